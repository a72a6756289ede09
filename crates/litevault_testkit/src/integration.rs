//! Cross-crate integration tests for the full connection-lifecycle surface.
