//! # LiteVault Testkit
//!
//! Test utilities for LiteVault.
//!
//! This crate provides:
//! - Manager fixtures over the in-memory engine
//! - Property-based test generators using proptest
//! - Cross-crate integration tests for the full connection-lifecycle surface
//!
//! ## Usage
//!
//! ```rust
//! use litevault_testkit::prelude::*;
//!
//! with_manager(|manager| {
//!     manager.create_connection("test").unwrap();
//!     assert!(manager.is_connection("test", false));
//! });
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
mod integration;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
}

pub use fixtures::*;
pub use generators::*;
