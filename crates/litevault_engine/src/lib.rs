//! # LiteVault Engine
//!
//! Engine capability trait and reference implementation for LiteVault.
//!
//! This crate is the boundary between the connection registry and the
//! database engine proper. Engines are **opaque executors**: they open and
//! close named databases, run upgrade statements, answer which databases
//! they believe are open, and hold the single encryption secret. The
//! registry owns all lifecycle bookkeeping - engines do not know about
//! connection keys, insertion order, or staged upgrade plans.
//!
//! ## Design Principles
//!
//! - Engines are driven through an explicit trait listing every call the
//!   registry makes - no untyped plugin objects
//! - Sessions are opaque values minted by the engine and owned exclusively
//!   by the registry entry they belong to
//! - Must be `Send + Sync` for concurrent access
//!
//! ## Available Engines
//!
//! - [`InMemoryEngine`] - for testing and ephemeral databases
//!
//! ## Example
//!
//! ```rust
//! use litevault_engine::{DatabaseEngine, EncryptionMode, InMemoryEngine};
//!
//! let engine = InMemoryEngine::new();
//! let session = engine
//!     .open("inventory", false, EncryptionMode::NoEncryption, 1, false)
//!     .unwrap();
//! assert_eq!(session.stored_version(), 1);
//! engine.close("inventory", false).unwrap();
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod engine;
mod error;
mod memory;
mod types;

pub use engine::DatabaseEngine;
pub use error::{EngineError, EngineResult};
pub use memory::InMemoryEngine;
pub use types::{EncryptionMode, SeedStatement, Session, SessionId, SqlValue};
