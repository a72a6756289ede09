//! # LiteVault Core
//!
//! Connection registry and lifecycle manager for LiteVault.
//!
//! This crate provides:
//! - [`ConnectionManager`] - the facade owning every component below
//! - [`registry::ConnectionRegistry`] - one handle per `(name, read_only)`
//!   key, created/retrieved/closed through the engine capability
//! - [`path::PathRegistry`] - connections addressed by raw filesystem path
//! - [`UpgradeStore`] - staged schema-upgrade statements, applied in
//!   ascending order on open
//! - [`SecretManager`] - the single encryption-secret lifecycle
//! - A consistency check reconciling the registries against the engine's
//!   authoritative set of open databases
//!
//! The engine itself - SQL execution, file formats, secure storage - lives
//! behind the [`DatabaseEngine`] trait from `litevault_engine`.
//!
//! ## Example
//!
//! ```rust
//! use litevault_core::{ConnectionManager, ConnectionOptions, UpgradeStatement};
//! use litevault_engine::InMemoryEngine;
//! use std::sync::Arc;
//!
//! let manager = ConnectionManager::new(Arc::new(InMemoryEngine::new()));
//!
//! manager.add_upgrade_statement(
//!     "inventory",
//!     UpgradeStatement::new(2, vec!["CREATE TABLE items (id INTEGER)".into()]),
//! )?;
//!
//! let info = manager.create_connection_with(
//!     "inventory",
//!     &ConnectionOptions::new().version(2),
//! )?;
//! assert_eq!(info.version, 2);
//! # Ok::<(), litevault_core::CoreError>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod manager;
pub mod path;
pub mod registry;
mod secret;
mod types;
mod upgrade;

pub use config::ConnectionOptions;
pub use error::{CoreError, CoreResult};
pub use manager::ConnectionManager;
pub use secret::SecretManager;
pub use types::{ConnectionInfo, ConnectionKey, ConsistencyReport, Outcome, PathConnectionInfo};
pub use upgrade::{UpgradeStatement, UpgradeStore};

pub use litevault_engine::{DatabaseEngine, EncryptionMode, SeedStatement, SqlValue};
