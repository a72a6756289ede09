//! The connection manager facade.

use crate::config::ConnectionOptions;
use crate::error::CoreResult;
use crate::path::PathRegistry;
use crate::registry::ConnectionRegistry;
use crate::secret::SecretManager;
use crate::types::{ConnectionInfo, ConsistencyReport, PathConnectionInfo};
use crate::upgrade::{UpgradeStatement, UpgradeStore};
use litevault_engine::DatabaseEngine;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::warn;

/// The primary entry point for managing database connections.
///
/// `ConnectionManager` owns the engine capability and every registry
/// component: the named-connection registry, the path-keyed registry, the
/// staged upgrade store, and the secret manager. All callers go through it.
///
/// # Example
///
/// ```rust
/// use litevault_core::ConnectionManager;
/// use litevault_engine::InMemoryEngine;
/// use std::sync::Arc;
///
/// let manager = ConnectionManager::new(Arc::new(InMemoryEngine::new()));
/// manager.create_connection("inventory").unwrap();
/// assert!(manager.is_connection("inventory", false));
/// manager.close_all_connections().unwrap();
/// assert!(manager.retrieve_all_connections().is_empty());
/// ```
pub struct ConnectionManager {
    engine: Arc<dyn DatabaseEngine>,
    connections: ConnectionRegistry,
    paths: PathRegistry,
    upgrades: Arc<UpgradeStore>,
    secrets: SecretManager,
}

impl ConnectionManager {
    /// Creates a manager over the given engine.
    pub fn new(engine: Arc<dyn DatabaseEngine>) -> Self {
        let upgrades = Arc::new(UpgradeStore::new());
        Self {
            connections: ConnectionRegistry::new(engine.clone(), upgrades.clone()),
            paths: PathRegistry::new(engine.clone()),
            secrets: SecretManager::new(engine.clone()),
            upgrades,
            engine,
        }
    }

    // ========================================================================
    // Named connections
    // ========================================================================

    /// Opens a connection with default options (version 1, not encrypted,
    /// writable).
    pub fn create_connection(&self, name: &str) -> CoreResult<ConnectionInfo> {
        self.create_connection_with(name, &ConnectionOptions::default())
    }

    /// Opens a connection with explicit options.
    ///
    /// Staged upgrade statements apply before the handle becomes visible;
    /// see [`crate::registry::ConnectionRegistry::create_connection`].
    pub fn create_connection_with(
        &self,
        name: &str,
        options: &ConnectionOptions,
    ) -> CoreResult<ConnectionInfo> {
        self.connections.create_connection(name, options)
    }

    /// Returns a snapshot of an open connection.
    pub fn retrieve_connection(&self, name: &str, read_only: bool) -> CoreResult<ConnectionInfo> {
        self.connections.retrieve_connection(name, read_only)
    }

    /// Whether a connection is registered under `(name, read_only)`.
    #[must_use]
    pub fn is_connection(&self, name: &str, read_only: bool) -> bool {
        self.connections.is_connection(name, read_only)
    }

    /// Closes one connection.
    pub fn close_connection(&self, name: &str, read_only: bool) -> CoreResult<()> {
        self.connections.close_connection(name, read_only)
    }

    /// Returns snapshots of every open named connection, in creation order.
    #[must_use]
    pub fn retrieve_all_connections(&self) -> Vec<ConnectionInfo> {
        self.connections.retrieve_all_connections()
    }

    /// Closes every open named connection; the registry is cleared even if
    /// individual engine closes fail, and the first failure is reported.
    pub fn close_all_connections(&self) -> CoreResult<()> {
        self.connections.close_all_connections()
    }

    // ========================================================================
    // Path-keyed connections
    // ========================================================================

    /// Opens a connection to the database file at `path`.
    pub fn create_path_connection(
        &self,
        path: &str,
        version: u32,
    ) -> CoreResult<PathConnectionInfo> {
        self.paths.create_connection(path, version)
    }

    /// Returns a snapshot of an open path-keyed connection.
    pub fn retrieve_path_connection(&self, path: &str) -> CoreResult<PathConnectionInfo> {
        self.paths.retrieve_connection(path)
    }

    /// Closes one path-keyed connection.
    pub fn close_path_connection(&self, path: &str) -> CoreResult<()> {
        self.paths.close_connection(path)
    }

    /// Whether a connection is registered under `path`.
    #[must_use]
    pub fn is_path_connection(&self, path: &str) -> bool {
        self.paths.is_connection(path)
    }

    // ========================================================================
    // Upgrades
    // ========================================================================

    /// Stages a schema-upgrade step for a database.
    ///
    /// Nothing executes at registration time; the step runs on the next
    /// `create_connection` that opens the database past its stored version.
    pub fn add_upgrade_statement(&self, name: &str, upgrade: UpgradeStatement) -> CoreResult<()> {
        self.upgrades.add(name, upgrade)
    }

    // ========================================================================
    // Encryption secret
    // ========================================================================

    /// Whether an encryption secret is stored.
    pub fn is_secret_stored(&self) -> CoreResult<bool> {
        self.secrets.is_secret_stored()
    }

    /// Stores the encryption secret. Runs at most once per deployment.
    pub fn set_encryption_secret(&self, passphrase: &str) -> CoreResult<()> {
        self.secrets.set_secret(passphrase)
    }

    /// Replaces the stored secret after verifying the old passphrase.
    pub fn change_encryption_secret(
        &self,
        passphrase: &str,
        old_passphrase: &str,
    ) -> CoreResult<()> {
        self.secrets.change_secret(passphrase, old_passphrase)
    }

    /// Removes the stored secret.
    pub fn clear_encryption_secret(&self) -> CoreResult<()> {
        self.secrets.clear_secret()
    }

    // ========================================================================
    // Consistency
    // ========================================================================

    /// Reconciles the registries against the engine's authoritative set of
    /// open databases.
    ///
    /// On any mismatch every registry entry is dropped - without individual
    /// engine closes, since the engine-side state is already suspect - and
    /// the report says `result: false`. On match the state is untouched and
    /// the report says `result: true`. This is a defensive
    /// re-synchronization primitive, not a repair mechanism: it trades
    /// dropped in-memory handles for never acting on stale ones.
    pub fn check_connections_consistency(&self) -> CoreResult<ConsistencyReport> {
        let reported = self.engine.report_open_connections()?;

        let mut known: BTreeSet<String> = self.connections.distinct_names();
        known.extend(self.paths.names());

        if known == reported {
            return Ok(ConsistencyReport { result: true });
        }

        let dropped = self.connections.reset() + self.paths.reset();
        warn!(
            dropped,
            registry = ?known,
            engine = ?reported,
            "connection registries out of sync with engine; all entries dropped"
        );
        Ok(ConsistencyReport { result: false })
    }
}

impl std::fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("connections", &self.connections.len())
            .field("path_connections", &self.paths.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use crate::types::Outcome;
    use litevault_engine::{EncryptionMode, InMemoryEngine};

    fn manager() -> (Arc<InMemoryEngine>, ConnectionManager) {
        let engine = Arc::new(InMemoryEngine::new());
        let manager = ConnectionManager::new(engine.clone());
        (engine, manager)
    }

    #[test]
    fn creation_order_then_bulk_close() {
        let (_, manager) = manager();
        manager.create_connection("testFirstDB").unwrap();
        manager.create_connection("testSecondDB").unwrap();

        let names: Vec<String> = manager
            .retrieve_all_connections()
            .into_iter()
            .map(|info| info.key.name)
            .collect();
        assert_eq!(names, vec!["testFirstDB", "testSecondDB"]);

        manager.close_all_connections().unwrap();
        assert!(manager.retrieve_all_connections().is_empty());
    }

    #[test]
    fn closed_connection_is_gone() {
        let (_, manager) = manager();
        manager.create_connection("testDB").unwrap();
        manager.close_connection("testDB", false).unwrap();

        assert!(matches!(
            manager.retrieve_connection("testDB", false),
            Err(CoreError::ConnectionNotFound { .. })
        ));
    }

    #[test]
    fn secret_round_trip() {
        let (_, manager) = manager();
        manager.set_encryption_secret("p1").unwrap();
        assert!(manager.is_secret_stored().unwrap());

        manager.clear_encryption_secret().unwrap();
        assert!(!manager.is_secret_stored().unwrap());
    }

    #[test]
    fn encrypted_connection_after_secret_is_set() {
        let (_, manager) = manager();

        let options = ConnectionOptions::new()
            .encrypted(true)
            .mode(EncryptionMode::Secret);

        // Without a stored secret the engine refuses the open.
        assert!(matches!(
            manager.create_connection_with("vault", &options),
            Err(CoreError::Engine(_))
        ));

        manager.set_encryption_secret("p1").unwrap();
        let info = manager.create_connection_with("vault", &options).unwrap();
        assert!(info.encrypted);
        assert_eq!(info.mode, EncryptionMode::Secret);
    }

    #[test]
    fn upgrade_staging_validates_order() {
        let (_, manager) = manager();
        manager
            .add_upgrade_statement(
                "db",
                UpgradeStatement::new(2, vec!["CREATE TABLE a (id INTEGER)".into()]),
            )
            .unwrap();
        let result = manager.add_upgrade_statement(
            "db",
            UpgradeStatement::new(1, vec!["CREATE TABLE b (id INTEGER)".into()]),
        );
        assert!(matches!(result, Err(CoreError::InvalidArgument { .. })));
    }

    #[test]
    fn consistency_match_leaves_state_untouched() {
        let (_, manager) = manager();
        manager.create_connection("db").unwrap();

        let report = manager.check_connections_consistency().unwrap();
        assert!(report.result);
        assert!(manager.is_connection("db", false));
    }

    #[test]
    fn consistency_mismatch_resets_everything() {
        let (engine, manager) = manager();
        manager.create_connection("db").unwrap();
        manager.create_path_connection("/data/legacy.db", 1).unwrap();
        engine.add_phantom_connection("ghost");

        let report = manager.check_connections_consistency().unwrap();
        assert!(!report.result);
        assert!(manager.retrieve_all_connections().is_empty());
        assert!(!manager.is_path_connection("/data/legacy.db"));
    }

    #[test]
    fn consistency_detects_engine_side_loss() {
        let (engine, manager) = manager();
        manager.create_connection("db").unwrap();
        engine.forget_connection("db");

        let report = manager.check_connections_consistency().unwrap();
        assert!(!report.result);
        assert!(manager.retrieve_all_connections().is_empty());
    }

    #[test]
    fn both_registries_count_toward_the_authoritative_set() {
        let (_, manager) = manager();
        manager.create_connection("named").unwrap();
        manager.create_path_connection("/data/by-path.db", 1).unwrap();

        let report = manager.check_connections_consistency().unwrap();
        assert!(report.result);
        assert!(manager.is_connection("named", false));
        assert!(manager.is_path_connection("/data/by-path.db"));
    }

    #[test]
    fn errors_translate_to_wire_outcomes() {
        let (_, manager) = manager();
        let outcome: Outcome = manager.close_connection("missing", false).into();
        assert!(!outcome.result);
        assert!(outcome.message.unwrap().contains("missing"));

        manager.create_connection("db").unwrap();
        let outcome: Outcome = manager.close_connection("db", false).into();
        assert_eq!(outcome, Outcome::success());
    }

    #[test]
    fn read_only_duality_through_the_facade() {
        let (_, manager) = manager();
        manager.create_connection("db").unwrap();
        manager
            .create_connection_with("db", &ConnectionOptions::new().read_only(true))
            .unwrap();

        assert_eq!(manager.retrieve_all_connections().len(), 2);
        assert!(manager.retrieve_connection("db", true).unwrap().key.read_only);
    }
}
