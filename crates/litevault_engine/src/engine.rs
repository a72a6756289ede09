//! Engine capability trait definition.

use crate::error::EngineResult;
use crate::types::{EncryptionMode, SeedStatement, Session};
use std::collections::BTreeSet;

/// The database engine capability consumed by the LiteVault registry.
///
/// Engines are **opaque executors**. They open and close named databases,
/// run upgrade statements inside a session, report which databases they
/// believe are open, and hold the single encryption secret. The registry
/// owns all connection bookkeeping - engines do not understand connection
/// keys, insertion order, or staged upgrade plans.
///
/// # Invariants
///
/// - `open` mints a fresh [`Session`] every time; sessions are never reused
///   across a close/reopen cycle
/// - The `Session` returned by `open` reports the schema version stored for
///   that database at open time
/// - `execute_upgrade` records `to_version` as the new stored version on
///   success
/// - Engines must be `Send + Sync` for concurrent access
///
/// # Implementors
///
/// - [`crate::InMemoryEngine`] - for testing and ephemeral databases
pub trait DatabaseEngine: Send + Sync {
    /// Opens the named database and returns a fresh session.
    ///
    /// A database may be open at most once per `(name, read_only)` pair.
    /// Fresh databases come into existence at schema version 1.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The database is already open for this access pair
    /// - An encrypted mode is requested without a stored secret
    /// - The engine refuses the open (wrong secret, I/O failure)
    fn open(
        &self,
        name: &str,
        encrypted: bool,
        mode: EncryptionMode,
        version: u32,
        read_only: bool,
    ) -> EngineResult<Session>;

    /// Closes the named database for the given access pair.
    ///
    /// After a successful close the session minted for this pair is dead;
    /// reopening allocates a fresh one.
    ///
    /// # Errors
    ///
    /// Returns an error if the database is not open or the close fails.
    fn close(&self, name: &str, read_only: bool) -> EngineResult<()>;

    /// Executes one upgrade step inside an open session.
    ///
    /// Runs `statements` in order, then `seeds` in order, and records
    /// `to_version` as the database's stored schema version.
    ///
    /// # Errors
    ///
    /// Returns an error if the session is unknown or any statement fails.
    /// On failure the stored version is left unchanged.
    fn execute_upgrade(
        &self,
        session: &Session,
        to_version: u32,
        statements: &[String],
        seeds: &[SeedStatement],
    ) -> EngineResult<()>;

    /// Reports the names of all databases the engine believes are open.
    ///
    /// This is the authoritative set the consistency checker reconciles the
    /// registry against. Names appear once regardless of access mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine cannot enumerate its open databases.
    fn report_open_connections(&self) -> EngineResult<BTreeSet<String>>;

    /// Whether an encryption secret is currently stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the secure storage backing the secret fails.
    fn is_secret_stored(&self) -> EngineResult<bool>;

    /// Stores the encryption secret.
    ///
    /// # Errors
    ///
    /// Returns an error if a secret is already stored or storage fails.
    fn set_secret(&self, passphrase: &str) -> EngineResult<()>;

    /// Replaces the stored secret, verifying the old passphrase first.
    ///
    /// # Errors
    ///
    /// Returns an error if no secret is stored, the old passphrase does not
    /// match, or storage fails.
    fn change_secret(&self, passphrase: &str, old_passphrase: &str) -> EngineResult<()>;

    /// Removes the stored secret.
    ///
    /// # Errors
    ///
    /// Returns an error if no secret is stored or storage fails.
    fn clear_secret(&self) -> EngineResult<()>;
}
