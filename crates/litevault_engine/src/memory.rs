//! In-memory engine for testing and ephemeral databases.

use crate::engine::DatabaseEngine;
use crate::error::{EngineError, EngineResult};
use crate::types::{EncryptionMode, SeedStatement, Session, SessionId};
use parking_lot::RwLock;
use sha2::{Digest, Sha256};
use std::collections::{BTreeSet, HashMap};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// SHA-256 digest of the stored passphrase, wiped on drop.
#[derive(PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
struct SecretDigest([u8; 32]);

impl SecretDigest {
    fn of(passphrase: &str) -> Self {
        Self(Sha256::digest(passphrase.as_bytes()).into())
    }
}

impl std::fmt::Debug for SecretDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SecretDigest([REDACTED])")
    }
}

/// A database known to the engine, persisting across close/reopen.
#[derive(Debug, Default)]
struct StoredDb {
    version: u32,
    executed: Vec<String>,
}

#[derive(Debug, Default)]
struct State {
    /// Databases that exist, by name. Survives close.
    catalog: HashMap<String, StoredDb>,
    /// Currently open `(name, read_only)` pairs.
    open: HashMap<(String, bool), SessionId>,
    /// Live sessions, back-reference to the database name.
    sessions: HashMap<SessionId, String>,
    /// Stored secret, if any.
    secret: Option<SecretDigest>,
    /// Names reported as open that the engine never actually opened.
    phantom: BTreeSet<String>,
    fail_next_open: bool,
    fail_next_close: bool,
}

/// An in-memory database engine.
///
/// This engine keeps a catalog of named databases entirely in memory and is
/// suitable for:
/// - Unit tests
/// - Integration tests
/// - Ephemeral registries that don't need persistence
///
/// Fresh databases come into existence at schema version 1;
/// [`DatabaseEngine::execute_upgrade`] advances the stored version and
/// records every executed statement so tests can assert ordering.
///
/// # Thread Safety
///
/// The engine is thread-safe and can be shared across threads.
///
/// # Example
///
/// ```rust
/// use litevault_engine::{DatabaseEngine, EncryptionMode, InMemoryEngine};
///
/// let engine = InMemoryEngine::new();
/// let session = engine
///     .open("ledger", false, EncryptionMode::NoEncryption, 1, false)
///     .unwrap();
/// engine
///     .execute_upgrade(&session, 2, &["CREATE TABLE t (id INTEGER)".into()], &[])
///     .unwrap();
/// assert_eq!(engine.stored_version("ledger"), Some(2));
/// ```
#[derive(Debug, Default)]
pub struct InMemoryEngine {
    state: RwLock<State>,
}

impl InMemoryEngine {
    /// Creates a new empty engine.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the stored schema version of a database, if it exists.
    #[must_use]
    pub fn stored_version(&self, name: &str) -> Option<u32> {
        self.state.read().catalog.get(name).map(|db| db.version)
    }

    /// Returns every statement executed against a database, in order.
    #[must_use]
    pub fn executed_statements(&self, name: &str) -> Vec<String> {
        self.state
            .read()
            .catalog
            .get(name)
            .map(|db| db.executed.clone())
            .unwrap_or_default()
    }

    /// Number of currently open `(name, read_only)` pairs.
    #[must_use]
    pub fn open_count(&self) -> usize {
        self.state.read().open.len()
    }

    /// Makes the next `open` call fail.
    pub fn inject_open_failure(&self) {
        self.state.write().fail_next_open = true;
    }

    /// Makes the next `close` call fail.
    pub fn inject_close_failure(&self) {
        self.state.write().fail_next_close = true;
    }

    /// Adds a name that will be reported as open without being opened.
    ///
    /// Used by tests to provoke a registry/engine mismatch.
    pub fn add_phantom_connection(&self, name: impl Into<String>) {
        self.state.write().phantom.insert(name.into());
    }

    /// Silently drops the engine's record of an open database.
    ///
    /// The registry is not informed; used by tests to provoke the opposite
    /// mismatch from [`Self::add_phantom_connection`].
    pub fn forget_connection(&self, name: &str) {
        let mut state = self.state.write();
        state.open.retain(|(n, _), _| n != name);
        state.sessions.retain(|_, n| n != name);
    }
}

impl DatabaseEngine for InMemoryEngine {
    fn open(
        &self,
        name: &str,
        encrypted: bool,
        mode: EncryptionMode,
        _version: u32,
        read_only: bool,
    ) -> EngineResult<Session> {
        let mut state = self.state.write();

        if state.fail_next_open {
            state.fail_next_open = false;
            return Err(EngineError::failure("injected open failure"));
        }

        let pair = (name.to_string(), read_only);
        if state.open.contains_key(&pair) {
            return Err(EngineError::already_open(name));
        }

        if encrypted {
            match mode {
                EncryptionMode::WrongSecret => return Err(EngineError::SecretMismatch),
                EncryptionMode::Secret | EncryptionMode::NewSecret | EncryptionMode::Encryption => {
                    if state.secret.is_none() {
                        return Err(EngineError::SecretRequired);
                    }
                }
                EncryptionMode::NoEncryption => {}
            }
        }

        // Fresh databases come into existence at version 1; the registry
        // drives them toward the requested version through execute_upgrade.
        let stored = state
            .catalog
            .entry(name.to_string())
            .or_insert_with(|| StoredDb {
                version: 1,
                executed: Vec::new(),
            })
            .version;

        let id = SessionId::new();
        state.open.insert(pair, id);
        state.sessions.insert(id, name.to_string());
        Ok(Session::new(id, stored))
    }

    fn close(&self, name: &str, read_only: bool) -> EngineResult<()> {
        let mut state = self.state.write();

        if state.fail_next_close {
            state.fail_next_close = false;
            return Err(EngineError::failure("injected close failure"));
        }

        let pair = (name.to_string(), read_only);
        match state.open.remove(&pair) {
            Some(id) => {
                state.sessions.remove(&id);
                Ok(())
            }
            None => Err(EngineError::not_open(name)),
        }
    }

    fn execute_upgrade(
        &self,
        session: &Session,
        to_version: u32,
        statements: &[String],
        seeds: &[SeedStatement],
    ) -> EngineResult<()> {
        let mut state = self.state.write();

        let name = state
            .sessions
            .get(&session.id())
            .cloned()
            .ok_or_else(|| EngineError::UnknownSession {
                session: session.id().to_string(),
            })?;

        let db = state
            .catalog
            .get_mut(&name)
            .ok_or_else(|| EngineError::not_open(&name))?;

        if to_version <= db.version {
            return Err(EngineError::failure(format!(
                "upgrade target {to_version} does not advance stored version {}",
                db.version
            )));
        }

        for statement in statements {
            db.executed.push(statement.clone());
        }
        for seed in seeds {
            db.executed.push(seed.statement.clone());
        }
        db.version = to_version;
        Ok(())
    }

    fn report_open_connections(&self) -> EngineResult<BTreeSet<String>> {
        let state = self.state.read();
        let mut names: BTreeSet<String> =
            state.open.keys().map(|(name, _)| name.clone()).collect();
        names.extend(state.phantom.iter().cloned());
        Ok(names)
    }

    fn is_secret_stored(&self) -> EngineResult<bool> {
        Ok(self.state.read().secret.is_some())
    }

    fn set_secret(&self, passphrase: &str) -> EngineResult<()> {
        let mut state = self.state.write();
        if state.secret.is_some() {
            return Err(EngineError::SecretAlreadySet);
        }
        state.secret = Some(SecretDigest::of(passphrase));
        Ok(())
    }

    fn change_secret(&self, passphrase: &str, old_passphrase: &str) -> EngineResult<()> {
        let mut state = self.state.write();
        match &state.secret {
            None => Err(EngineError::SecretNotStored),
            Some(stored) if *stored != SecretDigest::of(old_passphrase) => {
                Err(EngineError::SecretMismatch)
            }
            Some(_) => {
                state.secret = Some(SecretDigest::of(passphrase));
                Ok(())
            }
        }
    }

    fn clear_secret(&self) -> EngineResult<()> {
        let mut state = self.state.write();
        if state.secret.is_none() {
            return Err(EngineError::SecretNotStored);
        }
        state.secret = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_plain(engine: &InMemoryEngine, name: &str) -> Session {
        engine
            .open(name, false, EncryptionMode::NoEncryption, 1, false)
            .unwrap()
    }

    #[test]
    fn open_mints_fresh_sessions() {
        let engine = InMemoryEngine::new();
        let first = open_plain(&engine, "db");
        engine.close("db", false).unwrap();
        let second = open_plain(&engine, "db");
        assert_ne!(first.id(), second.id());
    }

    #[test]
    fn double_open_same_pair_fails() {
        let engine = InMemoryEngine::new();
        open_plain(&engine, "db");
        let result = engine.open("db", false, EncryptionMode::NoEncryption, 1, false);
        assert!(matches!(result, Err(EngineError::AlreadyOpen { .. })));
    }

    #[test]
    fn read_only_pair_is_distinct() {
        let engine = InMemoryEngine::new();
        open_plain(&engine, "db");
        assert!(engine
            .open("db", false, EncryptionMode::NoEncryption, 1, true)
            .is_ok());
        assert_eq!(engine.open_count(), 2);
    }

    #[test]
    fn fresh_database_starts_at_version_one() {
        let engine = InMemoryEngine::new();
        let session = engine
            .open("db", false, EncryptionMode::NoEncryption, 3, false)
            .unwrap();
        assert_eq!(session.stored_version(), 1);
    }

    #[test]
    fn version_survives_close_and_reopen() {
        let engine = InMemoryEngine::new();
        let session = open_plain(&engine, "db");
        engine
            .execute_upgrade(&session, 2, &["CREATE TABLE t (id INTEGER)".into()], &[])
            .unwrap();
        engine.close("db", false).unwrap();

        let reopened = open_plain(&engine, "db");
        assert_eq!(reopened.stored_version(), 2);
    }

    #[test]
    fn upgrade_records_statements_in_order() {
        let engine = InMemoryEngine::new();
        let session = open_plain(&engine, "db");
        engine
            .execute_upgrade(
                &session,
                2,
                &["CREATE TABLE a (id INTEGER)".into()],
                &[SeedStatement::new(
                    "INSERT INTO a (id) VALUES (?)",
                    vec![crate::SqlValue::Integer(1)],
                )],
            )
            .unwrap();
        let executed = engine.executed_statements("db");
        assert_eq!(executed.len(), 2);
        assert!(executed[0].starts_with("CREATE TABLE"));
        assert!(executed[1].starts_with("INSERT INTO"));
    }

    #[test]
    fn upgrade_with_stale_session_fails() {
        let engine = InMemoryEngine::new();
        let session = open_plain(&engine, "db");
        engine.close("db", false).unwrap();
        let result = engine.execute_upgrade(&session, 2, &[], &[]);
        assert!(matches!(result, Err(EngineError::UnknownSession { .. })));
    }

    #[test]
    fn upgrade_must_advance_version() {
        let engine = InMemoryEngine::new();
        let session = open_plain(&engine, "db");
        let result = engine.execute_upgrade(&session, 1, &[], &[]);
        assert!(result.is_err());
        assert_eq!(engine.stored_version("db"), Some(1));
    }

    #[test]
    fn close_unopened_fails() {
        let engine = InMemoryEngine::new();
        let result = engine.close("nothing", false);
        assert!(matches!(result, Err(EngineError::NotOpen { .. })));
    }

    #[test]
    fn encrypted_secret_mode_requires_stored_secret() {
        let engine = InMemoryEngine::new();
        let result = engine.open("db", true, EncryptionMode::Secret, 1, false);
        assert!(matches!(result, Err(EngineError::SecretRequired)));

        engine.set_secret("passphrase").unwrap();
        assert!(engine
            .open("db", true, EncryptionMode::Secret, 1, false)
            .is_ok());
    }

    #[test]
    fn wrongsecret_mode_always_refused() {
        let engine = InMemoryEngine::new();
        engine.set_secret("passphrase").unwrap();
        let result = engine.open("db", true, EncryptionMode::WrongSecret, 1, false);
        assert!(matches!(result, Err(EngineError::SecretMismatch)));
    }

    #[test]
    fn secret_lifecycle() {
        let engine = InMemoryEngine::new();
        assert!(!engine.is_secret_stored().unwrap());

        engine.set_secret("first").unwrap();
        assert!(engine.is_secret_stored().unwrap());

        assert!(matches!(
            engine.set_secret("second"),
            Err(EngineError::SecretAlreadySet)
        ));

        assert!(matches!(
            engine.change_secret("second", "not-first"),
            Err(EngineError::SecretMismatch)
        ));
        engine.change_secret("second", "first").unwrap();

        engine.clear_secret().unwrap();
        assert!(!engine.is_secret_stored().unwrap());
        assert!(matches!(
            engine.clear_secret(),
            Err(EngineError::SecretNotStored)
        ));
    }

    #[test]
    fn report_includes_open_and_phantom_names() {
        let engine = InMemoryEngine::new();
        open_plain(&engine, "real");
        engine.add_phantom_connection("ghost");

        let names = engine.report_open_connections().unwrap();
        assert!(names.contains("real"));
        assert!(names.contains("ghost"));
    }

    #[test]
    fn forget_connection_drops_engine_record() {
        let engine = InMemoryEngine::new();
        open_plain(&engine, "db");
        engine.forget_connection("db");
        assert!(engine.report_open_connections().unwrap().is_empty());
    }

    #[test]
    fn injected_failures_fire_once() {
        let engine = InMemoryEngine::new();
        engine.inject_open_failure();
        assert!(engine
            .open("db", false, EncryptionMode::NoEncryption, 1, false)
            .is_err());
        assert!(engine
            .open("db", false, EncryptionMode::NoEncryption, 1, false)
            .is_ok());

        engine.inject_close_failure();
        assert!(engine.close("db", false).is_err());
        assert!(engine.close("db", false).is_ok());
    }
}
