//! Connection registry: the key → handle table and its lifecycle rules.

use crate::config::ConnectionOptions;
use crate::error::{CoreError, CoreResult};
use crate::types::{ConnectionInfo, ConnectionKey};
use crate::upgrade::UpgradeStore;
use litevault_engine::{DatabaseEngine, EncryptionMode, Session};
use parking_lot::RwLock;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, warn};

/// The registry's owned record of one open connection.
///
/// The engine session lives here and nowhere else; callers only ever see
/// [`ConnectionInfo`] snapshots.
#[derive(Debug)]
struct ConnectionHandle {
    key: ConnectionKey,
    version: u32,
    encrypted: bool,
    mode: EncryptionMode,
    session: Session,
}

impl ConnectionHandle {
    fn info(&self) -> ConnectionInfo {
        ConnectionInfo {
            key: self.key.clone(),
            version: self.version,
            encrypted: self.encrypted,
            mode: self.mode,
            session: self.session.id(),
        }
    }
}

#[derive(Debug, Default)]
struct Inner {
    entries: HashMap<ConnectionKey, ConnectionHandle>,
    /// Insertion order of the keys in `entries`.
    order: Vec<ConnectionKey>,
    /// Keys with an engine call in flight.
    in_flight: HashSet<ConnectionKey>,
    /// Bumped whenever the table is cleared wholesale; an open that settles
    /// across a bump must not insert into the rebuilt table.
    epoch: u64,
}

/// Tracks open connections keyed by `(name, read_only)`.
///
/// All state transitions are safe under concurrent invocation. Engine calls
/// are never made while holding the registry lock, except in
/// [`Self::close_all_connections`] where holding it for the whole sweep is
/// what makes the bulk close atomic for observers. Per-key serialization
/// uses in-flight markers: a second operation on a key with one in flight is
/// rejected rather than queued.
pub struct ConnectionRegistry {
    engine: Arc<dyn DatabaseEngine>,
    upgrades: Arc<UpgradeStore>,
    inner: RwLock<Inner>,
}

impl ConnectionRegistry {
    /// Creates an empty registry over the given engine and upgrade store.
    pub fn new(engine: Arc<dyn DatabaseEngine>, upgrades: Arc<UpgradeStore>) -> Self {
        Self {
            engine,
            upgrades,
            inner: RwLock::new(Inner::default()),
        }
    }

    /// Opens a connection and registers it under `(name, options.read_only)`.
    ///
    /// Staged upgrade statements with `stored < to_version <= options.version`
    /// are applied in ascending order before the handle becomes visible. The
    /// returned snapshot reports the schema version actually reached.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` - empty name or zero version
    /// - `ConnectionExists` - a handle is already registered for this key
    /// - `Conflict` - another operation is in flight for this key, or the
    ///   registry was reset while the engine open was settling
    /// - `Engine` - the open or an upgrade step failed
    pub fn create_connection(
        &self,
        name: &str,
        options: &ConnectionOptions,
    ) -> CoreResult<ConnectionInfo> {
        if name.trim().is_empty() {
            return Err(CoreError::invalid_argument("must provide a database name"));
        }
        if options.version == 0 {
            return Err(CoreError::invalid_argument("version must be at least 1"));
        }

        let key = ConnectionKey::new(name, options.read_only);
        let epoch = {
            let mut inner = self.inner.write();
            if inner.entries.contains_key(&key) {
                return Err(CoreError::connection_exists(name, options.read_only));
            }
            if !inner.in_flight.insert(key.clone()) {
                return Err(CoreError::conflict(format!(
                    "an operation is already in progress for {key}"
                )));
            }
            inner.epoch
        };

        let session = match self.engine.open(
            name,
            options.encrypted,
            options.mode,
            options.version,
            options.read_only,
        ) {
            Ok(session) => session,
            Err(e) => {
                self.clear_marker(&key);
                return Err(e.into());
            }
        };

        let version = match self.apply_staged_upgrades(name, options, &session) {
            Ok(version) => version,
            Err(e) => {
                if let Err(close_err) = self.engine.close(name, options.read_only) {
                    warn!(%key, error = %close_err, "failed to close connection after upgrade error");
                }
                self.clear_marker(&key);
                return Err(e);
            }
        };

        let mut inner = self.inner.write();
        inner.in_flight.remove(&key);
        if inner.epoch != epoch {
            drop(inner);
            warn!(%key, "registry was reset while the connection was opening");
            if let Err(close_err) = self.engine.close(name, options.read_only) {
                warn!(%key, error = %close_err, "failed to close orphaned connection");
            }
            return Err(CoreError::conflict(
                "registry was reset while the connection was opening",
            ));
        }

        let handle = ConnectionHandle {
            key: key.clone(),
            version,
            encrypted: options.encrypted,
            mode: options.mode,
            session,
        };
        let info = handle.info();
        inner.entries.insert(key.clone(), handle);
        inner.order.push(key.clone());
        debug!(%key, version, "connection created");
        Ok(info)
    }

    /// Runs the staged upgrade steps for `name` and returns the schema
    /// version reached.
    fn apply_staged_upgrades(
        &self,
        name: &str,
        options: &ConnectionOptions,
        session: &Session,
    ) -> CoreResult<u32> {
        let mut version = session.stored_version();
        let staged = self
            .upgrades
            .staged_between(name, version, options.version);
        for step in &staged {
            self.engine.execute_upgrade(
                session,
                step.to_version,
                &step.statements,
                &step.seed_statements,
            )?;
            debug!(name, to_version = step.to_version, "upgrade step applied");
            version = step.to_version;
        }
        Ok(version)
    }

    /// Returns a snapshot of the connection registered under the key.
    ///
    /// Never creates a connection as a side effect.
    ///
    /// # Errors
    ///
    /// `ConnectionNotFound` if the key is absent.
    pub fn retrieve_connection(&self, name: &str, read_only: bool) -> CoreResult<ConnectionInfo> {
        if name.trim().is_empty() {
            return Err(CoreError::invalid_argument("must provide a database name"));
        }
        let key = ConnectionKey::new(name, read_only);
        self.inner
            .read()
            .entries
            .get(&key)
            .map(ConnectionHandle::info)
            .ok_or_else(|| CoreError::connection_not_found(name, read_only))
    }

    /// Whether a connection is registered under the key. Pure lookup.
    #[must_use]
    pub fn is_connection(&self, name: &str, read_only: bool) -> bool {
        let key = ConnectionKey::new(name, read_only);
        self.inner.read().entries.contains_key(&key)
    }

    /// Closes the connection registered under the key.
    ///
    /// The engine close runs first; the entry is only removed once it
    /// succeeds, so a failed engine close leaves the entry intact.
    ///
    /// # Errors
    ///
    /// - `ConnectionNotFound` - the key is absent
    /// - `Conflict` - another operation is in flight for this key
    /// - `Engine` - the engine close failed
    pub fn close_connection(&self, name: &str, read_only: bool) -> CoreResult<()> {
        if name.trim().is_empty() {
            return Err(CoreError::invalid_argument("must provide a database name"));
        }
        let key = ConnectionKey::new(name, read_only);
        {
            let mut inner = self.inner.write();
            if !inner.entries.contains_key(&key) {
                return Err(CoreError::connection_not_found(name, read_only));
            }
            if !inner.in_flight.insert(key.clone()) {
                return Err(CoreError::conflict(format!(
                    "an operation is already in progress for {key}"
                )));
            }
        }

        if let Err(e) = self.engine.close(name, read_only) {
            self.clear_marker(&key);
            return Err(e.into());
        }

        let mut inner = self.inner.write();
        inner.in_flight.remove(&key);
        inner.entries.remove(&key);
        inner.order.retain(|k| k != &key);
        debug!(%key, "connection closed");
        Ok(())
    }

    /// Returns snapshots of every open connection, in the insertion order of
    /// the `create_connection` calls still open.
    #[must_use]
    pub fn retrieve_all_connections(&self) -> Vec<ConnectionInfo> {
        let inner = self.inner.read();
        inner
            .order
            .iter()
            .filter_map(|key| inner.entries.get(key))
            .map(ConnectionHandle::info)
            .collect()
    }

    /// Closes every open connection and clears the registry as one atomic
    /// step for observers.
    ///
    /// Every handle is closed through the engine; the registry is cleared
    /// regardless of individual failures, and the first engine failure is
    /// reported after clearing. Entries whose sessions are gone must not
    /// survive.
    ///
    /// # Errors
    ///
    /// - `Conflict` - a single-key operation is in flight
    /// - `Engine` - at least one engine close failed (the registry is
    ///   cleared anyway)
    pub fn close_all_connections(&self) -> CoreResult<()> {
        let mut inner = self.inner.write();
        if !inner.in_flight.is_empty() {
            return Err(CoreError::conflict(
                "connection operations are in progress; retry the bulk close",
            ));
        }

        // The lock is deliberately held across the engine closes: the sweep
        // must be atomic with respect to every observer of the table.
        let mut first_failure = None;
        for key in &inner.order {
            if let Err(e) = self.engine.close(&key.name, key.read_only) {
                warn!(%key, error = %e, "engine close failed during bulk close");
                if first_failure.is_none() {
                    first_failure = Some(e);
                }
            }
        }

        let dropped = inner.entries.len();
        inner.entries.clear();
        inner.order.clear();
        inner.epoch += 1;
        debug!(dropped, "all connections closed");

        match first_failure {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }

    /// Drops every entry without touching the engine.
    ///
    /// Used by the consistency checker once the engine-side state is
    /// suspect. Returns the number of entries dropped.
    pub fn reset(&self) -> usize {
        let mut inner = self.inner.write();
        let dropped = inner.entries.len();
        inner.entries.clear();
        inner.order.clear();
        inner.epoch += 1;
        dropped
    }

    /// The distinct database names currently registered.
    #[must_use]
    pub fn distinct_names(&self) -> BTreeSet<String> {
        self.inner
            .read()
            .entries
            .keys()
            .map(|key| key.name.clone())
            .collect()
    }

    /// Number of registered connections.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().entries.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.read().entries.is_empty()
    }

    fn clear_marker(&self, key: &ConnectionKey) {
        self.inner.write().in_flight.remove(key);
    }
}

impl std::fmt::Debug for ConnectionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionRegistry")
            .field("connections", &self.len())
            .finish_non_exhaustive()
    }
}
