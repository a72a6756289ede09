//! Registry for connections addressed by raw filesystem path.
//!
//! Databases outside the standard naming scheme are keyed by their absolute
//! path instead of a logical name. They are treated as pre-existing,
//! fixed-schema files: no read-only duality, no encryption mode, no staged
//! upgrades.

use crate::error::{CoreError, CoreResult};
use crate::types::PathConnectionInfo;
use litevault_engine::{DatabaseEngine, EncryptionMode, Session};
use parking_lot::RwLock;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug)]
struct PathHandle {
    path: String,
    version: u32,
    session: Session,
}

impl PathHandle {
    fn info(&self) -> PathConnectionInfo {
        PathConnectionInfo {
            path: self.path.clone(),
            version: self.version,
            session: self.session.id(),
        }
    }
}

#[derive(Debug, Default)]
struct Inner {
    entries: HashMap<String, PathHandle>,
    order: Vec<String>,
    in_flight: HashSet<String>,
    epoch: u64,
}

/// Tracks open connections keyed by filesystem path.
///
/// Same contract shape as [`crate::registry::ConnectionRegistry`], one
/// handle per path.
pub struct PathRegistry {
    engine: Arc<dyn DatabaseEngine>,
    inner: RwLock<Inner>,
}

impl PathRegistry {
    /// Creates an empty path registry over the given engine.
    pub fn new(engine: Arc<dyn DatabaseEngine>) -> Self {
        Self {
            engine,
            inner: RwLock::new(Inner::default()),
        }
    }

    /// Opens the database file at `path` and registers it.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` - empty path or zero version
    /// - `PathExists` - a handle is already registered for this path
    /// - `Conflict` - another operation is in flight for this path, or the
    ///   registry was reset while the open was settling
    /// - `Engine` - the open failed
    pub fn create_connection(&self, path: &str, version: u32) -> CoreResult<PathConnectionInfo> {
        if path.trim().is_empty() {
            return Err(CoreError::invalid_argument("must provide a database path"));
        }
        if version == 0 {
            return Err(CoreError::invalid_argument("version must be at least 1"));
        }

        let epoch = {
            let mut inner = self.inner.write();
            if inner.entries.contains_key(path) {
                return Err(CoreError::path_exists(path));
            }
            if !inner.in_flight.insert(path.to_string()) {
                return Err(CoreError::conflict(format!(
                    "an operation is already in progress for path '{path}'"
                )));
            }
            inner.epoch
        };

        let session = match self
            .engine
            .open(path, false, EncryptionMode::NoEncryption, version, false)
        {
            Ok(session) => session,
            Err(e) => {
                self.clear_marker(path);
                return Err(e.into());
            }
        };

        let mut inner = self.inner.write();
        inner.in_flight.remove(path);
        if inner.epoch != epoch {
            drop(inner);
            warn!(path, "path registry was reset while the connection was opening");
            if let Err(close_err) = self.engine.close(path, false) {
                warn!(path, error = %close_err, "failed to close orphaned path connection");
            }
            return Err(CoreError::conflict(
                "registry was reset while the connection was opening",
            ));
        }

        let handle = PathHandle {
            path: path.to_string(),
            version: session.stored_version(),
            session,
        };
        let info = handle.info();
        inner.entries.insert(path.to_string(), handle);
        inner.order.push(path.to_string());
        debug!(path, "path connection created");
        Ok(info)
    }

    /// Returns a snapshot of the connection registered under the path.
    ///
    /// # Errors
    ///
    /// `PathNotFound` if the path is absent.
    pub fn retrieve_connection(&self, path: &str) -> CoreResult<PathConnectionInfo> {
        if path.trim().is_empty() {
            return Err(CoreError::invalid_argument("must provide a database path"));
        }
        self.inner
            .read()
            .entries
            .get(path)
            .map(PathHandle::info)
            .ok_or_else(|| CoreError::path_not_found(path))
    }

    /// Whether a connection is registered under the path. Pure lookup.
    #[must_use]
    pub fn is_connection(&self, path: &str) -> bool {
        self.inner.read().entries.contains_key(path)
    }

    /// Closes the connection registered under the path.
    ///
    /// The engine close runs first; a failed close leaves the entry intact.
    ///
    /// # Errors
    ///
    /// - `PathNotFound` - the path is absent
    /// - `Conflict` - another operation is in flight for this path
    /// - `Engine` - the engine close failed
    pub fn close_connection(&self, path: &str) -> CoreResult<()> {
        if path.trim().is_empty() {
            return Err(CoreError::invalid_argument("must provide a database path"));
        }
        {
            let mut inner = self.inner.write();
            if !inner.entries.contains_key(path) {
                return Err(CoreError::path_not_found(path));
            }
            if !inner.in_flight.insert(path.to_string()) {
                return Err(CoreError::conflict(format!(
                    "an operation is already in progress for path '{path}'"
                )));
            }
        }

        if let Err(e) = self.engine.close(path, false) {
            self.clear_marker(path);
            return Err(e.into());
        }

        let mut inner = self.inner.write();
        inner.in_flight.remove(path);
        inner.entries.remove(path);
        inner.order.retain(|p| p != path);
        debug!(path, "path connection closed");
        Ok(())
    }

    /// Drops every entry without touching the engine.
    ///
    /// Returns the number of entries dropped.
    pub fn reset(&self) -> usize {
        let mut inner = self.inner.write();
        let dropped = inner.entries.len();
        inner.entries.clear();
        inner.order.clear();
        inner.epoch += 1;
        dropped
    }

    /// The paths currently registered.
    #[must_use]
    pub fn names(&self) -> BTreeSet<String> {
        self.inner.read().entries.keys().cloned().collect()
    }

    /// Number of registered path connections.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().entries.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.read().entries.is_empty()
    }

    fn clear_marker(&self, path: &str) {
        self.inner.write().in_flight.remove(path);
    }
}

impl std::fmt::Debug for PathRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PathRegistry")
            .field("connections", &self.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use litevault_engine::InMemoryEngine;

    fn registry() -> (Arc<InMemoryEngine>, PathRegistry) {
        let engine = Arc::new(InMemoryEngine::new());
        let reg = PathRegistry::new(engine.clone());
        (engine, reg)
    }

    #[test]
    fn create_retrieve_close_round_trip() {
        let (_, reg) = registry();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("legacy.db").display().to_string();

        let info = reg.create_connection(&path, 1).unwrap();
        assert_eq!(info.path, path);
        assert!(reg.is_connection(&path));

        let retrieved = reg.retrieve_connection(&path).unwrap();
        assert_eq!(retrieved.session, info.session);

        reg.close_connection(&path).unwrap();
        assert!(!reg.is_connection(&path));
        assert!(matches!(
            reg.retrieve_connection(&path),
            Err(CoreError::PathNotFound { .. })
        ));
    }

    #[test]
    fn one_handle_per_path() {
        let (_, reg) = registry();
        reg.create_connection("/data/fixed.db", 1).unwrap();
        let result = reg.create_connection("/data/fixed.db", 1);
        assert!(matches!(result, Err(CoreError::PathExists { .. })));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn empty_path_and_zero_version_rejected() {
        let (engine, reg) = registry();
        assert!(reg.create_connection("", 1).is_err());
        assert!(reg.create_connection("/data/fixed.db", 0).is_err());
        assert_eq!(engine.open_count(), 0);
    }

    #[test]
    fn close_absent_path_is_not_found() {
        let (_, reg) = registry();
        assert!(matches!(
            reg.close_connection("/nope.db"),
            Err(CoreError::PathNotFound { .. })
        ));
    }

    #[test]
    fn failed_engine_close_leaves_entry_intact() {
        let (engine, reg) = registry();
        reg.create_connection("/data/fixed.db", 1).unwrap();

        engine.inject_close_failure();
        assert!(matches!(
            reg.close_connection("/data/fixed.db"),
            Err(CoreError::Engine(_))
        ));
        assert!(reg.is_connection("/data/fixed.db"));
    }

    #[test]
    fn reset_drops_without_engine_closes() {
        let (engine, reg) = registry();
        reg.create_connection("/data/fixed.db", 1).unwrap();
        assert_eq!(reg.reset(), 1);
        assert!(reg.is_empty());
        assert_eq!(engine.open_count(), 1);
    }
}
