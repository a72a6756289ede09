//! Manager fixtures over the in-memory engine.

use litevault_core::ConnectionManager;
use litevault_engine::InMemoryEngine;
use std::sync::Arc;

/// Creates a manager over a fresh in-memory engine, returning both so tests
/// can drive engine-side state (failure injection, phantom connections).
#[must_use]
pub fn manager_with_engine() -> (Arc<InMemoryEngine>, ConnectionManager) {
    let engine = Arc::new(InMemoryEngine::new());
    let manager = ConnectionManager::new(engine.clone());
    (engine, manager)
}

/// Creates a manager over a fresh in-memory engine.
#[must_use]
pub fn manager() -> ConnectionManager {
    manager_with_engine().1
}

/// Runs a test body against a fresh manager.
pub fn with_manager<F>(f: F)
where
    F: FnOnce(&ConnectionManager),
{
    let manager = manager();
    f(&manager);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixtures_start_empty() {
        with_manager(|manager| {
            assert!(manager.retrieve_all_connections().is_empty());
            assert!(!manager.is_secret_stored().unwrap());
        });
    }

    #[test]
    fn engine_handle_reaches_the_same_state() {
        let (engine, manager) = manager_with_engine();
        manager.create_connection("db").unwrap();
        assert_eq!(engine.open_count(), 1);
    }
}
