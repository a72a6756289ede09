//! Error types for the registry.

use litevault_engine::EngineError;
use thiserror::Error;

/// Result type for registry operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in registry operations.
///
/// `InvalidArgument` and the not-found variants are resolved entirely inside
/// the registry and never reach the engine. Engine failures are propagated
/// with the engine's message, never swallowed and never retried.
#[derive(Debug, Error)]
pub enum CoreError {
    /// An argument failed local validation before any engine call.
    #[error("invalid argument: {message}")]
    InvalidArgument {
        /// Description of the validation failure.
        message: String,
    },

    /// No connection is registered under this key.
    #[error("no connection for database '{name}' (read_only: {read_only})")]
    ConnectionNotFound {
        /// Database name.
        name: String,
        /// Read-only flag of the key.
        read_only: bool,
    },

    /// A connection is already registered under this key.
    #[error("connection already exists for database '{name}' (read_only: {read_only})")]
    ConnectionExists {
        /// Database name.
        name: String,
        /// Read-only flag of the key.
        read_only: bool,
    },

    /// No connection is registered under this path.
    #[error("no connection for path '{path}'")]
    PathNotFound {
        /// Filesystem path of the database.
        path: String,
    },

    /// A connection is already registered under this path.
    #[error("connection already exists for path '{path}'")]
    PathExists {
        /// Filesystem path of the database.
        path: String,
    },

    /// The operation conflicts with registry state or another operation.
    #[error("conflict: {message}")]
    Conflict {
        /// Description of the conflict.
        message: String,
    },

    /// The engine reported a failure.
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),
}

impl CoreError {
    /// Creates an invalid-argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Creates a connection-not-found error.
    pub fn connection_not_found(name: impl Into<String>, read_only: bool) -> Self {
        Self::ConnectionNotFound {
            name: name.into(),
            read_only,
        }
    }

    /// Creates a connection-exists error.
    pub fn connection_exists(name: impl Into<String>, read_only: bool) -> Self {
        Self::ConnectionExists {
            name: name.into(),
            read_only,
        }
    }

    /// Creates a path-not-found error.
    pub fn path_not_found(path: impl Into<String>) -> Self {
        Self::PathNotFound { path: path.into() }
    }

    /// Creates a path-exists error.
    pub fn path_exists(path: impl Into<String>) -> Self {
        Self::PathExists { path: path.into() }
    }

    /// Creates a conflict error.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_display_mentions_access_mode() {
        let plain = CoreError::connection_not_found("db", false);
        assert_eq!(
            plain.to_string(),
            "no connection for database 'db' (read_only: false)"
        );

        let ro = CoreError::connection_not_found("db", true);
        assert_eq!(
            ro.to_string(),
            "no connection for database 'db' (read_only: true)"
        );
    }

    #[test]
    fn engine_errors_keep_their_message() {
        let err: CoreError = EngineError::failure("disk full").into();
        assert!(err.to_string().contains("disk full"));
    }
}
