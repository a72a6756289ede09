//! Error types for engine operations.

use std::io;
use thiserror::Error;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors that can occur inside a database engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The database is already open in this access mode.
    #[error("database '{name}' is already open")]
    AlreadyOpen {
        /// Name of the database.
        name: String,
    },

    /// The database is not open.
    #[error("database '{name}' is not open")]
    NotOpen {
        /// Name of the database.
        name: String,
    },

    /// The session does not belong to any open database.
    #[error("unknown session: {session}")]
    UnknownSession {
        /// Display form of the session id.
        session: String,
    },

    /// The engine refused to open the database.
    #[error("open rejected for '{name}': {reason}")]
    OpenRejected {
        /// Name of the database.
        name: String,
        /// Why the open was refused.
        reason: String,
    },

    /// An encrypted open requires a stored secret and none is stored.
    #[error("no encryption secret is stored")]
    SecretRequired,

    /// A secret is already stored and cannot be set again.
    #[error("an encryption secret is already stored")]
    SecretAlreadySet,

    /// No secret is stored to change or clear.
    #[error("no encryption secret is stored to modify")]
    SecretNotStored,

    /// The provided passphrase does not match the stored secret.
    #[error("passphrase does not match the stored secret")]
    SecretMismatch,

    /// Any other engine-reported failure.
    #[error("engine failure: {message}")]
    Failure {
        /// Engine-provided description.
        message: String,
    },
}

impl EngineError {
    /// Creates an already-open error.
    pub fn already_open(name: impl Into<String>) -> Self {
        Self::AlreadyOpen { name: name.into() }
    }

    /// Creates a not-open error.
    pub fn not_open(name: impl Into<String>) -> Self {
        Self::NotOpen { name: name.into() }
    }

    /// Creates an open-rejected error.
    pub fn open_rejected(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::OpenRejected {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Creates a generic failure.
    pub fn failure(message: impl Into<String>) -> Self {
        Self::Failure {
            message: message.into(),
        }
    }
}
