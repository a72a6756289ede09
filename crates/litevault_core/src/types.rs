//! Core value types for the registry.

use litevault_engine::{EncryptionMode, SessionId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The unique identifier of a registry entry: database name plus read-only
/// flag.
///
/// Two handles may coexist for the same name if one is read-only and the
/// other is not; no two handles may share an identical key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionKey {
    /// Logical database name.
    pub name: String,
    /// Whether the connection is read-only.
    pub read_only: bool,
}

impl ConnectionKey {
    /// Creates a connection key.
    pub fn new(name: impl Into<String>, read_only: bool) -> Self {
        Self {
            name: name.into(),
            read_only,
        }
    }
}

impl fmt::Display for ConnectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.read_only {
            write!(f, "{} (read-only)", self.name)
        } else {
            f.write_str(&self.name)
        }
    }
}

/// A caller-facing snapshot of one open connection.
///
/// Carries no resource ownership: the engine session stays exclusively
/// inside the registry, and the snapshot only exposes its opaque id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionInfo {
    /// The connection key.
    pub key: ConnectionKey,
    /// Schema version of the database behind this connection.
    pub version: u32,
    /// Whether the database is encrypted.
    pub encrypted: bool,
    /// Access mode the connection was opened with.
    pub mode: EncryptionMode,
    /// Opaque id of the engine session owned by the registry entry.
    pub session: SessionId,
}

/// A caller-facing snapshot of one open path-keyed connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathConnectionInfo {
    /// Absolute filesystem path of the database file.
    pub path: String,
    /// Schema version of the database behind this connection.
    pub version: u32,
    /// Opaque id of the engine session owned by the registry entry.
    pub session: SessionId,
}

/// The uniform `{ result, message }` wire shape for collaborators that
/// cannot consume Rust errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    /// Whether the operation succeeded.
    pub result: bool,
    /// Failure description, absent on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Outcome {
    /// A successful outcome.
    #[must_use]
    pub const fn success() -> Self {
        Self {
            result: true,
            message: None,
        }
    }

    /// A failed outcome with a description.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            result: false,
            message: Some(message.into()),
        }
    }
}

impl<E: fmt::Display> From<Result<(), E>> for Outcome {
    fn from(result: Result<(), E>) -> Self {
        match result {
            Ok(()) => Self::success(),
            Err(e) => Self::failure(e.to_string()),
        }
    }
}

/// Verdict of a consistency check between the registry and the engine.
///
/// Always a success value: a mismatch is reported, not raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsistencyReport {
    /// `true` when the registry and the engine agreed; `false` when the
    /// registry was reset because they did not.
    pub result: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_display_marks_read_only() {
        assert_eq!(ConnectionKey::new("db", false).to_string(), "db");
        assert_eq!(ConnectionKey::new("db", true).to_string(), "db (read-only)");
    }

    #[test]
    fn keys_differ_by_access_mode() {
        assert_ne!(
            ConnectionKey::new("db", false),
            ConnectionKey::new("db", true)
        );
    }

    #[test]
    fn outcome_success_omits_message_on_the_wire() {
        let json = serde_json::to_string(&Outcome::success()).unwrap();
        assert_eq!(json, "{\"result\":true}");
    }

    #[test]
    fn outcome_failure_carries_message() {
        let json = serde_json::to_string(&Outcome::failure("boom")).unwrap();
        assert_eq!(json, "{\"result\":false,\"message\":\"boom\"}");
    }

    #[test]
    fn outcome_from_result() {
        let ok: Outcome = Result::<(), String>::Ok(()).into();
        assert!(ok.result);

        let err: Outcome = Result::<(), String>::Err("nope".into()).into();
        assert!(!err.result);
        assert_eq!(err.message.as_deref(), Some("nope"));
    }
}
