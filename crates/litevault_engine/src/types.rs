//! Shared vocabulary for the engine boundary.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Access mode requested when opening a database.
///
/// The spellings on the wire are the ones callers pass in configuration:
/// `no-encryption`, `encryption`, `secret`, `newsecret`, `wrongsecret`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EncryptionMode {
    /// Plain database, no encryption.
    #[serde(rename = "no-encryption")]
    NoEncryption,
    /// Encrypt an existing plain database on open.
    #[serde(rename = "encryption")]
    Encryption,
    /// Open an encrypted database with the stored secret.
    #[serde(rename = "secret")]
    Secret,
    /// Open an encrypted database while rotating to a new secret.
    #[serde(rename = "newsecret")]
    NewSecret,
    /// Deliberately open with a non-matching secret; always refused.
    #[serde(rename = "wrongsecret")]
    WrongSecret,
}

impl EncryptionMode {
    /// Returns the wire spelling of this mode.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NoEncryption => "no-encryption",
            Self::Encryption => "encryption",
            Self::Secret => "secret",
            Self::NewSecret => "newsecret",
            Self::WrongSecret => "wrongsecret",
        }
    }

    /// Whether this mode operates on an encrypted database.
    #[must_use]
    pub const fn is_encrypted(self) -> bool {
        !matches!(self, Self::NoEncryption)
    }
}

impl Default for EncryptionMode {
    fn default() -> Self {
        Self::NoEncryption
    }
}

impl fmt::Display for EncryptionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EncryptionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "no-encryption" => Ok(Self::NoEncryption),
            "encryption" => Ok(Self::Encryption),
            "secret" => Ok(Self::Secret),
            "newsecret" => Ok(Self::NewSecret),
            "wrongsecret" => Ok(Self::WrongSecret),
            other => Err(format!("unknown encryption mode: '{other}'")),
        }
    }
}

/// A typed SQL value bound into a seed statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SqlValue {
    /// SQL NULL.
    Null,
    /// 64-bit integer.
    Integer(i64),
    /// Double-precision float.
    Real(f64),
    /// UTF-8 text.
    Text(String),
    /// Raw bytes.
    Blob(Vec<u8>),
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<f64> for SqlValue {
    fn from(v: f64) -> Self {
        Self::Real(v)
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

/// A parameterized statement run after the schema statements of an upgrade
/// step, used to seed or transform data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeedStatement {
    /// The SQL text with positional placeholders.
    pub statement: String,
    /// Values bound to the placeholders, in order.
    #[serde(default)]
    pub values: Vec<SqlValue>,
}

impl SeedStatement {
    /// Creates a seed statement.
    pub fn new(statement: impl Into<String>, values: Vec<SqlValue>) -> Self {
        Self {
            statement: statement.into(),
            values,
        }
    }
}

/// Opaque identifier of an engine session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Mints a fresh session id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session:{}", self.0)
    }
}

/// One open engine session.
///
/// Minted by [`crate::DatabaseEngine::open`] and owned exclusively by the
/// registry entry it was opened for. Deliberately not `Clone`: a session must
/// never be reachable from two places at once.
#[derive(Debug)]
pub struct Session {
    id: SessionId,
    stored_version: u32,
}

impl Session {
    /// Creates a session. Engines call this; the registry never does.
    #[must_use]
    pub fn new(id: SessionId, stored_version: u32) -> Self {
        Self { id, stored_version }
    }

    /// The opaque session id.
    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// The schema version the engine reported at open time.
    #[must_use]
    pub fn stored_version(&self) -> u32 {
        self.stored_version
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_wire_spellings_round_trip() {
        for mode in [
            EncryptionMode::NoEncryption,
            EncryptionMode::Encryption,
            EncryptionMode::Secret,
            EncryptionMode::NewSecret,
            EncryptionMode::WrongSecret,
        ] {
            assert_eq!(mode.as_str().parse::<EncryptionMode>().unwrap(), mode);
        }
    }

    #[test]
    fn mode_serde_uses_wire_spelling() {
        let json = serde_json::to_string(&EncryptionMode::NoEncryption).unwrap();
        assert_eq!(json, "\"no-encryption\"");
        let back: EncryptionMode = serde_json::from_str("\"newsecret\"").unwrap();
        assert_eq!(back, EncryptionMode::NewSecret);
    }

    #[test]
    fn unknown_mode_rejected() {
        assert!("aes-everywhere".parse::<EncryptionMode>().is_err());
    }

    #[test]
    fn session_ids_are_unique() {
        assert_ne!(SessionId::new(), SessionId::new());
    }

    #[test]
    fn seed_statement_values_from_primitives() {
        let seed = SeedStatement::new(
            "INSERT INTO users (id, name) VALUES (?, ?)",
            vec![1i64.into(), "alice".into()],
        );
        assert_eq!(seed.values.len(), 2);
        assert_eq!(seed.values[0], SqlValue::Integer(1));
    }
}
