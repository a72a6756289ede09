//! Connection options.

use litevault_engine::EncryptionMode;
use serde::{Deserialize, Serialize};

/// Options for opening a connection.
///
/// The defaults match what callers get when they elide every optional
/// argument: version 1, not encrypted, `no-encryption` mode, writable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionOptions {
    /// Whether the database is encrypted.
    pub encrypted: bool,

    /// Access mode for encrypted databases.
    pub mode: EncryptionMode,

    /// Schema version to open the database at. Staged upgrade statements
    /// apply up to (and never past) this version.
    pub version: u32,

    /// Open the connection read-only.
    pub read_only: bool,
}

impl Default for ConnectionOptions {
    fn default() -> Self {
        Self {
            encrypted: false,
            mode: EncryptionMode::NoEncryption,
            version: 1,
            read_only: false,
        }
    }
}

impl ConnectionOptions {
    /// Creates options with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the encrypted flag.
    #[must_use]
    pub const fn encrypted(mut self, value: bool) -> Self {
        self.encrypted = value;
        self
    }

    /// Sets the access mode.
    #[must_use]
    pub const fn mode(mut self, mode: EncryptionMode) -> Self {
        self.mode = mode;
        self
    }

    /// Sets the schema version.
    #[must_use]
    pub const fn version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    /// Sets the read-only flag.
    #[must_use]
    pub const fn read_only(mut self, value: bool) -> Self {
        self.read_only = value;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options() {
        let options = ConnectionOptions::default();
        assert!(!options.encrypted);
        assert_eq!(options.mode, EncryptionMode::NoEncryption);
        assert_eq!(options.version, 1);
        assert!(!options.read_only);
    }

    #[test]
    fn builder_pattern() {
        let options = ConnectionOptions::new()
            .encrypted(true)
            .mode(EncryptionMode::Secret)
            .version(3)
            .read_only(true);

        assert!(options.encrypted);
        assert_eq!(options.mode, EncryptionMode::Secret);
        assert_eq!(options.version, 3);
        assert!(options.read_only);
    }
}
