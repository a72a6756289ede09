//! Encryption-secret lifecycle.
//!
//! The secret is a single passphrase guarding every encrypted database,
//! managed independently of any connection. Storage and verification live
//! behind the engine; this component owns the set-once policy and argument
//! validation. It is an explicit capability handed the engine at
//! construction, not process-global state.

use crate::error::{CoreError, CoreResult};
use litevault_engine::DatabaseEngine;
use std::sync::Arc;
use tracing::debug;

/// Administers the single encryption-secret lifecycle.
///
/// Transitions: unset → stored (set), stored → stored-new (change, requires
/// the old value), stored → unset (clear). Setting while already stored is
/// a conflict; the stored state is never left implicitly.
pub struct SecretManager {
    engine: Arc<dyn DatabaseEngine>,
}

impl SecretManager {
    /// Creates a secret manager over the given engine.
    pub fn new(engine: Arc<dyn DatabaseEngine>) -> Self {
        Self { engine }
    }

    /// Whether a secret is currently stored.
    pub fn is_secret_stored(&self) -> CoreResult<bool> {
        Ok(self.engine.is_secret_stored()?)
    }

    /// Stores the secret. Runs at most once per deployment.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for an empty passphrase and `Conflict` if a
    /// secret is already stored - rotation must go through
    /// [`Self::change_secret`].
    pub fn set_secret(&self, passphrase: &str) -> CoreResult<()> {
        if passphrase.is_empty() {
            return Err(CoreError::invalid_argument("must provide a passphrase"));
        }
        if self.engine.is_secret_stored()? {
            return Err(CoreError::conflict(
                "an encryption secret is already stored; use change_secret to rotate it",
            ));
        }
        self.engine.set_secret(passphrase)?;
        debug!("encryption secret stored");
        Ok(())
    }

    /// Replaces the stored secret. The engine verifies the old passphrase.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if either passphrase is empty; engine
    /// verification failures propagate as engine errors.
    pub fn change_secret(&self, passphrase: &str, old_passphrase: &str) -> CoreResult<()> {
        if passphrase.is_empty() || old_passphrase.is_empty() {
            return Err(CoreError::invalid_argument(
                "must provide both the new and the old passphrase",
            ));
        }
        self.engine.change_secret(passphrase, old_passphrase)?;
        debug!("encryption secret rotated");
        Ok(())
    }

    /// Removes the stored secret.
    ///
    /// Clearing a secret that protects an open encrypted connection is the
    /// caller's responsibility; no connection bookkeeping happens here.
    pub fn clear_secret(&self) -> CoreResult<()> {
        self.engine.clear_secret()?;
        debug!("encryption secret cleared");
        Ok(())
    }
}

impl std::fmt::Debug for SecretManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretManager").finish_non_exhaustive()
    }
}
