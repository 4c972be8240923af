//! Token store: the current credential for one provider identity

use std::sync::{PoisonError, RwLock};

use super::CredentialStorage;
use crate::error::{MailError, Result};
use crate::models::Credential;

/// Holds the current credential and persists it through a storage backend
///
/// The in-memory copy is only updated after the backend accepted the write,
/// so a failed save leaves the previous credential in effect.
pub struct TokenStore {
    backend: Box<dyn CredentialStorage>,
    current: RwLock<Option<Credential>>,
}

impl TokenStore {
    /// Open the store, loading whatever credential the backend holds
    pub fn open(backend: Box<dyn CredentialStorage>) -> Result<Self> {
        let current = backend.load().map_err(MailError::storage)?;
        Ok(Self {
            backend,
            current: RwLock::new(current),
        })
    }

    pub fn get(&self) -> Option<Credential> {
        self.current.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Replace the stored credential
    pub fn set(&self, credential: Credential) -> Result<()> {
        self.backend.save(&credential).map_err(MailError::storage)?;
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Some(credential);
        Ok(())
    }

    pub fn clear(&self) -> Result<()> {
        self.backend.clear().map_err(MailError::storage)?;
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}
