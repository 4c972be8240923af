//! In-memory credential storage
//!
//! Used by tests and by hosts that manage persistence themselves.

use anyhow::Result;
use std::sync::{PoisonError, RwLock};

use super::CredentialStorage;
use crate::models::Credential;

#[derive(Default)]
pub struct MemoryCredentialStorage {
    credential: RwLock<Option<Credential>>,
}

impl MemoryCredentialStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with a credential already stored
    pub fn with_credential(credential: Credential) -> Self {
        Self {
            credential: RwLock::new(Some(credential)),
        }
    }
}

impl CredentialStorage for MemoryCredentialStorage {
    fn load(&self) -> Result<Option<Credential>> {
        Ok(self.credential.read().unwrap_or_else(PoisonError::into_inner).clone())
    }

    fn save(&self, credential: &Credential) -> Result<()> {
        *self.credential.write().unwrap_or_else(PoisonError::into_inner) = Some(credential.clone());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.credential.write().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}
