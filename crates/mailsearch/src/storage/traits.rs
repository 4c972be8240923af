//! Credential storage trait

use crate::models::Credential;
use anyhow::Result;

/// Secure storage collaborator for the current credential
///
/// Backends only need to persist one opaque record. Implementations must make
/// `save` replace the whole record.
pub trait CredentialStorage: Send + Sync {
    /// Load the stored credential, if any
    fn load(&self) -> Result<Option<Credential>>;

    /// Replace the stored credential
    fn save(&self, credential: &Credential) -> Result<()>;

    /// Remove the stored credential
    fn clear(&self) -> Result<()>;
}
