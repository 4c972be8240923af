//! Credential storage
//!
//! [`TokenStore`] holds the current credential; the [`CredentialStorage`]
//! trait abstracts over where it is persisted so hosts can plug in a keychain
//! or keep it in memory.

mod file;
mod memory;
mod token_store;
mod traits;

pub use file::FileCredentialStorage;
pub use memory::MemoryCredentialStorage;
pub use token_store::TokenStore;
pub use traits::CredentialStorage;
