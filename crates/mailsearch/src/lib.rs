//! Mailsearch crate - Business logic for searching a Gmail mailbox
//!
//! This crate provides platform-independent search functionality including:
//! - OAuth 2.0 authorization code flow with PKCE and token refresh
//! - Credential persistence behind a storage trait
//! - Gmail API client for search and message details
//! - Search coordination with cancellation and ordered, incremental hydration
//!
//! This crate has zero UI dependencies. Hosts subscribe to
//! [`SearchCoordinator`] and render the published [`SearchState`].

pub mod cancel;
pub mod config;
pub mod error;
pub mod gmail;
pub mod models;
pub mod search;
pub mod storage;

pub use cancel::CancelToken;
pub use config::{ClientConfig, GmailCredentials, SearchSettings};
pub use error::{MailError, Result};
pub use gmail::{
    AuthSession, ConsentPrompt, ConsentSession, HttpResponse, LoopbackConsent, MailApi,
    MailApiClient, Transport, UreqTransport,
};
pub use models::{
    Attachment, Credential, EmailAddress, MessageId, MessageSummary, SearchHit, ThreadId,
};
pub use search::{SearchCoordinator, SearchEvent, SearchState, SearchTask};
pub use storage::{CredentialStorage, FileCredentialStorage, MemoryCredentialStorage, TokenStore};
