//! Domain models for credentials, search hits and message summaries

mod address;
mod credential;
mod message;

pub use address::EmailAddress;
pub use credential::Credential;
pub use message::{Attachment, MessageId, MessageSummary, SearchHit, ThreadId};
