//! Gmail API integration
//!
//! This module provides:
//! - OAuth2 PKCE authorization with refresh and validation
//! - Gmail API client for searching and fetching messages
//! - Response normalization to message summaries

mod auth;
mod client;
mod consent;
mod normalize;
mod pkce;
mod transport;

pub use auth::AuthSession;
pub use client::{MailApi, MailApiClient};
pub use consent::{ConsentPrompt, ConsentSession, LoopbackConsent};
pub use normalize::summarize_message;
pub use pkce::{AuthorizationRequest, PkceChallenge};
pub use transport::{HttpResponse, Transport, UreqTransport};

#[cfg(test)]
pub(crate) use transport::scripted;

/// Gmail API and OAuth wire types
pub mod api {
    use serde::Deserialize;

    /// Response from listing (searching) messages
    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ListMessagesResponse {
        pub messages: Option<Vec<MessageRef>>,
    }

    /// Reference to a message (just ID and thread ID)
    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct MessageRef {
        pub id: String,
        pub thread_id: String,
    }

    /// Full message from the Gmail API
    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct GmailMessage {
        pub id: String,
        #[serde(default)]
        pub thread_id: Option<String>,
        #[serde(default)]
        pub label_ids: Option<Vec<String>>,
        #[serde(default)]
        pub snippet: Option<String>,
        #[serde(default)]
        pub payload: Option<MessagePart>,
    }

    /// A MIME part; the message payload is the root part
    #[derive(Debug, Default, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct MessagePart {
        pub mime_type: Option<String>,
        pub filename: Option<String>,
        pub headers: Option<Vec<Header>>,
        pub body: Option<MessageBody>,
        pub parts: Option<Vec<MessagePart>>,
    }

    /// Email header (name-value pair)
    #[derive(Debug, Deserialize)]
    pub struct Header {
        pub name: String,
        pub value: String,
    }

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct MessageBody {
        pub size: Option<u64>,
    }

    /// Error envelope returned with non-success statuses
    #[derive(Debug, Deserialize)]
    pub struct ErrorResponse {
        pub error: ErrorBody,
    }

    #[derive(Debug, Deserialize)]
    pub struct ErrorBody {
        pub message: String,
    }

    /// Token endpoint response
    #[derive(Debug, Deserialize)]
    pub struct TokenResponse {
        pub access_token: String,
        pub refresh_token: Option<String>,
        pub expires_in: Option<i64>,
    }
}
