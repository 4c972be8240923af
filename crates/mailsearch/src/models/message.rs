//! Message models: search hits and the summaries hydrated from them

use super::EmailAddress;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Unique identifier for a message (Gmail message ID)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

impl MessageId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for MessageId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for MessageId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Conversation a message belongs to
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ThreadId(pub String);

impl ThreadId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A lightweight search result, pending hydration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub id: MessageId,
    pub thread_id: ThreadId,
}

/// A file attached to a message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub filename: String,
    pub mime_type: String,
    /// Size in bytes as reported by the API
    pub size: u64,
}

/// Display metadata for one search result
///
/// Starts life as a placeholder (only `id` known, `is_loaded == false`) and is
/// replaced by a hydrated summary once its detail fetch resolves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageSummary {
    pub id: MessageId,
    pub is_loaded: bool,
    pub snippet: Option<String>,
    /// Parsed `Date` header; `None` when missing or unparseable
    pub received_date: Option<DateTime<Utc>>,
    pub subject: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub labels: Option<BTreeSet<String>>,
    pub attachments: Option<Vec<Attachment>>,
}

impl MessageSummary {
    /// Create an unloaded entry for a search hit
    pub fn placeholder(id: MessageId) -> Self {
        Self {
            id,
            is_loaded: false,
            snippet: None,
            received_date: None,
            subject: None,
            from: None,
            to: None,
            labels: None,
            attachments: None,
        }
    }

    /// Short sender name for list display
    pub fn sender_name(&self) -> Option<String> {
        let from = EmailAddress::parse(self.from.as_deref()?);
        Some(from.name.unwrap_or(from.email))
    }

    pub fn has_label(&self, label: &str) -> bool {
        self.labels.as_ref().is_some_and(|l| l.contains(label))
    }

    pub fn attachment_count(&self) -> usize {
        self.attachments.as_ref().map_or(0, Vec::len)
    }

    /// Link to the message in the Gmail web client
    pub fn web_url(&self) -> String {
        format!("https://mail.google.com/mail/u/0/#all/{}", self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_is_unloaded() {
        let summary = MessageSummary::placeholder(MessageId::new("a"));
        assert!(!summary.is_loaded);
        assert_eq!(summary.id.as_str(), "a");
        assert_eq!(summary.attachment_count(), 0);
        assert_eq!(summary.sender_name(), None);
    }

    #[test]
    fn test_sender_name_prefers_display_name() {
        let mut summary = MessageSummary::placeholder(MessageId::new("a"));
        summary.from = Some("\"Ada Lovelace\" <ada@example.com>".to_string());
        assert_eq!(summary.sender_name(), Some("Ada Lovelace".to_string()));

        summary.from = Some("ada@example.com".to_string());
        assert_eq!(summary.sender_name(), Some("ada@example.com".to_string()));
    }

    #[test]
    fn test_has_label() {
        let mut summary = MessageSummary::placeholder(MessageId::new("a"));
        assert!(!summary.has_label("INBOX"));
        summary.labels = Some(["INBOX".to_string()].into_iter().collect());
        assert!(summary.has_label("INBOX"));
        assert!(!summary.has_label("SENT"));
    }

    #[test]
    fn test_web_url() {
        let summary = MessageSummary::placeholder(MessageId::new("18c2f"));
        assert_eq!(summary.web_url(), "https://mail.google.com/mail/u/0/#all/18c2f");
    }
}
