//! Error type shared by the auth, API and search layers

/// Errors surfaced by the mail core
#[derive(Debug, thiserror::Error)]
pub enum MailError {
    /// Interactive consent was cancelled/denied, or a token exchange was rejected
    #[error("Authorization failed: {0}")]
    Auth(String),

    /// Non-success HTTP status from the mail API; `message` comes from the
    /// provider's error body
    #[error("{message}")]
    Api { status: u16, message: String },

    /// The operation was superseded or aborted
    #[error("Operation cancelled")]
    Cancelled,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Credential storage error: {0}")]
    Storage(String),
}

impl MailError {
    /// Whether this error only signals that the work was abandoned
    pub fn is_cancelled(&self) -> bool {
        matches!(self, MailError::Cancelled)
    }

    pub(crate) fn storage(err: anyhow::Error) -> Self {
        MailError::Storage(format!("{:#}", err))
    }
}

pub type Result<T, E = MailError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_displays_provider_message() {
        let err = MailError::Api {
            status: 403,
            message: "insufficient scope".to_string(),
        };
        assert_eq!(err.to_string(), "insufficient scope");
        assert!(!err.is_cancelled());
    }

    #[test]
    fn test_cancelled_is_distinguishable() {
        assert!(MailError::Cancelled.is_cancelled());
        assert!(!MailError::Auth("denied".into()).is_cancelled());
    }
}
