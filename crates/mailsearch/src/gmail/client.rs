//! Gmail API HTTP client
//!
//! Search and detail requests for the signed-in mailbox. Bearer tokens come
//! from the [`AuthSession`]; responses are normalized into domain models.

use log::debug;
use std::sync::Arc;
use url::Url;

use super::api::{ErrorResponse, GmailMessage, ListMessagesResponse};
use super::normalize::summarize_message;
use super::transport::{HttpResponse, Transport};
use super::AuthSession;
use crate::cancel::CancelToken;
use crate::config::ClientConfig;
use crate::error::{MailError, Result};
use crate::models::{MessageId, MessageSummary, SearchHit, ThreadId};

/// Operations the search coordinator needs from the mail backend
pub trait MailApi: Send + Sync {
    /// Make sure a valid credential is available, refreshing or prompting as needed
    fn authorize(&self, cancel: &CancelToken) -> Result<()>;

    /// Run a single-page search with the provider's query language
    fn search(&self, query: &str, cancel: &CancelToken) -> Result<Vec<SearchHit>>;

    /// Fetch and summarize one message
    fn get_message(&self, id: &MessageId, cancel: &CancelToken) -> Result<MessageSummary>;
}

/// Gmail REST client for searching and reading message metadata
pub struct MailApiClient {
    auth: Arc<AuthSession>,
    transport: Arc<dyn Transport>,
    base_url: String,
}

impl MailApiClient {
    pub fn new(config: &ClientConfig, auth: Arc<AuthSession>, transport: Arc<dyn Transport>) -> Self {
        Self {
            auth,
            transport,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn auth(&self) -> &AuthSession {
        &self.auth
    }

    /// Search messages matching `query`
    ///
    /// The query is passed through verbatim as Gmail's `q` parameter. A
    /// response without a `messages` field means no results.
    pub fn search_messages(&self, query: &str, cancel: &CancelToken) -> Result<Vec<SearchHit>> {
        let url = Url::parse_with_params(
            &format!("{}/users/me/messages", self.base_url),
            &[("q", query)],
        )
        .map_err(|e| MailError::InvalidResponse(format!("Invalid search URL: {}", e)))?;

        let response = self.authorized_get(&url, cancel)?;
        let list: ListMessagesResponse = response.json()?;

        let hits: Vec<SearchHit> = list
            .messages
            .unwrap_or_default()
            .into_iter()
            .map(|m| SearchHit {
                id: MessageId::new(m.id),
                thread_id: ThreadId::new(m.thread_id),
            })
            .collect();
        debug!("Search {:?} returned {} hits", query, hits.len());
        Ok(hits)
    }

    /// Fetch full message details by ID and summarize them
    pub fn fetch_message(&self, id: &MessageId, cancel: &CancelToken) -> Result<MessageSummary> {
        let url = Url::parse(&format!(
            "{}/users/me/messages/{}",
            self.base_url,
            urlencoding::encode(id.as_str())
        ))
        .map_err(|e| MailError::InvalidResponse(format!("Invalid message URL: {}", e)))?;

        let response = self.authorized_get(&url, cancel)?;
        let message: GmailMessage = response.json()?;
        Ok(summarize_message(message))
    }

    /// GET with the current bearer token, honoring cancellation on both sides
    /// of the network call
    fn authorized_get(&self, url: &Url, cancel: &CancelToken) -> Result<HttpResponse> {
        cancel.check()?;
        let access_token = self.auth.access_token()?;
        let response = self.transport.get(url, &access_token)?;
        cancel.check()?;

        if response.is_success() {
            Ok(response)
        } else {
            Err(api_error(&response))
        }
    }
}

impl MailApi for MailApiClient {
    fn authorize(&self, cancel: &CancelToken) -> Result<()> {
        self.auth.authorize_cancellable(cancel)
    }

    fn search(&self, query: &str, cancel: &CancelToken) -> Result<Vec<SearchHit>> {
        self.search_messages(query, cancel)
    }

    fn get_message(&self, id: &MessageId, cancel: &CancelToken) -> Result<MessageSummary> {
        self.fetch_message(id, cancel)
    }
}

/// Build an API error from a non-success response, preferring the provider's
/// `error.message`
pub(crate) fn api_error(response: &HttpResponse) -> MailError {
    let message = match serde_json::from_str::<ErrorResponse>(&response.body) {
        Ok(envelope) => envelope.error.message,
        Err(_) if !response.body.trim().is_empty() => response.body.trim().to_string(),
        Err(_) => format!("HTTP {}", response.status),
    };
    MailError::Api {
        status: response.status,
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GmailCredentials;
    use crate::gmail::scripted::ScriptedTransport;
    use crate::gmail::{ConsentPrompt, ConsentSession};
    use crate::models::Credential;
    use crate::storage::{MemoryCredentialStorage, TokenStore};
    use chrono::Utc;

    struct NoConsent;

    impl ConsentPrompt for NoConsent {
        fn begin(&self) -> Result<Box<dyn ConsentSession>> {
            Err(MailError::Auth("consent not available in tests".into()))
        }
    }

    fn client_with(transport: Arc<ScriptedTransport>) -> MailApiClient {
        let config = ClientConfig::gmail(GmailCredentials {
            client_id: "id".into(),
            client_secret: None,
        });
        let cred = Credential::issued_at(Utc::now(), "token-1", None, Some(3600));
        let store =
            TokenStore::open(Box::new(MemoryCredentialStorage::with_credential(cred))).unwrap();
        let auth = Arc::new(AuthSession::new(
            config.clone(),
            store,
            transport.clone(),
            Box::new(NoConsent),
        ));
        MailApiClient::new(&config, auth, transport)
    }

    #[test]
    fn test_search_returns_hits_in_order() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.respond(
            "GET /gmail/v1/users/me/messages",
            200,
            r#"{"messages": [{"id": "b", "threadId": "t2"}, {"id": "a", "threadId": "t1"}], "resultSizeEstimate": 2}"#,
        );
        let client = client_with(transport.clone());

        let hits = client
            .search_messages("from:ada has:attachment", &CancelToken::new())
            .unwrap();
        assert_eq!(
            hits.iter().map(|h| h.id.as_str()).collect::<Vec<_>>(),
            vec!["b", "a"]
        );
        assert_eq!(hits[0].thread_id.as_str(), "t2");

        let call = &transport.calls_to("GET /gmail/v1/users/me/messages")[0];
        assert_eq!(call.bearer.as_deref(), Some("token-1"));
        assert_eq!(call.query.as_deref(), Some("q=from%3Aada+has%3Aattachment"));
    }

    #[test]
    fn test_search_without_messages_field_is_empty() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.respond(
            "GET /gmail/v1/users/me/messages",
            200,
            r#"{"resultSizeEstimate": 0}"#,
        );
        let client = client_with(transport);
        let hits = client.search_messages("nothing", &CancelToken::new()).unwrap();
        assert!(hits.is_empty());
    }

    #[test]
    fn test_search_error_uses_provider_message() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.respond(
            "GET /gmail/v1/users/me/messages",
            403,
            r#"{"error": {"code": 403, "message": "insufficient scope"}}"#,
        );
        let client = client_with(transport);
        let err = client.search_messages("x", &CancelToken::new()).unwrap_err();
        assert!(matches!(err, MailError::Api { status: 403, ref message } if message == "insufficient scope"));
    }

    #[test]
    fn test_error_without_json_body() {
        let err = api_error(&HttpResponse::new(502, ""));
        assert_eq!(err.to_string(), "HTTP 502");
        let err = api_error(&HttpResponse::new(500, "upstream exploded"));
        assert_eq!(err.to_string(), "upstream exploded");
    }

    #[test]
    fn test_get_message() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.respond(
            "GET /gmail/v1/users/me/messages/m1",
            200,
            r#"{"id": "m1", "threadId": "t1", "snippet": "hi", "payload": {"headers": [{"name": "Subject", "value": "Hello"}]}}"#,
        );
        let client = client_with(transport);
        let summary = client
            .fetch_message(&MessageId::new("m1"), &CancelToken::new())
            .unwrap();
        assert!(summary.is_loaded);
        assert_eq!(summary.subject.as_deref(), Some("Hello"));
        assert_eq!(summary.received_date, None);
    }

    #[test]
    fn test_get_message_error_status() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.respond(
            "GET /gmail/v1/users/me/messages/gone",
            404,
            r#"{"error": {"code": 404, "message": "Requested entity was not found."}}"#,
        );
        let client = client_with(transport);
        let err = client
            .fetch_message(&MessageId::new("gone"), &CancelToken::new())
            .unwrap_err();
        assert!(matches!(err, MailError::Api { status: 404, .. }));
    }

    #[test]
    fn test_cancelled_before_call_skips_network() {
        let transport = Arc::new(ScriptedTransport::new());
        let client = client_with(transport.clone());
        let cancel = CancelToken::new();
        cancel.cancel();

        let err = client.search_messages("x", &cancel).unwrap_err();
        assert!(err.is_cancelled());
        assert!(transport.calls().is_empty());
    }
}
