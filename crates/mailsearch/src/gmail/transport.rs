//! HTTP transport
//!
//! The auth and API layers talk to the network through [`Transport`] so they
//! can be driven by a scripted transport in tests. The default implementation
//! uses synchronous HTTP (ureq) to stay executor-agnostic.

use serde::de::DeserializeOwned;
use url::Url;

use crate::error::{MailError, Result};

/// Status and body of a completed HTTP exchange
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Decode the body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_str(&self.body)
            .map_err(|e| MailError::InvalidResponse(format!("{} (HTTP {})", e, self.status)))
    }
}

/// Blocking HTTP client used for every outbound call
///
/// Non-success statuses are returned as responses, not errors; only failures
/// to complete the exchange are `Err`.
pub trait Transport: Send + Sync {
    /// GET with a bearer token
    fn get(&self, url: &Url, bearer: &str) -> Result<HttpResponse>;

    /// POST an `application/x-www-form-urlencoded` body
    fn post_form(&self, url: &Url, form: &[(&str, &str)]) -> Result<HttpResponse>;
}

/// ureq-backed transport
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new() -> Self {
        let config = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build();
        Self {
            agent: ureq::Agent::new_with_config(config),
        }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for UreqTransport {
    fn get(&self, url: &Url, bearer: &str) -> Result<HttpResponse> {
        let mut response = self
            .agent
            .get(url.as_str())
            .header("Authorization", &format!("Bearer {}", bearer))
            .header("Accept", "application/json")
            .call()
            .map_err(|e| MailError::Network(format!("GET {}: {}", url.path(), e)))?;

        let status = response.status().as_u16();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| MailError::Network(format!("Failed to read response body: {}", e)))?;
        Ok(HttpResponse { status, body })
    }

    fn post_form(&self, url: &Url, form: &[(&str, &str)]) -> Result<HttpResponse> {
        let mut response = self
            .agent
            .post(url.as_str())
            .header("Accept", "application/json")
            .send_form(form.iter().copied())
            .map_err(|e| MailError::Network(format!("POST {}: {}", url.path(), e)))?;

        let status = response.status().as_u16();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| MailError::Network(format!("Failed to read response body: {}", e)))?;
        Ok(HttpResponse { status, body })
    }
}
