//! Interactive user consent for the authorization code flow
//!
//! [`LoopbackConsent`] receives the OAuth redirect on a local HTTP listener
//! and opens the system browser at the authorization URL.

use log::{debug, info, warn};
use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use url::Url;

use super::pkce::AuthorizationRequest;
use crate::error::{MailError, Result};

/// Starts consent attempts
pub trait ConsentPrompt: Send + Sync {
    /// Prepare a redirect target for one authorization attempt
    fn begin(&self) -> Result<Box<dyn ConsentSession>>;
}

/// One pending consent attempt
pub trait ConsentSession: Send {
    /// Redirect URI the provider must send the user back to
    fn redirect_uri(&self) -> &str;

    /// Present `request` to the user and return the authorization code.
    ///
    /// Fails with `MailError::Auth` if the user denies or abandons consent.
    fn complete(self: Box<Self>, request: &AuthorizationRequest) -> Result<String>;
}

/// Consent through the system browser and a loopback redirect
pub struct LoopbackConsent {
    open_browser: bool,
}

impl LoopbackConsent {
    /// Port range to try for the local callback server
    const PORT_RANGE_START: u16 = 8080;
    const PORT_RANGE_END: u16 = 8090;

    /// Unrelated requests (favicon probes etc.) tolerated before giving up
    const MAX_STRAY_REQUESTS: usize = 5;

    pub fn new() -> Self {
        Self { open_browser: true }
    }

    /// Only print the URL instead of launching a browser
    pub fn without_browser() -> Self {
        Self {
            open_browser: false,
        }
    }
}

impl Default for LoopbackConsent {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsentPrompt for LoopbackConsent {
    fn begin(&self) -> Result<Box<dyn ConsentSession>> {
        for port in Self::PORT_RANGE_START..=Self::PORT_RANGE_END {
            if let Ok(listener) = TcpListener::bind(("127.0.0.1", port)) {
                debug!("OAuth callback listener bound on port {}", port);
                return Ok(Box::new(LoopbackSession {
                    listener,
                    redirect_uri: format!("http://127.0.0.1:{}", port),
                    open_browser: self.open_browser,
                }));
            }
        }
        Err(MailError::Auth(format!(
            "Could not bind to any port in range {}-{}",
            Self::PORT_RANGE_START,
            Self::PORT_RANGE_END
        )))
    }
}

struct LoopbackSession {
    listener: TcpListener,
    redirect_uri: String,
    open_browser: bool,
}

impl ConsentSession for LoopbackSession {
    fn redirect_uri(&self) -> &str {
        &self.redirect_uri
    }

    fn complete(self: Box<Self>, request: &AuthorizationRequest) -> Result<String> {
        info!("Authorization required, visit: {}", request.url);
        if self.open_browser
            && let Err(e) = open::that(request.url.as_str())
        {
            warn!("Failed to open browser: {}. Please open the URL manually.", e);
        }

        for _ in 0..=LoopbackConsent::MAX_STRAY_REQUESTS {
            let (mut stream, _) = self
                .listener
                .accept()
                .map_err(|e| MailError::Auth(format!("Failed to accept callback: {}", e)))?;

            let Some(callback) = read_callback(&stream) else {
                respond(&mut stream, "404 Not Found", "Not found");
                continue;
            };

            return match callback.into_code(&request.state) {
                Ok(code) => {
                    respond(
                        &mut stream,
                        "200 OK",
                        "Authentication successful! You can close this window.",
                    );
                    Ok(code)
                }
                Err(e) => {
                    respond(
                        &mut stream,
                        "400 Bad Request",
                        "Authentication failed. Please try again.",
                    );
                    Err(e)
                }
            };
        }

        Err(MailError::Auth("No authorization callback received".to_string()))
    }
}

/// Query parameters of the OAuth redirect
#[derive(Debug, Default, PartialEq, Eq)]
struct Callback {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
}

impl Callback {
    /// Parse a request target like `/?code=...&state=...`.
    /// Returns `None` for requests that are not an OAuth redirect.
    fn from_target(target: &str) -> Option<Self> {
        let url = Url::parse(&format!("http://127.0.0.1{}", target)).ok()?;
        let mut callback = Callback::default();
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "code" => callback.code = Some(value.into_owned()),
                "state" => callback.state = Some(value.into_owned()),
                "error" => callback.error = Some(value.into_owned()),
                _ => {}
            }
        }
        (callback.code.is_some() || callback.error.is_some()).then_some(callback)
    }

    fn into_code(self, expected_state: &str) -> Result<String> {
        if let Some(error) = self.error {
            return Err(MailError::Auth(format!("Consent not granted: {}", error)));
        }
        if self.state.as_deref() != Some(expected_state) {
            return Err(MailError::Auth("OAuth state mismatch".to_string()));
        }
        self.code
            .filter(|c| !c.is_empty())
            .ok_or_else(|| MailError::Auth("No authorization code received".to_string()))
    }
}

/// Read the request line and parse its target
fn read_callback(stream: &TcpStream) -> Option<Callback> {
    let mut reader = BufReader::new(stream);
    let mut request_line = String::new();
    reader.read_line(&mut request_line).ok()?;

    // Drain headers up to the blank line
    let mut header = String::new();
    while matches!(reader.read_line(&mut header), Ok(n) if n > 0) && !header.trim().is_empty() {
        header.clear();
    }

    // Format: GET /?code=AUTH_CODE&state=... HTTP/1.1
    let target = request_line.split_whitespace().nth(1)?;
    Callback::from_target(target)
}

fn respond(stream: &mut TcpStream, status: &str, body: &str) {
    let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: text/html\r\nConnection: close\r\n\r\n<html><body><h1>{}</h1></body></html>",
        status, body
    );
    stream.write_all(response.as_bytes()).ok();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ClientConfig, GmailCredentials};
    use std::io::Read;

    #[test]
    fn test_parse_code_callback() {
        let callback = Callback::from_target("/?state=xyz&code=4%2F0Abc&scope=mail").unwrap();
        assert_eq!(callback.code.as_deref(), Some("4/0Abc"));
        assert_eq!(callback.into_code("xyz").unwrap(), "4/0Abc");
    }

    #[test]
    fn test_denied_consent_is_auth_error() {
        let callback = Callback::from_target("/?error=access_denied&state=xyz").unwrap();
        let err = callback.into_code("xyz").unwrap_err();
        assert!(matches!(err, MailError::Auth(ref m) if m.contains("access_denied")));
    }

    #[test]
    fn test_state_mismatch_rejected() {
        let callback = Callback::from_target("/?code=abc&state=other").unwrap();
        assert!(callback.into_code("xyz").is_err());
    }

    #[test]
    fn test_stray_requests_ignored() {
        assert!(Callback::from_target("/favicon.ico").is_none());
        assert!(Callback::from_target("/?foo=bar").is_none());
    }

    #[test]
    fn test_loopback_roundtrip() {
        let consent = LoopbackConsent::without_browser();
        let session = consent.begin().unwrap();
        let redirect = session.redirect_uri().to_string();

        let config = ClientConfig::gmail(GmailCredentials {
            client_id: "id".into(),
            client_secret: None,
        });
        let request = AuthorizationRequest::new(&config, &redirect).unwrap();
        let state = request.state.clone();

        let browser = std::thread::spawn(move || {
            let addr = redirect.trim_start_matches("http://");
            let mut favicon = TcpStream::connect(addr).unwrap();
            favicon
                .write_all(b"GET /favicon.ico HTTP/1.1\r\n\r\n")
                .unwrap();
            let mut ignored = String::new();
            favicon.read_to_string(&mut ignored).unwrap();

            let mut stream = TcpStream::connect(addr).unwrap();
            let line = format!("GET /?code=the-code&state={} HTTP/1.1\r\n\r\n", state);
            stream.write_all(line.as_bytes()).unwrap();
            let mut reply = String::new();
            stream.read_to_string(&mut reply).unwrap();
            reply
        });

        let code = session.complete(&request).unwrap();
        assert_eq!(code, "the-code");
        assert!(browser.join().unwrap().starts_with("HTTP/1.1 200 OK"));
    }
}
