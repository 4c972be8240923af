//! Gmail OAuth2 authorization
//!
//! Implements the authorization code flow with PKCE, refresh-token exchange
//! and a validity probe against the profile endpoint. The session is
//! long-lived: whenever the stored credential becomes unusable it falls back
//! to the interactive flow.

use chrono::Utc;
use log::{debug, info, warn};
use std::sync::{Arc, Mutex};
use url::Url;

use super::api::TokenResponse;
use super::consent::ConsentPrompt;
use super::pkce::AuthorizationRequest;
use super::transport::Transport;
use crate::cancel::CancelToken;
use crate::config::ClientConfig;
use crate::error::{MailError, Result};
use crate::models::Credential;
use crate::storage::TokenStore;

/// Produces a currently valid bearer token for outbound API calls
pub struct AuthSession {
    config: ClientConfig,
    store: TokenStore,
    transport: Arc<dyn Transport>,
    consent: Box<dyn ConsentPrompt>,
    /// Serializes `authorize` so only one flow runs at a time
    flow: Mutex<()>,
}

impl AuthSession {
    pub fn new(
        config: ClientConfig,
        store: TokenStore,
        transport: Arc<dyn Transport>,
        consent: Box<dyn ConsentPrompt>,
    ) -> Self {
        Self {
            config,
            store,
            transport,
            consent,
            flow: Mutex::new(()),
        }
    }

    /// Ensure a usable credential is stored
    ///
    /// A non-expired token is confirmed with a single probe request. An
    /// expired token is refreshed when a refresh token exists. Anything else
    /// runs the interactive consent flow.
    pub fn authorize(&self) -> Result<()> {
        self.authorize_cancellable(&CancelToken::new())
    }

    /// [`authorize`](Self::authorize) on behalf of work that may be abandoned
    ///
    /// `cancel` is checked once the flow lock is held and again before consent
    /// is requested; a cancelled caller returns `MailError::Cancelled` without
    /// touching the network or prompting the user.
    pub fn authorize_cancellable(&self, cancel: &CancelToken) -> Result<()> {
        let _flow = self.flow.lock().unwrap_or_else(|e| e.into_inner());
        cancel.check()?;

        if let Some(credential) = self.store.get() {
            if !credential.is_expired() {
                if self.probe(&credential.access_token)? {
                    debug!("Stored access token is valid");
                    return Ok(());
                }
                info!("Stored access token was rejected, re-authorizing");
            } else if let Some(refresh_token) = credential.refresh_token.as_deref() {
                match self.refresh(refresh_token) {
                    Ok(refreshed) => {
                        let access_token = refreshed.access_token.clone();
                        self.store.set(refreshed)?;
                        if self.probe(&access_token)? {
                            info!("Access token refreshed");
                            return Ok(());
                        }
                        info!("Refreshed access token was rejected, re-authorizing");
                    }
                    Err(e) => warn!("Token refresh failed: {}", e),
                }
            } else {
                debug!("Access token expired and no refresh token is stored");
            }
        }

        cancel.check()?;
        self.authorize_interactively()
    }

    /// Current access token
    ///
    /// Never refreshes; call [`authorize`](Self::authorize) first.
    pub fn access_token(&self) -> Result<String> {
        self.store
            .get()
            .map(|c| c.access_token)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| MailError::Auth("Not authorized".to_string()))
    }

    /// Whether a non-expired credential is stored (no network)
    pub fn is_authorized(&self) -> bool {
        self.store.get().is_some_and(|c| !c.is_expired())
    }

    /// Forget the stored credential
    pub fn sign_out(&self) -> Result<()> {
        self.store.clear()
    }

    fn authorize_interactively(&self) -> Result<()> {
        let session = self.consent.begin()?;
        let request = AuthorizationRequest::new(&self.config, session.redirect_uri())?;
        let code = session.complete(&request)?;

        let credential = self.exchange_code(&request, &code)?;
        self.store.set(credential)?;
        info!("Authorization successful");
        Ok(())
    }

    /// Exchange an authorization code for a token pair
    fn exchange_code(&self, request: &AuthorizationRequest, code: &str) -> Result<Credential> {
        let mut form = vec![
            ("client_id", self.config.client_id.as_str()),
            ("code", code),
            ("code_verifier", request.code_verifier.as_str()),
            ("grant_type", "authorization_code"),
            ("redirect_uri", request.redirect_uri.as_str()),
        ];
        if let Some(secret) = self.config.client_secret.as_deref() {
            form.push(("client_secret", secret));
        }

        let token = self.token_request(&form)?;
        Ok(Credential::issued_at(
            Utc::now(),
            token.access_token,
            token.refresh_token,
            token.expires_in,
        ))
    }

    /// Refresh the access token, keeping `refresh_token` if the provider
    /// does not issue a new one
    fn refresh(&self, refresh_token: &str) -> Result<Credential> {
        let mut form = vec![
            ("client_id", self.config.client_id.as_str()),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ];
        if let Some(secret) = self.config.client_secret.as_deref() {
            form.push(("client_secret", secret));
        }

        let token = self.token_request(&form)?;
        Ok(Credential::issued_at(
            Utc::now(),
            token.access_token,
            token.refresh_token.or_else(|| Some(refresh_token.to_string())),
            token.expires_in,
        ))
    }

    fn token_request(&self, form: &[(&str, &str)]) -> Result<TokenResponse> {
        let url = Url::parse(&self.config.token_url)
            .map_err(|e| MailError::Auth(format!("Invalid token endpoint: {}", e)))?;
        let response = self.transport.post_form(&url, form)?;

        if !response.is_success() {
            warn!(
                "Token endpoint returned HTTP {}: {}",
                response.status, response.body
            );
            return Err(MailError::Auth(format!(
                "Token exchange rejected (HTTP {})",
                response.status
            )));
        }
        response.json()
    }

    /// `true` when the profile endpoint accepts the token
    fn probe(&self, access_token: &str) -> Result<bool> {
        let url = Url::parse(&format!(
            "{}/users/me/profile",
            self.config.api_base_url.trim_end_matches('/')
        ))
        .map_err(|e| MailError::Auth(format!("Invalid API endpoint: {}", e)))?;
        let response = self.transport.get(&url, access_token)?;
        Ok(response.status == 200)
    }
}
