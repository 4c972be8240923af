//! PKCE (RFC 7636) verifier/challenge pairs and the authorization request
//! built from them

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngCore;
use sha2::{Digest, Sha256};
use url::Url;

use crate::config::ClientConfig;
use crate::error::{MailError, Result};

/// PKCE code verifier and its S256 challenge
#[derive(Debug, Clone)]
pub struct PkceChallenge {
    pub verifier: String,
    pub challenge: String,
}

impl PkceChallenge {
    pub const METHOD: &'static str = "S256";

    /// Generate a fresh 43-character verifier and its challenge
    pub fn generate() -> Self {
        let verifier = random_token(32);
        let challenge = Self::compute_challenge(&verifier);
        Self {
            verifier,
            challenge,
        }
    }

    fn compute_challenge(verifier: &str) -> String {
        let hash = Sha256::digest(verifier.as_bytes());
        URL_SAFE_NO_PAD.encode(hash)
    }
}

/// URL-safe random string from `len` random bytes
fn random_token(len: usize) -> String {
    let mut bytes = vec![0u8; len];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// One interactive authorization attempt
///
/// Carries everything the code exchange needs afterwards: the verifier and
/// the exact redirect URI sent to the provider.
#[derive(Debug, Clone)]
pub struct AuthorizationRequest {
    pub url: Url,
    pub redirect_uri: String,
    pub code_verifier: String,
    /// Opaque value the provider echoes back on the redirect
    pub state: String,
}

impl AuthorizationRequest {
    pub fn new(config: &ClientConfig, redirect_uri: &str) -> Result<Self> {
        let pkce = PkceChallenge::generate();
        let state = random_token(16);

        let url = Url::parse_with_params(
            &config.auth_url,
            &[
                ("client_id", config.client_id.as_str()),
                ("redirect_uri", redirect_uri),
                ("response_type", "code"),
                ("scope", config.scope.as_str()),
                ("code_challenge", pkce.challenge.as_str()),
                ("code_challenge_method", PkceChallenge::METHOD),
                ("state", state.as_str()),
                ("access_type", "offline"),
                ("prompt", "consent"),
            ],
        )
        .map_err(|e| MailError::Auth(format!("Invalid authorization endpoint: {}", e)))?;

        Ok(Self {
            url,
            redirect_uri: redirect_uri.to_string(),
            code_verifier: pkce.verifier,
            state,
        })
    }
}
