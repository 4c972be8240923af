//! Client configuration
//!
//! OAuth client credentials are loaded from (in order of priority):
//! 1. Compile-time embedded credentials (for release builds)
//! 2. JSON file in the Google Cloud Console format
//! 3. Runtime environment variables
//!
//! Everything the auth and API layers need is collected into an immutable
//! [`ClientConfig`] that is passed in at construction.

use anyhow::{Context, Result};
use config::ConfigFile;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// OAuth client identity registered with Google
#[derive(Debug, Clone)]
pub struct GmailCredentials {
    pub client_id: String,
    /// Desktop clients are issued a secret; PKCE-only clients are not
    pub client_secret: Option<String>,
}

/// Google Cloud Console credential file format
#[derive(Deserialize)]
struct GoogleCredentialFile {
    installed: Option<InstalledCredentials>,
    web: Option<InstalledCredentials>,
}

#[derive(Deserialize)]
struct InstalledCredentials {
    client_id: String,
    client_secret: Option<String>,
}

impl GmailCredentials {
    /// Load credentials from the first available source
    pub fn load() -> Result<Self> {
        if let Some(creds) = Self::from_compile_time() {
            return Ok(creds);
        }

        if let Some(path) = Self::default_credentials_path().filter(|p| p.exists()) {
            return Self::from_file(&path);
        }

        Self::from_env()
    }

    /// Credentials embedded at compile time.
    /// Build with: GOOGLE_CLIENT_ID=xxx [GOOGLE_CLIENT_SECRET=yyy] cargo build --release
    pub fn from_compile_time() -> Option<Self> {
        let client_id = option_env!("GOOGLE_CLIENT_ID").filter(|id| !id.is_empty())?;
        let client_secret = option_env!("GOOGLE_CLIENT_SECRET")
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        Some(Self {
            client_id: client_id.to_string(),
            client_secret,
        })
    }

    /// Load credentials from a specific JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        let creds: GoogleCredentialFile = config::load_json_file(path)?;
        Self::from_credential_file(creds)
    }

    /// Parse credentials from JSON (Google Cloud Console format)
    pub fn from_json(json: &str) -> Result<Self> {
        let creds: GoogleCredentialFile =
            serde_json::from_str(json).context("Failed to parse credentials JSON")?;
        Self::from_credential_file(creds)
    }

    fn from_credential_file(creds: GoogleCredentialFile) -> Result<Self> {
        let installed = creds
            .installed
            .or(creds.web)
            .context("Credentials file missing 'installed' or 'web' section")?;

        Ok(Self {
            client_id: installed.client_id,
            client_secret: installed.client_secret.filter(|s| !s.is_empty()),
        })
    }

    /// Load credentials from GMAIL_CLIENT_ID / GMAIL_CLIENT_SECRET
    pub fn from_env() -> Result<Self> {
        let client_id = std::env::var("GMAIL_CLIENT_ID")
            .context("GMAIL_CLIENT_ID environment variable not set")?;
        let client_secret = std::env::var("GMAIL_CLIENT_SECRET")
            .ok()
            .filter(|s| !s.is_empty());

        Ok(Self {
            client_id,
            client_secret,
        })
    }

    /// Default credentials file path (~/.config/lookout/google-credentials.json)
    pub fn default_credentials_path() -> Option<PathBuf> {
        ConfigFile::Credentials.path()
    }
}

/// Immutable endpoint and client identity configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub client_id: String,
    pub client_secret: Option<String>,
    pub auth_url: String,
    pub token_url: String,
    /// Base of the mail REST API, without a trailing slash
    pub api_base_url: String,
    pub scope: String,
}

impl ClientConfig {
    pub const GMAIL_AUTH_URL: &'static str = "https://accounts.google.com/o/oauth2/v2/auth";
    pub const GMAIL_TOKEN_URL: &'static str = "https://oauth2.googleapis.com/token";
    pub const GMAIL_API_BASE_URL: &'static str = "https://gmail.googleapis.com/gmail/v1";
    pub const GMAIL_READONLY_SCOPE: &'static str =
        "https://www.googleapis.com/auth/gmail.readonly";

    /// Google endpoints with read-only Gmail scope
    pub fn gmail(credentials: GmailCredentials) -> Self {
        Self {
            client_id: credentials.client_id,
            client_secret: credentials.client_secret,
            auth_url: Self::GMAIL_AUTH_URL.to_string(),
            token_url: Self::GMAIL_TOKEN_URL.to_string(),
            api_base_url: Self::GMAIL_API_BASE_URL.to_string(),
            scope: Self::GMAIL_READONLY_SCOPE.to_string(),
        }
    }

    /// Point every endpoint at another host, keeping Google's path layout
    pub fn with_base(mut self, base: &str) -> Self {
        let base = base.trim_end_matches('/');
        self.auth_url = format!("{}/o/oauth2/v2/auth", base);
        self.token_url = format!("{}/token", base);
        self.api_base_url = format!("{}/gmail/v1", base);
        self
    }
}

/// Search tunables
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// Upper bound on concurrent detail fetches; `None` fetches every hit at once
    pub max_concurrent_fetches: Option<usize>,
}

impl SearchSettings {
    /// Load from ~/.config/lookout/settings.json, or defaults when absent
    pub fn load() -> Result<Self> {
        config::load_or_default(ConfigFile::Settings)
    }
}
