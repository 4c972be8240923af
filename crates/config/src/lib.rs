//! Where Lookout keeps its files
//!
//! Everything Lookout persists sits side by side in `~/.config/lookout/`:
//! the Google OAuth client file, the token file written after sign-in and
//! optional search settings. [`ConfigFile`] names each of them so callers
//! never spell out file names.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

const APP_DIR: &str = "lookout";

/// A file Lookout reads or writes in its config directory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFile {
    /// OAuth client downloaded from the Google Cloud console
    Credentials,
    /// Access and refresh token of the signed-in account
    Tokens,
    /// Optional search tuning
    Settings,
}

impl ConfigFile {
    pub fn file_name(self) -> &'static str {
        match self {
            ConfigFile::Credentials => "google-credentials.json",
            ConfigFile::Tokens => "gmail-tokens.json",
            ConfigFile::Settings => "settings.json",
        }
    }

    /// Location in the config directory; `None` without a home directory
    pub fn path(self) -> Option<PathBuf> {
        config_dir().map(|dir| dir.join(self.file_name()))
    }

    pub fn exists(self) -> bool {
        self.path().is_some_and(|p| p.exists())
    }
}

/// Create the config directory on startup and return it
pub fn init() -> Result<PathBuf> {
    let dir = config_dir().context("Could not determine config directory")?;
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create config directory: {}", dir.display()))?;
    Ok(dir)
}

pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join(APP_DIR))
}

/// Parse a JSON file, naming the path in any error
pub fn load_json_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Parse `file`, or `T::default()` when it has not been created
///
/// A file that exists but does not parse is still an error.
pub fn load_or_default<T: DeserializeOwned + Default>(file: ConfigFile) -> Result<T> {
    match file.path() {
        Some(path) if path.exists() => load_json_file(&path),
        _ => Ok(T::default()),
    }
}
