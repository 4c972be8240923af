//! File-backed credential storage
//!
//! Stores the credential as pretty JSON, by default at
//! ~/.config/lookout/gmail-tokens.json. On unix the file is created with
//! owner-only permissions.

use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use super::CredentialStorage;
use crate::models::Credential;

pub struct FileCredentialStorage {
    path: PathBuf,
}

impl FileCredentialStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Storage at the default token path in the config directory
    pub fn open_default() -> Result<Self> {
        let path = config::ConfigFile::Tokens.path().context("Could not determine config directory")?;
        Ok(Self::new(path))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_private(&self, content: &str) -> Result<()> {
        let mut options = fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        // Replaced via rename so the record is never partially written
        let tmp = self.path.with_extension("json.tmp");
        let mut file = options
            .open(&tmp)
            .with_context(|| format!("Failed to open {}", tmp.display()))?;
        file.write_all(content.as_bytes())?;
        file.sync_all()?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("Failed to replace {}", self.path.display()))?;
        Ok(())
    }
}

impl CredentialStorage for FileCredentialStorage {
    fn load(&self) -> Result<Option<Credential>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        let credential = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", self.path.display()))?;
        Ok(Some(credential))
    }

    fn save(&self, credential: &Credential) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(credential)?;
        self.write_private(&content)
    }

    fn clear(&self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tempfile::TempDir;

    fn credential(access: &str) -> Credential {
        Credential::issued_at(Utc::now(), access, Some("rt".into()), Some(3600))
    }

    #[test]
    fn test_missing_file_loads_none() {
        let dir = TempDir::new().unwrap();
        let storage = FileCredentialStorage::new(dir.path().join("tokens.json"));
        assert!(storage.load().unwrap().is_none());
    }

    #[test]
    fn test_save_replaces_whole_record() {
        let dir = TempDir::new().unwrap();
        let storage = FileCredentialStorage::new(dir.path().join("nested/tokens.json"));

        storage.save(&credential("first")).unwrap();
        let second = Credential {
            access_token: "second".into(),
            refresh_token: None,
            expires_at: None,
        };
        storage.save(&second).unwrap();

        assert_eq!(storage.load().unwrap(), Some(second));
    }

    #[test]
    fn test_clear_removes_file() {
        let dir = TempDir::new().unwrap();
        let storage = FileCredentialStorage::new(dir.path().join("tokens.json"));
        storage.save(&credential("at")).unwrap();
        storage.clear().unwrap();
        assert!(!storage.path().exists());
        storage.clear().unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn test_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let storage = FileCredentialStorage::new(dir.path().join("tokens.json"));
        storage.save(&credential("at")).unwrap();
        let mode = fs::metadata(storage.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tokens.json");
        fs::write(&path, "not json").unwrap();
        assert!(FileCredentialStorage::new(path).load().is_err());
    }
}
