//! Persisted session credential.
//!
//! A single JSON file holds the access token between runs. There is one
//! writer (the session gate) and many readers (every authenticated request),
//! so the in-memory copy sits behind an `RwLock`.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{RemoteError, RemoteResult};
use crate::store::TokenPair;

/// File name used under the data directory.
pub const CREDENTIAL_FILE: &str = "credential.json";

#[derive(Clone, Serialize, Deserialize)]
pub struct StoredCredential {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub obtained_at: DateTime<Utc>,
}

impl StoredCredential {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: None,
            obtained_at: Utc::now(),
        }
    }
}

impl From<TokenPair> for StoredCredential {
    fn from(pair: TokenPair) -> Self {
        Self {
            access_token: pair.access,
            refresh_token: pair.refresh,
            obtained_at: Utc::now(),
        }
    }
}

impl std::fmt::Debug for StoredCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoredCredential")
            .field("obtained_at", &self.obtained_at)
            .finish_non_exhaustive()
    }
}

/// File-backed credential store.
#[derive(Debug)]
pub struct CredentialStore {
    path: PathBuf,
    current: RwLock<Option<StoredCredential>>,
}

impl CredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            current: RwLock::new(None),
        }
    }

    /// `<data dir>/eventflow/credential.json`.
    pub fn default_path() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("eventflow")
            .join(CREDENTIAL_FILE)
    }

    /// Reads the file into memory. Returns `Ok(false)` if there is none.
    pub fn load(&self) -> RemoteResult<bool> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "no stored credential");
            return Ok(false);
        }

        let content = fs::read_to_string(&self.path).map_err(|e| {
            RemoteError::configuration(format!("failed to read credential file: {}", e))
                .with_source(e)
        })?;
        let credential: StoredCredential = serde_json::from_str(&content).map_err(|e| {
            RemoteError::configuration(format!("failed to parse credential file: {}", e))
        })?;

        info!(path = %self.path.display(), "loaded stored credential");
        *self.write_guard() = Some(credential);
        Ok(true)
    }

    pub fn get(&self) -> Option<StoredCredential> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The bearer token for requests, if logged in.
    pub fn access_token(&self) -> Option<String> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|c| c.access_token.clone())
    }

    pub fn is_present(&self) -> bool {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Replaces the credential in memory and on disk.
    pub fn set(&self, credential: StoredCredential) -> RemoteResult<()> {
        self.persist(&credential)?;
        *self.write_guard() = Some(credential);
        Ok(())
    }

    /// Forgets the credential. The in-memory copy is dropped even if the file
    /// cannot be removed.
    pub fn clear(&self) -> RemoteResult<()> {
        *self.write_guard() = None;
        if self.path.exists() {
            fs::remove_file(&self.path).map_err(|e| {
                RemoteError::configuration(format!("failed to remove credential file: {}", e))
                    .with_source(e)
            })?;
            info!(path = %self.path.display(), "cleared stored credential");
        }
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_guard(&self) -> std::sync::RwLockWriteGuard<'_, Option<StoredCredential>> {
        self.current.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn persist(&self, credential: &StoredCredential) -> RemoteResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                RemoteError::configuration(format!("failed to create credential directory: {}", e))
                    .with_source(e)
            })?;
        }

        let content = serde_json::to_string_pretty(credential).map_err(|e| {
            RemoteError::internal(format!("failed to serialize credential: {}", e))
        })?;

        // Write next to the target, then rename over it.
        let temp_path = self.path.with_extension("json.tmp");
        fs::write(&temp_path, content).map_err(|e| {
            RemoteError::configuration(format!("failed to write credential file: {}", e))
                .with_source(e)
        })?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let _ = fs::set_permissions(&temp_path, fs::Permissions::from_mode(0o600));
        }

        fs::rename(&temp_path, &self.path).map_err(|e| {
            RemoteError::configuration(format!("failed to rename credential file: {}", e))
                .with_source(e)
        })?;

        debug!(path = %self.path.display(), "saved credential");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_in(dir: &tempfile::TempDir) -> CredentialStore {
        CredentialStore::new(dir.path().join("nested").join(CREDENTIAL_FILE))
    }

    #[test]
    fn set_then_load_in_a_new_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.set(StoredCredential::new("tok-1")).unwrap();
        assert!(store.path().exists());
        assert_eq!(store.access_token().as_deref(), Some("tok-1"));

        let reopened = store_in(&dir);
        assert!(!reopened.is_present());
        assert!(reopened.load().unwrap());
        assert_eq!(reopened.access_token().as_deref(), Some("tok-1"));
    }

    #[test]
    fn load_without_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        assert!(!store.load().unwrap());
        assert!(store.get().is_none());
    }

    #[test]
    fn clear_removes_file_and_memory() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.set(StoredCredential::new("tok")).unwrap();
        store.clear().unwrap();
        assert!(!store.path().exists());
        assert!(store.access_token().is_none());
        // clearing twice is fine
        store.clear().unwrap();
    }

    #[test]
    fn corrupt_file_is_a_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        fs::write(store.path(), "not json").unwrap();
        let err = store.load().unwrap_err();
        assert_eq!(err.code(), crate::RemoteErrorCode::ConfigurationError);
        assert!(!store.is_present());
    }

    #[test]
    fn token_pair_keeps_refresh() {
        let pair: TokenPair = serde_json::from_str(r#"{"access":"a","refresh":"r"}"#).unwrap();
        let credential = StoredCredential::from(pair);
        assert_eq!(credential.access_token, "a");
        assert_eq!(credential.refresh_token.as_deref(), Some("r"));
    }

    #[cfg(unix)]
    #[test]
    fn file_is_private() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.set(StoredCredential::new("tok")).unwrap();
        let mode = fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
