//! Durable backends for the refresh token.
//!
//! Exactly one record is kept: the refresh token under [`REFRESH_TOKEN_KEY`].
//! A missing record means there is no session to restore.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use keyring::Entry;
use serde::{Deserialize, Serialize};

/// Name of the persisted record (file stem / keyring account).
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";

/// Keyring service name
const SERVICE_NAME: &str = "coursekit";

/// Storage abstraction for the persisted refresh token.
pub trait RefreshTokenStorage: Send + Sync {
    fn load(&self) -> Result<Option<String>>;
    fn save(&self, token: &str) -> Result<()>;
    /// Remove the record. Removing an absent record is not an error.
    fn remove(&self) -> Result<()>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RefreshTokenFile {
    refresh_token: String,
    saved_at: DateTime<Utc>,
}

/// Refresh token kept in a JSON file inside the data directory.
#[derive(Debug, Clone)]
pub struct FileRefreshStorage {
    data_dir: PathBuf,
}

impl FileRefreshStorage {
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    pub fn path(&self) -> PathBuf {
        self.data_dir.join(format!("{}.json", REFRESH_TOKEN_KEY))
    }

    fn ensure_parent(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        Ok(())
    }
}

impl RefreshTokenStorage for FileRefreshStorage {
    fn load(&self) -> Result<Option<String>> {
        let path = self.path();
        let contents = match std::fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e).context("Failed to read refresh token file"),
        };
        let file: RefreshTokenFile =
            serde_json::from_str(&contents).context("Failed to parse refresh token file")?;
        if file.refresh_token.is_empty() {
            return Ok(None);
        }
        Ok(Some(file.refresh_token))
    }

    fn save(&self, token: &str) -> Result<()> {
        let path = self.path();
        Self::ensure_parent(&path)?;
        let file = RefreshTokenFile {
            refresh_token: token.to_string(),
            saved_at: Utc::now(),
        };
        let contents = serde_json::to_string_pretty(&file)?;
        std::fs::write(&path, contents).context("Failed to write refresh token file")?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o600))?;
        }
        Ok(())
    }

    fn remove(&self) -> Result<()> {
        match std::fs::remove_file(self.path()) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).context("Failed to delete refresh token file"),
        }
    }
}

/// Refresh token kept in the OS keychain.
#[derive(Debug, Clone)]
pub struct KeyringRefreshStorage {
    account: String,
}

impl KeyringRefreshStorage {
    pub fn new() -> Self {
        Self::with_account(REFRESH_TOKEN_KEY)
    }

    pub fn with_account(account: &str) -> Self {
        Self {
            account: account.to_string(),
        }
    }

    fn entry(&self) -> Result<Entry> {
        Entry::new(SERVICE_NAME, &self.account).context("Failed to create keyring entry")
    }
}

impl Default for KeyringRefreshStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl RefreshTokenStorage for KeyringRefreshStorage {
    fn load(&self) -> Result<Option<String>> {
        match self.entry()?.get_password() {
            Ok(token) => Ok(Some(token)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e).context("Failed to retrieve refresh token from keychain"),
        }
    }

    fn save(&self, token: &str) -> Result<()> {
        self.entry()?
            .set_password(token)
            .context("Failed to store refresh token in keychain")?;

        // Read back through a fresh entry: a non-persistent credential store
        // accepts the write but has nothing to return here.
        match self.entry()?.get_password() {
            Ok(stored) if stored == token => Ok(()),
            Ok(_) | Err(keyring::Error::NoEntry) => {
                bail!("Keychain did not retain the refresh token")
            }
            Err(e) => Err(e).context("Failed to verify refresh token in keychain"),
        }
    }

    fn remove(&self) -> Result<()> {
        match self.entry()?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e).context("Failed to delete refresh token from keychain"),
        }
    }
}

/// Process-local storage; nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryRefreshStorage {
    token: Mutex<Option<String>>,
}

impl MemoryRefreshStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: &str) -> Self {
        Self {
            token: Mutex::new(Some(token.to_string())),
        }
    }
}

impl RefreshTokenStorage for MemoryRefreshStorage {
    fn load(&self) -> Result<Option<String>> {
        Ok(self
            .token
            .lock()
            .map_err(|_| anyhow::anyhow!("refresh token lock poisoned"))?
            .clone())
    }

    fn save(&self, token: &str) -> Result<()> {
        *self
            .token
            .lock()
            .map_err(|_| anyhow::anyhow!("refresh token lock poisoned"))? = Some(token.to_string());
        Ok(())
    }

    fn remove(&self) -> Result<()> {
        *self
            .token
            .lock()
            .map_err(|_| anyhow::anyhow!("refresh token lock poisoned"))? = None;
        Ok(())
    }
}
