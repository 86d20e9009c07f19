//! Application configuration management.
//!
//! This module handles loading and saving the application configuration,
//! which includes the API base URL, transport settings, where the refresh
//! token is persisted, and the last used username.
//!
//! Configuration is stored at `~/.config/coursekit/config.json`. The base URL
//! can be overridden with `COURSEKIT_API_BASE_URL`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::api::{DEFAULT_API_BASE_URL, DEFAULT_REQUEST_TIMEOUT_SECS};
use crate::auth::{
    FileRefreshStorage, KeyringRefreshStorage, MemoryRefreshStorage, RefreshTokenStorage,
};

/// Application name used for config/data directory paths
const APP_NAME: &str = "coursekit";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Environment variable overriding `api_base_url`
pub const BASE_URL_ENV: &str = "COURSEKIT_API_BASE_URL";

/// Where the refresh token is persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TokenStorageKind {
    #[default]
    File,
    Keyring,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_base_url: String,
    pub request_timeout_secs: u64,
    pub token_storage: TokenStorageKind,
    pub single_flight_refresh: bool,
    pub last_username: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            token_storage: TokenStorageKind::default(),
            single_flight_refresh: false,
            last_username: None,
        }
    }
}

impl Config {
    /// Load from the default location and apply environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::config_path()?)?;
        config.apply_env();
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            serde_json::from_str(&contents).context("Failed to parse config file")
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn apply_env(&mut self) {
        if let Ok(url) = std::env::var(BASE_URL_ENV) {
            if !url.trim().is_empty() {
                self.api_base_url = url.trim().to_string();
            }
        }
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Directory for the persisted refresh token and log files.
    pub fn data_dir(&self) -> Result<PathBuf> {
        let data_dir = dirs::data_local_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME))
    }

    /// Build the configured refresh token backend.
    pub fn refresh_storage(&self) -> Result<Arc<dyn RefreshTokenStorage>> {
        Ok(match self.token_storage {
            TokenStorageKind::File => Arc::new(FileRefreshStorage::new(self.data_dir()?)),
            TokenStorageKind::Keyring => Arc::new(KeyringRefreshStorage::new()),
            TokenStorageKind::Memory => Arc::new(MemoryRefreshStorage::new()),
        })
    }
}
