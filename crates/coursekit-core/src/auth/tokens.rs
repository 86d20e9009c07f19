use std::sync::{Arc, RwLock};

use tracing::{debug, warn};

use super::storage::RefreshTokenStorage;
use crate::models::TokenPair;

/// Holds the access token in memory and the refresh token in durable storage.
///
/// Accessors never fail: a storage backend error is logged and a failed
/// read is reported as "no refresh token".
pub struct TokenStore {
    access: RwLock<Option<String>>,
    refresh: Arc<dyn RefreshTokenStorage>,
}

impl TokenStore {
    pub fn new(refresh: Arc<dyn RefreshTokenStorage>) -> Self {
        Self {
            access: RwLock::new(None),
            refresh,
        }
    }

    pub fn access(&self) -> Option<String> {
        self.access
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn set_access(&self, token: Option<String>) {
        *self
            .access
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = token;
    }

    pub fn refresh(&self) -> Option<String> {
        match self.refresh.load() {
            Ok(token) => token,
            Err(e) => {
                warn!(error = %e, "Failed to read refresh token");
                None
            }
        }
    }

    /// Persist the refresh token, or remove the persisted entry for `None`.
    pub fn set_refresh(&self, token: Option<&str>) {
        let result = match token {
            Some(token) if !token.is_empty() => self.refresh.save(token),
            _ => self.refresh.remove(),
        };
        if let Err(e) = result {
            warn!(error = %e, "Failed to update refresh token");
        }
    }

    /// Store a token pair. A pair without a refresh token leaves the
    /// persisted one in place.
    pub fn store_pair(&self, pair: &TokenPair) {
        self.set_access(Some(pair.access.clone()));
        if let Some(ref refresh) = pair.refresh {
            self.set_refresh(Some(refresh));
        }
        debug!(rotated = pair.refresh.is_some(), "Token pair stored");
    }

    pub fn clear(&self) {
        self.set_access(None);
        self.set_refresh(None);
    }
}
