//! Credential state shared by the transport and session layers.
//!
//! This module provides:
//! - `TokenStore`: access token in memory, refresh token in durable storage
//! - `RefreshTokenStorage`: file, keyring and in-memory backends
//! - `UnauthorizedNotifier`: the "session is not recoverable" signal
//! - `AuthContext`: the single instance of the above, shared via `Arc`

pub mod notifier;
pub mod storage;
pub mod tokens;

use std::sync::Arc;

pub use notifier::{UnauthorizedHandler, UnauthorizedNotifier};
pub use storage::{
    FileRefreshStorage, KeyringRefreshStorage, MemoryRefreshStorage, RefreshTokenStorage,
    REFRESH_TOKEN_KEY,
};
pub use tokens::TokenStore;

/// Process-wide credential state.
///
/// Constructed once at startup and handed to both the `ApiClient` and the
/// `SessionController`, so neither has to reach for the other.
pub struct AuthContext {
    pub tokens: TokenStore,
    pub notifier: UnauthorizedNotifier,
}

impl AuthContext {
    pub fn new(storage: Arc<dyn RefreshTokenStorage>) -> Arc<Self> {
        Arc::new(Self {
            tokens: TokenStore::new(storage),
            notifier: UnauthorizedNotifier::new(),
        })
    }

    /// Context with process-local refresh storage.
    pub fn in_memory() -> Arc<Self> {
        Self::new(Arc::new(MemoryRefreshStorage::new()))
    }
}
