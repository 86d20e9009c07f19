//! Session lifecycle: bootstrap, login, register, logout.
//!
//! `SessionController` owns the public session state and publishes it on a
//! `tokio::sync::watch` channel. It registers itself with the
//! `UnauthorizedNotifier` so an irrecoverable 401 anywhere in the
//! application ends the session.

use std::sync::{Arc, Weak};

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::api::{ApiClient, ApiError};
use crate::auth::{AuthContext, UnauthorizedHandler};
use crate::models::{AuthResponse, UserIdentity};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Bootstrapping,
    Anonymous,
    Authenticated,
}

/// Snapshot of the session as seen by UI collaborators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    pub user: Option<UserIdentity>,
    /// True only while bootstrap is running (and before it has run).
    pub loading: bool,
}

impl SessionState {
    fn bootstrapping() -> Self {
        Self {
            user: None,
            loading: true,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    pub fn phase(&self) -> SessionPhase {
        if self.loading {
            SessionPhase::Bootstrapping
        } else if self.is_authenticated() {
            SessionPhase::Authenticated
        } else {
            SessionPhase::Anonymous
        }
    }
}

/// Clears `loading` when dropped, whichever way bootstrap ends.
struct LoadingGuard<'a> {
    state: &'a watch::Sender<SessionState>,
}

impl<'a> LoadingGuard<'a> {
    fn begin(state: &'a watch::Sender<SessionState>) -> Self {
        state.send_modify(|s| s.loading = true);
        Self { state }
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.state.send_modify(|s| s.loading = false);
    }
}

pub struct SessionController {
    api: ApiClient,
    auth: Arc<AuthContext>,
    state: Arc<watch::Sender<SessionState>>,
}

impl SessionController {
    pub fn new(api: ApiClient) -> Self {
        let auth = api.auth().clone();
        let (state, _) = watch::channel(SessionState::bootstrapping());
        Self {
            api,
            auth,
            state: Arc::new(state),
        }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn user(&self) -> Option<UserIdentity> {
        self.state.borrow().user.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().loading
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated()
    }

    pub fn phase(&self) -> SessionPhase {
        self.state.borrow().phase()
    }

    /// Wait until bootstrap has finished and return the resulting state.
    pub async fn ready(&self) -> SessionState {
        let mut rx = self.subscribe();
        let state = match rx.wait_for(|s| !s.loading).await {
            Ok(state) => state.clone(),
            // Unreachable while `self` holds the sender
            Err(_) => self.state(),
        };
        state
    }

    /// Restore the session from the persisted refresh token.
    ///
    /// Runs once at startup. Without a refresh token no request is made.
    /// Any failure along the way ends in a full logout; `loading` is false
    /// afterwards in every case.
    pub async fn bootstrap(&self) -> SessionState {
        self.auth.notifier.register(self.unauthorized_handler());

        {
            let _loading = LoadingGuard::begin(&self.state);
            self.restore().await;
        }

        let state = self.state();
        debug!(phase = ?state.phase(), "Bootstrap finished");
        state
    }

    async fn restore(&self) {
        let Some(refresh) = self.auth.tokens.refresh() else {
            debug!("No stored session");
            return;
        };

        match self.restore_with(&refresh).await {
            Ok(user) => {
                info!(username = %user.username, "Session restored");
                self.state.send_modify(|s| s.user = Some(user));
            }
            Err(e) => {
                warn!(error = %e, "Could not restore session");
                self.logout();
            }
        }
    }

    async fn restore_with(&self, refresh: &str) -> Result<UserIdentity, ApiError> {
        let pair = self.api.exchange_refresh(refresh).await?;
        self.auth.tokens.store_pair(&pair);
        self.api.me().await
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<UserIdentity, ApiError> {
        let response = self
            .api
            .login(username, password)
            .await
            .inspect_err(|e| warn!(error = %e, "Login failed"))?;
        let user = self.establish(response);
        info!(username = %user.username, "Login successful");
        Ok(user)
    }

    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<UserIdentity, ApiError> {
        let response = self
            .api
            .register(username, email, password)
            .await
            .inspect_err(|e| warn!(error = %e, "Registration failed"))?;
        let user = self.establish(response);
        info!(username = %user.username, "Registration successful");
        Ok(user)
    }

    /// End the session locally. No network call is made.
    pub fn logout(&self) {
        Self::end_session(&self.state, &self.auth);
        info!("Logged out");
    }

    /// Tokens are committed before the user is published, so a visible user
    /// always has an access token behind it.
    fn establish(&self, response: AuthResponse) -> UserIdentity {
        self.auth.tokens.store_pair(&response.token_pair());
        let user = response.user;
        self.state.send_modify(|s| s.user = Some(user.clone()));
        user
    }

    /// The user is withdrawn before the tokens are cleared.
    fn end_session(state: &watch::Sender<SessionState>, auth: &AuthContext) {
        state.send_modify(|s| s.user = None);
        auth.tokens.clear();
    }

    fn unauthorized_handler(&self) -> UnauthorizedHandler {
        let state: Weak<watch::Sender<SessionState>> = Arc::downgrade(&self.state);
        let auth: Weak<AuthContext> = Arc::downgrade(&self.auth);
        Arc::new(move || {
            if let (Some(state), Some(auth)) = (state.upgrade(), auth.upgrade()) {
                info!("Session can no longer be recovered, logging out");
                Self::end_session(&state, &auth);
            }
        })
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        self.auth.notifier.clear();
    }
}
