use std::sync::Arc;

use reqwest::{Client, Response, StatusCode};
use serde_json::json;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::request::ApiRequest;
use super::ApiError;
use crate::auth::AuthContext;
use crate::models::{RefreshResponse, TokenPair};

/// What the pipeline should do with a response.
#[derive(Debug)]
pub enum Verdict {
    /// Hand the response to the caller unchanged.
    Pass(Response),
    /// Credentials were renewed; transmit the request once more.
    Replay,
    /// Terminal failure for this request.
    Fail(ApiError),
}

/// Response stage implementing 401 → refresh → replay once.
///
/// The interceptor holds no user state. When the session cannot be
/// recovered it clears the tokens and fires the `UnauthorizedNotifier`;
/// whoever registered there decides what "logged out" means.
pub struct RefreshInterceptor {
    auth: Arc<AuthContext>,
    http: Client,
    refresh_url: String,
    single_flight: Option<Mutex<()>>,
}

impl RefreshInterceptor {
    pub fn new(auth: Arc<AuthContext>, http: Client, refresh_url: String) -> Self {
        Self {
            auth,
            http,
            refresh_url,
            single_flight: None,
        }
    }

    /// Serialize refreshes so concurrent 401s share one refresh call.
    pub fn with_single_flight(mut self, enabled: bool) -> Self {
        self.single_flight = enabled.then(|| Mutex::new(()));
        self
    }

    pub async fn inspect(&self, request: &mut ApiRequest, response: Response) -> Verdict {
        if response.status() != StatusCode::UNAUTHORIZED {
            return Verdict::Pass(response);
        }

        if request.is_retried() {
            debug!(path = %request.path, "401 on replayed request, giving up");
            return Verdict::Fail(ApiError::Unauthorized);
        }

        match self.reauthenticate(request.sent_with()).await {
            Ok(()) => {
                request.mark_retried();
                Verdict::Replay
            }
            Err(e) => Verdict::Fail(e),
        }
    }

    async fn reauthenticate(&self, stale_access: Option<&str>) -> Result<(), ApiError> {
        let Some(lock) = &self.single_flight else {
            return self.refresh_session().await.map(|_| ());
        };

        let _guard = lock.lock().await;
        if let Some(current) = self.auth.tokens.access() {
            if stale_access != Some(current.as_str()) {
                debug!("Access token renewed by a concurrent request, reusing it");
                return Ok(());
            }
        }
        self.refresh_session().await.map(|_| ())
    }

    /// Exchange the stored refresh token for a new access token.
    ///
    /// With no refresh token the notifier fires and `Unauthorized` is
    /// returned without touching the network. A rejected refresh clears both
    /// tokens and fires the notifier. A transport failure leaves the tokens
    /// alone.
    async fn refresh_session(&self) -> Result<TokenPair, ApiError> {
        let Some(refresh) = self.auth.tokens.refresh() else {
            info!("Unauthorized with no refresh token");
            self.auth.notifier.notify();
            return Err(ApiError::Unauthorized);
        };

        match self.exchange(&refresh).await {
            Ok(pair) => {
                self.auth.tokens.store_pair(&pair);
                debug!("Access token refreshed");
                Ok(pair)
            }
            Err(e @ ApiError::Transport(_)) => {
                warn!(error = %e, "Refresh request failed to reach the server");
                Err(e)
            }
            Err(e) => {
                warn!(error = %e, "Refresh rejected, clearing session");
                self.auth.tokens.clear();
                self.auth.notifier.notify();
                Err(e)
            }
        }
    }

    /// Call the refresh endpoint directly, outside the pipeline.
    pub async fn exchange(&self, refresh: &str) -> Result<TokenPair, ApiError> {
        let response = self
            .http
            .post(&self.refresh_url)
            .json(&json!({ "refresh": refresh }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::RefreshRejected(format!(
                "status {}: {}",
                status,
                ApiError::truncate_body(&body)
            )));
        }

        let parsed: RefreshResponse = response
            .json()
            .await
            .map_err(|e| ApiError::RefreshRejected(format!("unreadable refresh response: {}", e)))?;
        Ok(parsed.into())
    }
}
