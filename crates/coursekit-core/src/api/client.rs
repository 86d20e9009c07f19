//! API client for the learning backend.
//!
//! Every call made through [`ApiClient::send`] passes the authenticated
//! pipeline: the [`RequestAuthorizer`] stamps the current access token, the
//! request is transmitted, and the [`RefreshInterceptor`] may renew the
//! credentials and replay the request once.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::debug;

use super::authorizer::RequestAuthorizer;
use super::interceptor::{RefreshInterceptor, Verdict};
use super::request::ApiRequest;
use super::ApiError;
use crate::auth::AuthContext;
use crate::config::Config;
use crate::models::{
    AttemptResult, AuthResponse, CourseDetail, CourseListItem, CourseRef, CourseTree, Enrollment,
    EnrollmentRecord, LessonDetail, TokenPair, UserIdentity,
};

// ============================================================================
// Constants
// ============================================================================

/// Base URL used when nothing is configured.
pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:8001/api/v1";

/// HTTP request timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

const LOGIN_PATH: &str = "/auth/login/";
const REGISTER_PATH: &str = "/auth/register/";
const REFRESH_PATH: &str = "/auth/refresh/";
const ME_PATH: &str = "/auth/me/";

/// Transport settings for [`ApiClient`].
#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub timeout: Duration,
    /// Share one refresh call between concurrent 401s.
    pub single_flight_refresh: bool,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            single_flight_refresh: false,
        }
    }
}

impl From<&Config> for ClientOptions {
    fn from(config: &Config) -> Self {
        Self {
            timeout: Duration::from_secs(config.request_timeout_secs),
            single_flight_refresh: config.single_flight_refresh,
        }
    }
}

/// Health endpoint payload
#[derive(Debug, Clone, serde::Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub service: String,
}

/// API client for the learning backend.
/// Clone is cheap - the reqwest client and the credential state are shared.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    auth: Arc<AuthContext>,
    authorizer: RequestAuthorizer,
    interceptor: Arc<RefreshInterceptor>,
}

impl ApiClient {
    /// Create a client with default options
    pub fn new(base_url: &str, auth: Arc<AuthContext>) -> Result<Self, ApiError> {
        Self::with_options(base_url, auth, ClientOptions::default())
    }

    pub fn from_config(config: &Config, auth: Arc<AuthContext>) -> Result<Self, ApiError> {
        Self::with_options(&config.api_base_url, auth, ClientOptions::from(config))
    }

    pub fn with_options(
        base_url: &str,
        auth: Arc<AuthContext>,
        options: ClientOptions,
    ) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(options.timeout).build()?;
        let base_url = base_url.trim_end_matches('/').to_string();

        let interceptor = RefreshInterceptor::new(
            auth.clone(),
            client.clone(),
            format!("{}{}", base_url, REFRESH_PATH),
        )
        .with_single_flight(options.single_flight_refresh);

        Ok(Self {
            client,
            base_url,
            authorizer: RequestAuthorizer::new(auth.clone()),
            auth,
            interceptor: Arc::new(interceptor),
        })
    }

    /// Shared credential state this client reads and updates.
    pub fn auth(&self) -> &Arc<AuthContext> {
        &self.auth
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    // ===== Pipeline =====

    /// Send a request through the authenticated pipeline.
    ///
    /// A 401 is answered at most once by refreshing and replaying; the
    /// replay's outcome is what the caller sees. Non-401 responses are
    /// returned as-is, whatever their status.
    pub async fn send(&self, mut request: ApiRequest) -> Result<Response, ApiError> {
        loop {
            let response = self.dispatch(&mut request).await?;
            match self.interceptor.inspect(&mut request, response).await {
                Verdict::Pass(response) => return Ok(response),
                Verdict::Replay => continue,
                Verdict::Fail(e) => return Err(e),
            }
        }
    }

    async fn dispatch(&self, request: &mut ApiRequest) -> Result<Response, ApiError> {
        let mut builder = self
            .client
            .request(request.method.clone(), self.url(&request.path));
        if let Some(ref body) = request.body {
            builder = builder.json(body);
        }

        let (builder, sent_with) = self.authorizer.authorize(builder);
        debug!(
            method = %request.method,
            path = %request.path,
            authorized = sent_with.is_some(),
            replay = request.is_retried(),
            "Sending request"
        );
        request.record_sent_with(sent_with);

        Ok(builder.send().await?)
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: Response) -> Result<Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    async fn parse<T: DeserializeOwned>(response: Response, path: &str) -> Result<T, ApiError> {
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| {
            ApiError::InvalidResponse(format!("Failed to parse response from {}: {}", path, e))
        })
    }

    async fn fetch<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ApiError> {
        let path = request.path.clone();
        let response = self.send(request).await?;
        let response = Self::check_response(response).await?;
        Self::parse(response, &path).await
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.fetch(ApiRequest::get(path)).await
    }

    pub async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        body: serde_json::Value,
    ) -> Result<T, ApiError> {
        self.fetch(ApiRequest::post(path).json(body)).await
    }

    // ===== Authentication =====

    /// Credential exchanges go out without a bearer token and without
    /// interception: a 401 here means wrong credentials, not an expired
    /// session.
    async fn post_credentials(
        &self,
        path: &str,
        body: serde_json::Value,
    ) -> Result<AuthResponse, ApiError> {
        let response = self.client.post(self.url(path)).json(&body).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::from_credentials_status(status, &body));
        }
        Self::parse(response, path).await
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<AuthResponse, ApiError> {
        self.post_credentials(
            LOGIN_PATH,
            json!({ "username": username, "password": password }),
        )
        .await
    }

    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthResponse, ApiError> {
        self.post_credentials(
            REGISTER_PATH,
            json!({ "username": username, "email": email, "password": password }),
        )
        .await
    }

    /// Exchange `refresh` for a new access token without storing anything.
    pub async fn exchange_refresh(&self, refresh: &str) -> Result<TokenPair, ApiError> {
        self.interceptor.exchange(refresh).await
    }

    /// Fetch the profile of the authenticated user
    pub async fn me(&self) -> Result<UserIdentity, ApiError> {
        self.get(ME_PATH).await
    }

    // ===== Data Fetching Methods =====

    pub async fn health(&self) -> Result<HealthStatus, ApiError> {
        self.get("/health/").await
    }

    /// Fetch the published course catalog
    pub async fn fetch_courses(&self) -> Result<Vec<CourseListItem>, ApiError> {
        self.get("/courses/").await
    }

    /// Fetch a course by id or slug
    pub async fn fetch_course(&self, course: &CourseRef) -> Result<CourseDetail, ApiError> {
        self.get(&format!("/courses/{}/", course)).await
    }

    /// Fetch modules and lessons with completion state for the current user
    pub async fn fetch_course_tree(&self, course_id: i64) -> Result<CourseTree, ApiError> {
        self.get(&format!("/courses/{}/tree/", course_id)).await
    }

    pub async fn enroll(&self, course_id: i64) -> Result<EnrollmentRecord, ApiError> {
        self.post(&format!("/courses/{}/enroll/", course_id), json!({}))
            .await
    }

    pub async fn fetch_lesson(&self, lesson_id: i64) -> Result<LessonDetail, ApiError> {
        self.get(&format!("/lessons/{}/", lesson_id)).await
    }

    /// Submit an answer to a practice problem
    pub async fn submit_attempt(
        &self,
        problem_id: i64,
        answer: &str,
    ) -> Result<AttemptResult, ApiError> {
        self.post(
            "/attempts/submit/",
            json!({ "problem_id": problem_id, "answer": answer }),
        )
        .await
    }

    pub async fn fetch_enrollments(&self) -> Result<Vec<Enrollment>, ApiError> {
        self.get("/me/enrollments/").await
    }
}
