//! REST API client module for the learning backend.
//!
//! This module provides the `ApiClient` and the two pipeline stages it
//! runs every request through:
//!
//! - `RequestAuthorizer` attaches `Authorization: Bearer <access>`
//! - `RefreshInterceptor` turns a 401 into refresh + one replay
//!
//! The backend issues short-lived JWT access tokens together with a
//! longer-lived refresh token.

pub mod authorizer;
pub mod client;
pub mod error;
pub mod interceptor;
pub mod request;

pub use authorizer::RequestAuthorizer;
pub use client::{
    ApiClient, ClientOptions, HealthStatus, DEFAULT_API_BASE_URL, DEFAULT_REQUEST_TIMEOUT_SECS,
};
pub use error::ApiError;
pub use interceptor::{RefreshInterceptor, Verdict};
pub use request::ApiRequest;
