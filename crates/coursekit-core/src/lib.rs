//! Core library for coursekit.
//!
//! The heart of the crate is the authenticated request layer and the
//! session lifecycle built on top of it:
//!
//! - [`auth`]: token store, refresh token storage, unauthorized notifier
//! - [`api`]: the HTTP client and its authorize / refresh-and-replay stages
//! - [`session`]: bootstrap, login, register, logout and the public state
//! - [`guard`]: access decisions for protected destinations
//!
//! Everything else ([`models`], [`config`], [`utils`]) supports the course
//! browsing built on that layer.

pub mod api;
pub mod auth;
pub mod config;
pub mod guard;
pub mod models;
pub mod session;
pub mod utils;

pub use api::{ApiClient, ApiError};
pub use auth::AuthContext;
pub use config::Config;
pub use session::{SessionController, SessionPhase, SessionState};
