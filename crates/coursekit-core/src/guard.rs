//! Access decisions for protected destinations.
//!
//! Callers showing protected content ask [`check`] first: while bootstrap
//! is running the answer is `Pending`, an anonymous user is sent to the
//! login page with the original destination carried in `next`.

use crate::session::{SessionPhase, SessionState};

/// Path of the login page.
pub const LOGIN_PATH: &str = "/login";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    /// Session state is not known yet; wait for bootstrap.
    Pending,
    Granted,
    RedirectToLogin { next: String },
}

pub fn check(state: &SessionState, destination: &str) -> Access {
    match state.phase() {
        SessionPhase::Bootstrapping => Access::Pending,
        SessionPhase::Authenticated => Access::Granted,
        SessionPhase::Anonymous => Access::RedirectToLogin {
            next: login_path(destination),
        },
    }
}

/// Login page URL that returns to `destination` afterwards.
pub fn login_path(destination: &str) -> String {
    format!("{}?next={}", LOGIN_PATH, destination)
}

/// Where to go after a successful login.
///
/// Only same-origin paths are honoured; anything else falls back to `/`.
pub fn next_destination(next: Option<&str>) -> &str {
    match next {
        Some(path) if path.starts_with('/') && !path.starts_with("//") => path,
        _ => "/",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserIdentity;

    fn state(user: bool, loading: bool) -> SessionState {
        SessionState {
            user: user.then(|| UserIdentity {
                id: 1,
                username: "ada".to_string(),
                email: String::new(),
            }),
            loading,
        }
    }

    #[test]
    fn test_pending_while_loading() {
        assert_eq!(check(&state(false, true), "/learn/1/1"), Access::Pending);
    }

    #[test]
    fn test_anonymous_redirects_with_next() {
        assert_eq!(
            check(&state(false, false), "/learn/1/2"),
            Access::RedirectToLogin {
                next: "/login?next=/learn/1/2".to_string()
            }
        );
    }

    #[test]
    fn test_authenticated_granted() {
        assert_eq!(check(&state(true, false), "/learn/1/2"), Access::Granted);
    }

    #[test]
    fn test_next_destination_rejects_foreign_urls() {
        assert_eq!(next_destination(Some("/learn/1/2")), "/learn/1/2");
        assert_eq!(next_destination(Some("https://evil.example")), "/");
        assert_eq!(next_destination(Some("//evil.example")), "/");
        assert_eq!(next_destination(None), "/");
    }
}
