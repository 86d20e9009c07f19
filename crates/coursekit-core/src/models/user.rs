use serde::{Deserialize, Serialize};

/// The authenticated principal as returned by `/auth/me/` and the auth endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct UserIdentity {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub email: String,
}

/// Access token plus, when the server issued one, a refresh token.
///
/// Login and register always produce both; the refresh endpoint returns
/// only an access token unless the server rotates refresh tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access: String,
    pub refresh: Option<String>,
}

/// Response body of `/auth/login/` and `/auth/register/`.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    pub access: String,
    pub refresh: String,
    pub user: UserIdentity,
}

impl AuthResponse {
    pub fn token_pair(&self) -> TokenPair {
        TokenPair {
            access: self.access.clone(),
            refresh: Some(self.refresh.clone()),
        }
    }
}

/// Response body of `/auth/refresh/`.
#[derive(Debug, Clone, Deserialize)]
pub struct RefreshResponse {
    pub access: String,
    #[serde(default)]
    pub refresh: Option<String>,
}

impl From<RefreshResponse> for TokenPair {
    fn from(response: RefreshResponse) -> Self {
        TokenPair {
            access: response.access,
            refresh: response.refresh,
        }
    }
}
