use std::sync::Arc;

use reqwest::RequestBuilder;

use crate::auth::AuthContext;

/// Request stage that stamps outgoing calls with the current access token.
#[derive(Clone)]
pub struct RequestAuthorizer {
    auth: Arc<AuthContext>,
}

impl RequestAuthorizer {
    pub fn new(auth: Arc<AuthContext>) -> Self {
        Self { auth }
    }

    /// Attach `Authorization: Bearer <access>` when an access token is held.
    ///
    /// Returns the token that was attached so the caller can tell later
    /// whether it has been superseded.
    pub fn authorize(&self, builder: RequestBuilder) -> (RequestBuilder, Option<String>) {
        match self.auth.tokens.access() {
            Some(token) => (builder.bearer_auth(&token), Some(token)),
            None => (builder, None),
        }
    }
}
