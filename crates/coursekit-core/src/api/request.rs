use reqwest::Method;
use serde_json::Value;

/// A logical request travelling through the authenticated pipeline.
///
/// Unlike a `reqwest::Request` it can be transmitted again, which is what
/// the refresh interceptor needs to replay it after reauthentication.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
    retried: bool,
    sent_with: Option<String>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            retried: false,
            sent_with: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Whether this request has already been replayed after a refresh.
    pub fn is_retried(&self) -> bool {
        self.retried
    }

    /// Set the retry marker. It never goes back to unset.
    pub(crate) fn mark_retried(&mut self) {
        self.retried = true;
    }

    /// Access token carried by the most recent transmission.
    pub fn sent_with(&self) -> Option<&str> {
        self.sent_with.as_deref()
    }

    pub(crate) fn record_sent_with(&mut self, token: Option<String>) {
        self.sent_with = token;
    }
}
