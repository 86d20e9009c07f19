#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use coursekit_core::api::{ApiClient, ClientOptions};
use coursekit_core::auth::{AuthContext, MemoryRefreshStorage, RefreshTokenStorage};
use serde_json::{json, Value};
use wiremock::MockServer;

pub struct Harness {
    pub storage: Arc<MemoryRefreshStorage>,
    pub auth: Arc<AuthContext>,
    pub api: ApiClient,
}

impl Harness {
    pub fn new(server: &MockServer) -> Self {
        Self::with_options(server, ClientOptions::default())
    }

    pub fn with_options(server: &MockServer, options: ClientOptions) -> Self {
        let storage = Arc::new(MemoryRefreshStorage::new());
        let auth = AuthContext::new(storage.clone());
        let api = ApiClient::with_options(&server.uri(), auth.clone(), options)
            .expect("api client");
        Self { storage, auth, api }
    }

    pub fn seed(&self, access: Option<&str>, refresh: Option<&str>) {
        self.auth.tokens.set_access(access.map(str::to_string));
        if let Some(refresh) = refresh {
            self.storage.save(refresh).expect("seed refresh");
        }
    }

    pub fn persisted_refresh(&self) -> Option<String> {
        self.storage.load().expect("load refresh")
    }

    /// Register a handler that only counts how often it fired.
    pub fn count_unauthorized(&self) -> Arc<AtomicUsize> {
        let count = Arc::new(AtomicUsize::new(0));
        let inner = count.clone();
        self.auth.notifier.register(Arc::new(move || {
            inner.fetch_add(1, Ordering::SeqCst);
        }));
        count
    }
}

pub fn fired(count: &AtomicUsize) -> usize {
    count.load(Ordering::SeqCst)
}

pub fn user_json(id: i64, username: &str) -> Value {
    json!({ "id": id, "username": username, "email": format!("{}@example.com", username) })
}

pub fn auth_json(access: &str, refresh: &str, username: &str) -> Value {
    json!({ "access": access, "refresh": refresh, "user": user_json(1, username) })
}

pub fn course_json(id: i64, title: &str) -> Value {
    json!({
        "id": id,
        "slug": title.to_lowercase().replace(' ', "-"),
        "title": title,
        "description": "",
        "cover_image": "",
        "modules_count": 2,
        "lessons_count": 6,
        "enrolled": false,
        "progress_percent": 0
    })
}

pub async fn request_count(server: &MockServer) -> usize {
    server
        .received_requests()
        .await
        .map(|requests| requests.len())
        .unwrap_or_default()
}
