mod support;

use std::time::Duration;

use coursekit_core::api::{ApiClient, ApiError, ClientOptions};
use coursekit_core::auth::AuthContext;
use coursekit_core::models::CourseListItem;
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use support::{course_json, fired, Harness};

async fn mount_refresh(server: &MockServer, refresh: &str, status: u16, expected: u64) {
    let template = if status == 200 {
        ResponseTemplate::new(200).set_body_json(json!({ "access": "fresh" }))
    } else {
        ResponseTemplate::new(status).set_body_json(json!({ "detail": "Token is invalid or expired" }))
    };
    Mock::given(method("POST"))
        .and(path("/auth/refresh/"))
        .and(body_json(json!({ "refresh": refresh })))
        .respond_with(template)
        .expect(expected)
        .mount(server)
        .await;
}

#[tokio::test]
async fn request_carries_bearer_when_access_token_held() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/courses/"))
        .and(header("authorization", "Bearer a1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([course_json(1, "Algebra")])))
        .expect(1)
        .mount(&server)
        .await;

    let harness = Harness::new(&server);
    harness.seed(Some("a1"), None);

    let courses: Vec<CourseListItem> = harness.api.fetch_courses().await.expect("courses");
    assert_eq!(courses.len(), 1);
    assert_eq!(courses[0].title, "Algebra");
}

#[tokio::test]
async fn request_without_access_token_has_no_authorization_header() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/courses/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let harness = Harness::new(&server);
    harness.api.fetch_courses().await.expect("courses");

    let requests = server.received_requests().await.expect("recorded requests");
    assert_eq!(requests.len(), 1);
    assert!(requests[0].headers.get("authorization").is_none());
}

#[tokio::test]
async fn expired_access_is_refreshed_and_request_replayed_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/courses/"))
        .and(header("authorization", "Bearer stale"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/courses/"))
        .and(header("authorization", "Bearer fresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([course_json(2, "Geometry")])))
        .expect(1)
        .mount(&server)
        .await;
    mount_refresh(&server, "r1", 200, 1).await;

    let harness = Harness::new(&server);
    harness.seed(Some("stale"), Some("r1"));
    let unauthorized = harness.count_unauthorized();

    let courses = harness.api.fetch_courses().await.expect("replayed request");

    assert_eq!(courses[0].title, "Geometry");
    assert_eq!(harness.auth.tokens.access().as_deref(), Some("fresh"));
    assert_eq!(harness.persisted_refresh().as_deref(), Some("r1"));
    assert_eq!(fired(&unauthorized), 0);
}

#[tokio::test]
async fn second_401_on_replayed_request_is_terminal() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/me/enrollments/"))
        .respond_with(ResponseTemplate::new(401))
        .expect(2)
        .mount(&server)
        .await;
    mount_refresh(&server, "r1", 200, 1).await;

    let harness = Harness::new(&server);
    harness.seed(Some("stale"), Some("r1"));
    let unauthorized = harness.count_unauthorized();

    let result = harness.api.fetch_enrollments().await;

    assert!(matches!(result, Err(ApiError::Unauthorized)));
    assert_eq!(fired(&unauthorized), 0);
}

#[tokio::test]
async fn missing_refresh_token_notifies_without_network_call() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/me/enrollments/"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    mount_refresh(&server, "r1", 200, 0).await;

    let harness = Harness::new(&server);
    harness.seed(Some("stale"), None);
    let unauthorized = harness.count_unauthorized();

    let result = harness.api.fetch_enrollments().await;

    assert!(matches!(result, Err(ApiError::Unauthorized)));
    assert_eq!(fired(&unauthorized), 1);
}

#[tokio::test]
async fn rejected_refresh_clears_tokens_and_notifies() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/lessons/5/"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    mount_refresh(&server, "expired", 401, 1).await;

    let harness = Harness::new(&server);
    harness.seed(Some("stale"), Some("expired"));
    let unauthorized = harness.count_unauthorized();

    let result = harness.api.fetch_lesson(5).await;

    assert!(matches!(result, Err(ApiError::RefreshRejected(_))));
    assert!(harness.auth.tokens.access().is_none());
    assert!(harness.persisted_refresh().is_none());
    assert_eq!(fired(&unauthorized), 1);
}

#[tokio::test]
async fn rotated_refresh_token_is_persisted() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/courses/"))
        .and(header("authorization", "Bearer stale"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/courses/"))
        .and(header("authorization", "Bearer fresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "access": "fresh", "refresh": "r2" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let harness = Harness::new(&server);
    harness.seed(Some("stale"), Some("r1"));

    harness.api.fetch_courses().await.expect("courses");
    assert_eq!(harness.persisted_refresh().as_deref(), Some("r2"));
}

#[tokio::test]
async fn non_401_errors_pass_through_without_refresh() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/lessons/404/"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "detail": "Not found." })))
        .expect(1)
        .mount(&server)
        .await;
    mount_refresh(&server, "r1", 200, 0).await;

    let harness = Harness::new(&server);
    harness.seed(Some("a1"), Some("r1"));

    let result = harness.api.fetch_lesson(404).await;
    assert!(matches!(result, Err(ApiError::NotFound(body)) if body.contains("Not found")));
    assert_eq!(harness.auth.tokens.access().as_deref(), Some("a1"));
}

#[tokio::test]
async fn transport_failure_is_not_retried_and_keeps_session() {
    let auth = AuthContext::in_memory();
    auth.tokens.set_access(Some("a1".to_string()));
    auth.tokens.set_refresh(Some("r1"));
    let count = std::sync::Arc::new(std::sync::atomic::AtomicUsize::new(0));
    let inner = count.clone();
    auth.notifier.register(std::sync::Arc::new(move || {
        inner.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
    }));

    // Nothing listens on the discard port
    let api = ApiClient::new("http://127.0.0.1:9", auth.clone()).expect("client");
    let result = api.fetch_courses().await;

    assert!(matches!(result, Err(ref e) if e.is_transport()));
    assert_eq!(fired(&count), 0);
    assert_eq!(auth.tokens.access().as_deref(), Some("a1"));
    assert_eq!(auth.tokens.refresh().as_deref(), Some("r1"));
}

#[tokio::test]
async fn concurrent_401s_refresh_independently_by_default() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/courses/"))
        .and(header("authorization", "Bearer stale"))
        .respond_with(ResponseTemplate::new(401).set_delay(Duration::from_millis(100)))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/courses/"))
        .and(header("authorization", "Bearer fresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(2)
        .mount(&server)
        .await;
    mount_refresh(&server, "r1", 200, 2).await;

    let harness = Harness::new(&server);
    harness.seed(Some("stale"), Some("r1"));

    let (first, second) =
        futures::future::join(harness.api.fetch_courses(), harness.api.fetch_courses()).await;
    assert!(first.is_ok());
    assert!(second.is_ok());
}

#[tokio::test]
async fn single_flight_shares_one_refresh_between_concurrent_401s() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/courses/"))
        .and(header("authorization", "Bearer stale"))
        .respond_with(ResponseTemplate::new(401).set_delay(Duration::from_millis(100)))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/courses/"))
        .and(header("authorization", "Bearer fresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(2)
        .mount(&server)
        .await;
    mount_refresh(&server, "r1", 200, 1).await;

    let options = ClientOptions {
        single_flight_refresh: true,
        ..ClientOptions::default()
    };
    let harness = Harness::with_options(&server, options);
    harness.seed(Some("stale"), Some("r1"));

    let (first, second) =
        futures::future::join(harness.api.fetch_courses(), harness.api.fetch_courses()).await;
    assert!(first.is_ok());
    assert!(second.is_ok());
}

#[tokio::test]
async fn refresh_transport_failure_keeps_session_and_does_not_notify() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/me/enrollments/"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    // Answers long after the client has given up
    Mock::given(method("POST"))
        .and(path("/auth/refresh/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "access": "fresh" }))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let options = ClientOptions {
        timeout: Duration::from_millis(300),
        ..ClientOptions::default()
    };
    let harness = Harness::with_options(&server, options);
    harness.seed(Some("stale"), Some("r1"));
    let unauthorized = harness.count_unauthorized();

    let result = harness.api.fetch_enrollments().await;

    assert!(matches!(result, Err(ref e) if e.is_transport()));
    assert_eq!(harness.auth.tokens.access().as_deref(), Some("stale"));
    assert_eq!(harness.persisted_refresh().as_deref(), Some("r1"));
    assert_eq!(fired(&unauthorized), 0);
}

#[tokio::test]
async fn replayed_post_resends_its_body() {
    let server = MockServer::start().await;
    let body = json!({ "problem_id": 3, "answer": "1/2" });
    Mock::given(method("POST"))
        .and(path("/attempts/submit/"))
        .and(header("authorization", "Bearer stale"))
        .and(body_json(body.clone()))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/attempts/submit/"))
        .and(header("authorization", "Bearer fresh"))
        .and(body_json(body))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "attempt_id": 5,
            "is_correct": false,
            "awarded_points": 0,
            "lesson_progress": 0,
            "course_progress": 10,
            "correct_answer_if_wrong": "1"
        })))
        .expect(1)
        .mount(&server)
        .await;
    mount_refresh(&server, "r1", 200, 1).await;

    let harness = Harness::new(&server);
    harness.seed(Some("stale"), Some("r1"));

    let result = harness.api.submit_attempt(3, "1/2").await.expect("replayed submit");
    assert_eq!(result.correct_answer_if_wrong.as_deref(), Some("1"));
}
