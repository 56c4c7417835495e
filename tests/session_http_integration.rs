//! Integration tests for the session HTTP endpoints.
//!
//! These tests drive the full router (middleware included) against the
//! in-memory table and a manual clock:
//! 1. Create / read / bulk delete round trips
//! 2. Expiry observed through the clock before the backend reclaims items
//! 3. Validation, conflict and storage failure status codes

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::Router;
use http::{header, Method, Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use session_store::adapters::{InMemorySessionTable, ManualClock, RandomSessionIdGenerator};
use session_store::config::AppConfig;
use session_store::domain::foundation::{SessionId, Timestamp, Username};
use session_store::domain::session::Session;
use session_store::ports::{IndexEntry, PutOutcome, SessionTable, TableError};
use session_store::{build_router, AppDependencies};

// =============================================================================
// Test Infrastructure
// =============================================================================

const NOW: i64 = 1_700_000_000;

struct TestApp {
    router: Router,
    table: InMemorySessionTable,
    clock: Arc<ManualClock>,
}

impl TestApp {
    fn new() -> Self {
        let table = InMemorySessionTable::new();
        let clock = Arc::new(ManualClock::at_unix_secs(NOW));
        let router = build_router(
            AppDependencies {
                table: Arc::new(table.clone()),
                clock: clock.clone(),
                id_generator: Arc::new(RandomSessionIdGenerator),
            },
            &AppConfig::default(),
        );
        Self {
            router,
            table,
            clock,
        }
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    async fn post_json(&self, body: Value) -> (StatusCode, Value) {
        self.send(
            Request::builder()
                .method(Method::POST)
                .uri("/sessions")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
    }

    async fn delete(&self, uri: &str) -> (StatusCode, Value) {
        self.send(
            Request::builder()
                .method(Method::DELETE)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }
}

/// Table that reports every call as a backend outage.
struct DownTable;

#[async_trait]
impl SessionTable for DownTable {
    async fn put_if_absent(&self, _: &Session, _: Timestamp) -> Result<PutOutcome, TableError> {
        Err(TableError::Unavailable("connection refused".to_string()))
    }

    async fn get(&self, _: &SessionId) -> Result<Option<Session>, TableError> {
        Err(TableError::Unavailable("connection refused".to_string()))
    }

    async fn query_by_username(&self, _: &Username) -> Result<Vec<IndexEntry>, TableError> {
        Err(TableError::Unavailable("connection refused".to_string()))
    }

    async fn delete(&self, _: &Username, _: &SessionId) -> Result<bool, TableError> {
        Err(TableError::Unavailable("connection refused".to_string()))
    }

    async fn ping(&self) -> Result<(), TableError> {
        Err(TableError::Unavailable("connection refused".to_string()))
    }
}

/// Table whose reads outlive any storage deadline.
struct SlowTable;

#[async_trait]
impl SessionTable for SlowTable {
    async fn put_if_absent(&self, _: &Session, _: Timestamp) -> Result<PutOutcome, TableError> {
        tokio::time::sleep(Duration::from_secs(10)).await;
        Ok(PutOutcome::Created)
    }

    async fn get(&self, _: &SessionId) -> Result<Option<Session>, TableError> {
        tokio::time::sleep(Duration::from_secs(10)).await;
        Ok(None)
    }

    async fn query_by_username(&self, _: &Username) -> Result<Vec<IndexEntry>, TableError> {
        Ok(vec![])
    }

    async fn delete(&self, _: &Username, _: &SessionId) -> Result<bool, TableError> {
        Ok(false)
    }

    async fn ping(&self) -> Result<(), TableError> {
        Ok(())
    }
}

fn router_over(table: Arc<dyn SessionTable>, config: &AppConfig) -> Router {
    build_router(
        AppDependencies {
            table,
            clock: Arc::new(ManualClock::at_unix_secs(NOW)),
            id_generator: Arc::new(RandomSessionIdGenerator),
        },
        config,
    )
}

// =============================================================================
// Round trips
// =============================================================================

#[tokio::test]
async fn create_get_delete_scenario() {
    let app = TestApp::new();

    let (status, created) = app
        .post_json(json!({"username": "alice", "payload": "p1", "ttlSeconds": 3600}))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = created["sessionId"].as_str().unwrap().to_string();
    assert!(!id.is_empty());
    assert_eq!(created["expiresAt"], NOW + 3600);
    assert_eq!(created["createdAt"], NOW);

    let (status, fetched) = app.get(&format!("/sessions/{}", id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, created);

    let (status, deleted) = app.delete("/sessions/alice").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deleted, json!({"username": "alice", "deletedCount": 1}));

    let (status, body) = app.get(&format!("/sessions/{}", id)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn get_by_query_parameter_and_bearer_token() {
    let app = TestApp::new();
    let (_, created) = app
        .post_json(json!({"username": "alice", "payload": "p1", "sessionId": "known-id"}))
        .await;

    let (status, by_query) = app.get("/sessions?id=known-id").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(by_query, created);

    let (status, by_bearer) = app
        .send(
            Request::builder()
                .uri("/sessions")
                .header(header::AUTHORIZATION, "Bearer known-id")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(by_bearer, created);
}

#[tokio::test]
async fn get_without_any_id_is_bad_request() {
    let app = TestApp::new();
    let (status, body) = app.get("/sessions").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn get_unknown_id_is_not_found_without_side_effects() {
    let app = TestApp::new();
    let (status, _) = app.get("/sessions/nonexistent-id").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(app.table.is_empty().await);
}

#[tokio::test]
async fn expired_session_is_not_found_before_reclaim() {
    let app = TestApp::new();
    let (_, created) = app
        .post_json(json!({"username": "alice", "payload": "p1", "ttlSeconds": 60}))
        .await;
    let id = created["sessionId"].as_str().unwrap().to_string();

    app.clock.advance_secs(59);
    let (status, _) = app.get(&format!("/sessions/{}", id)).await;
    assert_eq!(status, StatusCode::OK);

    app.clock.advance_secs(1);
    let (status, _) = app.get(&format!("/sessions/{}", id)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(app.table.len().await, 1);
}

#[tokio::test]
async fn delete_all_leaves_other_users_untouched() {
    let app = TestApp::new();
    let mut alice_ids = Vec::new();
    for payload in ["a", "b", "c"] {
        let (_, body) = app
            .post_json(json!({"username": "alice", "payload": payload}))
            .await;
        alice_ids.push(body["sessionId"].as_str().unwrap().to_string());
    }
    let (_, bob) = app.post_json(json!({"username": "bob", "payload": "x"})).await;

    let (status, deleted) = app.delete("/sessions/alice").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deleted["deletedCount"], 3);

    for id in alice_ids {
        let (status, _) = app.get(&format!("/sessions/{}", id)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
    let (status, _) = app
        .get(&format!("/sessions/{}", bob["sessionId"].as_str().unwrap()))
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn delete_for_unknown_user_returns_zero() {
    let app = TestApp::new();
    let (status, body) = app.delete("/sessions/nobody").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"username": "nobody", "deletedCount": 0}));
}

#[tokio::test]
async fn delete_decodes_percent_encoded_username() {
    let app = TestApp::new();
    app.post_json(json!({"username": "alice smith", "payload": "p"}))
        .await;

    let (status, body) = app.delete("/sessions/alice%20smith").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deletedCount"], 1);
}

// =============================================================================
// Validation and conflicts
// =============================================================================

#[tokio::test]
async fn create_without_username_is_rejected_and_writes_nothing() {
    let app = TestApp::new();
    let (status, body) = app.post_json(json!({"payload": "p1"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "BAD_REQUEST");
    assert!(app.table.is_empty().await);
}

#[tokio::test]
async fn create_with_malformed_json_is_bad_request() {
    let app = TestApp::new();
    let (status, body) = app
        .send(
            Request::builder()
                .method(Method::POST)
                .uri("/sessions")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn create_with_both_expiry_forms_is_bad_request() {
    let app = TestApp::new();
    let (status, _) = app
        .post_json(json!({
            "username": "alice",
            "payload": "p1",
            "ttlSeconds": 60,
            "expiresAt": NOW + 60
        }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn create_with_past_expiry_is_bad_request() {
    let app = TestApp::new();
    let (status, _) = app
        .post_json(json!({"username": "alice", "payload": "p1", "expiresAt": NOW - 10}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(app.table.is_empty().await);
}

#[tokio::test]
async fn supplied_id_collision_is_conflict() {
    let app = TestApp::new();
    let request = json!({"username": "alice", "payload": "p1", "sessionId": "fixed"});

    let (status, _) = app.post_json(request.clone()).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app.post_json(request).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");
}

#[tokio::test]
async fn supplied_id_of_expired_session_can_be_reused() {
    let app = TestApp::new();
    let request = json!({"username": "alice", "payload": "p1", "sessionId": "fixed", "ttlSeconds": 10});

    app.post_json(request.clone()).await;
    app.clock.advance_secs(10);

    let (status, body) = app.post_json(request).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["createdAt"], NOW + 10);
}

// =============================================================================
// Concurrency
// =============================================================================

#[tokio::test]
async fn concurrent_creates_for_one_user_get_distinct_ids() {
    let app = Arc::new(TestApp::new());

    let tasks: Vec<_> = (0..16)
        .map(|i| {
            let app = app.clone();
            tokio::spawn(async move {
                app.post_json(json!({"username": "alice", "payload": format!("p{}", i)}))
                    .await
            })
        })
        .collect();

    let mut ids = std::collections::HashSet::new();
    for task in tasks {
        let (status, body) = task.await.unwrap();
        assert_eq!(status, StatusCode::CREATED);
        ids.insert(body["sessionId"].as_str().unwrap().to_string());
    }
    assert_eq!(ids.len(), 16);

    for id in &ids {
        let (status, _) = app.get(&format!("/sessions/{}", id)).await;
        assert_eq!(status, StatusCode::OK);
    }
}

// =============================================================================
// Infrastructure failures and surface
// =============================================================================

#[tokio::test]
async fn storage_outage_maps_to_service_unavailable() {
    let router = router_over(Arc::new(DownTable), &AppConfig::default());

    let response = router
        .clone()
        .oneshot(Request::builder().uri("/sessions/s1").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let response = router
        .oneshot(
            Request::builder()
                .method(Method::DELETE)
                .uri("/sessions/alice")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn slow_storage_times_out_as_service_unavailable() {
    let mut config = AppConfig::default();
    config.storage.timeout_ms = 25;
    let router = router_over(Arc::new(SlowTable), &config);

    let response = router
        .oneshot(Request::builder().uri("/sessions/s1").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn health_reflects_backend_reachability() {
    let app = TestApp::new();
    let (status, body) = app.get("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));

    let router = router_over(Arc::new(DownTable), &AppConfig::default());
    let response = router
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn unknown_route_is_json_not_found() {
    let app = TestApp::new();
    let (status, body) = app.get("/nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn responses_carry_request_id() {
    let app = TestApp::new();
    let response = app
        .router
        .clone()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert!(response.headers().contains_key("x-request-id"));
}
