//! Integration Tests for API Endpoints
//!
//! Tests full request/response cycle for each endpoint against a store in a
//! temporary directory.

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use filecache::cache::{CacheFile, CacheStore, ManualClock, Never};
use filecache::{api::create_router, AppState, Config};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

const NOW: i64 = 1_700_000_000;

// == Helper Functions ==

struct TestApp {
    app: Router,
    clock: ManualClock,
    root: std::path::PathBuf,
    _dir: TempDir,
}

fn create_test_app() -> TestApp {
    let dir = TempDir::new().unwrap();
    let clock = ManualClock::new(NOW);
    let cache = CacheStore::open(&Config::with_root(dir.path()))
        .unwrap()
        .with_trigger(Never)
        .with_clock(clock.clone());
    let root = cache.root().to_path_buf();
    TestApp {
        app: create_router(AppState::new(cache)),
        clock,
        root,
        _dir: dir,
    }
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn put_json(app: &Router, body: &str) -> StatusCode {
    app.clone()
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/set")
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap()
        .status()
}

async fn get_key(app: &Router, key: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri(format!("/get/{key}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    (status, body_to_json(response.into_body()).await)
}

// == SET Endpoint Tests ==

#[tokio::test]
async fn test_set_endpoint_success() {
    let test = create_test_app();

    let response = test
        .app
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/set")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"key":"test_key","value":"test_value"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = body_to_json(response.into_body()).await;
    assert!(json["message"].as_str().unwrap().contains("test_key"));
}

#[tokio::test]
async fn test_set_endpoint_writes_shard_file() {
    let test = create_test_app();

    let status = put_json(&test.app, r#"{"key":"123456789","value":[1,2,3],"ttl":60}"#).await;
    assert_eq!(status, StatusCode::OK);

    // hash("123456789") == 52212 -> directory 12, bucket 2212
    let bytes = std::fs::read(test.root.join("12").join("2212")).unwrap();
    let file = CacheFile::decode(&bytes);
    let entry = file.get("123456789").unwrap();
    assert_eq!(entry.value, json!([1, 2, 3]));
    assert_eq!(entry.expires_at, NOW + 60);
}

#[tokio::test]
async fn test_set_endpoint_default_ttl() {
    let test = create_test_app();

    put_json(&test.app, r#"{"key":"forever","value":true}"#).await;

    // still there eleven months later
    test.clock.advance(11 * 30 * 24 * 3600);
    let (status, json) = get_key(&test.app, "forever").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["value"], json!(true));
}

// == GET Endpoint Tests ==

#[tokio::test]
async fn test_get_endpoint_success() {
    let test = create_test_app();

    let status = put_json(
        &test.app,
        r#"{"key":"get_key","value":{"name":"ada","langs":["en","fr"]}}"#,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, json) = get_key(&test.app, "get_key").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["key"].as_str().unwrap(), "get_key");
    assert_eq!(json["value"], json!({"name": "ada", "langs": ["en", "fr"]}));
}

#[tokio::test]
async fn test_get_endpoint_not_found() {
    let test = create_test_app();

    let (status, json) = get_key(&test.app, "nonexistent_key").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(json.get("error").is_some());
}

// == DELETE Endpoint Tests ==

#[tokio::test]
async fn test_delete_endpoint_success() {
    let test = create_test_app();

    put_json(&test.app, r#"{"key":"delete_key","value":"v"}"#).await;

    let response = test
        .app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/del/delete_key")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let (status, _) = get_key(&test.app, "delete_key").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_endpoint_absent_key() {
    let test = create_test_app();

    let response = test
        .app
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/del/never_set")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

// == GC Endpoint Tests ==

#[tokio::test]
async fn test_gc_endpoint_removes_expired_files() {
    let test = create_test_app();

    put_json(&test.app, r#"{"key":"brief","value":1,"ttl":5}"#).await;
    put_json(&test.app, r#"{"key":"lasting","value":2,"ttl":3600}"#).await;
    test.clock.advance(10);

    let response = test
        .app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/gc")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["removed"], json!(1));

    let (status, _) = get_key(&test.app, "lasting").await;
    assert_eq!(status, StatusCode::OK);
}

// == STATS Endpoint Tests ==

#[tokio::test]
async fn test_stats_endpoint() {
    let test = create_test_app();

    put_json(&test.app, r#"{"key":"k","value":"v"}"#).await;
    get_key(&test.app, "k").await;
    get_key(&test.app, "missing").await;

    let response = test
        .app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/stats")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["hits"], json!(1));
    assert_eq!(json["misses"], json!(1));
    assert_eq!(json["writes"], json!(1));
    assert_eq!(json["hit_rate"], json!(0.5));
}

// == HEALTH Endpoint Tests ==

#[tokio::test]
async fn test_health_endpoint() {
    let test = create_test_app();

    let response = test
        .app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["status"], "healthy");
}

// == Error Response Tests ==

#[tokio::test]
async fn test_invalid_json_request() {
    let test = create_test_app();

    let status = put_json(&test.app, r#"{"invalid json"#).await;

    // Axum returns 400 or 422 for JSON body errors
    assert!(status == StatusCode::BAD_REQUEST || status == StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_empty_key_request() {
    let test = create_test_app();

    let response = test
        .app
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/set")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"key":"","value":"test"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_to_json(response.into_body()).await;
    assert!(json.get("error").is_some());
}

// == TTL Expiration via API Tests ==

#[tokio::test]
async fn test_ttl_expiration_via_api() {
    let test = create_test_app();

    let status = put_json(
        &test.app,
        r#"{"key":"ttl_test","value":"expires_soon","ttl":1}"#,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = get_key(&test.app, "ttl_test").await;
    assert_eq!(status, StatusCode::OK);

    test.clock.advance(2);

    let (status, _) = get_key(&test.app, "ttl_test").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
