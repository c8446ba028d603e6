//! HTTP surface tests, driven through the router without a socket

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{header, Request, StatusCode},
    Router,
};
use blinkguard::api::{create_router, AppState};
use blinkguard::{GuardConfig, RegistryStore, TelemetryCollector};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

const ADMIN_KEY: &str = "test-admin-key";

fn app_with(dir: &TempDir, admin_key: Option<&str>, rate_limit: u32) -> Router {
    let config = GuardConfig {
        registry_path: dir.path().join("registry.json"),
        admin_key: admin_key.map(str::to_string),
        rate_limit_per_minute: rate_limit,
        ..GuardConfig::default()
    };
    let store = Arc::new(RegistryStore::open(&config.registry_path).unwrap());
    let state = Arc::new(AppState::new(
        &config,
        store,
        Arc::new(TelemetryCollector::new()),
    ));
    create_router(state, config.max_concurrency)
}

fn app(dir: &TempDir) -> Router {
    app_with(dir, Some(ADMIN_KEY), 100)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn verify_request(url: &str, key: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/registry/verify")
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(key) = key {
        builder = builder.header("x-admin-key", key);
    }
    builder
        .body(Body::from(json!({ "url": url, "verified": true }).to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_health() {
    let dir = TempDir::new().unwrap();
    let app = app(&dir);

    let response = app.clone().oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));

    let (_, body) = send(&app, get("/health")).await;
    assert_eq!(body["status"], "ok");
    assert!(body["timestamp"].as_i64().unwrap() > 0);
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_analyze_drainer() {
    let dir = TempDir::new().unwrap();
    let app = app(&dir);

    let (status, body) = send(
        &app,
        post_json(
            "/analyze",
            json!({
                "transactionData": {
                    "success": true,
                    "logs": [],
                    "balanceChanges": [
                        {"account": "A", "preBalance": 1000, "postBalance": 50, "change": -950}
                    ]
                },
                "domain": "jup.ag"
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["level"], "caution");
    assert_eq!(body["score"], 50);
    assert_eq!(body["flags"][0]["type"], "drainer");
    assert_eq!(body["flags"][0]["severity"], "critical");
    assert_eq!(body["transactionSimulation"]["balanceChanges"][0]["change"], -950);
}

#[tokio::test]
async fn test_analyze_defaults_domain_to_unknown() {
    let dir = TempDir::new().unwrap();
    let app = app(&dir);

    let (status, body) = send(
        &app,
        post_json("/analyze", json!({ "transactionData": { "success": true } })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["score"], 95);
    assert_eq!(body["flags"][0]["type"], "domain_risk");
    assert_eq!(
        body["flags"][0]["description"],
        "Domain unknown has limited trust signals"
    );

    let (status, body) = send(
        &app,
        post_json("/analyze", json!({ "transactionData": {}, "domain": "jup.ag" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["score"], 100);
    assert_eq!(body["level"], "safe");
}

#[tokio::test]
async fn test_analyze_bad_requests() {
    let dir = TempDir::new().unwrap();
    let app = app(&dir);

    let (status, body) = send(&app, post_json("/analyze", json!({ "domain": "jup.ag" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "API_BAD_REQUEST");

    let (status, _) = send(
        &app,
        post_json("/analyze", json!({ "transactionData": "not an object" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let malformed = Request::builder()
        .method("POST")
        .uri("/analyze")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, _) = send(&app, malformed).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        post_json(
            "/analyze",
            json!({
                "transactionData": {
                    "success": true,
                    "balanceChanges": [
                        {"account": "A", "preBalance": 1000, "postBalance": 50, "change": 7}
                    ]
                }
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_report_check_verify_flow() {
    let dir = TempDir::new().unwrap();
    let app = app(&dir);

    let (status, body) = send(
        &app,
        post_json(
            "/registry/report",
            json!({ "url": "http://evil.example/x", "reason": "phishing", "reportedBy": "user1" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["entry"]["domain"], "evil.example");
    assert_eq!(body["entry"]["verified"], false);
    assert!(body["entry"]["reportedAt"].as_i64().unwrap() > 0);

    // Unverified: neither exact nor domain match
    let (status, body) = send(&app, get("/registry/check?url=http://evil.example/y")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["isMalicious"], false);

    let (status, body) = send(&app, verify_request("http://evil.example/x", Some(ADMIN_KEY))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["updated"], true);

    let (_, body) = send(&app, get("/registry/check?url=http://evil.example/y")).await;
    assert_eq!(body["isMalicious"], true);
    assert_eq!(body["reason"], "phishing");
    assert_eq!(body["entry"]["url"], "http://evil.example/x");

    // Registry hit short-circuits analysis
    let (_, body) = send(
        &app,
        post_json(
            "/analyze",
            json!({
                "transactionData": { "success": true },
                "domain": "jup.ag",
                "url": "http://evil.example/x"
            }),
        ),
    )
    .await;
    assert_eq!(body["level"], "high_risk");
    assert_eq!(body["score"], 0);
    assert_eq!(body["reasons"][0], "Flagged as malicious: phishing");

    let (_, body) = send(&app, get("/registry/latest")).await;
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (_, body) = send(&app, get("/stats")).await;
    assert_eq!(body["registryEntries"], 1);
    assert_eq!(body["verifiedEntries"], 1);
    assert_eq!(body["reportsSubmitted"], 1);
    assert_eq!(body["registryHits"], 2);
}

#[tokio::test]
async fn test_re_report_cannot_clear_verification() {
    let dir = TempDir::new().unwrap();
    let app = app(&dir);
    let report = |by: &str| {
        post_json(
            "/registry/report",
            json!({ "url": "http://evil.example/x", "reason": "phishing", "reportedBy": by }),
        )
    };

    let (status, _) = send(&app, report("user1")).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, verify_request("http://evil.example/x", Some(ADMIN_KEY))).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, report("attacker")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["entry"]["verified"], true);
    assert_eq!(body["entry"]["reportedBy"], "attacker");

    let (_, body) = send(&app, get("/registry/check?url=http://evil.example/x")).await;
    assert_eq!(body["isMalicious"], true);

    let (_, body) = send(&app, get("/registry/latest")).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_report_validation() {
    let dir = TempDir::new().unwrap();
    let app = app(&dir);

    let (status, body) = send(
        &app,
        post_json("/registry/report", json!({ "url": "http://evil.example/x", "reason": "r" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing required field: reportedBy");

    let (status, _) = send(
        &app,
        post_json(
            "/registry/report",
            json!({ "url": "", "reason": "r", "reportedBy": "u" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        post_json(
            "/registry/report",
            json!({ "url": "not a url", "reason": "r", "reportedBy": "u" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = send(&app, get("/registry/latest")).await;
    assert!(body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_check_requires_url() {
    let dir = TempDir::new().unwrap();
    let app = app(&dir);

    let (status, _) = send(&app, get("/registry/check")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, get("/registry/check?url=")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_verify_requires_admin_key() {
    let dir = TempDir::new().unwrap();
    let app = app(&dir);

    let (status, body) = send(&app, verify_request("http://evil.example/x", None)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "API_FORBIDDEN");

    let (status, _) = send(&app, verify_request("http://evil.example/x", Some("wrong"))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&app, verify_request("http://missing.example/", Some(ADMIN_KEY))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["updated"], false);

    let disabled = app_with(&dir, None, 100);
    let (status, _) = send(&disabled, verify_request("http://evil.example/x", Some(ADMIN_KEY))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_rate_limit() {
    let dir = TempDir::new().unwrap();
    let app = app_with(&dir, None, 2);

    for _ in 0..2 {
        let (status, _) = send(&app, get("/registry/latest")).await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = send(&app, get("/registry/latest")).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["code"], "API_RATE_LIMITED");

    // Health is exempt
    let (status, _) = send(&app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
}

fn from_peer(uri: &str, peer: &str) -> Request<Body> {
    let mut request = get(uri);
    let addr: SocketAddr = peer.parse().unwrap();
    request.extensions_mut().insert(ConnectInfo(addr));
    request
}

#[tokio::test]
async fn test_rate_limit_is_per_peer() {
    let dir = TempDir::new().unwrap();
    let app = app_with(&dir, None, 1);

    let (status, _) = send(&app, from_peer("/registry/latest", "10.0.0.1:40000")).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, from_peer("/registry/latest", "10.0.0.1:40001")).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);

    // Another peer still has its own budget
    let (status, _) = send(&app, from_peer("/registry/latest", "10.0.0.2:40000")).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_closed_store_is_internal_error() {
    let dir = TempDir::new().unwrap();
    let config = GuardConfig {
        registry_path: dir.path().join("registry.json"),
        ..GuardConfig::default()
    };
    let store = Arc::new(RegistryStore::open(&config.registry_path).unwrap());
    let state = Arc::new(AppState::new(
        &config,
        store.clone(),
        Arc::new(TelemetryCollector::new()),
    ));
    let app = create_router(state, 16);
    store.close();

    let (status, body) = send(&app, get("/registry/latest")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["code"], "REGISTRY_CLOSED");
}
