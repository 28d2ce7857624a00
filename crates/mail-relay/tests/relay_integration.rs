//! Integration tests for the relay.
//!
//! Each test starts a fake upstream API and a relay pointing at it, both on
//! ephemeral local ports, and drives the relay over real HTTP.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::body::Bytes;
use axum::extract::State;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderMap, HeaderName, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use mail_relay::RelayConfig;
use serde_json::json;
use tokio::net::TcpListener;

/// A request as seen by the fake upstream.
#[derive(Debug, Clone)]
struct Recorded {
    method: Method,
    path: String,
    authorization: Option<String>,
    content_type: Option<String>,
    body: Vec<u8>,
}

#[derive(Clone, Default)]
struct Recorder(Arc<Mutex<Vec<Recorded>>>);

impl Recorder {
    fn last(&self) -> Recorded {
        self.0.lock().unwrap().last().cloned().expect("no upstream request")
    }

    fn count(&self) -> usize {
        self.0.lock().unwrap().len()
    }
}

async fn fake_upstream(
    State(recorder): State<Recorder>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let header = |name: HeaderName| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    recorder.0.lock().unwrap().push(Recorded {
        method: method.clone(),
        path: uri.path().to_string(),
        authorization: header(AUTHORIZATION),
        content_type: header(CONTENT_TYPE),
        body: body.to_vec(),
    });

    match (method.as_str(), uri.path()) {
        ("GET", "/domains") => Json(json!({
            "hydra:member": [{"id": "d1", "domain": "test.dev", "isActive": true}]
        }))
        .into_response(),
        ("POST", "/accounts") => (
            StatusCode::CREATED,
            [(CONTENT_TYPE, "application/json")],
            body,
        )
            .into_response(),
        ("POST", "/token") => Json(json!({"id": "acc1", "token": "tok-123"})).into_response(),
        ("GET", "/messages") => Json(json!({"hydra:member": []})).into_response(),
        ("GET", "/messages/x") => {
            (StatusCode::NOT_FOUND, Json(json!({"message": "not found"}))).into_response()
        }
        ("DELETE", "/messages/x") => {
            (StatusCode::NO_CONTENT, [(CONTENT_TYPE, "application/json")]).into_response()
        }
        ("GET", "/messages/plain") => (
            StatusCode::BAD_GATEWAY,
            [(CONTENT_TYPE, "text/html")],
            "<html>upstream down</html>",
        )
            .into_response(),
        ("GET", "/messages/broken") => (
            StatusCode::OK,
            [(CONTENT_TYPE, "application/json")],
            "{\"id\": ",
        )
            .into_response(),
        ("GET", "/messages/empty") => StatusCode::OK.into_response(),
        _ => (StatusCode::NOT_FOUND, "no such route").into_response(),
    }
}

async fn serve(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// Start a fake upstream and a relay in front of it; returns the relay base URL.
async fn start() -> (String, Recorder) {
    let recorder = Recorder::default();
    let upstream = Router::new()
        .fallback(fake_upstream)
        .with_state(recorder.clone());
    let upstream_addr = serve(upstream).await;

    let config = RelayConfig::new(format!("http://{}", upstream_addr))
        .with_service_name("test-relay");
    let relay_addr = serve(mail_relay::app(&config).unwrap()).await;

    (format!("http://{}", relay_addr), recorder)
}

// ============================================================================
// Route table
// ============================================================================

#[tokio::test]
async fn test_health_on_both_prefixes() {
    let (base, recorder) = start().await;

    for path in ["/health", "/api/health"] {
        let resp = reqwest::get(format!("{}{}", base, path)).await.unwrap();
        assert_eq!(resp.status(), 200);
        let body: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(body, json!({"status": "ok", "service": "test-relay"}));
    }

    assert_eq!(recorder.count(), 0);
}

#[tokio::test]
async fn test_domains_on_both_prefixes() {
    let (base, recorder) = start().await;

    for path in ["/domains", "/api/domains"] {
        let resp = reqwest::get(format!("{}{}", base, path)).await.unwrap();
        assert_eq!(resp.status(), 200);
        let body: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(body["hydra:member"][0]["domain"], "test.dev");

        let seen = recorder.last();
        assert_eq!(seen.method, Method::GET);
        assert_eq!(seen.path, "/domains");
        assert_eq!(seen.content_type.as_deref(), Some("application/json"));
    }
}

#[tokio::test]
async fn test_unknown_route_is_not_forwarded() {
    let (base, recorder) = start().await;

    let resp = reqwest::get(format!("{}/api/unknown", base)).await.unwrap();
    assert_eq!(resp.status(), 404);
    assert_eq!(recorder.count(), 0);
}

// ============================================================================
// Request forwarding
// ============================================================================

#[tokio::test]
async fn test_post_forwards_serialized_body() {
    let (base, recorder) = start().await;
    let input = json!({"address": "abc@test.dev", "password": "secret"});

    let resp = reqwest::Client::new()
        .post(format!("{}/api/accounts", base))
        .json(&input)
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 201);
    let echoed: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(echoed, input);

    let seen = recorder.last();
    assert_eq!(seen.method, Method::POST);
    assert_eq!(seen.path, "/accounts");
    assert_eq!(seen.body, serde_json::to_vec(&input).unwrap());
    assert_eq!(seen.content_type.as_deref(), Some("application/json"));
}

#[tokio::test]
async fn test_post_body_forwarded_byte_for_byte() {
    let (base, recorder) = start().await;
    let input = r#"{"password":"pw", "address":"a@test.dev"}"#;

    let resp = reqwest::Client::new()
        .post(format!("{}/api/accounts", base))
        .header(CONTENT_TYPE, "application/json")
        .body(input)
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 201);
    assert_eq!(recorder.last().body, input.as_bytes());
}

#[tokio::test]
async fn test_token_request() {
    let (base, _recorder) = start().await;

    let resp = reqwest::Client::new()
        .post(format!("{}/token", base))
        .json(&json!({"address": "abc@test.dev", "password": "secret"}))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["token"], "tok-123");
}

#[tokio::test]
async fn test_invalid_json_body_rejected() {
    let (base, recorder) = start().await;

    let resp = reqwest::Client::new()
        .post(format!("{}/api/accounts", base))
        .header(CONTENT_TYPE, "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 400);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Invalid JSON body");
    assert_eq!(recorder.count(), 0);
}

#[tokio::test]
async fn test_bearer_forwarded() {
    let (base, recorder) = start().await;

    let resp = reqwest::Client::new()
        .get(format!("{}/api/messages", base))
        .bearer_auth("tok-123")
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    assert_eq!(
        recorder.last().authorization.as_deref(),
        Some("Bearer tok-123")
    );
}

#[tokio::test]
async fn test_missing_bearer_not_invented() {
    let (base, recorder) = start().await;

    reqwest::get(format!("{}/messages", base)).await.unwrap();
    assert!(recorder.last().authorization.is_none());
}

#[tokio::test]
async fn test_delete_drops_body() {
    let (base, recorder) = start().await;

    let resp = reqwest::Client::new()
        .delete(format!("{}/api/messages/x", base))
        .bearer_auth("tok-123")
        .header(CONTENT_TYPE, "application/json")
        .body("{\"ignored\":true}")
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 204);
    assert!(resp.bytes().await.unwrap().is_empty());

    let seen = recorder.last();
    assert_eq!(seen.method, Method::DELETE);
    assert_eq!(seen.path, "/messages/x");
    assert!(seen.body.is_empty());
}

#[tokio::test]
async fn test_get_drops_body() {
    let (base, recorder) = start().await;

    let resp = reqwest::Client::new()
        .get(format!("{}/api/messages/x", base))
        .bearer_auth("tok-123")
        .header(CONTENT_TYPE, "application/json")
        .body("{\"ignored\":true}")
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 404);

    let seen = recorder.last();
    assert_eq!(seen.method, Method::GET);
    assert_eq!(seen.path, "/messages/x");
    assert!(seen.body.is_empty());
}

// ============================================================================
// Response adaptation
// ============================================================================

#[tokio::test]
async fn test_upstream_error_json_passed_through() {
    let (base, _recorder) = start().await;

    let resp = reqwest::Client::new()
        .get(format!("{}/api/messages/x", base))
        .bearer_auth("tok-123")
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 404);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body, json!({"message": "not found"}));
}

#[tokio::test]
async fn test_non_json_body_passed_verbatim() {
    let (base, _recorder) = start().await;

    let resp = reqwest::get(format!("{}/messages/plain", base)).await.unwrap();
    assert_eq!(resp.status(), 502);
    assert_eq!(
        resp.bytes().await.unwrap().as_ref(),
        b"<html>upstream down</html>"
    );
}

#[tokio::test]
async fn test_broken_json_passed_verbatim() {
    let (base, _recorder) = start().await;

    let resp = reqwest::get(format!("{}/messages/broken", base)).await.unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.bytes().await.unwrap().as_ref(), b"{\"id\": ");
}

#[tokio::test]
async fn test_empty_body_passed_as_text() {
    let (base, _recorder) = start().await;

    let resp = reqwest::get(format!("{}/messages/empty", base)).await.unwrap();
    assert_eq!(resp.status(), 200);
    assert!(resp.bytes().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_unreachable_upstream_is_500() {
    // Reserve a port, then free it so nothing is listening there.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let dead_addr = listener.local_addr().unwrap();
    drop(listener);

    let config = RelayConfig::new(format!("http://{}", dead_addr));
    let relay_addr = serve(mail_relay::app(&config).unwrap()).await;

    let resp = reqwest::get(format!("http://{}/api/domains", relay_addr))
        .await
        .unwrap();
    assert_eq!(resp.status(), 500);

    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Failed to reach upstream API");
    assert!(!body["details"].as_str().unwrap_or_default().is_empty());
}
