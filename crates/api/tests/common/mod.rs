//! Shared builders for integration tests.
//!
//! Mirrors the router construction in `main.rs` so tests exercise the same
//! middleware stack (CORS, request ID, tracing, timeout, wrapping, fault
//! interpretation, panic recovery) that production uses, with a set of
//! demo routes covering each response shape.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use manila_api::config::{FaultStatusMode, ResponsePolicy, ServerConfig};
use manila_api::error::AppResult;
use manila_api::response::EnvelopeResponse;
use manila_api::router::with_response_pipeline;
use manila_api::state::AppState;
use manila_api::wrap::WrapPolicy;
use manila_core::{BusinessCode, Envelope, Fault, HttpCode};

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        print_error_details: None,
        fault_status_mode: FaultStatusMode::Embedded,
    }
}

pub fn test_state() -> AppState {
    AppState {
        config: Arc::new(test_config()),
    }
}

/// Demo routes covering each response shape the pipeline must handle.
pub fn demo_router() -> Router<AppState> {
    Router::new()
        .route("/demo/object", get(object))
        .route("/demo/text", get(text))
        .route("/demo/unit", get(unit))
        .route("/demo/created", get(created))
        .route("/demo/envelope", get(stamped_envelope))
        .route("/demo/envelope-json", get(envelope_as_json))
        .route("/demo/bytes", get(bytes_download))
        .route("/demo/no-content", get(no_content))
        .route("/demo/echo", post(echo))
        .route("/demo/fault", get(business_fault))
        .route("/demo/forbidden", get(forbidden))
        .route("/demo/unexpected", get(unexpected))
        .route("/demo/panic", get(panics))
}

/// Full test application: demo routes + health, default policies.
pub fn build_test_app() -> Router {
    build_test_app_with(ResponsePolicy::default(), WrapPolicy::new())
}

/// Full test application with explicit policies.
pub fn build_test_app_with(policy: ResponsePolicy, wrap_policy: WrapPolicy) -> Router {
    let router = demo_router().merge(manila_api::routes::health::router());
    with_response_pipeline(
        router,
        test_state(),
        Arc::new(policy),
        Arc::new(wrap_policy),
    )
}

// --- Demo handlers -------------------------------------------------------

async fn object() -> Json<Value> {
    Json(json!({"id": 1}))
}

async fn text() -> &'static str {
    "ok"
}

async fn unit() {}

async fn created() -> (StatusCode, Json<Value>) {
    (StatusCode::CREATED, Json(json!({"id": 9})))
}

async fn stamped_envelope() -> EnvelopeResponse {
    Envelope::from_code(&HttpCode::Success, json!("framed")).into()
}

async fn envelope_as_json() -> Json<Envelope> {
    Json(Envelope::from_code(&HttpCode::Success, json!("framed")))
}

async fn bytes_download() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/octet-stream")],
        vec![1u8, 2, 3],
    )
}

async fn no_content() -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn echo(Json(body): Json<Value>) -> Json<Value> {
    Json(body)
}

async fn business_fault() -> AppResult<Json<Value>> {
    Err(Fault::new(4001, Some("insufficient balance".into()), Value::Null).into())
}

async fn forbidden() -> AppResult<Json<Value>> {
    Err(HttpCode::Forbidden.fault().into())
}

async fn unexpected() -> AppResult<Json<Value>> {
    Err(anyhow::anyhow!("connection reset by peer").into())
}

async fn panics() -> Json<Value> {
    panic!("boom: simulated handler defect");
}

// --- Request helpers -----------------------------------------------------

pub async fn get_path(app: Router, path: &str) -> Response {
    let request = Request::builder()
        .method(Method::GET)
        .uri(path)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_body(app: Router, path: &str, content_type: &str, body: &str) -> Response {
    let request = Request::builder()
        .method(Method::POST)
        .uri(path)
        .header(header::CONTENT_TYPE, content_type)
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn body_bytes(response: Response) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

pub async fn body_text(response: Response) -> String {
    String::from_utf8(body_bytes(response).await).unwrap()
}

pub async fn body_json(response: Response) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}
