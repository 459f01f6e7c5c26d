//! Shared application router builder.
//!
//! Provides [`build_app_router`] so both the production binary (`main.rs`)
//! and integration tests use the exact same middleware stack, and
//! [`with_response_pipeline`] for mounting application routes under the
//! uniform-response pipeline with custom policies.

use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderName, Method, StatusCode, Uri};
use axum::{middleware, Router};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::config::{ResponsePolicy, ServerConfig};
use crate::error::{self, AppError};
use crate::routes;
use crate::state::AppState;
use crate::wrap::{self, WrapPolicy};

/// Build the full application [`Router`] with default policies.
///
/// The print-error flag falls back to `false` when the deployment leaves
/// `PRINT_ERROR_DETAILS` unset, and no wrap escape hatch is installed.
pub fn build_app_router(state: AppState) -> Router {
    let policy = Arc::new(ResponsePolicy::from_config(&state.config, false));
    let router = Router::new().merge(routes::health::router());
    with_response_pipeline(router, state, policy, Arc::new(WrapPolicy::new()))
}

/// Mount the given routes under the uniform-response pipeline.
///
/// The middleware stack is applied bottom-up:
///
/// 1. CORS
/// 2. Set request ID on incoming requests
/// 3. Structured request/response tracing
/// 4. Propagate request ID to response
/// 5. Response interceptor (success wrapping)
/// 6. Request timeout
/// 7. Fault interpreter (fault → envelope + log policy)
/// 8. Panic recovery (catch panics, return the 500 envelope)
pub fn with_response_pipeline(
    router: Router<AppState>,
    state: AppState,
    policy: Arc<ResponsePolicy>,
    wrap_policy: Arc<WrapPolicy>,
) -> Router {
    let cors = build_cors_layer(&state.config);
    let request_id_header = HeaderName::from_static("x-request-id");
    let panic_policy = Arc::clone(&policy);

    router
        // Unmatched routes surface as a route-not-found fault.
        .fallback(not_found)
        // -- Middleware stack (applied bottom-up) --
        // Panic recovery: catch panics and return the 500 envelope.
        .layer(CatchPanicLayer::custom(
            move |err: Box<dyn Any + Send + 'static>| error::panic_response(&panic_policy, err),
        ))
        // Fault interpreter.
        .layer(middleware::from_fn_with_state(
            policy,
            error::interpret_faults,
        ))
        // Request timeout; the interceptor above it normalizes the 408.
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(state.config.request_timeout_secs),
        ))
        // Response interceptor.
        .layer(middleware::from_fn_with_state(
            wrap_policy,
            wrap::rewrap_response,
        ))
        // Propagate request ID to response.
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        // Structured request/response tracing.
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        // Set request ID on incoming requests.
        .layer(SetRequestIdLayer::new(request_id_header, MakeRequestUuid))
        // CORS.
        .layer(cors)
        // Shared state.
        .with_state(state)
}

/// Fallback handler for requests no route matched.
async fn not_found(method: Method, uri: Uri) -> AppError {
    AppError::NotFound(format!("no route configured for {method} {uri}"))
}

/// Build the CORS middleware layer from server configuration.
///
/// Panics at startup if any configured origin is invalid, which is the
/// desired behaviour -- we want misconfiguration to fail fast.
pub fn build_cors_layer(config: &ServerConfig) -> CorsLayer {
    let origins: Vec<_> = config
        .cors_origins
        .iter()
        .map(|o| {
            o.parse()
                .unwrap_or_else(|e| panic!("Invalid CORS origin '{o}': {e}"))
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::PATCH,
        ])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600))
}
