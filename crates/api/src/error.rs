//! Fault interpretation: every fault class is converted into exactly one
//! envelope and at most one error-level log statement.
//!
//! Handlers return [`AppError`]; its `IntoResponse` renders a safe
//! (detail-suppressed) envelope immediately and stashes the fault in a
//! response extension. The [`interpret_faults`] middleware, constructed
//! with the deployment's [`ResponsePolicy`], re-renders stashed faults with
//! the resolved policy and applies the log policy. Panics are handled by
//! [`panic_response`] behind `tower_http::catch_panic`.

use std::any::Any;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Request, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use http_body_util::Full;
use manila_core::{BusinessCode, Envelope, Fault, HttpCode};
use serde_json::Value;

use crate::config::{FaultStatusMode, ResponsePolicy};
use crate::response::{envelope_response, EnvelopeStamp};

/// Application-level error type for HTTP handlers.
///
/// The three fault classes the interpreter distinguishes: business faults
/// raised by application logic, route-not-found, and anything uncaught.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// An application-raised fault carrying its ready-made envelope.
    #[error(transparent)]
    Fault(#[from] Fault),

    /// No handler matched the request; carries the detail string.
    #[error("route not configured: {0}")]
    NotFound(String),

    /// Any other uncaught fault. Always logged in full.
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

/// Response extension carrying a fault from `IntoResponse` to the
/// interpreter middleware. Type-keyed, so the key is reserved to this
/// crate.
#[derive(Debug, Clone)]
struct FaultStash(Arc<AppError>);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Safe rendering with detail suppressed; the interpreter layer
        // re-renders with the deployment policy and logs.
        let mut response = render(&ResponsePolicy::default(), &self);
        response.extensions_mut().insert(FaultStash(Arc::new(self)));
        response
    }
}

/// Middleware converting stashed faults with the resolved policy.
///
/// This is the single fault-processing entry point: handler errors, the
/// 404 fallback and extractor rejections that surface as [`AppError`] all
/// pass through here.
pub async fn interpret_faults(
    State(policy): State<Arc<ResponsePolicy>>,
    request: Request,
    next: Next,
) -> Response {
    let response = next.run(request).await;

    let Some(stash) = response.extensions().get::<FaultStash>() else {
        return response;
    };
    let error = Arc::clone(&stash.0);

    log_fault(&policy, &error);
    render(&policy, &error)
}

/// Build the envelope response for a fault under the given policy.
fn render(policy: &ResponsePolicy, error: &AppError) -> Response {
    let (status, envelope) = interpret(policy, error);
    envelope_response(status, &envelope)
}

/// Map a fault to its transport status and envelope under the given policy.
fn interpret(policy: &ResponsePolicy, error: &AppError) -> (StatusCode, Envelope) {
    match error {
        AppError::Fault(fault) => (business_status(policy, fault), fault.envelope().clone()),
        AppError::NotFound(detail) => (
            StatusCode::NOT_FOUND,
            Envelope::new(
                HttpCode::PageNotFound.code(),
                policy.print_error().then(|| detail.clone()),
                Value::Null,
            ),
        ),
        AppError::Unexpected(err) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Envelope::new(
                HttpCode::InternalServerError.code(),
                policy.print_error().then(|| err.to_string()),
                Value::Null,
            ),
        ),
    }
}

/// Transport status for a business fault under the configured mode.
fn business_status(policy: &ResponsePolicy, fault: &Fault) -> StatusCode {
    match policy.fault_status() {
        FaultStatusMode::Embedded => StatusCode::OK,
        FaultStatusMode::Mirror => u16::try_from(fault.envelope().code())
            .ok()
            .and_then(|code| StatusCode::from_u16(code).ok())
            .unwrap_or(StatusCode::OK),
    }
}

fn log_fault(policy: &ResponsePolicy, error: &AppError) {
    match error {
        AppError::Fault(fault) => {
            let envelope = fault.envelope();
            if policy.print_error() {
                tracing::error!(
                    code = envelope.code(),
                    message = ?envelope.message(),
                    detail = ?fault,
                    "business fault"
                );
            } else {
                tracing::error!(
                    code = envelope.code(),
                    message = ?envelope.message(),
                    "business fault"
                );
            }
        }
        AppError::NotFound(detail) => {
            if policy.print_error() {
                tracing::error!(detail = %detail, "request for unconfigured route");
            }
        }
        AppError::Unexpected(err) => {
            // Logged in full regardless of the print-error flag.
            tracing::error!(error = ?err, "unhandled fault");
        }
    }
}

/// Response for a caught handler panic. Used via
/// `CatchPanicLayer::custom`; always logs the panic payload at error
/// level, and includes it in the envelope only when the policy allows.
pub fn panic_response(
    policy: &ResponsePolicy,
    err: Box<dyn Any + Send + 'static>,
) -> axum::http::Response<Full<Bytes>> {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        (*s).to_string()
    } else {
        "non-string panic payload".to_string()
    };

    tracing::error!(detail = %detail, "handler panicked");

    let envelope = Envelope::new(
        HttpCode::InternalServerError.code(),
        policy.print_error().then_some(detail),
        Value::Null,
    );
    let body = serde_json::to_vec(&envelope)
        .unwrap_or_else(|_| br#"{"code":500,"message":null,"data":null}"#.to_vec());

    let mut response = axum::http::Response::new(Full::new(Bytes::from(body)));
    *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    response.extensions_mut().insert(EnvelopeStamp);
    response
}
