//! The response interceptor: wraps every successful handler result into the
//! uniform envelope.
//!
//! Applied once in the router builder and runs for every outbound
//! response. Decision order: the pluggable ignore predicate, then the
//! already-an-envelope checks, then content-type-specific wrapping. Bodies
//! are only buffered for JSON, plain-text and empty responses; any other
//! content type (downloads, streams) passes through untouched.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::response::Parts;
use axum::http::{header, HeaderMap, HeaderValue, Method, StatusCode, Uri};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use manila_core::{BusinessCode, Envelope, HttpCode};
use serde_json::Value;

use crate::response::EnvelopeStamp;

/// What the ignore predicate can inspect: the request line and headers,
/// and the response status and headers. Bodies are not exposed; a handler
/// that needs byte-level control should match on route or content type.
pub struct WrapContext<'a> {
    pub method: &'a Method,
    pub uri: &'a Uri,
    pub request_headers: &'a HeaderMap,
    pub status: StatusCode,
    pub response_headers: &'a HeaderMap,
}

type IgnorePredicate = Arc<dyn Fn(&WrapContext<'_>) -> bool + Send + Sync>;

/// Interceptor policy, supplied at router construction.
///
/// The default policy wraps everything; [`WrapPolicy::ignore_when`] installs
/// the escape hatch for handlers that manage their own response format.
#[derive(Clone, Default)]
pub struct WrapPolicy {
    ignore: Option<IgnorePredicate>,
}

impl WrapPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install an escape-hatch predicate: responses it matches pass
    /// through the interceptor byte-identical, ahead of every other rule.
    pub fn ignore_when(
        predicate: impl Fn(&WrapContext<'_>) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            ignore: Some(Arc::new(predicate)),
        }
    }
}

/// Middleware wrapping handler output into the uniform envelope.
pub async fn rewrap_response(
    State(policy): State<Arc<WrapPolicy>>,
    request: Request,
    next: Next,
) -> Response {
    // Snapshot of the request line for the predicate; headers are cloned
    // only when a predicate is installed.
    let method = request.method().clone();
    let uri = request.uri().clone();
    let request_headers = if policy.ignore.is_some() {
        request.headers().clone()
    } else {
        HeaderMap::new()
    };

    let response = next.run(request).await;

    if let Some(ignore) = &policy.ignore {
        let ctx = WrapContext {
            method: &method,
            uri: &uri,
            request_headers: &request_headers,
            status: response.status(),
            response_headers: response.headers(),
        };
        if ignore(&ctx) {
            return response;
        }
    }

    if response.extensions().get::<EnvelopeStamp>().is_some() {
        return response;
    }

    let status = response.status();
    // Body-less statuses are never wrapped.
    if matches!(status, StatusCode::NO_CONTENT | StatusCode::NOT_MODIFIED) {
        return response;
    }

    match body_kind(response.headers()) {
        BodyKind::Json => rewrap_json(response).await,
        BodyKind::Text => rewrap_text(response).await,
        BodyKind::Unspecified => rewrap_untyped(response).await,
        BodyKind::Other => response,
    }
}

enum BodyKind {
    Json,
    Text,
    /// No content-type header; empty bodies from `()` handlers and
    /// boundary layers land here.
    Unspecified,
    Other,
}

fn body_kind(headers: &HeaderMap) -> BodyKind {
    let Some(content_type) = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
    else {
        return BodyKind::Unspecified;
    };
    if content_type.starts_with("application/json") {
        BodyKind::Json
    } else if content_type.starts_with("text/plain") {
        BodyKind::Text
    } else {
        BodyKind::Other
    }
}

/// JSON bodies: pass serialized envelopes through, wrap everything else.
/// Non-2xx values (framework rejections rendered as JSON) keep their
/// status and are re-framed with the status as the envelope code.
async fn rewrap_json(response: Response) -> Response {
    let status = response.status();
    let (parts, bytes) = match buffer(response).await {
        Ok(buffered) => buffered,
        Err(failure) => return failure,
    };

    let value: Value = match serde_json::from_slice(&bytes) {
        Ok(value) => value,
        Err(err) => {
            tracing::error!(error = %err, "response body declared JSON but failed to parse");
            return pipeline_failure();
        }
    };

    if Envelope::matches_value(&value) {
        let mut parts = parts;
        parts.extensions.insert(EnvelopeStamp);
        return Response::from_parts(parts, Body::from(bytes));
    }

    let envelope = if status.is_success() {
        Envelope::from_code(&HttpCode::Success, value)
    } else {
        Envelope::new(i32::from(status.as_u16()), None, value)
    };
    substitute_envelope(parts, &envelope)
}

/// Plain-text bodies. For success this is the string bypass: the envelope
/// is pre-serialized to its JSON text and substituted for the raw string.
/// Non-2xx text (extractor rejections) becomes the envelope message.
async fn rewrap_text(response: Response) -> Response {
    let status = response.status();
    let (parts, bytes) = match buffer(response).await {
        Ok(buffered) => buffered,
        Err(failure) => return failure,
    };
    let text = String::from_utf8_lossy(&bytes).into_owned();

    let envelope = if status.is_success() {
        Envelope::from_code(&HttpCode::Success, Value::String(text))
    } else {
        let message = (!text.is_empty()).then_some(text);
        Envelope::new(i32::from(status.as_u16()), message, Value::Null)
    };
    substitute_envelope(parts, &envelope)
}

/// Responses with no declared content type: wrap empty bodies, pass
/// anything else through unmodified.
async fn rewrap_untyped(response: Response) -> Response {
    let status = response.status();
    let (parts, bytes) = match buffer(response).await {
        Ok(buffered) => buffered,
        Err(failure) => return failure,
    };

    if !bytes.is_empty() {
        return Response::from_parts(parts, Body::from(bytes));
    }

    let envelope = if status.is_success() {
        Envelope::from_code(&HttpCode::Success, Value::Null)
    } else {
        Envelope::new(i32::from(status.as_u16()), None, Value::Null)
    };
    substitute_envelope(parts, &envelope)
}

async fn buffer(response: Response) -> Result<(Parts, axum::body::Bytes), Response> {
    let (parts, body) = response.into_parts();
    match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => Ok((parts, bytes)),
        Err(err) => {
            tracing::error!(error = %err, "failed to buffer response body for wrapping");
            Err(pipeline_failure())
        }
    }
}

/// Replace the buffered body with the serialized envelope, keeping the
/// original status and headers.
fn substitute_envelope(mut parts: Parts, envelope: &Envelope) -> Response {
    let body = match serde_json::to_vec(envelope) {
        Ok(body) => body,
        Err(err) => {
            tracing::error!(error = %err, "failed to serialize response envelope");
            return pipeline_failure();
        }
    };

    // The body changed; the transport recomputes the length.
    parts.headers.remove(header::CONTENT_LENGTH);
    parts.headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    parts.extensions.insert(EnvelopeStamp);
    Response::from_parts(parts, Body::from(body))
}

/// Terminal response for faults inside the wrapping pipeline itself.
fn pipeline_failure() -> Response {
    let envelope = Envelope::new(HttpCode::InternalServerError.code(), None, Value::Null);
    let mut response =
        (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(&envelope)).into_response();
    response.extensions_mut().insert(EnvelopeStamp);
    response
}
