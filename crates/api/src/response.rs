//! Response types shared by handlers and the response pipeline.
//!
//! Every path that emits a serialized [`Envelope`] stamps the response with
//! [`EnvelopeStamp`] so the response interceptor can recognize it and keep
//! wrapping idempotent.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use manila_core::Envelope;

/// Marker extension present on any response whose body is already a
/// serialized envelope.
///
/// The extension type itself is the reserved key: being type-keyed, it is
/// namespaced by this crate's identity and cannot collide with application
/// extensions.
#[derive(Debug, Clone, Copy)]
pub struct EnvelopeStamp;

/// Response type for handlers that build their own [`Envelope`].
///
/// Serializes the envelope as JSON and stamps the response, so the
/// interceptor passes it through unchanged.
///
/// # Example
///
/// ```ignore
/// async fn report() -> EnvelopeResponse {
///     Envelope::from_code(&HttpCode::Success, json!({"rows": 0})).into()
/// }
/// ```
#[derive(Debug, Clone)]
pub struct EnvelopeResponse(pub Envelope);

impl From<Envelope> for EnvelopeResponse {
    fn from(envelope: Envelope) -> Self {
        Self(envelope)
    }
}

impl IntoResponse for EnvelopeResponse {
    fn into_response(self) -> Response {
        envelope_response(StatusCode::OK, &self.0)
    }
}

/// Serialize an envelope as a stamped JSON response with the given status.
pub(crate) fn envelope_response(status: StatusCode, envelope: &Envelope) -> Response {
    let mut response = (status, axum::Json(envelope)).into_response();
    response.extensions_mut().insert(EnvelopeStamp);
    response
}
