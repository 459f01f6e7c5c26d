//! The `{code, message, data}` response envelope.
//!
//! Every response leaving the service is exactly this shape. Use
//! [`Envelope`] instead of ad-hoc `serde_json::json!({ ... })` maps to get
//! compile-time type safety and consistent serialization.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::code::BusinessCode;

/// Immutable `{code, message, data}` transfer value.
///
/// All three fields are always serialized; `message` and `data` appear as
/// JSON `null` when absent so clients see a stable shape regardless of
/// which handler or fault path produced the response.
///
/// # Example
///
/// ```
/// use manila_core::{Envelope, HttpCode};
/// use serde_json::json;
///
/// let env = Envelope::from_code(&HttpCode::Success, json!({"id": 1}));
/// assert_eq!(env.code(), 200);
/// assert_eq!(env.message(), Some("success"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    code: i32,
    message: Option<String>,
    data: Value,
}

impl Envelope {
    /// Build an envelope from explicit parts.
    pub fn new(code: i32, message: Option<String>, data: Value) -> Self {
        Self {
            code,
            message,
            data,
        }
    }

    /// Build an envelope from a registry entry, copying its code and
    /// default message and pairing them with the given payload.
    pub fn from_code<C: BusinessCode + ?Sized>(code: &C, data: Value) -> Self {
        Self::new(code.code(), Some(code.message().to_string()), data)
    }

    pub fn code(&self) -> i32 {
        self.code
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn data(&self) -> &Value {
        &self.data
    }

    /// Whether a JSON value already has the envelope shape: an object with
    /// exactly the keys `code` (integer), `message` (string or null) and
    /// `data`.
    ///
    /// Used by the response interceptor to keep wrapping idempotent for
    /// handlers that serialize an [`Envelope`] themselves.
    pub fn matches_value(value: &Value) -> bool {
        let Some(map) = value.as_object() else {
            return false;
        };
        if map.len() != 3 || !map.contains_key("data") {
            return false;
        }
        let code_ok = map.get("code").is_some_and(|c| {
            c.as_i64()
                .is_some_and(|n| i32::try_from(n).is_ok())
        });
        let message_ok = map
            .get("message")
            .is_some_and(|m| m.is_string() || m.is_null());
        code_ok && message_ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code::HttpCode;
    use serde_json::json;

    #[test]
    fn explicit_parts() {
        let env = Envelope::new(4001, Some("insufficient balance".into()), Value::Null);
        assert_eq!(env.code(), 4001);
        assert_eq!(env.message(), Some("insufficient balance"));
        assert_eq!(env.data(), &Value::Null);
    }

    #[test]
    fn from_registry_entry_copies_code_and_message() {
        let env = Envelope::from_code(&HttpCode::Success, json!("ok"));
        assert_eq!(env.code(), 200);
        assert_eq!(env.message(), Some("success"));
        assert_eq!(env.data(), &json!("ok"));
    }

    #[test]
    fn serializes_all_fields_with_nulls() {
        let env = Envelope::new(404, None, Value::Null);
        let value = serde_json::to_value(&env).unwrap();
        assert_eq!(value, json!({"code": 404, "message": null, "data": null}));
    }

    #[test]
    fn round_trips_through_json() {
        let env = Envelope::from_code(&HttpCode::Success, json!({"id": 1}));
        let text = serde_json::to_string(&env).unwrap();
        let back: Envelope = serde_json::from_str(&text).unwrap();
        assert_eq!(back, env);
    }

    #[test]
    fn matches_value_accepts_envelope_shape() {
        assert!(Envelope::matches_value(&json!({
            "code": 200, "message": "success", "data": {"id": 1}
        })));
        assert!(Envelope::matches_value(&json!({
            "code": 404, "message": null, "data": null
        })));
    }

    #[test]
    fn matches_value_rejects_other_shapes() {
        assert!(!Envelope::matches_value(&json!({"id": 1})));
        assert!(!Envelope::matches_value(&json!("ok")));
        // Extra keys mean it is user data, not an envelope.
        assert!(!Envelope::matches_value(&json!({
            "code": 200, "message": "success", "data": null, "extra": 1
        })));
        // A non-integer code is user data.
        assert!(!Envelope::matches_value(&json!({
            "code": "200", "message": "success", "data": null
        })));
    }
}
