//! Business code registry.
//!
//! A business code pairs a stable integer with a default human-readable
//! message. The built-in set lives in [`HttpCode`]; applications extend the
//! registry by implementing [`BusinessCode`] on their own enums. Built-in
//! codes are process-wide constants and must not be reassigned.

use serde_json::Value;

use crate::fault::Fault;

/// Capability of a registry entry: a stable code plus its default message.
///
/// The provided [`fault`](BusinessCode::fault) and
/// [`fault_with`](BusinessCode::fault_with) methods build a [`Fault`]
/// carrying this entry, so application code can short-circuit a handler
/// with `Err(HttpCode::Forbidden.fault())?`.
pub trait BusinessCode {
    fn code(&self) -> i32;

    fn message(&self) -> &str;

    /// A fault carrying this entry's code and default message, no payload.
    fn fault(&self) -> Fault {
        Fault::new(self.code(), Some(self.message().to_string()), Value::Null)
    }

    /// A fault carrying this entry's code with a custom message and payload.
    fn fault_with(&self, message: impl Into<String>, data: Value) -> Fault {
        Fault::new(self.code(), Some(message.into()), data)
    }
}

/// Built-in business codes.
///
/// These values are stable across releases; extensions must not collide
/// with them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpCode {
    /// 200 -- normal result.
    Success,
    /// 401 -- authentication failed.
    Unauthorized,
    /// 403 -- insufficient permission.
    Forbidden,
    /// 404 -- route not configured.
    PageNotFound,
    /// 500 -- internal error.
    InternalServerError,
}

impl BusinessCode for HttpCode {
    fn code(&self) -> i32 {
        match self {
            HttpCode::Success => 200,
            HttpCode::Unauthorized => 401,
            HttpCode::Forbidden => 403,
            HttpCode::PageNotFound => 404,
            HttpCode::InternalServerError => 500,
        }
    }

    fn message(&self) -> &str {
        match self {
            HttpCode::Success => "success",
            HttpCode::Unauthorized => "authentication failed",
            HttpCode::Forbidden => "insufficient permission",
            HttpCode::PageNotFound => "route not configured",
            HttpCode::InternalServerError => "internal error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn builtin_codes_are_stable() {
        assert_eq!(HttpCode::Success.code(), 200);
        assert_eq!(HttpCode::Unauthorized.code(), 401);
        assert_eq!(HttpCode::Forbidden.code(), 403);
        assert_eq!(HttpCode::PageNotFound.code(), 404);
        assert_eq!(HttpCode::InternalServerError.code(), 500);
    }

    #[test]
    fn fault_carries_code_and_default_message() {
        let fault = HttpCode::Forbidden.fault();
        let env = fault.envelope();
        assert_eq!(env.code(), 403);
        assert_eq!(env.message(), Some("insufficient permission"));
        assert_eq!(env.data(), &serde_json::Value::Null);
    }

    #[test]
    fn fault_with_overrides_message_and_data() {
        let fault = HttpCode::Forbidden.fault_with("read-only account", json!({"account": 7}));
        let env = fault.envelope();
        assert_eq!(env.code(), 403);
        assert_eq!(env.message(), Some("read-only account"));
        assert_eq!(env.data(), &json!({"account": 7}));
    }

    // Applications register their own codes by implementing the trait.
    enum BillingCode {
        InsufficientBalance,
    }

    impl BusinessCode for BillingCode {
        fn code(&self) -> i32 {
            4001
        }

        fn message(&self) -> &str {
            "insufficient balance"
        }
    }

    #[test]
    fn registry_is_open_for_extension() {
        let fault = BillingCode::InsufficientBalance.fault();
        assert_eq!(fault.envelope().code(), 4001);
        assert_eq!(fault.envelope().message(), Some("insufficient balance"));
    }
}
