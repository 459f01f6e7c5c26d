//! The business fault signal type.
//!
//! A [`Fault`] is raised by application logic to abort normal handler
//! execution with a specific envelope. It propagates with `?` until the
//! HTTP boundary converts it; intermediate code must not swallow it.

use serde_json::Value;

use crate::code::BusinessCode;
use crate::envelope::Envelope;

/// An application-raised fault carrying its ready-made response envelope.
///
/// The envelope is fixed at construction and cannot be mutated afterwards;
/// the fault is discarded once the boundary extracts it.
///
/// # Example
///
/// ```
/// use manila_core::Fault;
///
/// fn withdraw(balance: i64, amount: i64) -> Result<i64, Fault> {
///     if amount > balance {
///         return Err(Fault::new(4001, Some("insufficient balance".into()), serde_json::Value::Null));
///     }
///     Ok(balance - amount)
/// }
///
/// assert!(withdraw(10, 100).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("business fault: code={} message={:?}", envelope.code(), envelope.message())]
pub struct Fault {
    envelope: Envelope,
}

impl Fault {
    /// Build a fault from explicit envelope parts.
    pub fn new(code: i32, message: Option<String>, data: Value) -> Self {
        Self {
            envelope: Envelope::new(code, message, data),
        }
    }

    /// Build a fault from a registry entry with the given payload.
    pub fn from_code<C: BusinessCode + ?Sized>(code: &C, data: Value) -> Self {
        Self {
            envelope: Envelope::from_code(code, data),
        }
    }

    /// The envelope this fault materializes as.
    pub fn envelope(&self) -> &Envelope {
        &self.envelope
    }

    pub fn into_envelope(self) -> Envelope {
        self.envelope
    }
}
