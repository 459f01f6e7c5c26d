//! Domain types for the uniform response contract.
//!
//! Framework-free: this crate defines the envelope value type, the business
//! code registry and the fault signal type. HTTP integration (wrapping,
//! fault interpretation, status mapping) lives in `manila-api`.

pub mod code;
pub mod envelope;
pub mod fault;

pub use code::{BusinessCode, HttpCode};
pub use envelope::Envelope;
pub use fault::Fault;
