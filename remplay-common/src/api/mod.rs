//! Shared HTTP API functionality
//!
//! Pure authentication primitives with no HTTP framework dependency. The
//! server wraps these in its own tower layer.

pub mod auth;

pub use auth::{validate_secret, ApiAuthError, SharedSecret};
