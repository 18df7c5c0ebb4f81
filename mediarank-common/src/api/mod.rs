//! HTTP-facing helpers shared with the server crate
//!
//! Framework-free: the server wraps these in axum extractors.

pub mod auth;

pub use auth::{
    calculate_hash, initialize_shared_secret, load_shared_secret, validate_hash,
    validate_timestamp, verify_identity, ApiAuthError,
};
