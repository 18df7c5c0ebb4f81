//! Identity assertion checks
//!
//! The identity provider in front of the service signs each request with
//! three headers: the user id, a Unix epoch millisecond timestamp, and
//! SHA-256(`{user_id}:{timestamp}{shared_secret}`) as lowercase hex.
//!
//! Pure functions plus the shared secret accessors. The axum extractor that
//! calls them lives in the server crate.

use rand::Rng;
use sha2::{Digest, Sha256};
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::info;

use crate::db::settings::{self, SHARED_SECRET_KEY};
use crate::time;

/// Oldest accepted timestamp, relative to now
pub const MAX_PAST_MS: i64 = 60_000;
/// Allowed clock drift into the future
pub const MAX_FUTURE_MS: i64 = 1_000;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ApiAuthError {
    #[error("Missing user id")]
    MissingUser,

    #[error("Missing timestamp")]
    MissingTimestamp,

    #[error("Missing hash")]
    MissingHash,

    #[error("Invalid timestamp: {reason}")]
    InvalidTimestamp { timestamp: i64, reason: String },

    #[error("Invalid hash")]
    InvalidHash,
}

/// Load the shared secret, generating one on first use
///
/// A stored value of 0 disables hash checking.
pub async fn load_shared_secret(db: &SqlitePool) -> crate::Result<i64> {
    match settings::get_setting::<i64>(db, SHARED_SECRET_KEY).await? {
        Some(secret) => Ok(secret),
        None => initialize_shared_secret(db).await,
    }
}

/// Generate and store a random non-zero shared secret
pub async fn initialize_shared_secret(db: &SqlitePool) -> crate::Result<i64> {
    let secret: i64 = {
        let mut rng = rand::thread_rng();
        loop {
            let val = rng.gen::<i64>();
            if val != 0 {
                break val;
            }
        }
    };

    settings::set_setting(db, SHARED_SECRET_KEY, secret).await?;
    info!("Generated new API shared secret");
    Ok(secret)
}

/// Check a request timestamp against `now` (both Unix epoch ms)
pub fn validate_timestamp_at(timestamp: i64, now: i64) -> Result<(), ApiAuthError> {
    let age = now - timestamp;

    if age > MAX_PAST_MS {
        return Err(ApiAuthError::InvalidTimestamp {
            timestamp,
            reason: format!("{}ms old (max {}ms)", age, MAX_PAST_MS),
        });
    }

    if -age > MAX_FUTURE_MS {
        return Err(ApiAuthError::InvalidTimestamp {
            timestamp,
            reason: format!("{}ms in future (max {}ms)", -age, MAX_FUTURE_MS),
        });
    }

    Ok(())
}

pub fn validate_timestamp(timestamp: i64) -> Result<(), ApiAuthError> {
    validate_timestamp_at(timestamp, time::now_millis())
}

/// SHA-256 over `{user_id}:{timestamp}` with the secret appended, as hex
pub fn calculate_hash(user_id: &str, timestamp: i64, shared_secret: i64) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("{}:{}{}", user_id, timestamp, shared_secret).as_bytes());
    format!("{:x}", hasher.finalize())
}

pub fn validate_hash(
    user_id: &str,
    timestamp: i64,
    provided: &str,
    shared_secret: i64,
) -> Result<(), ApiAuthError> {
    let expected = calculate_hash(user_id, timestamp, shared_secret);
    if provided.eq_ignore_ascii_case(&expected) {
        Ok(())
    } else {
        Err(ApiAuthError::InvalidHash)
    }
}

/// Full check of one identity assertion
///
/// With `shared_secret == 0` only the user id is required.
pub fn verify_identity(
    user_id: Option<&str>,
    timestamp: Option<i64>,
    hash: Option<&str>,
    shared_secret: i64,
) -> Result<String, ApiAuthError> {
    let user_id = user_id
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .ok_or(ApiAuthError::MissingUser)?;

    if shared_secret == 0 {
        return Ok(user_id.to_string());
    }

    let timestamp = timestamp.ok_or(ApiAuthError::MissingTimestamp)?;
    let hash = hash.ok_or(ApiAuthError::MissingHash)?;
    validate_timestamp(timestamp)?;
    validate_hash(user_id, timestamp, hash, shared_secret)?;
    Ok(user_id.to_string())
}
