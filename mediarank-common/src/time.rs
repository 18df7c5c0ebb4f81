//! Timestamp utilities
//!
//! Timestamps are persisted as RFC 3339 UTC text with microsecond precision so
//! that lexical order in SQL matches chronological order.

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};

use crate::{Error, Result};

/// Current UTC timestamp at storage precision (microseconds)
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Current time as Unix epoch milliseconds
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Format a timestamp for storage
pub fn to_db_string(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse a stored timestamp
pub fn from_db_string(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::Validation(format!("Invalid timestamp '{}': {}", s, e)))
}

/// Parse an optional stored timestamp column
pub fn from_db_opt(s: Option<String>) -> Result<Option<DateTime<Utc>>> {
    s.as_deref().map(from_db_string).transpose()
}

/// Milliseconds since epoch, treating a missing timestamp as epoch
pub fn millis_or_epoch(ts: Option<&DateTime<Utc>>) -> i64 {
    ts.map(|t| t.timestamp_millis()).unwrap_or(0)
}
