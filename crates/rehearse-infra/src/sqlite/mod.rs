//! SQLite storage layer.
//!
//! Repository implementations backed by SQLite with WAL mode and split
//! read/write connection pools.

pub mod item;
pub mod migrator;
pub mod pool;
pub mod reminder;
pub mod settings;

use chrono::{DateTime, Utc};
use rehearse_types::error::RepositoryError;

/// Convert stored unix seconds into a timestamp.
pub(crate) fn from_unix(secs: i64) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::from_timestamp(secs, 0)
        .ok_or_else(|| RepositoryError::Query(format!("invalid timestamp: {secs}")))
}

pub(crate) fn to_unix(dt: &DateTime<Utc>) -> i64 {
    dt.timestamp()
}
