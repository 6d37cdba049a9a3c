//! Reminder bookkeeping trait definition.

use chrono::{DateTime, Utc};
use rehearse_types::error::RepositoryError;

/// Stores when each chat was last reminded.
pub trait ReminderRepository: Send + Sync {
    /// Last reminder time. `None` if the chat was never reminded.
    fn last_reminder(
        &self,
        owner: i64,
    ) -> impl std::future::Future<Output = Result<Option<DateTime<Utc>>, RepositoryError>> + Send;

    /// Record a reminder sent at `at` (upsert).
    fn record_reminder(
        &self,
        owner: i64,
        at: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;
}
