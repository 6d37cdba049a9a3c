//! SQLite reminder bookkeeping.

use chrono::{DateTime, Utc};
use rehearse_core::repository::reminder::ReminderRepository;
use rehearse_types::error::RepositoryError;

use super::pool::DatabasePool;
use super::{from_unix, to_unix};

/// SQLite-backed implementation of `ReminderRepository`.
#[derive(Clone)]
pub struct SqliteReminderRepository {
    pool: DatabasePool,
}

impl SqliteReminderRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

impl ReminderRepository for SqliteReminderRepository {
    async fn last_reminder(&self, owner: i64) -> Result<Option<DateTime<Utc>>, RepositoryError> {
        let secs: Option<Option<i64>> = sqlx::query_scalar(
            "SELECT last_reminder_time_seconds FROM Reminders WHERE chat_id = ?",
        )
        .bind(owner)
        .fetch_optional(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        secs.flatten().map(from_unix).transpose()
    }

    async fn record_reminder(&self, owner: i64, at: DateTime<Utc>) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO Reminders (chat_id, last_reminder_time_seconds) VALUES (?, ?)
             ON CONFLICT(chat_id) DO UPDATE SET last_reminder_time_seconds = excluded.last_reminder_time_seconds",
        )
        .bind(owner)
        .bind(to_unix(&at))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(())
    }
}
