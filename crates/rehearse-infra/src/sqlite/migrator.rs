//! Upgrade of legacy stage-based records to the ease/interval model.
//!
//! Older deployments scheduled items with a discrete `stage` index into a
//! list of durations. This migrator adds the `next_review_seconds`, `ease`
//! and `ivl` columns and backfills every record that has no due time yet.
//! It runs on every store startup and is idempotent: only rows with a NULL
//! `next_review_seconds` are touched.

use chrono::Utc;
use rehearse_core::stage::StageTable;
use rehearse_types::config::SchedulerConfig;
use rehearse_types::error::{ConfigError, RepositoryError};
use sqlx::Row;
use sqlx::sqlite::SqlitePool;

/// Value of `PRAGMA user_version` once the continuous model is in place.
pub const STAGE_SCHEMA_VERSION: i64 = 1;

/// Columns introduced by the continuous model.
const ADDED_COLUMNS: [&str; 3] = ["next_review_seconds", "ease", "ivl"];

/// Outcome of one migrator run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationReport {
    /// `user_version` before this run.
    pub previous_version: i64,
    /// Columns that did not exist yet.
    pub columns_added: usize,
    /// Records that received a due time.
    pub backfilled: u64,
    /// Records in the table after the run.
    pub total_rows: i64,
}

pub struct StageMigrator {
    stages: StageTable,
    initial_ease: i64,
    initial_interval: i64,
}

impl StageMigrator {
    /// Rejects a scheduler config whose initial ease or interval would be
    /// written into backfilled rows out of range.
    pub fn new(stages: StageTable, scheduler: &SchedulerConfig) -> Result<Self, ConfigError> {
        scheduler.validate()?;
        Ok(Self {
            stages,
            initial_ease: scheduler.initial_ease,
            initial_interval: scheduler.initial_interval_days,
        })
    }

    /// Bring every record into the ease/interval representation.
    ///
    /// All steps run in a single write transaction. An already existing
    /// column is the only tolerated error.
    pub async fn run(&self, pool: &SqlitePool) -> Result<MigrationReport, RepositoryError> {
        let mut tx = pool.begin().await.map_err(|e| migration_error("begin", e))?;

        let previous_version: i64 = sqlx::query_scalar("PRAGMA user_version")
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| migration_error("read user_version", e))?;

        let mut columns_added = 0;
        for column in ADDED_COLUMNS {
            let sql = format!("ALTER TABLE Repetition ADD COLUMN {column} INTEGER");
            match sqlx::query(&sql).execute(&mut *tx).await {
                Ok(_) => {
                    columns_added += 1;
                    tracing::debug!(column, "added column");
                }
                Err(e) if is_duplicate_column(&e) => {
                    tracing::debug!(column, "column already present");
                }
                Err(e) => return Err(migration_error(&format!("add column {column}"), e)),
            }
        }

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_repetition_due ON Repetition (chat_id, next_review_seconds)",
        )
        .execute(&mut *tx)
        .await
        .map_err(|e| migration_error("create due index", e))?;

        let pending = sqlx::query(
            "SELECT rowid AS id, stage, last_updated_seconds FROM Repetition WHERE next_review_seconds IS NULL",
        )
        .fetch_all(&mut *tx)
        .await
        .map_err(|e| migration_error("select pending rows", e))?;

        let now = Utc::now().timestamp();
        let mut backfilled = 0;
        for row in &pending {
            let id: i64 = row.try_get("id").map_err(|e| migration_error("decode id", e))?;
            let stage: Option<i64> = row
                .try_get("stage")
                .map_err(|e| migration_error("decode stage", e))?;
            let last: Option<i64> = row
                .try_get("last_updated_seconds")
                .map_err(|e| migration_error("decode last_updated_seconds", e))?;

            let last = last.unwrap_or(now);
            let due = last.saturating_add(self.stages.seconds(stage.unwrap_or(0)));

            let result = sqlx::query(
                "UPDATE Repetition
                 SET next_review_seconds = ?, ease = ?, ivl = ?, last_updated_seconds = ?
                 WHERE rowid = ? AND next_review_seconds IS NULL",
            )
            .bind(due)
            .bind(self.initial_ease)
            .bind(self.initial_interval)
            .bind(last)
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| migration_error("backfill row", e))?;
            backfilled += result.rows_affected();
        }

        if previous_version < STAGE_SCHEMA_VERSION {
            // PRAGMA does not accept bound parameters
            sqlx::query(&format!("PRAGMA user_version = {STAGE_SCHEMA_VERSION}"))
                .execute(&mut *tx)
                .await
                .map_err(|e| migration_error("write user_version", e))?;
        }

        let total_rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM Repetition")
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| migration_error("count rows", e))?;

        tx.commit().await.map_err(|e| migration_error("commit", e))?;

        if backfilled > 0 {
            tracing::info!(backfilled, stages = self.stages.len(), "backfilled legacy stage records");
        }
        tracing::debug!(total_rows, previous_version, "repetition table contains {total_rows} rows");

        Ok(MigrationReport {
            previous_version,
            columns_added,
            backfilled,
            total_rows,
        })
    }
}

/// SQLite has no `ADD COLUMN IF NOT EXISTS`; the error text is the only signal.
fn is_duplicate_column(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.message().contains("duplicate column name"),
        _ => false,
    }
}

fn migration_error(step: &str, err: sqlx::Error) -> RepositoryError {
    RepositoryError::Migration(format!("{step}: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::pool::DatabasePool;
    use std::time::Duration;

    async fn test_pool() -> DatabasePool {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let url = format!("sqlite://{}?mode=rwc", db_path.display());
        std::mem::forget(dir);
        DatabasePool::new(&url).await.unwrap()
    }

    fn migrator(stage_secs: &[u64]) -> StageMigrator {
        let stages =
            StageTable::new(stage_secs.iter().map(|s| Duration::from_secs(*s)).collect()).unwrap();
        StageMigrator::new(stages, &SchedulerConfig::default()).unwrap()
    }

    async fn insert_legacy(pool: &DatabasePool, chat_id: i64, word: &str, stage: Option<i64>, last: Option<i64>) {
        sqlx::query(
            "INSERT INTO Repetition (chat_id, word, definition, stage, last_updated_seconds)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(chat_id)
        .bind(word)
        .bind(format!("{word}\n\ndefinition of {word}"))
        .bind(stage)
        .bind(last)
        .execute(&pool.writer)
        .await
        .unwrap();
    }

    type Snapshot = Vec<(String, Option<i64>, Option<i64>, Option<i64>, Option<i64>)>;

    async fn snapshot(pool: &DatabasePool) -> Snapshot {
        sqlx::query_as(
            "SELECT word, last_updated_seconds, next_review_seconds, ease, ivl FROM Repetition ORDER BY rowid",
        )
        .fetch_all(&pool.writer)
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_fresh_database_adds_columns_once() {
        let pool = test_pool().await;
        let m = migrator(&[20, 60]);

        let first = m.run(&pool.writer).await.unwrap();
        assert_eq!(first.previous_version, 0);
        assert_eq!(first.columns_added, 3);
        assert_eq!(first.backfilled, 0);

        let second = m.run(&pool.writer).await.unwrap();
        assert_eq!(second.previous_version, STAGE_SCHEMA_VERSION);
        assert_eq!(second.columns_added, 0);
        assert_eq!(second.total_rows, 0);
    }

    #[tokio::test]
    async fn test_backfills_legacy_records() {
        let pool = test_pool().await;
        insert_legacy(&pool, 1, "alma", Some(0), Some(1_000)).await;
        insert_legacy(&pool, 1, "körte", Some(2), Some(2_000)).await;

        let report = migrator(&[20, 60, 600]).run(&pool.writer).await.unwrap();
        assert_eq!(report.backfilled, 2);
        assert_eq!(report.total_rows, 2);

        let rows = snapshot(&pool).await;
        assert_eq!(rows[0], ("alma".to_string(), Some(1_000), Some(1_020), Some(250), Some(0)));
        assert_eq!(rows[1], ("körte".to_string(), Some(2_000), Some(2_600), Some(250), Some(0)));
    }

    #[tokio::test]
    async fn test_stage_beyond_shrunk_list_uses_last_duration() {
        let pool = test_pool().await;
        insert_legacy(&pool, 1, "szilva", Some(9), Some(5_000)).await;

        migrator(&[20, 60, 600]).run(&pool.writer).await.unwrap();

        let rows = snapshot(&pool).await;
        assert_eq!(rows[0].2, Some(5_600));
    }

    #[tokio::test]
    async fn test_missing_stage_and_timestamp() {
        let pool = test_pool().await;
        insert_legacy(&pool, 1, "barack", None, None).await;
        let before = Utc::now().timestamp();

        migrator(&[30]).run(&pool.writer).await.unwrap();

        let rows = snapshot(&pool).await;
        let last = rows[0].1.unwrap();
        assert!(last >= before);
        assert_eq!(rows[0].2, Some(last + 30));
    }

    #[tokio::test]
    async fn test_second_run_changes_nothing() {
        let pool = test_pool().await;
        insert_legacy(&pool, 1, "alma", Some(1), Some(1_000)).await;
        insert_legacy(&pool, 2, "dió", Some(5), Some(3_000)).await;
        let m = migrator(&[20, 60, 600]);

        m.run(&pool.writer).await.unwrap();
        let after_first = snapshot(&pool).await;

        let report = m.run(&pool.writer).await.unwrap();
        assert_eq!(report.backfilled, 0);
        assert_eq!(snapshot(&pool).await, after_first);
    }

    #[tokio::test]
    async fn test_migrated_rows_not_rederived_with_new_stages() {
        let pool = test_pool().await;
        insert_legacy(&pool, 1, "alma", Some(1), Some(1_000)).await;

        migrator(&[20, 60]).run(&pool.writer).await.unwrap();
        migrator(&[5, 5]).run(&pool.writer).await.unwrap();

        assert_eq!(snapshot(&pool).await[0].2, Some(1_060));
    }

    #[tokio::test]
    async fn test_other_errors_propagate() {
        let pool = test_pool().await;
        sqlx::query("DROP TABLE Repetition")
            .execute(&pool.writer)
            .await
            .unwrap();

        let err = migrator(&[20]).run(&pool.writer).await.unwrap_err();
        match err {
            RepositoryError::Migration(msg) => assert!(msg.contains("no such table"), "{msg}"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_new_rejects_out_of_range_initial_ease() {
        let stages = StageTable::new(vec![Duration::from_secs(20)]).unwrap();
        let scheduler = SchedulerConfig {
            initial_ease: 5_000,
            ..SchedulerConfig::default()
        };
        let err = StageMigrator::new(stages, &scheduler).err().unwrap();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }
}
