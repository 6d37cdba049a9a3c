//! SQLite item store implementation.
//!
//! Implements `ItemRepository` from `rehearse-core` on top of the legacy
//! `Repetition` table. Reads use the reader pool; every write, including the
//! read-modify-write of a review, runs in a transaction on the single-connection
//! writer pool.

use chrono::{DateTime, Utc};
use rehearse_core::repository::item::ItemRepository;
use rehearse_core::stage::StageTable;
use rehearse_types::config::AppConfig;
use rehearse_types::error::RepositoryError;
use rehearse_types::item::{Item, ReviewState};
use sqlx::Row;

use super::migrator::StageMigrator;
use super::pool::DatabasePool;
use super::{from_unix, to_unix};

const ITEM_COLUMNS: &str =
    "chat_id, word, definition, last_updated_seconds, next_review_seconds, ease, ivl";

/// SQLite-backed implementation of `ItemRepository`.
#[derive(Clone)]
pub struct SqliteItemStore {
    pool: DatabasePool,
}

impl SqliteItemStore {
    /// Open the store, upgrading legacy stage records before returning.
    ///
    /// Fails on an invalid stage list or scheduler config before any row is
    /// touched, and on any migration error other than an already existing
    /// column.
    pub async fn open(pool: DatabasePool, config: &AppConfig) -> Result<Self, RepositoryError> {
        let stages = StageTable::from_config(&config.stages)?;
        let report = StageMigrator::new(stages, &config.scheduler)?
            .run(&pool.writer)
            .await?;
        tracing::info!(
            rows = report.total_rows,
            backfilled = report.backfilled,
            "item store ready"
        );
        Ok(Self { pool })
    }
}

// ---------------------------------------------------------------------------
// Row mapping
// ---------------------------------------------------------------------------

fn row_to_item(row: &sqlx::sqlite::SqliteRow) -> Result<Item, RepositoryError> {
    let owner: i64 = row
        .try_get("chat_id")
        .map_err(|e| RepositoryError::Query(e.to_string()))?;
    let word: String = row
        .try_get("word")
        .map_err(|e| RepositoryError::Query(e.to_string()))?;
    let definition: String = row
        .try_get("definition")
        .map_err(|e| RepositoryError::Query(e.to_string()))?;
    let last_updated: i64 = row
        .try_get("last_updated_seconds")
        .map_err(|e| RepositoryError::Query(e.to_string()))?;
    let next_review: i64 = row
        .try_get("next_review_seconds")
        .map_err(|e| RepositoryError::Query(e.to_string()))?;
    let ease: i64 = row
        .try_get("ease")
        .map_err(|e| RepositoryError::Query(e.to_string()))?;
    let interval: i64 = row
        .try_get("ivl")
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

    Ok(Item {
        owner,
        word,
        definition,
        ease,
        interval,
        last_reviewed: from_unix(last_updated)?,
        due_at: from_unix(next_review)?,
    })
}

/// The stored form of a timestamp, as the caller will read it back.
fn stored(dt: &DateTime<Utc>) -> Result<DateTime<Utc>, RepositoryError> {
    from_unix(to_unix(dt))
}

impl ItemRepository for SqliteItemStore {
    async fn insert(&self, item: &Item) -> Result<Item, RepositoryError> {
        let mut tx = self
            .pool
            .writer
            .begin()
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        // No unique index: legacy databases may already hold duplicates.
        let existing: Option<i64> =
            sqlx::query_scalar("SELECT 1 FROM Repetition WHERE chat_id = ? AND word = ? LIMIT 1")
                .bind(item.owner)
                .bind(&item.word)
                .fetch_optional(&mut *tx)
                .await
                .map_err(|e| RepositoryError::Query(e.to_string()))?;
        if existing.is_some() {
            return Err(RepositoryError::Conflict(format!(
                "'{}' already exists for chat {}",
                item.word, item.owner
            )));
        }

        sqlx::query(
            "INSERT INTO Repetition
                (chat_id, word, definition, stage, last_updated_seconds, next_review_seconds, ease, ivl)
             VALUES (?, ?, ?, 0, ?, ?, ?, ?)",
        )
        .bind(item.owner)
        .bind(&item.word)
        .bind(&item.definition)
        .bind(to_unix(&item.last_reviewed))
        .bind(to_unix(&item.due_at))
        .bind(item.ease)
        .bind(item.interval)
        .execute(&mut *tx)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(Item {
            last_reviewed: stored(&item.last_reviewed)?,
            due_at: stored(&item.due_at)?,
            ..item.clone()
        })
    }

    async fn review<F>(&self, owner: i64, word: &str, apply: F) -> Result<Item, RepositoryError>
    where
        F: FnOnce(&Item) -> ReviewState + Send,
    {
        let mut tx = self
            .pool
            .writer
            .begin()
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let sql = format!(
            "SELECT rowid AS id, {ITEM_COLUMNS} FROM Repetition
             WHERE chat_id = ? AND word = ?
             ORDER BY rowid LIMIT 1"
        );
        let row = sqlx::query(&sql)
            .bind(owner)
            .bind(word)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?
            .ok_or(RepositoryError::NotFound)?;

        let id: i64 = row
            .try_get("id")
            .map_err(|e| RepositoryError::Query(e.to_string()))?;
        let mut item = row_to_item(&row)?;
        item.apply(apply(&item));

        sqlx::query(
            "UPDATE Repetition
             SET last_updated_seconds = ?, next_review_seconds = ?, ease = ?, ivl = ?
             WHERE rowid = ?",
        )
        .bind(to_unix(&item.last_reviewed))
        .bind(to_unix(&item.due_at))
        .bind(item.ease)
        .bind(item.interval)
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        item.last_reviewed = stored(&item.last_reviewed)?;
        item.due_at = stored(&item.due_at)?;
        Ok(item)
    }

    async fn get(&self, owner: i64, word: &str) -> Result<Option<Item>, RepositoryError> {
        let sql = format!(
            "SELECT {ITEM_COLUMNS} FROM Repetition
             WHERE chat_id = ? AND word = ?
             ORDER BY rowid LIMIT 1"
        );
        let row = sqlx::query(&sql)
            .bind(owner)
            .bind(word)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        row.as_ref().map(row_to_item).transpose()
    }

    async fn next_due(&self, owner: i64, now: DateTime<Utc>) -> Result<Option<Item>, RepositoryError> {
        let sql = format!(
            "SELECT {ITEM_COLUMNS} FROM Repetition
             WHERE chat_id = ? AND next_review_seconds <= ?
             ORDER BY next_review_seconds, rowid LIMIT 1"
        );
        let row = sqlx::query(&sql)
            .bind(owner)
            .bind(to_unix(&now))
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        row.as_ref().map(row_to_item).transpose()
    }

    async fn count_due(&self, owner: i64, now: DateTime<Utc>) -> Result<i64, RepositoryError> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM Repetition WHERE chat_id = ? AND next_review_seconds <= ?",
        )
        .bind(owner)
        .bind(to_unix(&now))
        .fetch_one(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))
    }

    async fn list(&self, owner: i64) -> Result<Vec<Item>, RepositoryError> {
        let sql = format!(
            "SELECT {ITEM_COLUMNS} FROM Repetition
             WHERE chat_id = ?
             ORDER BY next_review_seconds, rowid"
        );
        let rows = sqlx::query(&sql)
            .bind(owner)
            .fetch_all(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        rows.iter().map(row_to_item).collect()
    }

    async fn exists(&self, owner: i64, word: &str) -> Result<bool, RepositoryError> {
        let found: Option<i64> =
            sqlx::query_scalar("SELECT 1 FROM Repetition WHERE chat_id = ? AND word = ? LIMIT 1")
                .bind(owner)
                .bind(word)
                .fetch_optional(&self.pool.reader)
                .await
                .map_err(|e| RepositoryError::Query(e.to_string()))?;
        Ok(found.is_some())
    }

    async fn delete(&self, owner: i64, word: &str) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM Repetition WHERE chat_id = ? AND word = ?")
            .bind(owner)
            .bind(word)
            .execute(&self.pool.writer)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        tracing::debug!(owner, word, removed = result.rows_affected(), "deleted item");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::TimeDelta;
    use rehearse_core::scheduler;
    use rehearse_core::service::review::ReviewService;
    use rehearse_types::config::SchedulerConfig;
    use rehearse_types::error::{ConfigError, ReviewError};
    use rehearse_types::item::{MASK, Quality};

    async fn test_pool() -> DatabasePool {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let url = format!("sqlite://{}?mode=rwc", db_path.display());
        // Leak the TempDir so it lives as long as the pool
        std::mem::forget(dir);
        DatabasePool::new(&url).await.unwrap()
    }

    async fn test_store() -> (SqliteItemStore, DatabasePool) {
        let pool = test_pool().await;
        let store = SqliteItemStore::open(pool.clone(), &AppConfig::default())
            .await
            .unwrap();
        (store, pool)
    }

    fn service(store: SqliteItemStore) -> ReviewService<SqliteItemStore> {
        ReviewService::new(store, SchedulerConfig::default()).unwrap()
    }

    /// Move an item's last review and due time `days` into the past.
    async fn backdate(pool: &DatabasePool, owner: i64, word: &str, days: i64) {
        let secs = days * 24 * 60 * 60;
        sqlx::query(
            "UPDATE Repetition
             SET last_updated_seconds = last_updated_seconds - ?,
                 next_review_seconds = next_review_seconds - ?
             WHERE chat_id = ? AND word = ?",
        )
        .bind(secs)
        .bind(secs)
        .bind(owner)
        .bind(word)
        .execute(&pool.writer)
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_open_rejects_empty_stage_list() {
        let pool = test_pool().await;
        let config = AppConfig {
            stages: Vec::new(),
            ..AppConfig::default()
        };
        let err = SqliteItemStore::open(pool, &config).await.err().unwrap();
        assert!(matches!(err, RepositoryError::Config(ConfigError::NoStages)));
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let (store, _pool) = test_store().await;
        let now = Utc::now();
        let item = Item {
            owner: 4,
            word: "alma".to_string(),
            definition: "alma\n\napple".to_string(),
            ease: 250,
            interval: 0,
            last_reviewed: now,
            due_at: now,
        };

        let inserted = store.insert(&item).await.unwrap();
        assert_eq!(inserted.last_reviewed.timestamp(), now.timestamp());

        let fetched = store.get(4, "alma").await.unwrap().unwrap();
        assert_eq!(fetched, inserted);
        assert!(store.exists(4, "alma").await.unwrap());
        assert!(!store.exists(5, "alma").await.unwrap());
        assert!(store.get(4, "körte").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_insert_duplicate_is_conflict() {
        let (store, _pool) = test_store().await;
        let svc = service(store);
        svc.save(1, "alma", "apple").await.unwrap();

        let err = svc.save(1, "alma", "apple again").await.unwrap_err();
        assert!(matches!(err, ReviewError::Duplicate { .. }));
        assert_eq!(svc.list(1).await.unwrap().len(), 1);
        assert_eq!(svc.get_definition(1, "alma").await.unwrap(), "apple");
    }

    #[tokio::test]
    async fn test_save_then_repeat_masks_word() {
        let (store, _pool) = test_store().await;
        let svc = service(store);
        svc.save(1, "alma", "fruit\n\nalma is a fruit").await.unwrap();

        assert_eq!(svc.repeat(1).await.unwrap(), format!("{MASK} is a fruit"));
        assert_eq!(svc.repeat_word(1).await.unwrap(), "alma");
    }

    #[tokio::test]
    async fn test_answer_sequence_from_new() {
        let (store, _pool) = test_store().await;
        let svc = service(store);
        svc.save(1, "kutya", "dog").await.unwrap();

        let first = svc.answer(1, "kutya", Quality::Good).await.unwrap();
        assert_eq!((first.ease, first.interval), (250, 1));
        let second = svc.answer(1, "kutya", Quality::Good).await.unwrap();
        assert_eq!((second.ease, second.interval), (250, 3));

        let stored = svc.get(1, "kutya").await.unwrap();
        assert_eq!(stored, second);
        assert!(matches!(
            svc.repeat(1).await.unwrap_err(),
            ReviewError::NothingDue { owner: 1 }
        ));
    }

    #[tokio::test]
    async fn test_answer_again_relearn_window() {
        let (store, _pool) = test_store().await;
        let svc = service(store);
        svc.save(1, "kutya", "dog").await.unwrap();

        let item = svc.answer(1, "kutya", Quality::Again).await.unwrap();
        assert_eq!(item.ease, 230);
        assert_eq!(item.interval, 0);
        assert_eq!(item.due_at - item.last_reviewed, TimeDelta::seconds(20));
    }

    #[tokio::test]
    async fn test_answer_overdue_uses_elapsed_days() {
        let (store, pool) = test_store().await;
        let svc = service(store);
        svc.save(1, "macska", "cat").await.unwrap();
        svc.answer(1, "macska", Quality::Good).await.unwrap();
        svc.answer(1, "macska", Quality::Good).await.unwrap();
        backdate(&pool, 1, "macska", 10).await;

        let item = svc.answer(1, "macska", Quality::Good).await.unwrap();
        assert_eq!(item.interval, 25);
    }

    #[tokio::test]
    async fn test_answer_missing_item() {
        let (store, _pool) = test_store().await;
        let err = store
            .review(1, "nincs", |item| item.review_state())
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound));
    }

    #[tokio::test]
    async fn test_concurrent_answers_are_serialized() {
        let (store, _pool) = test_store().await;
        let svc = service(store);
        svc.save(1, "ló", "horse").await.unwrap();

        let (a, b) = tokio::join!(
            svc.answer(1, "ló", Quality::Good),
            svc.answer(1, "ló", Quality::Good)
        );
        let mut intervals = vec![a.unwrap().interval, b.unwrap().interval];
        intervals.sort();
        assert_eq!(intervals, vec![1, 3]);
        assert_eq!(svc.get(1, "ló").await.unwrap().interval, 3);
    }

    #[tokio::test]
    async fn test_next_due_orders_by_due_time_then_insertion() {
        let (store, pool) = test_store().await;
        let svc = service(store.clone());
        svc.save(1, "első", "first").await.unwrap();
        svc.save(1, "második", "second").await.unwrap();
        svc.save(1, "harmadik", "third").await.unwrap();
        backdate(&pool, 1, "harmadik", 2).await;

        assert_eq!(svc.repeat_word(1).await.unwrap(), "harmadik");
        svc.delete(1, "harmadik").await.unwrap();
        // Same due second: insertion order decides.
        assert_eq!(svc.repeat_word(1).await.unwrap(), "első");
    }

    #[tokio::test]
    async fn test_not_yet_due_items_are_skipped() {
        let (store, _pool) = test_store().await;
        let svc = service(store.clone());
        svc.save(1, "alma", "apple").await.unwrap();
        svc.answer(1, "alma", Quality::Good).await.unwrap();

        assert_eq!(svc.count_due(1).await.unwrap(), 0);
        let later = Utc::now() + TimeDelta::days(2);
        assert_eq!(store.count_due(1, later).await.unwrap(), 1);
        assert_eq!(store.next_due(1, later).await.unwrap().unwrap().word, "alma");
    }

    #[tokio::test]
    async fn test_owners_are_isolated() {
        let (store, _pool) = test_store().await;
        let svc = service(store);
        svc.save(1, "alma", "apple").await.unwrap();
        svc.save(2, "alma", "Apfel").await.unwrap();
        svc.answer(1, "alma", Quality::Easy).await.unwrap();

        assert_eq!(svc.get(2, "alma").await.unwrap().ease, 250);
        assert_eq!(svc.list(2).await.unwrap().len(), 1);
        svc.delete(1, "alma").await.unwrap();
        assert!(svc.exists(2, "alma").await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_missing_is_noop() {
        let (store, _pool) = test_store().await;
        store.delete(1, "nincs").await.unwrap();
    }

    #[tokio::test]
    async fn test_far_future_due_time_round_trips() {
        let (store, _pool) = test_store().await;
        let now = Utc::now();
        let item = Item {
            owner: 1,
            word: "örök".to_string(),
            definition: "eternal".to_string(),
            ease: 1300,
            interval: i64::MAX,
            last_reviewed: now,
            due_at: scheduler::add_days(now, i64::MAX),
        };
        store.insert(&item).await.unwrap();

        let fetched = store.get(1, "örök").await.unwrap().unwrap();
        assert_eq!(fetched.due_at.timestamp(), DateTime::<Utc>::MAX_UTC.timestamp());
        assert!(store.next_due(1, now).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_legacy_rows_become_reviewable() {
        let pool = test_pool().await;
        let last = Utc::now().timestamp() - 3_600;
        sqlx::query(
            "INSERT INTO Repetition (chat_id, word, definition, stage, last_updated_seconds)
             VALUES (9, 'régi', 'régi\n\nold', 2, ?)",
        )
        .bind(last)
        .execute(&pool.writer)
        .await
        .unwrap();

        let store = SqliteItemStore::open(pool, &AppConfig::default()).await.unwrap();
        let item = store.get(9, "régi").await.unwrap().unwrap();
        assert_eq!(item.ease, 250);
        assert_eq!(item.interval, 0);
        // Default stage 2 is ten minutes.
        assert_eq!(item.due_at.timestamp(), last + 600);

        let svc = service(store);
        assert_eq!(svc.repeat(9).await.unwrap(), "old");
    }

    #[tokio::test]
    async fn test_open_with_invalid_scheduler_leaves_legacy_rows_alone() {
        let pool = test_pool().await;
        let last = Utc::now().timestamp() - 60;
        sqlx::query(
            "INSERT INTO Repetition (chat_id, word, definition, stage, last_updated_seconds)
             VALUES (3, 'szilva', 'plum', 0, ?)",
        )
        .bind(last)
        .execute(&pool.writer)
        .await
        .unwrap();

        let config = AppConfig {
            scheduler: SchedulerConfig {
                initial_ease: 5_000,
                ..SchedulerConfig::default()
            },
            ..AppConfig::default()
        };
        let err = SqliteItemStore::open(pool.clone(), &config).await.err().unwrap();
        assert!(matches!(err, RepositoryError::Config(ConfigError::Invalid(_))));

        let version: i64 = sqlx::query_scalar("PRAGMA user_version")
            .fetch_one(&pool.writer)
            .await
            .unwrap();
        assert_eq!(version, 0);

        let store = SqliteItemStore::open(pool, &AppConfig::default()).await.unwrap();
        let item = store.get(3, "szilva").await.unwrap().unwrap();
        assert_eq!(item.ease, 250);
        assert!((130..=1300).contains(&item.ease));
    }
}
