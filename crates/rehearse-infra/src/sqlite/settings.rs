//! SQLite settings repository implementation.
//!
//! One JSON document per chat in the `Settings` table.

use std::collections::BTreeMap;

use rehearse_core::repository::settings::SettingsRepository;
use rehearse_types::error::RepositoryError;
use rehearse_types::settings::Settings;
use sqlx::Row;

use super::pool::DatabasePool;

/// SQLite-backed implementation of `SettingsRepository`.
#[derive(Clone)]
pub struct SqliteSettingsRepository {
    pool: DatabasePool,
}

impl SqliteSettingsRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

fn parse_settings(owner: i64, raw: &str) -> Result<Settings, RepositoryError> {
    serde_json::from_str(raw)
        .map_err(|e| RepositoryError::Query(format!("invalid settings JSON for chat {owner}: {e}")))
}

impl SettingsRepository for SqliteSettingsRepository {
    async fn get(&self, owner: i64) -> Result<Option<Settings>, RepositoryError> {
        let raw: Option<String> =
            sqlx::query_scalar("SELECT settings FROM Settings WHERE chat_id = ?")
                .bind(owner)
                .fetch_optional(&self.pool.reader)
                .await
                .map_err(|e| RepositoryError::Query(e.to_string()))?;

        raw.map(|raw| parse_settings(owner, &raw)).transpose()
    }

    async fn set(&self, owner: i64, settings: &Settings) -> Result<(), RepositoryError> {
        let raw = serde_json::to_string(settings)
            .map_err(|e| RepositoryError::Query(format!("failed to serialize settings: {e}")))?;

        sqlx::query(
            "INSERT INTO Settings (chat_id, settings) VALUES (?, ?)
             ON CONFLICT(chat_id) DO UPDATE SET settings = excluded.settings",
        )
        .bind(owner)
        .bind(raw)
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(())
    }

    async fn get_all(&self) -> Result<BTreeMap<i64, Settings>, RepositoryError> {
        let rows = sqlx::query("SELECT chat_id, settings FROM Settings ORDER BY chat_id")
            .fetch_all(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let mut all = BTreeMap::new();
        for row in &rows {
            let owner: i64 = row
                .try_get("chat_id")
                .map_err(|e| RepositoryError::Query(e.to_string()))?;
            let raw: String = row
                .try_get("settings")
                .map_err(|e| RepositoryError::Query(e.to_string()))?;
            match parse_settings(owner, &raw) {
                Ok(settings) => {
                    all.insert(owner, settings);
                }
                // One corrupt row must not hide every other chat.
                Err(e) => tracing::warn!(owner, error = %e, "skipping unreadable settings"),
            }
        }
        Ok(all)
    }
}
