//! Item repository trait definition.

use chrono::{DateTime, Utc};
use rehearse_types::error::RepositoryError;
use rehearse_types::item::{Item, ReviewState};

/// Repository trait for review item persistence.
///
/// Implementations live in rehearse-infra (e.g., SqliteItemStore).
/// Uses native async fn in traits (Rust 2024 edition, no async_trait macro).
pub trait ItemRepository: Send + Sync {
    /// Insert a new item. Returns `Conflict` if `(owner, word)` already exists.
    fn insert(
        &self,
        item: &Item,
    ) -> impl std::future::Future<Output = Result<Item, RepositoryError>> + Send;

    /// Atomically read the item for `(owner, word)`, compute its next
    /// scheduling state with `apply`, and write it back.
    ///
    /// No other write to the same pair may interleave between the read and
    /// the write. Returns `NotFound` when the pair does not exist.
    fn review<F>(
        &self,
        owner: i64,
        word: &str,
        apply: F,
    ) -> impl std::future::Future<Output = Result<Item, RepositoryError>> + Send
    where
        F: FnOnce(&Item) -> ReviewState + Send;

    /// Get a copy of the item for `(owner, word)`.
    fn get(
        &self,
        owner: i64,
        word: &str,
    ) -> impl std::future::Future<Output = Result<Option<Item>, RepositoryError>> + Send;

    /// The item with the earliest `due_at <= now` for an owner.
    fn next_due(
        &self,
        owner: i64,
        now: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<Option<Item>, RepositoryError>> + Send;

    /// Number of items with `due_at <= now` for an owner.
    fn count_due(
        &self,
        owner: i64,
        now: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<i64, RepositoryError>> + Send;

    /// All items of an owner, ordered by due time.
    fn list(
        &self,
        owner: i64,
    ) -> impl std::future::Future<Output = Result<Vec<Item>, RepositoryError>> + Send;

    fn exists(
        &self,
        owner: i64,
        word: &str,
    ) -> impl std::future::Future<Output = Result<bool, RepositoryError>> + Send;

    /// Delete the item. No-op if it does not exist.
    fn delete(
        &self,
        owner: i64,
        word: &str,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;
}
