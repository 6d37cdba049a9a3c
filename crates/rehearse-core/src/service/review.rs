//! Review service.
//!
//! Entry point for the chat front-end: registers new items, hands out due
//! prompts, and advances scheduling state when the learner answers.

use chrono::Utc;
use rehearse_types::config::SchedulerConfig;
use rehearse_types::error::{ConfigError, RepositoryError, ReviewError};
use rehearse_types::item::{Item, Quality};

use crate::mask::mask_definition;
use crate::repository::item::ItemRepository;
use crate::scheduler;

/// Service orchestrating the review lifecycle of items.
///
/// Generic over the item repository so the core never depends on
/// rehearse-infra.
pub struct ReviewService<R: ItemRepository> {
    repo: R,
    config: SchedulerConfig,
}

impl<R: ItemRepository> ReviewService<R> {
    /// Create a new ReviewService, validating the scheduler constants.
    pub fn new(repo: R, config: SchedulerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { repo, config })
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// Register a new word with its definition.
    ///
    /// The item starts with the configured initial ease and interval and is
    /// due after the initial interval. Saving an existing pair is rejected.
    pub async fn save(
        &self,
        owner: i64,
        word: &str,
        definition: &str,
    ) -> Result<Item, ReviewError> {
        let word = normalize_word(word);
        if word.is_empty() {
            return Err(ReviewError::InvalidInput("word cannot be empty".to_string()));
        }
        if definition.trim().is_empty() {
            return Err(ReviewError::InvalidInput(
                "definition cannot be empty".to_string(),
            ));
        }

        let now = Utc::now();
        let item = Item {
            owner,
            word: word.to_string(),
            definition: definition.to_string(),
            ease: self.config.initial_ease,
            interval: self.config.initial_interval_days,
            last_reviewed: now,
            due_at: scheduler::add_days(now, self.config.initial_interval_days),
        };

        let item = self
            .repo
            .insert(&item)
            .await
            .map_err(|e| map_pair_error(e, "save", owner, word))?;

        tracing::info!(owner, word, "saved item");
        Ok(item)
    }

    /// Apply the learner's recall quality to an item and reschedule it.
    pub async fn answer(
        &self,
        owner: i64,
        word: &str,
        quality: Quality,
    ) -> Result<Item, ReviewError> {
        let word = normalize_word(word);
        let now = Utc::now();
        let config = &self.config;

        let item = self
            .repo
            .review(owner, word, |current| {
                scheduler::schedule(&current.review_state(), quality, now, config)
            })
            .await
            .map_err(|e| map_pair_error(e, "answer", owner, word))?;

        tracing::debug!(
            owner,
            word,
            %quality,
            ease = item.ease,
            interval = item.interval,
            due_at = %item.due_at,
            "rescheduled item"
        );
        Ok(item)
    }

    /// The next due item, unmodified.
    pub async fn next_due(&self, owner: i64) -> Result<Item, ReviewError> {
        self.repo
            .next_due(owner, Utc::now())
            .await
            .map_err(|e| storage_error(e, "next_due", owner, None))?
            .ok_or(ReviewError::NothingDue { owner })
    }

    /// Definition of a due item, with the word masked out.
    pub async fn repeat(&self, owner: i64) -> Result<String, ReviewError> {
        let item = self.next_due(owner).await?;
        Ok(mask_definition(&item.word, &item.definition))
    }

    /// Word of a due item.
    pub async fn repeat_word(&self, owner: i64) -> Result<String, ReviewError> {
        self.next_due(owner).await.map(|item| item.word)
    }

    pub async fn exists(&self, owner: i64, word: &str) -> Result<bool, ReviewError> {
        let word = normalize_word(word);
        self.repo
            .exists(owner, word)
            .await
            .map_err(|e| storage_error(e, "exists", owner, Some(word)))
    }

    /// Raw definition of an item. A missing item is an error.
    pub async fn get_definition(&self, owner: i64, word: &str) -> Result<String, ReviewError> {
        self.get(owner, word).await.map(|item| item.definition)
    }

    pub async fn get(&self, owner: i64, word: &str) -> Result<Item, ReviewError> {
        let word = normalize_word(word);
        self.repo
            .get(owner, word)
            .await
            .map_err(|e| storage_error(e, "get", owner, Some(word)))?
            .ok_or_else(|| ReviewError::NotFound {
                owner,
                word: word.to_string(),
            })
    }

    /// Remove an item. Deleting a missing item is not an error.
    pub async fn delete(&self, owner: i64, word: &str) -> Result<(), ReviewError> {
        let word = normalize_word(word);
        self.repo
            .delete(owner, word)
            .await
            .map_err(|e| storage_error(e, "delete", owner, Some(word)))?;
        tracing::info!(owner, word, "deleted item");
        Ok(())
    }

    pub async fn list(&self, owner: i64) -> Result<Vec<Item>, ReviewError> {
        self.repo
            .list(owner)
            .await
            .map_err(|e| storage_error(e, "list", owner, None))
    }

    pub async fn count_due(&self, owner: i64) -> Result<i64, ReviewError> {
        self.repo
            .count_due(owner, Utc::now())
            .await
            .map_err(|e| storage_error(e, "count_due", owner, None))
    }
}

/// Words are stored without surrounding whitespace; every lookup matches that.
fn normalize_word(word: &str) -> &str {
    word.trim()
}

fn map_pair_error(err: RepositoryError, op: &str, owner: i64, word: &str) -> ReviewError {
    match err {
        RepositoryError::NotFound => ReviewError::NotFound {
            owner,
            word: word.to_string(),
        },
        RepositoryError::Conflict(_) => ReviewError::Duplicate {
            owner,
            word: word.to_string(),
        },
        other => storage_error(other, op, owner, Some(word)),
    }
}

fn storage_error(err: RepositoryError, op: &str, owner: i64, word: Option<&str>) -> ReviewError {
    match word {
        Some(word) => ReviewError::Storage(format!("{op} owner={owner} word={word:?}: {err}")),
        None => ReviewError::Storage(format!("{op} owner={owner}: {err}")),
    }
}
