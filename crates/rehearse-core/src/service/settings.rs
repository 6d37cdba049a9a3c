//! Per-chat settings service.
//!
//! Validates language and time-zone changes against the injected
//! [`LanguageCatalog`] before persisting them.

use std::collections::BTreeMap;

use rehearse_types::error::{RepositoryError, SettingsError};
use rehearse_types::settings::{LanguageCatalog, Settings};

use crate::repository::settings::SettingsRepository;

pub struct SettingsService<S: SettingsRepository> {
    repo: S,
    catalog: LanguageCatalog,
}

impl<S: SettingsRepository> SettingsService<S> {
    pub fn new(repo: S, catalog: LanguageCatalog) -> Self {
        Self { repo, catalog }
    }

    pub fn catalog(&self) -> &LanguageCatalog {
        &self.catalog
    }

    /// Settings for a chat, or the defaults if none were stored.
    pub async fn get(&self, owner: i64) -> Result<Settings, SettingsError> {
        Ok(self
            .repo
            .get(owner)
            .await
            .map_err(|e| storage_error(e, owner))?
            .unwrap_or_default())
    }

    pub async fn set(&self, owner: i64, settings: &Settings) -> Result<(), SettingsError> {
        self.repo
            .set(owner, settings)
            .await
            .map_err(|e| storage_error(e, owner))
    }

    pub async fn get_all(&self) -> Result<BTreeMap<i64, Settings>, SettingsError> {
        self.repo
            .get_all()
            .await
            .map_err(|e| SettingsError::Storage(format!("get_all: {e}")))
    }

    /// Switch the input language, adopting its ISO code and translation set.
    pub async fn set_language(&self, owner: i64, language: &str) -> Result<Settings, SettingsError> {
        let profile = self.catalog.language(language)?;
        let mut settings = self.get(owner).await?;
        settings.apply_language(profile);
        self.set(owner, &settings).await?;
        tracing::info!(owner, language, "updated input language");
        Ok(settings)
    }

    /// Switch the time zone. Accepts `UTC`, `UTC+N` and `UTC-N` within the catalog range.
    pub async fn set_time_zone(&self, owner: i64, tz: &str) -> Result<Settings, SettingsError> {
        let tz = self.catalog.time_zone(tz)?;
        let mut settings = self.get(owner).await?;
        settings.time_zone = tz.to_string();
        self.set(owner, &settings).await?;
        tracing::info!(owner, time_zone = %tz, "updated time zone");
        Ok(settings)
    }
}

fn storage_error(err: RepositoryError, owner: i64) -> SettingsError {
    SettingsError::Storage(format!("settings for chat {owner}: {err}"))
}
