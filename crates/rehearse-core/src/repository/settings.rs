//! Settings repository trait definition.

use std::collections::BTreeMap;

use rehearse_types::error::RepositoryError;
use rehearse_types::settings::Settings;

/// Repository trait for per-chat settings.
pub trait SettingsRepository: Send + Sync {
    /// Settings for a chat. `None` if the chat never stored any.
    fn get(
        &self,
        owner: i64,
    ) -> impl std::future::Future<Output = Result<Option<Settings>, RepositoryError>> + Send;

    /// Store settings for a chat (upsert).
    fn set(
        &self,
        owner: i64,
        settings: &Settings,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Settings of every chat that stored any.
    fn get_all(
        &self,
    ) -> impl std::future::Future<Output = Result<BTreeMap<i64, Settings>, RepositoryError>> + Send;
}
