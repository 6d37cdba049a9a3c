//! Application state wiring all services together.
//!
//! Services are generic over repository traits; AppState pins them to the
//! SQLite implementations.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use rehearse_core::service::review::ReviewService;
use rehearse_core::service::settings::SettingsService;
use rehearse_infra::config::{load_config, resolve_data_dir};
use rehearse_infra::sqlite::item::SqliteItemStore;
use rehearse_infra::sqlite::pool::{DatabasePool, default_database_url};
use rehearse_infra::sqlite::settings::SqliteSettingsRepository;
use rehearse_types::config::AppConfig;

pub type ConcreteReviewService = ReviewService<SqliteItemStore>;

pub type ConcreteSettingsService = SettingsService<SqliteSettingsRepository>;

/// Shared application state holding all services.
#[derive(Clone)]
pub struct AppState {
    pub review_service: Arc<ConcreteReviewService>,
    pub settings_service: Arc<ConcreteSettingsService>,
    pub item_store: SqliteItemStore,
    pub config: AppConfig,
    pub data_dir: PathBuf,
    pub db_pool: DatabasePool,
}

impl AppState {
    /// Connect to the database, upgrade legacy records and wire services.
    ///
    /// An invalid configuration aborts startup.
    pub async fn init() -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();

        tokio::fs::create_dir_all(&data_dir)
            .await
            .with_context(|| format!("failed to create data directory {}", data_dir.display()))?;

        let config = load_config(&data_dir).await;

        let db_url = default_database_url();
        let db_pool = DatabasePool::new(&db_url)
            .await
            .context("failed to open database")?;

        let item_store = SqliteItemStore::open(db_pool.clone(), &config)
            .await
            .context("failed to open item store")?;

        let review_service = ReviewService::new(item_store.clone(), config.scheduler.clone())
            .context("invalid scheduler configuration")?;

        let settings_service = SettingsService::new(
            SqliteSettingsRepository::new(db_pool.clone()),
            config.languages.clone(),
        );

        tracing::debug!(data_dir = %data_dir.display(), "application state ready");

        Ok(Self {
            review_service: Arc::new(review_service),
            settings_service: Arc::new(settings_service),
            item_store,
            config,
            data_dir,
            db_pool,
        })
    }
}
