//! Configuration loader for Rehearse.
//!
//! Reads `config.toml` from the data directory (`~/.rehearse/` in production)
//! and deserializes it into [`AppConfig`]. Falls back to defaults when the
//! file is missing or malformed. Semantic checks (empty stage list, ease out
//! of range) happen later, in the constructors that consume the values.

use std::path::{Path, PathBuf};

use rehearse_types::config::AppConfig;

/// File name of the configuration inside the data directory.
pub const CONFIG_FILE: &str = "config.toml";

/// Load configuration from `{data_dir}/config.toml`.
pub async fn load_config(data_dir: &Path) -> AppConfig {
    let config_path = data_dir.join(CONFIG_FILE);

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return AppConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return AppConfig::default();
        }
    };

    match toml::from_str::<AppConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            AppConfig::default()
        }
    }
}

/// Resolve the data directory from environment or platform defaults.
///
/// Priority:
/// 1. `REHEARSE_DATA_DIR` environment variable
/// 2. `~/.rehearse`
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("REHEARSE_DATA_DIR") {
        return PathBuf::from(dir);
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(".rehearse");
    }

    PathBuf::from(".rehearse")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;

    #[tokio::test]
    async fn load_config_missing_file_returns_default() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(tmp.path()).await;
        assert_eq!(config.stages.len(), 8);
        assert_eq!(config.scheduler.initial_ease, 250);
    }

    #[tokio::test]
    async fn load_config_valid_toml_returns_parsed() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(
            tmp.path().join(CONFIG_FILE),
            r#"
stages = ["30s", "5m", "2d"]

[scheduler]
relearn_delay_secs = 60

[reminder]
frequency_per_day = 2
"#,
        )
        .await
        .unwrap();

        let config = load_config(tmp.path()).await;
        assert_eq!(config.stages.len(), 3);
        assert_eq!(config.stages[2].0, Duration::from_secs(2 * 24 * 60 * 60));
        assert_eq!(config.scheduler.relearn_delay_secs, 60);
        assert_eq!(config.scheduler.initial_ease, 250);
        assert_eq!(config.reminder.min_gap(), Duration::from_secs(12 * 60 * 60));
    }

    #[tokio::test]
    async fn load_config_invalid_toml_returns_default() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(tmp.path().join(CONFIG_FILE), "this is not { valid toml !!!")
            .await
            .unwrap();

        let config = load_config(tmp.path()).await;
        assert_eq!(config.stages.len(), 8);
    }

    #[tokio::test]
    async fn load_config_bad_duration_returns_default() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(tmp.path().join(CONFIG_FILE), r#"stages = ["20 parsecs"]"#)
            .await
            .unwrap();

        let config = load_config(tmp.path()).await;
        assert_eq!(config.stages.len(), 8);
    }

    #[tokio::test]
    async fn load_config_keeps_empty_stage_list_for_validation() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(tmp.path().join(CONFIG_FILE), "stages = []")
            .await
            .unwrap();

        let config = load_config(tmp.path()).await;
        assert!(config.stages.is_empty());
    }

    #[test]
    fn test_resolve_data_dir_from_env() {
        // SAFETY: This test is single-threaded and restores the env var immediately.
        unsafe {
            std::env::set_var("REHEARSE_DATA_DIR", "/tmp/test-rehearse");
        }
        let dir = resolve_data_dir();
        assert_eq!(dir, PathBuf::from("/tmp/test-rehearse"));
        unsafe {
            std::env::remove_var("REHEARSE_DATA_DIR");
        }
    }
}
