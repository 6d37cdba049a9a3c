use thiserror::Error;

/// Errors raised while validating configuration.
///
/// Returned from constructors; a bad configuration must prevent startup.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("stage list is empty; at least one stage duration is required")]
    NoStages,

    #[error("too many stages: {count} (must be fewer than {max})")]
    TooManyStages { count: usize, max: usize },

    #[error("invalid duration '{0}' (expected e.g. 20s, 10m, 1h, 3d)")]
    InvalidDuration(String),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Errors from repository operations (used by trait definitions in rehearse-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("migration error: {0}")]
    Migration(String),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Errors surfaced by the review service to its callers.
#[derive(Debug, Error)]
pub enum ReviewError {
    #[error("no item '{word}' for owner {owner}")]
    NotFound { owner: i64, word: String },

    #[error("nothing due for owner {owner}")]
    NothingDue { owner: i64 },

    #[error("'{word}' is already saved for owner {owner}")]
    Duplicate { owner: i64, word: String },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("storage error: {0}")]
    Storage(String),
}

/// Errors related to per-chat settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("unsupported language '{0}'")]
    UnsupportedLanguage(String),

    #[error("unsupported time zone '{0}' (format should be UTC, UTC+X or UTC-X)")]
    UnsupportedTimeZone(String),

    #[error("storage error: {0}")]
    Storage(String),
}
