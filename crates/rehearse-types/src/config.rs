//! Configuration types for Rehearse.
//!
//! `AppConfig` represents the top-level `config.toml`: the legacy stage
//! durations consumed by the schema migrator, the scheduler constants, the
//! reminder loop cadence and the catalog of supported languages.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::item::{MAX_EASE, MIN_EASE};
use crate::settings::LanguageCatalog;

/// Top-level configuration. All fields have sensible defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Ordered durations of the legacy discrete stages, indexed by stage number.
    #[serde(default = "default_stages")]
    pub stages: Vec<StageDuration>,

    #[serde(default)]
    pub scheduler: SchedulerConfig,

    #[serde(default)]
    pub reminder: ReminderConfig,

    #[serde(default)]
    pub languages: LanguageCatalog,
}

fn default_stages() -> Vec<StageDuration> {
    [
        20,
        60,
        10 * 60,
        60 * 60,
        24 * 60 * 60,
        3 * 24 * 60 * 60,
        7 * 24 * 60 * 60,
        30 * 24 * 60 * 60,
    ]
    .into_iter()
    .map(|secs| StageDuration(Duration::from_secs(secs)))
    .collect()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            stages: default_stages(),
            scheduler: SchedulerConfig::default(),
            reminder: ReminderConfig::default(),
            languages: LanguageCatalog::default(),
        }
    }
}

/// Constants owned by the review scheduler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Ease assigned to new items and to migrated legacy records.
    #[serde(default = "default_initial_ease")]
    pub initial_ease: i64,

    /// Interval assigned to new items; 0 is the first review window.
    #[serde(default)]
    pub initial_interval_days: i64,

    /// Wait imposed after an `Again` answer.
    #[serde(default = "default_relearn_delay_secs")]
    pub relearn_delay_secs: u64,

    /// Extra growth factor applied on `Easy`.
    #[serde(default = "default_easy_bonus")]
    pub easy_bonus: f64,
}

fn default_initial_ease() -> i64 {
    250
}

fn default_relearn_delay_secs() -> u64 {
    20
}

fn default_easy_bonus() -> f64 {
    1.3
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            initial_ease: default_initial_ease(),
            initial_interval_days: 0,
            relearn_delay_secs: default_relearn_delay_secs(),
            easy_bonus: default_easy_bonus(),
        }
    }
}

impl SchedulerConfig {
    /// Reject values that would break the item invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_EASE..=MAX_EASE).contains(&self.initial_ease) {
            return Err(ConfigError::Invalid(format!(
                "initial_ease {} outside [{MIN_EASE}, {MAX_EASE}]",
                self.initial_ease
            )));
        }
        if self.initial_interval_days < 0 {
            return Err(ConfigError::Invalid(format!(
                "initial_interval_days {} is negative",
                self.initial_interval_days
            )));
        }
        if !self.easy_bonus.is_finite() || self.easy_bonus < 1.0 {
            return Err(ConfigError::Invalid(format!(
                "easy_bonus {} must be a finite number >= 1.0",
                self.easy_bonus
            )));
        }
        Ok(())
    }

    pub fn relearn_delay(&self) -> Duration {
        Duration::from_secs(self.relearn_delay_secs)
    }
}

/// Cadence of the reminder loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReminderConfig {
    /// Seconds between two passes over all chats.
    #[serde(default = "default_tick_secs")]
    pub tick_secs: u64,

    /// Reminders per day for a single chat.
    #[serde(default = "default_frequency_per_day")]
    pub frequency_per_day: u32,
}

fn default_tick_secs() -> u64 {
    60
}

fn default_frequency_per_day() -> u32 {
    1
}

impl Default for ReminderConfig {
    fn default() -> Self {
        Self {
            tick_secs: default_tick_secs(),
            frequency_per_day: default_frequency_per_day(),
        }
    }
}

impl ReminderConfig {
    /// Minimum gap between two reminders for the same chat.
    pub fn min_gap(&self) -> Duration {
        let per_day = u64::from(self.frequency_per_day.max(1));
        Duration::from_secs(24 * 60 * 60 / per_day)
    }
}

/// A duration written in config files as `<n><unit>` with unit `s`, `m`, `h` or `d`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StageDuration(pub Duration);

impl StageDuration {
    pub fn as_secs(&self) -> i64 {
        i64::try_from(self.0.as_secs()).unwrap_or(i64::MAX)
    }
}

impl FromStr for StageDuration {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let invalid = || ConfigError::InvalidDuration(s.to_string());

        let split = trimmed
            .find(|c: char| !c.is_ascii_digit())
            .ok_or_else(invalid)?;
        let (digits, unit) = trimmed.split_at(split);
        let n: u64 = digits.parse().map_err(|_| invalid())?;

        let scale = match unit.trim() {
            "s" => 1,
            "m" => 60,
            "h" => 60 * 60,
            "d" => 24 * 60 * 60,
            _ => return Err(invalid()),
        };

        n.checked_mul(scale)
            .map(|secs| StageDuration(Duration::from_secs(secs)))
            .ok_or_else(invalid)
    }
}

impl TryFrom<String> for StageDuration {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<StageDuration> for String {
    fn from(value: StageDuration) -> Self {
        value.to_string()
    }
}

impl fmt::Display for StageDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let secs = self.0.as_secs();
        for (unit, scale) in [("d", 86_400), ("h", 3_600), ("m", 60)] {
            if secs != 0 && secs % scale == 0 {
                return write!(f, "{}{unit}", secs / scale);
            }
        }
        write!(f, "{secs}s")
    }
}
