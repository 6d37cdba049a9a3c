//! Legacy stage durations.
//!
//! Records created before the ease/interval model carry a discrete `stage`
//! index into a configured list of durations. The table is only consulted
//! when backfilling those records.

use std::time::Duration;

use rehearse_types::config::StageDuration;
use rehearse_types::error::ConfigError;

/// Exclusive upper bound on the number of configured stages.
pub const MAX_STAGES: usize = 1_000_000;

/// Validated lookup from legacy stage index to its duration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageTable {
    durations: Vec<Duration>,
    /// Final configured duration, served for any index past the list.
    overflow: Duration,
}

impl StageTable {
    /// Build the table, rejecting an empty list or one with `MAX_STAGES` or more entries.
    pub fn new(durations: Vec<Duration>) -> Result<Self, ConfigError> {
        if durations.len() >= MAX_STAGES {
            return Err(ConfigError::TooManyStages {
                count: durations.len(),
                max: MAX_STAGES,
            });
        }
        let overflow = *durations.last().ok_or(ConfigError::NoStages)?;
        Ok(Self { durations, overflow })
    }

    pub fn from_config(stages: &[StageDuration]) -> Result<Self, ConfigError> {
        Self::new(stages.iter().map(|s| s.0).collect())
    }

    /// Duration for a stage index.
    ///
    /// Indices beyond the configured list (the list may have shrunk since the
    /// record was written) resolve to the final duration, so such records stay
    /// schedulable. Negative indices resolve to stage 0.
    pub fn duration(&self, stage: i64) -> Duration {
        let index = usize::try_from(stage.max(0)).unwrap_or(MAX_STAGES);
        self.durations.get(index).copied().unwrap_or(self.overflow)
    }

    /// Same as [`duration`](Self::duration), in whole seconds.
    pub fn seconds(&self, stage: i64) -> i64 {
        i64::try_from(self.duration(stage).as_secs()).unwrap_or(i64::MAX)
    }

    pub fn len(&self) -> usize {
        self.durations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.durations.is_empty()
    }
}
