use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use std::fmt;
use std::str::FromStr;

/// Lowest ease an item can reach.
pub const MIN_EASE: i64 = 130;

/// Highest ease an item can reach.
pub const MAX_EASE: i64 = 1300;

/// Token substituted for the word when a definition is shown as a prompt.
pub const MASK: &str = "********";

/// A single review card: one word and its definition, owned by one learner.
///
/// Exactly one item exists per `(owner, word)` pair. Callers always receive
/// owned copies; the store is the only holder of the persisted record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Opaque identifier of the learner (chat id).
    pub owner: i64,
    /// Prompt text.
    pub word: String,
    /// Full answer text. The first paragraph usually restates the word.
    pub definition: String,
    /// Difficulty coefficient in basis points, always within `[MIN_EASE, MAX_EASE]`.
    pub ease: i64,
    /// Days until the item is due again, counted from `last_reviewed`.
    pub interval: i64,
    /// Time of the last save or answer.
    pub last_reviewed: DateTime<Utc>,
    /// The item may be reviewed once `now >= due_at`.
    pub due_at: DateTime<Utc>,
}

impl Item {
    /// Scheduling fields of this item.
    pub fn review_state(&self) -> ReviewState {
        ReviewState {
            ease: self.ease,
            interval: self.interval,
            last_reviewed: self.last_reviewed,
            due_at: self.due_at,
        }
    }

    /// Overwrite the scheduling fields with a freshly computed state.
    pub fn apply(&mut self, state: ReviewState) {
        self.ease = state.ease;
        self.interval = state.interval;
        self.last_reviewed = state.last_reviewed;
        self.due_at = state.due_at;
    }

    /// Whether the item is eligible for review at `now`.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.due_at <= now
    }
}

/// The mutable scheduling part of an [`Item`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewState {
    pub ease: i64,
    pub interval: i64,
    pub last_reviewed: DateTime<Utc>,
    pub due_at: DateTime<Utc>,
}

/// Self-reported recall quality, ordered from total failure to effortless recall.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    /// Total failure; the item goes back into the short relearn window.
    Again,
    Hard,
    Good,
    Easy,
}

impl Quality {
    /// All levels in ascending order.
    pub const ALL: [Quality; 4] = [Quality::Again, Quality::Hard, Quality::Good, Quality::Easy];
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Quality::Again => write!(f, "again"),
            Quality::Hard => write!(f, "hard"),
            Quality::Good => write!(f, "good"),
            Quality::Easy => write!(f, "easy"),
        }
    }
}

impl FromStr for Quality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "again" => Ok(Quality::Again),
            "hard" => Ok(Quality::Hard),
            "good" => Ok(Quality::Good),
            "easy" => Ok(Quality::Easy),
            other => Err(format!("invalid answer quality: '{other}'")),
        }
    }
}
