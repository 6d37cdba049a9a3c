//! Review scheduling.
//!
//! A variant of the Anki algorithm without separate learning/relearning
//! queues. Given the current scheduling state of an item and a recall-quality
//! signal, [`schedule`] computes the next ease, interval and due time. It is a
//! pure function of its inputs; persistence and atomicity live in the store.

use chrono::{DateTime, TimeDelta, Utc};
use rehearse_types::config::SchedulerConfig;
use rehearse_types::item::{MAX_EASE, MIN_EASE, Quality, ReviewState};

/// Ease lost on `Again`.
pub const AGAIN_PENALTY: i64 = 20;

/// Ease lost on `Hard`.
pub const HARD_PENALTY: i64 = 15;

/// Ease gained on `Easy`.
pub const EASY_BOOST: i64 = 15;

/// Fixed growth factor on `Hard`.
pub const HARD_MULTIPLIER: f64 = 1.2;

/// Upper bound for the growth factor of any answer.
pub const MAX_MULTIPLIER: f64 = 13.0;

/// Longest interval in days (one hundred years). Keeps due times
/// representable under repeated growth.
pub const MAX_INTERVAL_DAYS: i64 = 36_500;

/// Interval after the first successful review of a new or failed item.
const FIRST_INTERVAL: i64 = 1;

/// Interval after the second successful review.
const SECOND_INTERVAL: i64 = 3;

/// Whole days elapsed between `since` and `now`. Negative when `now` is earlier.
pub fn elapsed_days(since: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - since).num_days()
}

/// Interval to grow from: the stored one, or the real delay when the review is late.
pub fn effective_interval(current: &ReviewState, now: DateTime<Utc>) -> i64 {
    current.interval.max(elapsed_days(current.last_reviewed, now))
}

/// Ease after the quality adjustment, before clamping.
pub fn adjust_ease(ease: i64, quality: Quality) -> i64 {
    match quality {
        Quality::Again => ease - AGAIN_PENALTY,
        Quality::Hard => ease - HARD_PENALTY,
        Quality::Good => ease,
        Quality::Easy => ease + EASY_BOOST,
    }
}

/// Growth factor for a successful answer, computed from the adjusted ease.
///
/// `None` for `Again`, which resets the interval instead of growing it.
pub fn multiplier(adjusted_ease: i64, quality: Quality, easy_bonus: f64) -> Option<f64> {
    let m = match quality {
        Quality::Again => return None,
        Quality::Hard => HARD_MULTIPLIER,
        Quality::Good => adjusted_ease as f64 / 100.0,
        Quality::Easy => adjusted_ease as f64 * easy_bonus / 100.0,
    };
    Some(m.min(MAX_MULTIPLIER))
}

/// Next interval in days after a successful answer.
///
/// Strictly greater than `effective` until [`MAX_INTERVAL_DAYS`] is reached,
/// then stays at the cap.
pub fn next_interval(effective: i64, multiplier: f64) -> i64 {
    match effective {
        i if i <= 0 => FIRST_INTERVAL,
        1 => SECOND_INTERVAL,
        i => {
            let grown = (i as f64 * multiplier).round() as i64;
            grown.max(i.saturating_add(1)).min(MAX_INTERVAL_DAYS)
        }
    }
}

/// Compute the next scheduling state for an answer given at `now`.
pub fn schedule(
    current: &ReviewState,
    quality: Quality,
    now: DateTime<Utc>,
    config: &SchedulerConfig,
) -> ReviewState {
    let effective = effective_interval(current, now);
    let adjusted = adjust_ease(current.ease, quality);
    let growth = multiplier(adjusted, quality, config.easy_bonus);
    let ease = adjusted.clamp(MIN_EASE, MAX_EASE);

    let (interval, due_at) = match growth {
        None => {
            let delay = TimeDelta::from_std(config.relearn_delay()).unwrap_or(TimeDelta::MAX);
            (0, add_saturating(now, delay))
        }
        Some(m) => {
            let interval = next_interval(effective, m);
            (interval, add_days(now, interval))
        }
    };

    ReviewState {
        ease,
        interval,
        last_reviewed: now,
        due_at,
    }
}

/// `now + days`, saturating at the latest representable time.
pub fn add_days(now: DateTime<Utc>, days: i64) -> DateTime<Utc> {
    let delta = TimeDelta::try_days(days).unwrap_or(TimeDelta::MAX);
    add_saturating(now, delta)
}

fn add_saturating(now: DateTime<Utc>, delta: TimeDelta) -> DateTime<Utc> {
    now.checked_add_signed(delta)
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}
