//! Periodic reminder loop.
//!
//! On every tick, walks all chats with stored settings and nudges those that
//! have something due and were not reminded within the configured gap. The
//! loop only reads items; it never reschedules them.

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use rehearse_types::config::ReminderConfig;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::repository::item::ItemRepository;
use crate::repository::reminder::ReminderRepository;
use crate::repository::settings::SettingsRepository;

/// A nudge for one chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub owner: i64,
    /// Number of items due when the reminder was sent.
    pub due: i64,
}

#[derive(Debug, thiserror::Error)]
#[error("notification failed: {0}")]
pub struct NotifyError(pub String);

/// Delivers notifications to the learner (chat message, log line, ...).
pub trait Notifier: Send + Sync {
    fn notify(
        &self,
        notification: &Notification,
    ) -> impl std::future::Future<Output = Result<(), NotifyError>> + Send;
}

/// Notifier that only logs.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    async fn notify(&self, notification: &Notification) -> Result<(), NotifyError> {
        tracing::info!(
            owner = notification.owner,
            due = notification.due,
            "reminder: items waiting for review"
        );
        Ok(())
    }
}

pub struct Reminder<S, R, I, N>
where
    S: SettingsRepository,
    R: ReminderRepository,
    I: ItemRepository,
    N: Notifier,
{
    settings: S,
    reminders: R,
    items: I,
    notifier: N,
    config: ReminderConfig,
}

impl<S, R, I, N> Reminder<S, R, I, N>
where
    S: SettingsRepository,
    R: ReminderRepository,
    I: ItemRepository,
    N: Notifier,
{
    pub fn new(settings: S, reminders: R, items: I, notifier: N, config: ReminderConfig) -> Self {
        Self {
            settings,
            reminders,
            items,
            notifier,
            config,
        }
    }

    /// Run until `cancel` fires. The first pass happens immediately.
    pub async fn run(&self, cancel: CancellationToken) {
        let tick = Duration::from_secs(self.config.tick_secs.max(1));
        let mut ticker = tokio::time::interval(tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(tick_secs = tick.as_secs(), "reminder loop started");
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("reminder loop stopped");
                    return;
                }
                _ = ticker.tick() => {
                    self.run_once(Utc::now()).await;
                }
            }
        }
    }

    /// One pass over all chats. Returns the number of notifications sent.
    ///
    /// Failures are logged per chat and never abort the pass.
    pub async fn run_once(&self, now: DateTime<Utc>) -> usize {
        let chats = match self.settings.get_all().await {
            Ok(chats) => chats,
            Err(e) => {
                tracing::warn!(error = %e, "failed to fetch settings");
                return 0;
            }
        };

        let gap = TimeDelta::from_std(self.config.min_gap()).unwrap_or(TimeDelta::days(1));
        let mut sent = 0;

        for owner in chats.keys().copied() {
            match self.reminders.last_reminder(owner).await {
                Ok(Some(last)) if now < last + gap => continue,
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(owner, error = %e, "failed to read last reminder time");
                    continue;
                }
            }

            let due = match self.items.count_due(owner, now).await {
                Ok(0) => continue,
                Ok(due) => due,
                Err(e) => {
                    tracing::warn!(owner, error = %e, "failed to count due items");
                    continue;
                }
            };

            if let Err(e) = self.notifier.notify(&Notification { owner, due }).await {
                tracing::warn!(owner, error = %e, "failed to send reminder");
                continue;
            }
            sent += 1;

            if let Err(e) = self.reminders.record_reminder(owner, now).await {
                tracing::warn!(owner, error = %e, "failed to record reminder time");
            }
        }

        tracing::debug!(chats = chats.len(), sent, "reminder pass finished");
        sent
    }
}
