//! `rehearse remind`: run the reminder loop against the local database.

use anyhow::Result;
use chrono::Utc;
use console::style;
use tokio_util::sync::CancellationToken;

use rehearse_core::reminder::{LogNotifier, Reminder};
use rehearse_infra::sqlite::reminder::SqliteReminderRepository;
use rehearse_infra::sqlite::settings::SqliteSettingsRepository;

use crate::state::AppState;

pub async fn remind(state: &AppState, once: bool, json: bool) -> Result<()> {
    let reminder = Reminder::new(
        SqliteSettingsRepository::new(state.db_pool.clone()),
        SqliteReminderRepository::new(state.db_pool.clone()),
        state.item_store.clone(),
        LogNotifier,
        state.config.reminder.clone(),
    );

    if once {
        let sent = reminder.run_once(Utc::now()).await;
        if json {
            println!("{}", serde_json::to_string_pretty(&serde_json::json!({ "sent": sent }))?);
        } else {
            println!("  {} Sent {} reminder(s)", style("ok").green(), sent);
        }
        return Ok(());
    }

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            shutdown_signal().await;
            cancel.cancel();
        }
    });

    if !json {
        println!(
            "  {} Reminder loop running on {}",
            style("⏰").bold(),
            style(state.data_dir.join("rehearse.db").display()).cyan()
        );
        println!("  {}", style("Press Ctrl+C to stop").dim());
    }

    reminder.run(cancel).await;

    if !json {
        println!("\n  Reminder loop stopped.");
    }
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
