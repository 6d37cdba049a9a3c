//! Settings CLI subcommands (show, language, timezone).

use anyhow::Result;
use chrono::Utc;
use clap::Subcommand;
use console::style;

use rehearse_types::settings::Settings;

use crate::state::AppState;

#[derive(Subcommand)]
pub enum SettingsCommand {
    /// Show the chat's settings and the supported languages.
    Show,

    /// Set the input language (e.g. Hungarian, English, German).
    Language { name: String },

    /// Set the time zone (UTC, UTC+N or UTC-N).
    Timezone { zone: String },
}

pub async fn handle_settings_command(cmd: SettingsCommand, state: &AppState, chat: i64, json: bool) -> Result<()> {
    match cmd {
        SettingsCommand::Show => show(state, chat, json).await,
        SettingsCommand::Language { name } => {
            let settings = state.settings_service.set_language(chat, &name).await?;
            print_settings(chat, &settings, json)
        }
        SettingsCommand::Timezone { zone } => {
            let settings = state.settings_service.set_time_zone(chat, &zone).await?;
            print_settings(chat, &settings, json)
        }
    }
}

async fn show(state: &AppState, chat: i64, json: bool) -> Result<()> {
    let settings = state.settings_service.get(chat).await?;
    print_settings(chat, &settings, json)?;

    if !json {
        let languages = state.settings_service.catalog().language_names().join(", ");
        println!("  {:<20} {}", style("Available").dim(), languages);
        println!();
    }
    Ok(())
}

fn print_settings(chat: i64, settings: &Settings, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(settings)?);
        return Ok(());
    }

    let translations: Vec<&str> = settings
        .translation_languages
        .iter()
        .filter(|(_, enabled)| **enabled)
        .map(|(code, _)| code.as_str())
        .collect();

    let local_time = settings
        .time_zone()
        .and_then(|tz| tz.to_fixed_offset())
        .map(|offset| Utc::now().with_timezone(&offset).format("%H:%M").to_string())
        .unwrap_or_else(|| "-".to_string());

    println!();
    println!("  Settings for chat {}", style(chat).cyan());
    println!();
    println!(
        "  {:<20} {} ({})",
        style("Input language").dim(),
        settings.input_language,
        settings.input_language_iso639_3
    );
    println!("  {:<20} {}", style("Translations").dim(), translations.join(", "));
    println!(
        "  {:<20} {} (local time {})",
        style("Time zone").dim(),
        settings.time_zone,
        local_time
    );
    println!();
    Ok(())
}
