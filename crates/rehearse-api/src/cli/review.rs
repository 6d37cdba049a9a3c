//! Review CLI commands: save, answer, repeat, lookups and listing.

use anyhow::Result;
use chrono::{DateTime, Utc};
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;

use rehearse_types::error::ReviewError;
use rehearse_types::item::{Item, Quality};

use crate::state::AppState;

/// Save a new word.
pub async fn save(state: &AppState, chat: i64, word: &str, definition: &str, json: bool) -> Result<()> {
    let item = state.review_service.save(chat, word, definition).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&item)?);
    } else {
        println!();
        println!(
            "  {} Saved '{}', due {}",
            style("ok").green(),
            style(&item.word).cyan(),
            format_due(&item.due_at),
        );
        println!();
    }

    Ok(())
}

/// Apply an answer and show the new schedule.
pub async fn answer(state: &AppState, chat: i64, word: &str, quality: Quality, json: bool) -> Result<()> {
    let item = state.review_service.answer(chat, word, quality).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&item)?);
    } else {
        println!();
        println!(
            "  {} '{}' answered {}: next review {} (interval {} d, ease {})",
            style("ok").green(),
            style(&item.word).cyan(),
            style(quality).bold(),
            format_due(&item.due_at),
            item.interval,
            item.ease,
        );
        println!();
    }

    Ok(())
}

/// Show the masked definition of a due item.
pub async fn repeat(state: &AppState, chat: i64, json: bool) -> Result<()> {
    match state.review_service.repeat(chat).await {
        Ok(prompt) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&serde_json::json!({ "prompt": prompt }))?);
            } else {
                println!();
                for line in prompt.lines() {
                    println!("  {line}");
                }
                println!();
            }
            Ok(())
        }
        Err(ReviewError::NothingDue { .. }) => nothing_due(chat, json),
        Err(e) => Err(e.into()),
    }
}

/// Show the word of a due item.
pub async fn repeat_word(state: &AppState, chat: i64, json: bool) -> Result<()> {
    match state.review_service.repeat_word(chat).await {
        Ok(word) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&serde_json::json!({ "word": word }))?);
            } else {
                println!();
                println!("  {}", style(word).cyan().bold());
                println!();
            }
            Ok(())
        }
        Err(ReviewError::NothingDue { .. }) => nothing_due(chat, json),
        Err(e) => Err(e.into()),
    }
}

/// Show the full next due item.
pub async fn due(state: &AppState, chat: i64, json: bool) -> Result<()> {
    match state.review_service.next_due(chat).await {
        Ok(item) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&item)?);
            } else {
                print_item(&item);
            }
            Ok(())
        }
        Err(ReviewError::NothingDue { .. }) => nothing_due(chat, json),
        Err(e) => Err(e.into()),
    }
}

pub async fn exists(state: &AppState, chat: i64, word: &str, json: bool) -> Result<()> {
    let exists = state.review_service.exists(chat, word).await?;

    if json {
        let result = serde_json::json!({ "word": word, "exists": exists });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else if exists {
        println!("  {} '{}' is saved", style("✓").green(), style(word).cyan());
    } else {
        println!("  {} '{}' is not saved", style("✗").red(), style(word).cyan());
    }

    Ok(())
}

/// Print the stored definition as-is.
pub async fn definition(state: &AppState, chat: i64, word: &str, json: bool) -> Result<()> {
    let definition = state.review_service.get_definition(chat, word).await?;

    if json {
        let result = serde_json::json!({ "word": word, "definition": definition });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("{definition}");
    }

    Ok(())
}

pub async fn delete(state: &AppState, chat: i64, word: &str, json: bool) -> Result<()> {
    state.review_service.delete(chat, word).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&serde_json::json!({ "deleted": word }))?);
    } else {
        println!();
        println!("  {} Deleted '{}'", style("ok").green(), style(word).cyan());
        println!();
    }

    Ok(())
}

/// List every item of the chat in due order.
pub async fn list(state: &AppState, chat: i64, json: bool) -> Result<()> {
    let items = state.review_service.list(chat).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&items)?);
        return Ok(());
    }

    if items.is_empty() {
        println!();
        println!("  {} No words saved for chat {chat}.", style("i").blue().bold());
        println!("     Add one with: rehearse save <word> <definition>");
        println!();
        return Ok(());
    }

    let now = Utc::now();
    let due = items.iter().filter(|item| item.is_due(now)).count();

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Word").fg(Color::White),
        Cell::new("Ease").fg(Color::White),
        Cell::new("Interval").fg(Color::White),
        Cell::new("Last Reviewed").fg(Color::White),
        Cell::new("Due").fg(Color::White),
    ]);

    for item in &items {
        let due_cell = if item.is_due(now) {
            Cell::new("now").fg(Color::Green)
        } else {
            Cell::new(format_due(&item.due_at)).fg(Color::DarkGrey)
        };
        table.add_row(vec![
            Cell::new(&item.word).fg(Color::Cyan),
            Cell::new(item.ease),
            Cell::new(format!("{} d", item.interval)),
            Cell::new(item.last_reviewed.format("%Y-%m-%d %H:%M")),
            due_cell,
        ]);
    }

    println!();
    println!("{table}");
    println!();
    println!(
        "  {} words, {} due",
        items.len(),
        style(due).green().bold()
    );
    println!();

    Ok(())
}

fn nothing_due(chat: i64, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(&serde_json::json!({ "due": null, "chat": chat }))?);
    } else {
        println!();
        println!("  {} Nothing to repeat right now.", style("i").blue().bold());
        println!();
    }
    Ok(())
}

fn print_item(item: &Item) {
    println!();
    println!("  {}", style(&item.word).cyan().bold());
    println!();
    for line in item.definition.lines() {
        println!("    {line}");
    }
    println!();
    println!("  {:<14} {}", style("Ease").dim(), item.ease);
    println!("  {:<14} {} d", style("Interval").dim(), item.interval);
    println!(
        "  {:<14} {}",
        style("Last reviewed").dim(),
        item.last_reviewed.format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!("  {:<14} {}", style("Due").dim(), format_due(&item.due_at));
    println!();
}

/// Human-readable due time.
fn format_due(due: &DateTime<Utc>) -> String {
    if due.timestamp() == DateTime::<Utc>::MAX_UTC.timestamp() {
        return "never".to_string();
    }
    due.format("%Y-%m-%d %H:%M UTC").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_due() {
        let due = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        assert_eq!(format_due(&due), "2023-11-14 22:13 UTC");
        assert_eq!(format_due(&DateTime::<Utc>::MAX_UTC), "never");
    }
}
