//! Rehearse CLI entry point.
//!
//! Binary name: `rehearse`
//!
//! Parses CLI arguments, opens the database (upgrading legacy records), then
//! dispatches to the command handler.

mod cli;
mod state;

use clap::Parser;
use clap_complete::generate;

use cli::{Cli, Commands};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up tracing based on verbosity
    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn",
        1 => "info,rehearse_core=debug,rehearse_infra=debug",
        _ => "trace",
    };
    rehearse_observe::tracing_setup::init_tracing(filter, cli.otel)
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    // Shell completions don't need app state
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "rehearse", &mut std::io::stdout());
        return Ok(());
    }

    let result = run(cli).await;
    rehearse_observe::tracing_setup::shutdown_tracing();
    result
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let state = AppState::init().await?;
    let chat = cli.chat;
    let json = cli.json;

    match cli.command {
        Commands::Save { word, definition } => {
            cli::review::save(&state, chat, &word, &definition, json).await?;
        }
        Commands::Answer { word, quality } => {
            cli::review::answer(&state, chat, &word, quality, json).await?;
        }
        Commands::Repeat => cli::review::repeat(&state, chat, json).await?,
        Commands::RepeatWord => cli::review::repeat_word(&state, chat, json).await?,
        Commands::Due => cli::review::due(&state, chat, json).await?,
        Commands::Exists { word } => cli::review::exists(&state, chat, &word, json).await?,
        Commands::Definition { word } => {
            cli::review::definition(&state, chat, &word, json).await?;
        }
        Commands::Delete { word } => cli::review::delete(&state, chat, &word, json).await?,
        Commands::List => cli::review::list(&state, chat, json).await?,
        Commands::Settings { action } => {
            cli::settings::handle_settings_command(action, &state, chat, json).await?;
        }
        Commands::Remind { once } => cli::remind::remind(&state, once, json).await?,
        Commands::Completions { .. } => unreachable!("handled in main"),
    }

    Ok(())
}
