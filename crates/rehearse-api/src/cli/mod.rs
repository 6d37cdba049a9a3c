//! CLI command definitions for the `rehearse` binary.
//!
//! Uses clap derive macros for argument parsing. Every review command acts on
//! one chat, selected with `--chat` (or `REHEARSE_CHAT`).

pub mod remind;
pub mod review;
pub mod settings;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

use rehearse_types::item::Quality;

/// Spaced-repetition vocabulary trainer.
#[derive(Parser)]
#[command(name = "rehearse", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Export tracing spans to stdout via OpenTelemetry.
    #[arg(long, global = true)]
    pub otel: bool,

    /// Chat (learner) the command acts on.
    #[arg(
        long,
        global = true,
        env = "REHEARSE_CHAT",
        default_value_t = 0,
        allow_hyphen_values = true
    )]
    pub chat: i64,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Save a new word with its definition.
    #[command(alias = "add")]
    Save {
        /// The word to learn.
        word: String,

        /// Its definition. Paragraphs are separated by a blank line.
        definition: String,
    },

    /// Answer a review with a recall quality (again, hard, good, easy).
    Answer {
        word: String,

        quality: Quality,
    },

    /// Show the definition of a due word, with the word masked out.
    Repeat,

    /// Show a due word.
    #[command(name = "repeat-word")]
    RepeatWord,

    /// Show the full next due item.
    Due,

    /// Check whether a word is saved.
    Exists { word: String },

    /// Show the stored definition of a word.
    #[command(alias = "def")]
    Definition { word: String },

    /// Delete a word.
    #[command(alias = "rm")]
    Delete { word: String },

    /// List all words of the chat, earliest due first.
    #[command(alias = "ls")]
    List,

    /// Show or change chat settings.
    Settings {
        #[command(subcommand)]
        action: settings::SettingsCommand,
    },

    /// Run the reminder loop until interrupted.
    Remind {
        /// Run a single pass and exit.
        #[arg(long)]
        once: bool,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}
