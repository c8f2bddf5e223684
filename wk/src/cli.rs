//! CLI command definitions and subcommands

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Weekender - conversational weekend itinerary planner
#[derive(Parser)]
#[command(
    name = "wk",
    about = "Plan, refine and save weekend itineraries with a language model",
    version
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate a new itinerary from a preferences file
    New {
        /// Preferences file (JSON or YAML)
        #[arg(short, long, value_name = "FILE")]
        prefs: PathBuf,

        /// Save the generated plan
        #[arg(short, long, requires = "email")]
        save: bool,

        /// Owner email for saving
        #[arg(short, long)]
        email: Option<String>,

        /// Keep chatting about the plan after generating it
        #[arg(long)]
        chat: bool,
    },

    /// Chat about a saved plan
    Chat {
        /// Saved plan ID
        id: String,

        /// Owner email, used when saving a copy
        #[arg(short, long)]
        email: Option<String>,
    },

    /// Manage saved plans
    Plans {
        #[command(subcommand)]
        command: PlansCommand,
    },
}

/// Saved plan subcommands
#[derive(Debug, Subcommand)]
pub enum PlansCommand {
    /// List plans owned by an email, newest first
    List {
        #[arg(short, long)]
        email: String,
    },

    /// Show a saved plan
    Show {
        /// Saved plan ID
        id: String,

        /// Print the raw JSON document
        #[arg(long)]
        json: bool,
    },

    /// Delete a saved plan
    Delete {
        /// Saved plan ID
        id: String,
    },
}
