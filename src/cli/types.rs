//! CLI type definitions.
//!
//! Top-level clap structure. Per-command arguments live next to their
//! handlers under [`crate::cli::commands`].

use clap::{Parser, Subcommand};

use crate::cli::commands::activity::ActivityArgs;
use crate::cli::commands::automation::AutomationArgs;
use crate::cli::commands::epic::EpicArgs;
use crate::cli::commands::init::InitArgs;
use crate::cli::commands::prompt::PromptArgs;
use crate::cli::commands::watch::WatchArgs;

#[derive(Parser)]
#[command(name = "promptdeck")]
#[command(about = "Promptdeck - Optimistic prompt deck for coding agents", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a deck in the current directory
    Init(InitArgs),

    /// Prompt management commands
    Prompt(PromptArgs),

    /// Epic management commands
    Epic(EpicArgs),

    /// Automation commands
    Automation(AutomationArgs),

    /// Show recent workspace activity
    Activity(ActivityArgs),

    /// Live view of the deck
    Watch(WatchArgs),
}
