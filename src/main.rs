//! Promptdeck CLI entry point.

use clap::Parser;

use promptdeck::cli::{Cli, Commands};
use promptdeck::infrastructure::config::ConfigLoader;
use promptdeck::infrastructure::logging;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Config may not exist yet (e.g. before `init`); log with defaults then.
    let log_config = ConfigLoader::load()
        .map(|config| config.logging)
        .unwrap_or_default();
    if let Err(err) = logging::init(&log_config) {
        eprintln!("Failed to initialize logging: {err:#}");
    }

    let result = match cli.command {
        Commands::Init(args) => promptdeck::cli::commands::init::execute(args, cli.json).await,
        Commands::Prompt(args) => promptdeck::cli::commands::prompt::execute(args, cli.json).await,
        Commands::Epic(args) => promptdeck::cli::commands::epic::execute(args, cli.json).await,
        Commands::Automation(args) => {
            promptdeck::cli::commands::automation::execute(args, cli.json).await
        }
        Commands::Activity(args) => {
            promptdeck::cli::commands::activity::execute(args, cli.json).await
        }
        Commands::Watch(args) => promptdeck::cli::commands::watch::execute(args, cli.json).await,
    };

    if let Err(err) = result {
        promptdeck::cli::handle_error(err, cli.json);
    }
}
