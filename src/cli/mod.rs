//! Command-line interface for promptdeck.
//!
//! Structure:
//! - `types`: clap definitions for the top-level CLI
//! - `commands`: one module per subcommand
//! - `context`: config loading and session wiring shared by commands
//! - `output`: human and JSON rendering
//! - `id_resolver`: short ID prefix resolution

pub mod commands;
pub mod context;
pub mod id_resolver;
pub mod output;
pub mod types;

pub use types::{Cli, Commands};

/// Print an error in the selected output mode and exit non-zero.
pub fn handle_error(err: anyhow::Error, json_mode: bool) -> ! {
    if json_mode {
        let body = serde_json::json!({
            "success": false,
            "error": format!("{err:#}"),
        });
        eprintln!(
            "{}",
            serde_json::to_string_pretty(&body).unwrap_or_default()
        );
    } else {
        eprintln!("Error: {err:#}");
    }
    std::process::exit(1);
}
