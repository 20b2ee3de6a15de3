//! Implementation of the `promptdeck init` command.

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use tokio::fs;
use uuid::Uuid;

use crate::adapters::sqlite::initialize_database;
use crate::cli::output::{output, CommandOutput};
use crate::domain::models::Config;

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Force reinitialization even if already initialized
    #[arg(long, short)]
    pub force: bool,

    /// Workspace display name
    #[arg(long, default_value = "default")]
    pub name: String,

    /// Target directory (defaults to current directory)
    #[arg(default_value = ".")]
    pub path: PathBuf,
}

#[derive(Debug, serde::Serialize)]
pub struct InitOutput {
    pub success: bool,
    pub message: String,
    pub workspace_id: Option<Uuid>,
    pub config_path: Option<PathBuf>,
    pub database_initialized: bool,
}

impl CommandOutput for InitOutput {
    fn to_human(&self) -> String {
        let mut lines = vec![self.message.clone()];
        if let Some(id) = self.workspace_id {
            lines.push(format!("Workspace ID: {}", id));
        }
        if let Some(path) = &self.config_path {
            lines.push(format!("Config written to {}", path.display()));
        }
        if self.database_initialized {
            lines.push("Database initialized at .promptdeck/promptdeck.db".to_string());
        }
        lines.join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn execute(args: InitArgs, json_mode: bool) -> Result<()> {
    let target_path = if args.path.is_absolute() {
        args.path.clone()
    } else {
        std::env::current_dir()
            .context("Failed to get current directory")?
            .join(&args.path)
    };

    let deck_dir = target_path.join(".promptdeck");

    if deck_dir.exists() && !args.force {
        let output_data = InitOutput {
            success: false,
            message: "Deck already initialized. Use --force to reinitialize.".to_string(),
            workspace_id: None,
            config_path: None,
            database_initialized: false,
        };
        output(&output_data, json_mode);
        return Ok(());
    }

    if args.force && deck_dir.exists() {
        fs::remove_dir_all(&deck_dir)
            .await
            .context("Failed to remove existing .promptdeck directory")?;
    }

    fs::create_dir_all(&deck_dir)
        .await
        .with_context(|| format!("Failed to create {:?}", deck_dir))?;

    let workspace_id = Uuid::new_v4();
    let mut config = Config::default();
    config.workspace.id = Some(workspace_id);
    config.workspace.name = args.name.clone();

    let config_path = deck_dir.join("config.yaml");
    let yaml = serde_yaml::to_string(&config).context("Failed to serialize configuration")?;
    fs::write(&config_path, yaml)
        .await
        .with_context(|| format!("Failed to write {:?}", config_path))?;

    let db_path = deck_dir.join("promptdeck.db");
    let db_url = format!("sqlite:{}", db_path.display());
    initialize_database(&db_url, None)
        .await
        .context("Failed to initialize database")?;

    let output_data = InitOutput {
        success: true,
        message: if args.force {
            "Deck reinitialized successfully.".to_string()
        } else {
            "Deck initialized successfully.".to_string()
        },
        workspace_id: Some(workspace_id),
        config_path: Some(config_path),
        database_initialized: true,
    };

    output(&output_data, json_mode);
    Ok(())
}
