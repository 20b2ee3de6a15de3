//! Epic CLI commands.
//!
//! Epic CRUD goes straight to the store. Status is recomputed from linked
//! prompts by automation, so a manual `--status` override is an escape
//! hatch, not the normal path.

use anyhow::{anyhow, Result};
use chrono::Utc;
use clap::{Args, Subcommand};
use uuid::Uuid;

use crate::adapters::sqlite::{SqliteEpicStore, SqlitePromptStore};
use crate::cli::context::CommandContext;
use crate::cli::id_resolver::resolve_epic_id;
use crate::cli::output::table::TableFormatter;
use crate::cli::output::{output, CommandOutput};
use crate::domain::models::{Epic, EpicStatus, Prompt};
use crate::domain::ports::{EpicStore, PromptFilter, PromptStore};

#[derive(Args, Debug)]
pub struct EpicArgs {
    /// Workspace to operate on (defaults to the configured workspace)
    #[arg(long, global = true)]
    pub workspace: Option<Uuid>,

    #[command(subcommand)]
    pub command: EpicCommands,
}

#[derive(Subcommand, Debug)]
pub enum EpicCommands {
    /// Create a new epic
    Add {
        /// Epic name
        name: String,
        /// Epic description
        #[arg(short, long)]
        description: Option<String>,
        /// Display color (hex, e.g. "#f97316")
        #[arg(long)]
        color: Option<String>,
    },
    /// List epics
    List,
    /// Show epic details and its prompts
    Show {
        /// Epic ID
        id: String,
    },
    /// Update an epic
    Update {
        /// Epic ID
        id: String,
        /// New name
        #[arg(long)]
        name: Option<String>,
        /// New description
        #[arg(short, long)]
        description: Option<String>,
        /// New display color
        #[arg(long)]
        color: Option<String>,
        /// Override status (todo, in_progress, done)
        #[arg(long)]
        status: Option<String>,
    },
    /// Delete an epic
    Delete {
        /// Epic ID
        id: String,
    },
}

#[derive(Debug, serde::Serialize)]
pub struct EpicListOutput {
    pub epics: Vec<Epic>,
    pub total: usize,
}

impl CommandOutput for EpicListOutput {
    fn to_human(&self) -> String {
        if self.epics.is_empty() {
            return "No epics found".to_string();
        }
        let table = TableFormatter::new().format_epics(&self.epics);
        format!("{}\n{} epic(s)", table, self.total)
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

#[derive(Debug, serde::Serialize)]
pub struct EpicDetailOutput {
    pub epic: Epic,
    pub prompts: Vec<Prompt>,
}

impl CommandOutput for EpicDetailOutput {
    fn to_human(&self) -> String {
        let e = &self.epic;
        let mut lines = vec![
            format!("Epic {}", e.id),
            format!("  Name:        {}", e.name),
            format!("  Status:      {}", e.status),
            format!("  Color:       {}", e.color),
        ];
        if let Some(description) = &e.description {
            lines.push(format!("  Description: {}", description));
        }
        lines.push(format!(
            "  Created:     {}",
            e.created_at.format("%Y-%m-%d %H:%M UTC")
        ));
        if self.prompts.is_empty() {
            lines.push("\nNo prompts assigned".to_string());
        } else {
            lines.push(String::new());
            lines.push(TableFormatter::new().format_prompts(&self.prompts));
            lines.push(format!("{} prompt(s)", self.prompts.len()));
        }
        lines.join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

#[derive(Debug, serde::Serialize)]
pub struct EpicActionOutput {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub epic: Option<Epic>,
}

impl CommandOutput for EpicActionOutput {
    fn to_human(&self) -> String {
        self.message.clone()
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn execute(args: EpicArgs, json_mode: bool) -> Result<()> {
    let ctx = CommandContext::load().await?;
    let workspace_id = ctx.workspace_id(args.workspace)?;
    let store = SqliteEpicStore::new(ctx.pool.clone());

    match args.command {
        EpicCommands::Add {
            name,
            description,
            color,
        } => {
            let mut epic = Epic::new(workspace_id, name);
            if let Some(description) = description {
                epic = epic.with_description(description);
            }
            if let Some(color) = color {
                epic = epic.with_color(color);
            }
            epic.validate()?;
            store.insert(&epic).await?;

            let out = EpicActionOutput {
                success: true,
                message: format!("Created epic {} '{}'", short_uuid(epic.id), epic.name),
                epic: Some(epic),
            };
            output(&out, json_mode);
            Ok(())
        }
        EpicCommands::List => {
            let epics = store.list(workspace_id).await?;
            let total = epics.len();
            output(&EpicListOutput { epics, total }, json_mode);
            Ok(())
        }
        EpicCommands::Show { id } => {
            let uuid = resolve_epic_id(&ctx.pool, &id).await?;
            let epic = store
                .get(uuid)
                .await?
                .ok_or_else(|| anyhow!("No epic found matching '{}'", id))?;

            let prompt_store = SqlitePromptStore::new(ctx.pool.clone());
            let prompts = prompt_store
                .list(PromptFilter::workspace(workspace_id).with_epic(uuid))
                .await?;

            output(&EpicDetailOutput { epic, prompts }, json_mode);
            Ok(())
        }
        EpicCommands::Update {
            id,
            name,
            description,
            color,
            status,
        } => {
            let uuid = resolve_epic_id(&ctx.pool, &id).await?;
            let mut epic = store
                .get(uuid)
                .await?
                .ok_or_else(|| anyhow!("No epic found matching '{}'", id))?;

            if let Some(name) = name {
                epic.name = name;
            }
            if let Some(description) = description {
                epic.description = Some(description);
            }
            if let Some(color) = color {
                epic.color = color;
            }
            if let Some(status) = status {
                epic.status = EpicStatus::from_str(&status.to_lowercase())
                    .ok_or_else(|| anyhow!("Invalid status '{}'. Use todo, in_progress, or done.", status))?;
            }
            epic.updated_at = Utc::now();
            epic.validate()?;
            store.update(&epic).await?;

            let out = EpicActionOutput {
                success: true,
                message: format!("Updated epic {}", short_uuid(epic.id)),
                epic: Some(epic),
            };
            output(&out, json_mode);
            Ok(())
        }
        EpicCommands::Delete { id } => {
            let uuid = resolve_epic_id(&ctx.pool, &id).await?;
            store.delete(uuid).await?;

            let out = EpicActionOutput {
                success: true,
                message: format!("Deleted epic {}", short_uuid(uuid)),
                epic: None,
            };
            output(&out, json_mode);
            Ok(())
        }
    }
}

fn short_uuid(id: Uuid) -> String {
    id.to_string().chars().take(8).collect()
}
