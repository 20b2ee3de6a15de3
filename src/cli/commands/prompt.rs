//! Prompt CLI commands.
//!
//! All subcommands run through a live [`Session`] so mutations go through
//! the optimistic engine, and `shutdown` drains any generation the command
//! kicked off before the process exits.

use anyhow::{anyhow, Result};
use clap::{Args, Subcommand};
use uuid::Uuid;

use crate::cli::context::{CommandContext, Session};
use crate::cli::id_resolver::{resolve_epic_id, resolve_prompt_id};
use crate::cli::output::progress::create_spinner_with_message;
use crate::cli::output::table::TableFormatter;
use crate::cli::output::{output, truncate, CommandOutput};
use crate::domain::models::{Prompt, PromptPriority, PromptStatus};
use crate::domain::ports::NewPrompt;
use crate::services::GenerationOutcome;

#[derive(Args, Debug)]
pub struct PromptArgs {
    /// Workspace to operate on (defaults to the configured workspace)
    #[arg(long, global = true)]
    pub workspace: Option<Uuid>,

    #[command(subcommand)]
    pub command: PromptCommands,
}

#[derive(Subcommand, Debug)]
pub enum PromptCommands {
    /// Add a new prompt to the deck
    Add {
        /// Prompt title
        title: String,
        /// Raw idea text the generator expands
        #[arg(short, long)]
        description: Option<String>,
        /// Priority (low, normal, high)
        #[arg(short, long, default_value = "normal")]
        priority: String,
        /// Epic to assign (ID prefix)
        #[arg(long)]
        epic: Option<String>,
        /// Mark as a debug session, hidden from default listings
        #[arg(long)]
        debug_session: bool,
    },
    /// List prompts
    List {
        /// Filter by status (todo, in_progress, done, ...)
        #[arg(short, long)]
        status: Option<String>,
        /// Filter by epic (ID prefix)
        #[arg(long)]
        epic: Option<String>,
        /// Include debug-session prompts
        #[arg(long)]
        include_debug: bool,
        /// Maximum number of prompts to display
        #[arg(short, long, default_value = "50")]
        limit: usize,
    },
    /// Show prompt details
    Show {
        /// Prompt ID
        id: String,
    },
    /// Update a prompt
    Update {
        /// Prompt ID
        id: String,
        /// New title
        #[arg(long)]
        title: Option<String>,
        /// New description
        #[arg(short, long)]
        description: Option<String>,
        /// New priority (low, normal, high)
        #[arg(short, long)]
        priority: Option<String>,
        /// Epic to assign (ID prefix)
        #[arg(long)]
        epic: Option<String>,
        /// Remove the epic assignment
        #[arg(long, conflicts_with = "epic")]
        clear_epic: bool,
    },
    /// Delete a prompt
    Delete {
        /// Prompt ID
        id: String,
    },
    /// Duplicate a prompt as a fresh todo
    Duplicate {
        /// Prompt ID
        id: String,
    },
    /// Cycle the status through todo, in_progress, done
    Cycle {
        /// Prompt ID
        id: String,
    },
    /// Mark a prompt done
    Done {
        /// Prompt ID
        id: String,
    },
    /// Reopen a prompt back to todo
    Reopen {
        /// Prompt ID
        id: String,
    },
    /// Generate the agent-ready prompt text and wait for the result
    Generate {
        /// Prompt ID
        id: String,
    },
    /// Dispatch a prompt to a Cursor background agent
    Send {
        /// Prompt ID
        id: String,
    },
    /// Cancel the Cursor agent working on a prompt
    Cancel {
        /// Prompt ID
        id: String,
    },
    /// Poll Cursor for updates on all active agents
    Sync,
}

#[derive(Debug, serde::Serialize)]
pub struct PromptListOutput {
    pub prompts: Vec<Prompt>,
    pub total: usize,
}

impl CommandOutput for PromptListOutput {
    fn to_human(&self) -> String {
        if self.prompts.is_empty() {
            return "No prompts found".to_string();
        }
        let table = TableFormatter::new().format_prompts(&self.prompts);
        format!("{}\n{} prompt(s)", table, self.total)
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

#[derive(Debug, serde::Serialize)]
pub struct PromptDetailOutput {
    pub prompt: Prompt,
}

impl CommandOutput for PromptDetailOutput {
    fn to_human(&self) -> String {
        let p = &self.prompt;
        let mut lines = vec![
            format!("Prompt {}", p.id.as_uuid()),
            format!("  Title:       {}", p.title),
            format!("  Status:      {}", p.status),
            format!("  Priority:    {}", p.priority),
        ];
        if let Some(epic_id) = p.epic_id {
            lines.push(format!("  Epic:        {}", epic_id));
        }
        if p.is_debug_session {
            lines.push("  Debug:       yes".to_string());
        }
        if let Some(description) = &p.description {
            lines.push(format!("  Description: {}", truncate(description, 200)));
        }
        if let Some(generated) = &p.generated_prompt {
            let when = p
                .generated_at
                .map(|at| format!(" (generated {})", at.format("%Y-%m-%d %H:%M UTC")))
                .unwrap_or_default();
            lines.push(format!("  Generated{}:", when));
            for line in truncate(generated, 500).lines() {
                lines.push(format!("    {}", line));
            }
        }
        if let Some(agent_id) = &p.cursor_agent_id {
            let status = p
                .cursor_agent_status
                .map(|s| format!(" ({s})"))
                .unwrap_or_default();
            lines.push(format!("  Agent:       {}{}", agent_id, status));
        }
        if let Some(branch) = &p.cursor_branch_name {
            lines.push(format!("  Branch:      {}", branch));
        }
        if let Some(url) = &p.github_pr_url {
            let number = p
                .github_pr_number
                .map(|n| format!("#{n} "))
                .unwrap_or_default();
            let status = p
                .github_pr_status
                .map(|s| format!(" ({s})"))
                .unwrap_or_default();
            lines.push(format!("  PR:          {}{}{}", number, url, status));
        }
        lines.push(format!(
            "  Created:     {}",
            p.created_at.format("%Y-%m-%d %H:%M UTC")
        ));
        lines.push(format!(
            "  Updated:     {}",
            p.updated_at.format("%Y-%m-%d %H:%M UTC")
        ));
        lines.join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

#[derive(Debug, serde::Serialize)]
pub struct PromptActionOutput {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<Prompt>,
}

impl CommandOutput for PromptActionOutput {
    fn to_human(&self) -> String {
        self.message.clone()
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn execute(args: PromptArgs, json_mode: bool) -> Result<()> {
    let ctx = CommandContext::load().await?;
    let workspace_id = ctx.workspace_id(args.workspace)?;
    let session = ctx.open_session(workspace_id).await?;

    let result = run(args.command, &ctx, &session, json_mode).await;
    session.shutdown().await;
    result
}

async fn run(
    command: PromptCommands,
    ctx: &CommandContext,
    session: &Session,
    json_mode: bool,
) -> Result<()> {
    match command {
        PromptCommands::Add {
            title,
            description,
            priority,
            epic,
            debug_session,
        } => {
            let priority = PromptPriority::from_str(&priority)
                .ok_or_else(|| anyhow!("Invalid priority '{}'. Use low, normal, or high.", priority))?;
            let mut new_prompt =
                NewPrompt::new(session.workspace_id(), title).with_priority(priority);
            if let Some(description) = description {
                new_prompt = new_prompt.with_description(description);
            }
            if let Some(epic) = epic {
                new_prompt = new_prompt.with_epic(resolve_epic_id(&ctx.pool, &epic).await?);
            }
            if debug_session {
                new_prompt = new_prompt.as_debug_session();
            }

            let prompt = session.prompts().create(new_prompt).await?;
            let out = PromptActionOutput {
                success: true,
                message: format!("Created prompt {} '{}'", short_id(&prompt), prompt.title),
                prompt: Some(prompt),
            };
            output(&out, json_mode);
            Ok(())
        }
        PromptCommands::List {
            status,
            epic,
            include_debug,
            limit,
        } => {
            let status = status
                .map(|s| {
                    PromptStatus::from_str(&s).ok_or_else(|| anyhow!("Invalid status '{}'", s))
                })
                .transpose()?;
            let epic_id = match epic {
                Some(epic) => Some(resolve_epic_id(&ctx.pool, &epic).await?),
                None => None,
            };

            let snapshot = session.prompts().refresh().await?;
            let prompts: Vec<Prompt> = snapshot
                .iter()
                .filter(|p| status.map_or(true, |s| p.status == s))
                .filter(|p| epic_id.map_or(true, |e| p.epic_id == Some(e)))
                .filter(|p| include_debug || !p.is_debug_session)
                .take(limit)
                .cloned()
                .collect();

            let total = prompts.len();
            output(&PromptListOutput { prompts, total }, json_mode);
            Ok(())
        }
        PromptCommands::Show { id } => {
            let uuid = resolve_prompt_id(&ctx.pool, &id).await?;
            let prompt = session
                .prompts()
                .get(uuid)
                .ok_or_else(|| anyhow!("No prompt found matching '{}'", id))?;
            output(&PromptDetailOutput { prompt }, json_mode);
            Ok(())
        }
        PromptCommands::Update {
            id,
            title,
            description,
            priority,
            epic,
            clear_epic,
        } => {
            let uuid = resolve_prompt_id(&ctx.pool, &id).await?;
            let mut prompt = session.prompts().update(uuid, title, description).await?;
            if let Some(priority) = priority {
                let priority = PromptPriority::from_str(&priority).ok_or_else(|| {
                    anyhow!("Invalid priority '{}'. Use low, normal, or high.", priority)
                })?;
                prompt = session.prompts().set_priority(uuid, priority).await?;
            }
            if clear_epic {
                prompt = session.prompts().assign_epic(uuid, None).await?;
            } else if let Some(epic) = epic {
                let epic_id = resolve_epic_id(&ctx.pool, &epic).await?;
                prompt = session.prompts().assign_epic(uuid, Some(epic_id)).await?;
            }

            let out = PromptActionOutput {
                success: true,
                message: format!("Updated prompt {}", short_id(&prompt)),
                prompt: Some(prompt),
            };
            output(&out, json_mode);
            Ok(())
        }
        PromptCommands::Delete { id } => {
            let uuid = resolve_prompt_id(&ctx.pool, &id).await?;
            session.prompts().delete(uuid).await?;
            let out = PromptActionOutput {
                success: true,
                message: format!("Deleted prompt {}", short_uuid(uuid)),
                prompt: None,
            };
            output(&out, json_mode);
            Ok(())
        }
        PromptCommands::Duplicate { id } => {
            let uuid = resolve_prompt_id(&ctx.pool, &id).await?;
            let copy = session.prompts().duplicate(uuid).await?;
            let out = PromptActionOutput {
                success: true,
                message: format!(
                    "Duplicated prompt {} as {}",
                    short_uuid(uuid),
                    short_id(&copy)
                ),
                prompt: Some(copy),
            };
            output(&out, json_mode);
            Ok(())
        }
        PromptCommands::Cycle { id } => {
            let uuid = resolve_prompt_id(&ctx.pool, &id).await?;
            let prompt = session.prompts().cycle_status(uuid).await?;
            let out = PromptActionOutput {
                success: true,
                message: format!("Prompt {} is now {}", short_id(&prompt), prompt.status),
                prompt: Some(prompt),
            };
            output(&out, json_mode);
            Ok(())
        }
        PromptCommands::Done { id } => {
            let uuid = resolve_prompt_id(&ctx.pool, &id).await?;
            let prompt = session.prompts().mark_done(uuid).await?;
            let out = PromptActionOutput {
                success: true,
                message: format!("Prompt {} marked done", short_id(&prompt)),
                prompt: Some(prompt),
            };
            output(&out, json_mode);
            Ok(())
        }
        PromptCommands::Reopen { id } => {
            let uuid = resolve_prompt_id(&ctx.pool, &id).await?;
            let prompt = session.prompts().reopen(uuid).await?;
            let out = PromptActionOutput {
                success: true,
                message: format!("Prompt {} reopened", short_id(&prompt)),
                prompt: Some(prompt),
            };
            output(&out, json_mode);
            Ok(())
        }
        PromptCommands::Generate { id } => {
            let uuid = resolve_prompt_id(&ctx.pool, &id).await?;
            let spinner =
                (!json_mode).then(|| create_spinner_with_message("Generating prompt..."));
            let outcome = session.prompts().regenerate(uuid).await;
            if let Some(spinner) = &spinner {
                spinner.finish_and_clear();
            }

            let (success, message) = match outcome? {
                GenerationOutcome::Generated => (true, "Prompt generated.".to_string()),
                GenerationOutcome::Skipped => (
                    false,
                    "Generation skipped: description too short or status not eligible.".to_string(),
                ),
                GenerationOutcome::Reverted { reason } => {
                    (false, format!("Generation failed: {}", reason))
                }
            };
            let out = PromptActionOutput {
                success,
                message,
                prompt: session.prompts().get(uuid),
            };
            output(&out, json_mode);
            Ok(())
        }
        PromptCommands::Send { id } => {
            let uuid = resolve_prompt_id(&ctx.pool, &id).await?;
            let spinner = (!json_mode).then(|| create_spinner_with_message("Sending to Cursor..."));
            let result = session.dispatcher().send_to_cursor(uuid).await;
            if let Some(spinner) = &spinner {
                spinner.finish_and_clear();
            }

            let prompt = result?;
            let agent = prompt.cursor_agent_id.as_deref().unwrap_or("-");
            let out = PromptActionOutput {
                success: true,
                message: format!(
                    "Prompt {} sent to Cursor (agent {})",
                    short_id(&prompt),
                    agent
                ),
                prompt: Some(prompt),
            };
            output(&out, json_mode);
            Ok(())
        }
        PromptCommands::Cancel { id } => {
            let uuid = resolve_prompt_id(&ctx.pool, &id).await?;
            let prompt = session.dispatcher().cancel_agent(uuid).await?;
            let out = PromptActionOutput {
                success: true,
                message: format!("Cancelled Cursor agent for prompt {}", short_id(&prompt)),
                prompt: Some(prompt),
            };
            output(&out, json_mode);
            Ok(())
        }
        PromptCommands::Sync => {
            let updated = session.sync_agents().await?;
            let out = PromptActionOutput {
                success: true,
                message: format!("Synced agent status: {} prompt(s) updated", updated),
                prompt: None,
            };
            output(&out, json_mode);
            Ok(())
        }
    }
}

fn short_id(prompt: &Prompt) -> String {
    short_uuid(prompt.id.as_uuid())
}

fn short_uuid(id: Uuid) -> String {
    id.to_string().chars().take(8).collect()
}
