//! Automation CLI commands.
//!
//! `run` executes one pass and exits; `daemon` keeps the scheduler loop in
//! the foreground, printing one line per event, until Ctrl-C.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use clap::{Args, Subcommand};
use uuid::Uuid;

use crate::adapters::sqlite::{SqliteAuditStore, SqliteEpicStore, SqlitePromptStore};
use crate::application::{AutomationScheduler, SchedulerEvent, SchedulerOptions, StopReason};
use crate::cli::context::CommandContext;
use crate::cli::id_resolver::{resolve_epic_id, resolve_prompt_id};
use crate::cli::output::{output, CommandOutput};
use crate::services::automation::AutomationEntity;
use crate::services::{AutomationAction, AutomationOutcome, WorkflowEngine};

type Engine = WorkflowEngine<SqlitePromptStore, SqliteEpicStore, SqliteAuditStore>;

#[derive(Args, Debug)]
pub struct AutomationArgs {
    /// Workspace to operate on (defaults to the configured workspace)
    #[arg(long, global = true)]
    pub workspace: Option<Uuid>,

    #[command(subcommand)]
    pub command: AutomationCommands,
}

#[derive(Subcommand, Debug)]
pub enum AutomationCommands {
    /// Run one automation pass
    Run {
        /// Pass to run (status, task, priority, epics, patterns)
        action: String,
        /// Scope to one prompt (ID prefix, for status and task)
        #[arg(long, conflicts_with = "epic")]
        prompt: Option<String>,
        /// Scope to one epic (ID prefix, for status)
        #[arg(long)]
        epic: Option<String>,
    },
    /// Run the automation scheduler in the foreground
    Daemon {
        /// Override the tick interval from config
        #[arg(long)]
        interval_secs: Option<u64>,
    },
}

#[derive(Debug, serde::Serialize)]
pub struct AutomationRunOutput {
    pub action: String,
    pub outcome: AutomationOutcome,
}

impl CommandOutput for AutomationRunOutput {
    fn to_human(&self) -> String {
        let mut lines = vec![format!(
            "Action '{}': {} write(s)",
            self.action,
            self.outcome.writes()
        )];
        match &self.outcome {
            AutomationOutcome::StatusUpdates { applied } => {
                for change in applied {
                    lines.push(format!(
                        "  moved {} {} to {} ({})",
                        short_uuid(change.prompt_id),
                        change.from,
                        change.to,
                        change.reason
                    ));
                }
            }
            AutomationOutcome::PriorityChanges { applied } => {
                for change in applied {
                    lines.push(format!(
                        "  escalated {} {} to {} ({})",
                        short_uuid(change.prompt_id),
                        change.from,
                        change.to,
                        change.reason
                    ));
                }
            }
            AutomationOutcome::EpicAssignments {
                assigned,
                suggested,
            } => {
                for m in assigned {
                    lines.push(format!(
                        "  assigned {} to epic '{}' (score {:.2})",
                        short_uuid(m.prompt_id),
                        m.epic_name,
                        m.score
                    ));
                }
                for m in suggested {
                    lines.push(format!(
                        "  suggested epic '{}' for {} (score {:.2})",
                        m.epic_name,
                        short_uuid(m.prompt_id),
                        m.score
                    ));
                }
            }
            AutomationOutcome::EpicCompletion { epic_id, from, to } => {
                lines.push(format!(
                    "  epic {} recomputed {} to {}",
                    short_uuid(*epic_id),
                    from,
                    to
                ));
            }
            AutomationOutcome::Patterns(report) => {
                lines.push(format!(
                    "  {} prompt(s) in the last {} day(s), {} done ({:.0}%)",
                    report.total_prompts,
                    report.window_days,
                    report.completed,
                    report.completion_rate * 100.0
                ));
                if let Some(hours) = report.avg_completion_hours {
                    lines.push(format!("  average completion: {:.1}h", hours));
                }
                if !report.top_hours.is_empty() {
                    let hours: Vec<String> = report
                        .top_hours
                        .iter()
                        .map(|h| format!("{h:02}:00"))
                        .collect();
                    lines.push(format!("  busiest hours: {}", hours.join(", ")));
                }
                if !report.top_keywords.is_empty() {
                    let keywords: Vec<String> = report
                        .top_keywords
                        .iter()
                        .map(|(word, count)| format!("{word} ({count})"))
                        .collect();
                    lines.push(format!("  keywords: {}", keywords.join(", ")));
                }
            }
            AutomationOutcome::NoChange => {
                lines.push("  no changes".to_string());
            }
        }
        lines.join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn execute(args: AutomationArgs, json_mode: bool) -> Result<()> {
    let ctx = CommandContext::load().await?;
    let workspace_id = ctx.workspace_id(args.workspace)?;
    let engine = Arc::new(build_engine(&ctx, workspace_id));

    match args.command {
        AutomationCommands::Run {
            action,
            prompt,
            epic,
        } => {
            let entity = match (&prompt, &epic) {
                (Some(prefix), _) => Some(AutomationEntity::Prompt(
                    resolve_prompt_id(&ctx.pool, prefix).await?,
                )),
                (_, Some(prefix)) => Some(AutomationEntity::Epic(
                    resolve_epic_id(&ctx.pool, prefix).await?,
                )),
                (None, None) => None,
            };

            let action = parse_action(&action, entity)?;
            let outcome = engine.run(action).await?;

            let out = AutomationRunOutput {
                action: action.name().to_string(),
                outcome,
            };
            output(&out, json_mode);
            Ok(())
        }
        AutomationCommands::Daemon { interval_secs } => {
            let mut options = SchedulerOptions::from_config(&ctx.config.scheduler);
            if let Some(secs) = interval_secs {
                options.tick_interval = Duration::from_secs(secs);
            }

            let scheduler = AutomationScheduler::new(engine, options);
            let handle = scheduler.handle();
            let mut events = scheduler.run();

            loop {
                tokio::select! {
                    maybe_event = events.recv() => match maybe_event {
                        Some(event) => render_event(&event, json_mode),
                        None => break,
                    },
                    _ = tokio::signal::ctrl_c() => {
                        handle.stop();
                    }
                }
            }
            Ok(())
        }
    }
}

fn build_engine(ctx: &CommandContext, workspace_id: Uuid) -> Engine {
    WorkflowEngine::new(
        Arc::new(SqlitePromptStore::new(ctx.pool.clone())),
        Arc::new(SqliteEpicStore::new(ctx.pool.clone())),
        Arc::new(SqliteAuditStore::new(ctx.pool.clone())),
        ctx.config.automation.clone(),
        workspace_id,
    )
}

fn parse_action(name: &str, entity: Option<AutomationEntity>) -> Result<AutomationAction> {
    match name {
        "status" => Ok(AutomationAction::AutoStatusUpdate { entity }),
        "task" => match entity {
            Some(AutomationEntity::Prompt(prompt_id)) => {
                Ok(AutomationAction::TaskAutomation { prompt_id })
            }
            _ => bail!("The task action requires --prompt"),
        },
        "priority" => Ok(AutomationAction::PriorityAdjustment),
        "epics" => Ok(AutomationAction::EpicOrganization),
        "patterns" => Ok(AutomationAction::AnalyzePromptPatterns),
        other => bail!(
            "Unknown action '{}'. Use status, task, priority, epics, or patterns.",
            other
        ),
    }
}

fn render_event(event: &SchedulerEvent, json_mode: bool) {
    if json_mode {
        println!("{}", event_json(event));
        return;
    }
    match event {
        SchedulerEvent::Started => println!("Scheduler started"),
        SchedulerEvent::TickStarted { tick } => println!("Tick {} started", tick),
        SchedulerEvent::TickSkipped { tick, hour } => {
            println!("Tick {} skipped (hour {:02} outside active hours)", tick, hour)
        }
        SchedulerEvent::ActionFinished {
            tick,
            action,
            writes,
        } => println!("Tick {}: {} finished, {} write(s)", tick, action, writes),
        SchedulerEvent::ActionFailed {
            tick,
            action,
            error,
        } => println!("Tick {}: {} failed: {}", tick, action, error),
        SchedulerEvent::Stopped { reason } => {
            let reason = match reason {
                StopReason::Requested => "stop requested",
                StopReason::TooManyFailures => "too many consecutive failures",
            };
            println!("Scheduler stopped ({})", reason);
        }
    }
}

fn event_json(event: &SchedulerEvent) -> String {
    let value = match event {
        SchedulerEvent::Started => serde_json::json!({"event": "started"}),
        SchedulerEvent::TickStarted { tick } => {
            serde_json::json!({"event": "tick_started", "tick": tick})
        }
        SchedulerEvent::TickSkipped { tick, hour } => {
            serde_json::json!({"event": "tick_skipped", "tick": tick, "hour": hour})
        }
        SchedulerEvent::ActionFinished {
            tick,
            action,
            writes,
        } => serde_json::json!({
            "event": "action_finished", "tick": tick, "action": action, "writes": writes
        }),
        SchedulerEvent::ActionFailed {
            tick,
            action,
            error,
        } => serde_json::json!({
            "event": "action_failed", "tick": tick, "action": action, "error": error
        }),
        SchedulerEvent::Stopped { reason } => serde_json::json!({
            "event": "stopped",
            "reason": match reason {
                StopReason::Requested => "requested",
                StopReason::TooManyFailures => "too_many_failures",
            }
        }),
    };
    value.to_string()
}

fn short_uuid(id: Uuid) -> String {
    id.to_string().chars().take(8).collect()
}
