//! Implementation of the `promptdeck watch` command.
//!
//! Renders the deck whenever the cache changes and polls Cursor for agent
//! updates in between. JSON mode emits one snapshot per line instead of
//! redrawing the screen.

use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use clap::Args;
use console::Term;
use uuid::Uuid;

use crate::cli::context::CommandContext;
use crate::cli::output::table::TableFormatter;
use crate::domain::models::Prompt;

#[derive(Args, Debug)]
pub struct WatchArgs {
    /// Workspace to operate on (defaults to the configured workspace)
    #[arg(long)]
    pub workspace: Option<Uuid>,

    /// Seconds between Cursor agent polls
    #[arg(long, default_value = "30")]
    pub poll_secs: u64,
}

pub async fn execute(args: WatchArgs, json_mode: bool) -> Result<()> {
    let ctx = CommandContext::load().await?;
    let workspace_id = ctx.workspace_id(args.workspace)?;
    let session = ctx.open_session(workspace_id).await?;

    let mut rx = session.cache().subscribe();
    render(&rx.borrow_and_update(), json_mode);

    let mut poll = tokio::time::interval(Duration::from_secs(args.poll_secs.max(1)));
    poll.tick().await; // the first tick fires immediately

    loop {
        tokio::select! {
            _ = poll.tick() => {
                if let Err(err) = session.sync_agents().await {
                    eprintln!("sync failed: {err}");
                }
            }
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
                render(&rx.borrow_and_update(), json_mode);
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    session.shutdown().await;
    Ok(())
}

fn render(rows: &[Prompt], json_mode: bool) {
    if json_mode {
        if let Ok(line) = serde_json::to_string(rows) {
            println!("{line}");
        }
        return;
    }

    Term::stdout().clear_screen().ok();
    if rows.is_empty() {
        println!("No prompts in this workspace");
    } else {
        println!("{}", TableFormatter::new().format_prompts(rows));
    }
    println!("Last updated {}  (Ctrl-C to exit)", Utc::now().format("%H:%M:%S"));
}
