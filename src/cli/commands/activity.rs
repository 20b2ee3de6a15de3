//! Implementation of the `promptdeck activity` command.

use anyhow::Result;
use clap::Args;
use uuid::Uuid;

use crate::adapters::sqlite::SqliteAuditStore;
use crate::cli::context::CommandContext;
use crate::cli::output::table::TableFormatter;
use crate::cli::output::{output, CommandOutput};
use crate::domain::models::ActivityRecord;
use crate::domain::ports::AuditStore;

#[derive(Args, Debug)]
pub struct ActivityArgs {
    /// Workspace to operate on (defaults to the configured workspace)
    #[arg(long)]
    pub workspace: Option<Uuid>,

    /// Maximum number of records to display
    #[arg(short, long, default_value = "20")]
    pub limit: i64,
}

#[derive(Debug, serde::Serialize)]
pub struct ActivityListOutput {
    pub records: Vec<ActivityRecord>,
    pub total: usize,
}

impl CommandOutput for ActivityListOutput {
    fn to_human(&self) -> String {
        if self.records.is_empty() {
            return "No activity recorded".to_string();
        }
        let table = TableFormatter::new().format_activity(&self.records);
        format!("{}\n{} record(s)", table, self.total)
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn execute(args: ActivityArgs, json_mode: bool) -> Result<()> {
    let ctx = CommandContext::load().await?;
    let workspace_id = ctx.workspace_id(args.workspace)?;

    let store = SqliteAuditStore::new(ctx.pool.clone());
    let records = store.list_recent(workspace_id, args.limit).await?;
    let total = records.len();

    output(&ActivityListOutput { records, total }, json_mode);
    Ok(())
}
