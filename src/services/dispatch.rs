//! Coding-agent dispatch and report ingestion.

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    AgentReport, AgentRunStatus, CursorConfig, PrStatus, Prompt, PromptStatus,
};
use crate::domain::ports::{CursorAgent, LaunchRequest, PromptPatch, PromptStore};
use crate::services::optimistic::OptimisticEngine;

/// Map an agent report onto the prompt status it implies.
///
/// `has_pr` covers both a pull request in the report and one already linked
/// to the row, so a late report cannot demote a prompt that opened a PR.
pub fn map_report_status(status: AgentRunStatus, has_pr: bool) -> PromptStatus {
    match status {
        AgentRunStatus::Creating => PromptStatus::SentToCursor,
        AgentRunStatus::Running => PromptStatus::CursorWorking,
        AgentRunStatus::Completed => {
            if has_pr {
                PromptStatus::PrCreated
            } else {
                PromptStatus::Done
            }
        }
        AgentRunStatus::Failed | AgentRunStatus::Cancelled => PromptStatus::Todo,
    }
}

/// Sends prompts to the remote coding agent and folds its reports back in.
pub struct AgentDispatcher<S, C>
where
    S: PromptStore + 'static,
    C: CursorAgent + 'static,
{
    store: Arc<S>,
    agent: Arc<C>,
    engine: OptimisticEngine,
    config: CursorConfig,
}

impl<S, C> AgentDispatcher<S, C>
where
    S: PromptStore + 'static,
    C: CursorAgent + 'static,
{
    pub fn new(
        store: Arc<S>,
        agent: Arc<C>,
        engine: OptimisticEngine,
        config: CursorConfig,
    ) -> Self {
        Self {
            store,
            agent,
            engine,
            config,
        }
    }

    /// Launch an agent run for a prompt.
    ///
    /// The status flips to `sending_to_cursor` optimistically, then to
    /// `sent_to_cursor` with the run linkage once the service accepts. On
    /// launch failure the local collection rolls back and the remote status
    /// is restored to todo on a best-effort basis.
    pub async fn send_to_cursor(&self, prompt_id: Uuid) -> DomainResult<Prompt> {
        let prompt = self
            .store
            .get(prompt_id)
            .await?
            .ok_or(DomainError::PromptNotFound(prompt_id))?;

        if !prompt.status.can_transition_to(PromptStatus::SendingToCursor) {
            return Err(DomainError::InvalidStateTransition {
                from: prompt.status.as_str().to_string(),
                to: PromptStatus::SendingToCursor.as_str().to_string(),
                reason: "prompt is already dispatched or finished".to_string(),
            });
        }
        let repository = self.config.repository.clone().ok_or_else(|| {
            DomainError::ValidationFailed("no repository configured for agent dispatch".to_string())
        })?;

        let instructions = prompt
            .generated_prompt
            .clone()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| prompt.combined_text());
        let request = LaunchRequest {
            instructions,
            repository,
            base_branch: self.config.base_branch.clone(),
            model: self.config.model.clone(),
            auto_create_pr: self.config.auto_create_pr,
        };

        let store = self.store.clone();
        let agent = self.agent.clone();
        let dispatch_record = json!({
            "dispatch": {
                "repository": request.repository,
                "base_branch": request.base_branch,
                "auto_create_pr": request.auto_create_pr,
                "started_at": Utc::now().to_rfc3339(),
            }
        });
        let result = self
            .engine
            .mutate(
                |rows| set_status(rows, prompt_id, PromptStatus::SendingToCursor),
                async move {
                    let entry = PromptPatch {
                        status: Some(PromptStatus::SendingToCursor),
                        merge_workflow_metadata: Some(dispatch_record),
                        ..PromptPatch::default()
                    };
                    store.update(prompt_id, entry).await?;
                    let launch = agent.launch(request).await?;
                    let patch = PromptPatch {
                        status: Some(PromptStatus::SentToCursor),
                        cursor_agent_id: Some(launch.agent_id.clone()),
                        cursor_agent_status: Some(launch.status),
                        cursor_branch_name: launch.branch_name.clone(),
                        merge_cursor_logs: Some(json!({
                            "launched_at": Utc::now().to_rfc3339(),
                            "last_status": launch.status.to_string(),
                        })),
                        ..PromptPatch::default()
                    };
                    store.update(prompt_id, patch).await
                },
                OptimisticEngine::restore,
            )
            .await;

        match result {
            Ok(row) => {
                info!(id = %prompt_id, agent = %row.cursor_agent_id.as_deref().unwrap_or("?"), "prompt dispatched");
                self.apply_row(row.clone());
                Ok(row)
            }
            Err(err) => {
                // The remote row may be stranded at sending_to_cursor
                if let Err(revert_err) = self
                    .store
                    .update(prompt_id, PromptPatch::status(PromptStatus::Todo))
                    .await
                {
                    warn!(id = %prompt_id, error = %revert_err, "failed to restore status after launch failure");
                }
                Err(err)
            }
        }
    }

    /// Fold one agent report into the linked prompt.
    ///
    /// Unknown run ids are ignored; everything else writes the implied
    /// status, the reported linkage fields, and a log entry.
    pub async fn ingest(&self, report: AgentReport) -> DomainResult<Option<Prompt>> {
        let Some(prompt) = self.store.get_by_agent(&report.cursor_agent_id).await? else {
            debug!(agent = %report.cursor_agent_id, "report for unknown agent run, ignoring");
            return Ok(None);
        };
        let row_uuid = prompt.id.as_uuid();

        let has_pr = report.pr_url.is_some() || prompt.github_pr_url.is_some();
        let implied = map_report_status(report.status, has_pr);

        let mut patch = PromptPatch {
            cursor_agent_status: Some(report.status),
            cursor_branch_name: report.branch_name.clone(),
            github_pr_url: report.pr_url.clone(),
            github_pr_number: report.pr_number,
            merge_cursor_logs: Some(json!({
                "last_checked_at": Utc::now().to_rfc3339(),
                "last_status": report.status.to_string(),
                "summary": report.summary,
            })),
            ..PromptPatch::default()
        };
        if implied != prompt.status {
            patch.status = Some(implied);
        }
        if report.pr_url.is_some() && prompt.github_pr_status.is_none() {
            patch.github_pr_status = Some(PrStatus::Open);
        }

        let row = self.store.update(row_uuid, patch).await?;
        info!(id = %row_uuid, status = %row.status, run_status = %report.status, "agent report ingested");
        self.apply_row(row.clone());
        Ok(Some(row))
    }

    /// Cancel a running agent and put the prompt back into the queue.
    pub async fn cancel_agent(&self, prompt_id: Uuid) -> DomainResult<Prompt> {
        let prompt = self
            .store
            .get(prompt_id)
            .await?
            .ok_or(DomainError::PromptNotFound(prompt_id))?;
        let agent_id = prompt
            .cursor_agent_id
            .clone()
            .ok_or_else(|| DomainError::AgentNotLinked(prompt_id.to_string()))?;

        self.agent.cancel(&agent_id).await?;

        let patch = PromptPatch {
            status: Some(PromptStatus::Todo),
            cursor_agent_status: Some(AgentRunStatus::Cancelled),
            merge_cursor_logs: Some(json!({
                "cancelled_at": Utc::now().to_rfc3339(),
                "last_status": AgentRunStatus::Cancelled.to_string(),
            })),
            ..PromptPatch::default()
        };
        let row = self.store.update(prompt_id, patch).await?;
        info!(id = %prompt_id, agent = %agent_id, "agent run cancelled");
        self.apply_row(row.clone());
        Ok(row)
    }

    /// Poll the agent service for every prompt with an unfinished run and
    /// ingest the reports. Returns the ids of rows whose status moved, so
    /// the caller can run follow-up automation for them.
    pub async fn poll_active(&self, rows: &[Prompt]) -> DomainResult<Vec<Uuid>> {
        let mut moved = Vec::new();
        for prompt in rows {
            let Some(agent_id) = prompt.cursor_agent_id.as_deref() else {
                continue;
            };
            if prompt
                .cursor_agent_status
                .is_some_and(|s| s.is_finished())
            {
                continue;
            }
            match self.agent.status(agent_id).await {
                Ok(report) => {
                    if let Some(row) = self.ingest(report).await? {
                        if row.status != prompt.status {
                            moved.push(row.id.as_uuid());
                        }
                    }
                }
                Err(err) => {
                    warn!(agent = %agent_id, error = %err, "agent status poll failed");
                }
            }
        }
        Ok(moved)
    }

    fn apply_row(&self, row: Prompt) {
        self.engine.cache().apply(|rows| {
            rows.iter()
                .map(|p| {
                    if p.id.as_uuid() == row.id.as_uuid() {
                        row.clone()
                    } else {
                        p.clone()
                    }
                })
                .collect()
        });
    }
}

fn set_status(rows: &[Prompt], row_uuid: Uuid, status: PromptStatus) -> Vec<Prompt> {
    rows.iter()
        .map(|p| {
            let mut p = p.clone();
            if p.id.as_uuid() == row_uuid {
                p.status = status;
                p.touch();
            }
            p
        })
        .collect()
}
