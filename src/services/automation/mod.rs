//! Workflow automation.
//!
//! Scheduled passes that move agent-driven prompts along, escalate
//! priorities, group work into epics, and report on activity. Every pass is
//! attributed to the workspace's automation agent and leaves exactly one
//! activity record, success or failure.

pub mod actions;
pub mod epics;
pub mod patterns;
pub mod priority;
pub mod transitions;

pub use actions::{
    AutomationAction, AutomationEntity, AutomationOutcome, EpicMatch, PriorityChange, StatusChange,
};
pub use patterns::PatternReport;
pub use transitions::{decide_transition, TransitionDecision};

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use serde_json::json;
use tracing::{debug, info};
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    ActivityRecord, AutomationConfig, EpicStatus, PromptStatus, WorkflowAgent,
};
use crate::domain::ports::{AuditStore, EpicStore, PromptFilter, PromptPatch, PromptStore};

/// Runs automation actions against one workspace.
///
/// Writes go straight to the store; local collections converge through the
/// change feed like any other remote write.
pub struct WorkflowEngine<S, E, A>
where
    S: PromptStore + 'static,
    E: EpicStore + 'static,
    A: AuditStore + 'static,
{
    store: Arc<S>,
    epic_store: Arc<E>,
    audit: Arc<A>,
    config: AutomationConfig,
    workspace_id: Uuid,
}

impl<S, E, A> WorkflowEngine<S, E, A>
where
    S: PromptStore + 'static,
    E: EpicStore + 'static,
    A: AuditStore + 'static,
{
    pub fn new(
        store: Arc<S>,
        epic_store: Arc<E>,
        audit: Arc<A>,
        config: AutomationConfig,
        workspace_id: Uuid,
    ) -> Self {
        Self {
            store,
            epic_store,
            audit,
            config,
            workspace_id,
        }
    }

    /// Run one action, append its activity record, and return the outcome.
    pub async fn run(&self, action: AutomationAction) -> DomainResult<AutomationOutcome> {
        let agent = self.audit.find_or_create_agent(self.workspace_id).await?;
        let started = Instant::now();
        let result = self.execute(action).await;
        let elapsed_ms = i64::try_from(started.elapsed().as_millis()).unwrap_or(i64::MAX);

        let record = self.build_record(&agent, action, &result, elapsed_ms);
        self.audit.append(&record).await?;
        self.audit.touch_agent(agent.id).await?;

        match &result {
            Ok(outcome) => {
                info!(
                    action = action.name(),
                    writes = outcome.writes(),
                    elapsed_ms,
                    "automation action finished"
                );
            }
            Err(err) => {
                info!(action = action.name(), error = %err, elapsed_ms, "automation action failed");
            }
        }
        result
    }

    async fn execute(&self, action: AutomationAction) -> DomainResult<AutomationOutcome> {
        match action {
            AutomationAction::AutoStatusUpdate { entity: None } => self.status_sweep(None).await,
            AutomationAction::AutoStatusUpdate {
                entity: Some(AutomationEntity::Prompt(id)),
            }
            | AutomationAction::TaskAutomation { prompt_id: id } => {
                self.status_sweep(Some(id)).await
            }
            AutomationAction::AutoStatusUpdate {
                entity: Some(AutomationEntity::Epic(id)),
            } => self.epic_completion(id).await,
            AutomationAction::PriorityAdjustment => self.priority_pass().await,
            AutomationAction::EpicOrganization => self.epic_pass().await,
            AutomationAction::AnalyzePromptPatterns => self.patterns_pass().await,
        }
    }

    /// Push every matching row through the transition table.
    async fn status_sweep(&self, only: Option<Uuid>) -> DomainResult<AutomationOutcome> {
        let rows = match only {
            Some(id) => vec![self
                .store
                .get(id)
                .await?
                .ok_or(DomainError::PromptNotFound(id))?],
            None => {
                self.store
                    .list(PromptFilter::workspace(self.workspace_id))
                    .await?
            }
        };

        let mut applied = Vec::new();
        for prompt in &rows {
            let Some(decision) = transitions::decide_transition(prompt) else {
                continue;
            };
            let metadata = json!({
                "automated_at": Utc::now().to_rfc3339(),
                "automation_reason": decision.reason,
                "previous_status": prompt.status.as_str(),
            });
            let patch = PromptPatch::status(decision.to).with_workflow_metadata(metadata);
            self.store.update(prompt.id.as_uuid(), patch).await?;
            info!(
                id = %prompt.id,
                from = prompt.status.as_str(),
                to = decision.to.as_str(),
                reason = decision.reason,
                "status advanced by automation"
            );
            applied.push(StatusChange {
                prompt_id: prompt.id.as_uuid(),
                from: prompt.status,
                to: decision.to,
                reason: decision.reason.to_string(),
            });
        }

        if applied.is_empty() {
            debug!("status sweep found nothing to move");
            Ok(AutomationOutcome::NoChange)
        } else {
            Ok(AutomationOutcome::StatusUpdates { applied })
        }
    }

    async fn priority_pass(&self) -> DomainResult<AutomationOutcome> {
        let rows = self
            .store
            .list(PromptFilter::workspace(self.workspace_id))
            .await?;
        let changes = priority::escalation_pass(&rows, &self.config, Utc::now());

        for change in &changes {
            self.store
                .update(change.prompt_id, PromptPatch::priority(change.to))
                .await?;
            info!(
                id = %change.prompt_id,
                from = change.from.as_str(),
                to = change.to.as_str(),
                reason = %change.reason,
                "priority escalated"
            );
        }

        if changes.is_empty() {
            Ok(AutomationOutcome::NoChange)
        } else {
            Ok(AutomationOutcome::PriorityChanges { applied: changes })
        }
    }

    async fn epic_pass(&self) -> DomainResult<AutomationOutcome> {
        let rows = self
            .store
            .list(PromptFilter::workspace(self.workspace_id))
            .await?;
        let epics = self.epic_store.list(self.workspace_id).await?;
        let (assigned, suggested) = epics::organization_pass(&rows, &epics, &self.config);

        for epic_match in &assigned {
            self.store
                .assign_epic(epic_match.prompt_id, Some(epic_match.epic_id))
                .await?;
            info!(
                id = %epic_match.prompt_id,
                epic = %epic_match.epic_name,
                score = epic_match.score,
                "epic auto-assigned"
            );
        }

        if assigned.is_empty() && suggested.is_empty() {
            Ok(AutomationOutcome::NoChange)
        } else {
            Ok(AutomationOutcome::EpicAssignments {
                assigned,
                suggested,
            })
        }
    }

    /// Recompute one epic's completion status from its linked prompts.
    ///
    /// All prompts done (and at least one) marks the epic done; any done
    /// prompt marks it in progress; an epic with no finished work is left
    /// alone. Counts can be stale under concurrent edits, which is tolerable
    /// for a progress indicator.
    async fn epic_completion(&self, epic_id: Uuid) -> DomainResult<AutomationOutcome> {
        let mut epic = self
            .epic_store
            .get(epic_id)
            .await?
            .ok_or(DomainError::EpicNotFound(epic_id))?;
        let rows = self
            .store
            .list(PromptFilter::workspace(self.workspace_id).with_epic(epic_id))
            .await?;

        let done = rows
            .iter()
            .filter(|p| p.status == PromptStatus::Done)
            .count();
        let next = if !rows.is_empty() && done == rows.len() {
            EpicStatus::Done
        } else if done > 0 {
            EpicStatus::InProgress
        } else {
            epic.status
        };

        if next == epic.status {
            return Ok(AutomationOutcome::NoChange);
        }

        let from = epic.status;
        epic.status = next;
        epic.updated_at = Utc::now();
        self.epic_store.update(&epic).await?;
        info!(
            id = %epic_id,
            from = from.as_str(),
            to = next.as_str(),
            done,
            total = rows.len(),
            "epic completion recomputed"
        );
        Ok(AutomationOutcome::EpicCompletion {
            epic_id,
            from,
            to: next,
        })
    }

    async fn patterns_pass(&self) -> DomainResult<AutomationOutcome> {
        let rows = self
            .store
            .list(PromptFilter::workspace(self.workspace_id))
            .await?;
        let report = patterns::analyze(&rows, self.config.pattern_window_days, Utc::now());
        Ok(AutomationOutcome::Patterns(report))
    }

    fn build_record(
        &self,
        agent: &WorkflowAgent,
        action: AutomationAction,
        result: &DomainResult<AutomationOutcome>,
        elapsed_ms: i64,
    ) -> ActivityRecord {
        let mut record = ActivityRecord::new(self.workspace_id, agent.id, action.name());
        if let Some((entity_type, entity_id)) = action.entity() {
            record = record.with_entity(entity_type, entity_id);
        }

        match result {
            Ok(outcome) => {
                let details = match outcome {
                    AutomationOutcome::StatusUpdates { applied } if applied.len() == 1 => {
                        applied[0].reason.clone()
                    }
                    AutomationOutcome::StatusUpdates { applied } => {
                        format!("{} status updates", applied.len())
                    }
                    AutomationOutcome::PriorityChanges { applied } => {
                        format!("{} priority changes", applied.len())
                    }
                    AutomationOutcome::EpicAssignments {
                        assigned,
                        suggested,
                    } => format!(
                        "{} epics assigned, {} suggested",
                        assigned.len(),
                        suggested.len()
                    ),
                    AutomationOutcome::EpicCompletion { from, to, .. } => {
                        format!("epic {} -> {}", from.as_str(), to.as_str())
                    }
                    AutomationOutcome::Patterns(report) => {
                        format!("analyzed {} prompts", report.total_prompts)
                    }
                    AutomationOutcome::NoChange => "no changes".to_string(),
                };
                let before = match outcome {
                    AutomationOutcome::StatusUpdates { applied } if applied.len() == 1 => {
                        Some(json!({ "status": applied[0].from.as_str() }))
                    }
                    AutomationOutcome::EpicCompletion { from, .. } => {
                        Some(json!({ "status": from.as_str() }))
                    }
                    _ => None,
                };
                record
                    .with_states(before, serde_json::to_value(outcome).ok())
                    .with_details(details)
                    .finished(true, elapsed_ms)
            }
            Err(err) => record
                .with_details(err.to_string())
                .finished(false, elapsed_ms),
        }
    }
}
