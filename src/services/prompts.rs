//! Prompt lifecycle service.
//!
//! The write path every user-facing prompt operation goes through: local
//! state first, remote write second, rollback on rejection.

use std::sync::Arc;

use tracing::{debug, info};
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{Prompt, PromptPriority, PromptStatus};
use crate::domain::ports::{NewPrompt, PromptFilter, PromptPatch, PromptStore, PromptTransformer};
use crate::services::cache::PromptSnapshot;
use crate::services::generation::{GenerationOrchestrator, GenerationOutcome};
use crate::services::optimistic::OptimisticEngine;

/// Facade over prompt CRUD, status moves, and generation triggers for one
/// workspace.
pub struct PromptService<S, T>
where
    S: PromptStore + 'static,
    T: PromptTransformer + 'static,
{
    store: Arc<S>,
    engine: OptimisticEngine,
    generation: Arc<GenerationOrchestrator<S, T>>,
    workspace_id: Uuid,
}

impl<S, T> PromptService<S, T>
where
    S: PromptStore + 'static,
    T: PromptTransformer + 'static,
{
    pub fn new(
        store: Arc<S>,
        engine: OptimisticEngine,
        generation: Arc<GenerationOrchestrator<S, T>>,
        workspace_id: Uuid,
    ) -> Self {
        Self {
            store,
            engine,
            generation,
            workspace_id,
        }
    }

    /// Current local collection.
    pub fn list(&self) -> PromptSnapshot {
        self.engine.snapshot()
    }

    /// Look up a row in the local collection.
    pub fn get(&self, id: Uuid) -> Option<Prompt> {
        self.engine.cache().find_by_uuid(id)
    }

    /// Reload the collection from the store and repair any rows left stuck
    /// by a crash mid-generation.
    pub async fn refresh(&self) -> DomainResult<PromptSnapshot> {
        let rows = self
            .store
            .list(PromptFilter::workspace(self.workspace_id))
            .await?;
        self.engine.cache().replace(rows.clone());
        let repaired = self.generation.repair_stuck(&rows).await?;
        if repaired > 0 {
            debug!(repaired, "stuck prompts repaired on refresh");
        }
        Ok(self.engine.snapshot())
    }

    /// Create a prompt.
    ///
    /// The draft row appears at the top of the collection immediately and is
    /// swapped for the persisted row when the store confirms. A substantial
    /// description kicks off generation in the background.
    pub async fn create(&self, new_prompt: NewPrompt) -> DomainResult<Prompt> {
        if new_prompt.title.trim().is_empty() {
            return Err(DomainError::ValidationFailed(
                "prompt title cannot be empty".to_string(),
            ));
        }

        let draft = new_prompt.draft_row();
        let draft_id = draft.id;
        let store = self.store.clone();
        let to_insert = new_prompt.clone();

        let persisted = self
            .engine
            .mutate(
                |rows| {
                    let mut next = Vec::with_capacity(rows.len() + 1);
                    next.push(draft.clone());
                    next.extend(rows.iter().cloned());
                    next
                },
                async move { store.insert(to_insert).await },
                OptimisticEngine::restore,
            )
            .await?;

        self.engine.confirm_insert(draft_id, persisted.clone());
        info!(id = %persisted.id, title = %persisted.title, "prompt created");

        if self
            .generation
            .worth_generating(persisted.description.as_deref())
            .is_some()
        {
            self.generation.spawn(persisted.id.as_uuid());
        }
        Ok(persisted)
    }

    /// Update title and/or description. A changed description substantial
    /// enough to generate from re-runs generation.
    pub async fn update(
        &self,
        id: Uuid,
        title: Option<String>,
        description: Option<String>,
    ) -> DomainResult<Prompt> {
        let current = self.require(id).await?;
        let description_changed = description
            .as_deref()
            .is_some_and(|d| current.description.as_deref() != Some(d));

        let patch = PromptPatch {
            title: title.clone(),
            description: description.clone(),
            ..PromptPatch::default()
        };
        if patch.is_empty() {
            return Ok(current);
        }

        let store = self.store.clone();
        let row = self
            .engine
            .mutate(
                |rows| {
                    set_row(rows, id, |p| {
                        if let Some(title) = &title {
                            p.title = title.clone();
                        }
                        if let Some(description) = &description {
                            p.description = Some(description.clone());
                        }
                    })
                },
                async move { store.update(id, patch).await },
                OptimisticEngine::restore,
            )
            .await?;
        self.apply_row(row.clone());

        if description_changed
            && self
                .generation
                .worth_generating(row.description.as_deref())
                .is_some()
        {
            self.generation.spawn(id);
        }
        Ok(row)
    }

    /// Run generation for a prompt and wait for the outcome.
    ///
    /// Unlike the background trigger on create and update, this surfaces
    /// the result to the caller.
    pub async fn regenerate(&self, id: Uuid) -> DomainResult<GenerationOutcome> {
        self.require(id).await?;
        self.generation.generate(id).await
    }

    /// Wait for background generation tasks to finish.
    pub async fn quiesce(&self) {
        self.generation.quiesce().await;
    }

    /// Delete a prompt. Refused while generation is in flight so the
    /// background writes cannot resurrect a ghost row.
    pub async fn delete(&self, id: Uuid) -> DomainResult<()> {
        let current = self.require(id).await?;
        if current.status == PromptStatus::Generating {
            return Err(DomainError::GenerationInProgress(id));
        }

        let store = self.store.clone();
        self.engine
            .mutate(
                |rows| {
                    rows.iter()
                        .filter(|p| p.id.as_uuid() != id)
                        .cloned()
                        .collect()
                },
                async move { store.delete(id).await },
                OptimisticEngine::restore,
            )
            .await?;
        info!(id = %id, "prompt deleted");
        Ok(())
    }

    /// Duplicate a prompt as a fresh todo row, dropping generated content
    /// and agent linkage. Generation re-runs if the description warrants it.
    pub async fn duplicate(&self, id: Uuid) -> DomainResult<Prompt> {
        let source = self.require(id).await?;
        let mut copy = NewPrompt::new(source.workspace_id, format!("{} (Copy)", source.title))
            .with_priority(source.priority)
            .with_order_index(source.order_index);
        copy.product_id = source.product_id;
        copy.epic_id = source.epic_id;
        copy.description = source.description.clone();
        copy.is_debug_session = source.is_debug_session;
        self.create(copy).await
    }

    /// Advance the local status cycle: todo -> in progress -> done.
    ///
    /// Prompts in dispatch-owned or terminal states are left alone; the
    /// click is a silent no-op rather than an error.
    pub async fn cycle_status(&self, id: Uuid) -> DomainResult<Prompt> {
        let current = self.require(id).await?;
        if current.status.is_externally_driven() {
            debug!(id = %id, status = %current.status, "status owned by automation, cycle ignored");
            return Ok(current);
        }
        match current.status.next_in_cycle() {
            Some(next) => self.update_status(id, next).await,
            None => Ok(current),
        }
    }

    /// Set priority. Never gated; urgency is the user's call even while an
    /// agent works.
    pub async fn set_priority(&self, id: Uuid, priority: PromptPriority) -> DomainResult<Prompt> {
        self.require(id).await?;
        let store = self.store.clone();
        let row = self
            .engine
            .mutate(
                |rows| set_row(rows, id, |p| p.priority = priority),
                async move { store.update(id, PromptPatch::priority(priority)).await },
                OptimisticEngine::restore,
            )
            .await?;
        self.apply_row(row.clone());
        Ok(row)
    }

    /// Assign or clear the epic.
    pub async fn assign_epic(&self, id: Uuid, epic_id: Option<Uuid>) -> DomainResult<Prompt> {
        self.require(id).await?;
        let store = self.store.clone();
        let row = self
            .engine
            .mutate(
                |rows| set_row(rows, id, |p| p.epic_id = epic_id),
                async move { store.assign_epic(id, epic_id).await },
                OptimisticEngine::restore,
            )
            .await?;
        self.apply_row(row.clone());
        Ok(row)
    }

    /// Explicitly finish a prompt.
    pub async fn mark_done(&self, id: Uuid) -> DomainResult<Prompt> {
        self.update_status(id, PromptStatus::Done).await
    }

    /// Reopen a finished or failed prompt. This is the one user override
    /// allowed out of a terminal state.
    pub async fn reopen(&self, id: Uuid) -> DomainResult<Prompt> {
        let current = self.require(id).await?;
        if !current.status.is_terminal() {
            return Err(DomainError::InvalidStateTransition {
                from: current.status.as_str().to_string(),
                to: PromptStatus::Todo.as_str().to_string(),
                reason: "only done or error prompts can be reopened".to_string(),
            });
        }
        self.update_status(id, PromptStatus::Todo).await
    }

    /// Validated status write shared by the status-moving operations.
    pub(crate) async fn update_status(
        &self,
        id: Uuid,
        status: PromptStatus,
    ) -> DomainResult<Prompt> {
        let current = self.require(id).await?;
        if !current.status.can_transition_to(status) {
            return Err(DomainError::InvalidStateTransition {
                from: current.status.as_str().to_string(),
                to: status.as_str().to_string(),
                reason: "not in the lifecycle graph".to_string(),
            });
        }

        let store = self.store.clone();
        let row = self
            .engine
            .mutate(
                |rows| {
                    set_row(rows, id, |p| {
                        p.status = status;
                    })
                },
                async move { store.update(id, PromptPatch::status(status)).await },
                OptimisticEngine::restore,
            )
            .await?;
        self.apply_row(row.clone());
        Ok(row)
    }

    async fn require(&self, id: Uuid) -> DomainResult<Prompt> {
        if let Some(row) = self.engine.cache().find_by_uuid(id) {
            return Ok(row);
        }
        self.store
            .get(id)
            .await?
            .ok_or(DomainError::PromptNotFound(id))
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

fn set_row<F>(rows: &[Prompt], row_uuid: Uuid, mutate: F) -> Vec<Prompt>
where
    F: Fn(&mut Prompt),
{
    rows.iter()
        .map(|p| {
            let mut p = p.clone();
            if p.id.as_uuid() == row_uuid {
                mutate(&mut p);
                p.touch();
            }
            p
        })
        .collect()
}
