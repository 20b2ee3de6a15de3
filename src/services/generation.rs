//! AI generation pipeline.
//!
//! Turns a prompt's free-form description into machine-ready instructions
//! through the transformer port, with the status lifecycle and crash
//! recovery the rest of the system relies on.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{GenerationConfig, GenerationPhase, Prompt, PromptStatus};
use crate::domain::ports::{PromptPatch, PromptStore, PromptTransformer, TransformRequest};
use crate::services::optimistic::OptimisticEngine;

/// What one generation attempt did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationOutcome {
    /// Content written and status restored.
    Generated,
    /// Description too short or status not eligible; nothing written.
    Skipped,
    /// Transform failed, timed out, or came back blank; status reverted,
    /// existing content untouched.
    Reverted { reason: String },
}

/// Strip markup tags and common entities, collapsing whitespace.
///
/// Descriptions come from a rich-text editor, so length checks and the
/// transformer must see the visible text, not the markup around it.
pub fn strip_markup(input: &str) -> String {
    let mut text = String::with_capacity(input.len());
    let mut in_tag = false;
    for ch in input.chars() {
        match ch {
            '<' => in_tag = true,
            '>' if in_tag => {
                in_tag = false;
                text.push(' ');
            }
            _ if !in_tag => text.push(ch),
            _ => {}
        }
    }
    let decoded = text
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&");
    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Rows that crashed between the content write and the status write.
pub fn stuck_rows(rows: &[Prompt]) -> Vec<Uuid> {
    rows.iter()
        .filter(|p| p.is_stuck_generating())
        .map(|p| p.id.as_uuid())
        .collect()
}

/// Drives the generation lifecycle for prompts.
pub struct GenerationOrchestrator<S, T>
where
    S: PromptStore + 'static,
    T: PromptTransformer + 'static,
{
    store: Arc<S>,
    transformer: Arc<T>,
    engine: OptimisticEngine,
    config: GenerationConfig,
    inflight: Mutex<Vec<JoinHandle<()>>>,
}

impl<S, T> GenerationOrchestrator<S, T>
where
    S: PromptStore + 'static,
    T: PromptTransformer + 'static,
{
    pub fn new(
        store: Arc<S>,
        transformer: Arc<T>,
        engine: OptimisticEngine,
        config: GenerationConfig,
    ) -> Self {
        Self {
            store,
            transformer,
            engine,
            config,
            inflight: Mutex::new(Vec::new()),
        }
    }

    /// Whether a description is substantial enough to generate from.
    pub fn worth_generating(&self, description: Option<&str>) -> Option<String> {
        let stripped = strip_markup(description?);
        if stripped.chars().count() > self.config.min_description_chars {
            Some(stripped)
        } else {
            None
        }
    }

    /// Run one generation attempt for a prompt.
    ///
    /// Status moves todo -> generating up front; on success the content and
    /// the status restoration are two separate writes so a crash in between
    /// is detectable from the phase field. On any failure the status reverts
    /// and previously generated content stays in place.
    pub async fn generate(&self, prompt_id: Uuid) -> DomainResult<GenerationOutcome> {
        let prompt = self
            .store
            .get(prompt_id)
            .await?
            .ok_or(DomainError::PromptNotFound(prompt_id))?;

        if prompt.status == PromptStatus::Generating {
            return Err(DomainError::GenerationInProgress(prompt_id));
        }
        if !prompt.status.can_transition_to(PromptStatus::Generating) {
            debug!(id = %prompt_id, status = %prompt.status, "status not eligible for generation");
            return Ok(GenerationOutcome::Skipped);
        }
        let Some(stripped) = self.worth_generating(prompt.description.as_deref()) else {
            debug!(id = %prompt_id, "description too short, skipping generation");
            return Ok(GenerationOutcome::Skipped);
        };

        let row_uuid = prompt.id.as_uuid();
        let entry_patch = PromptPatch::status(PromptStatus::Generating)
            .with_generation_phase(GenerationPhase::Idle);
        let store = self.store.clone();
        self.engine
            .mutate(
                |rows| {
                    set_row(rows, row_uuid, |p| {
                        p.status = PromptStatus::Generating;
                        p.generation_phase = GenerationPhase::Idle;
                    })
                },
                async move { store.update(row_uuid, entry_patch).await },
                OptimisticEngine::restore,
            )
            .await?;

        let request = TransformRequest::new(stripped);
        let deadline = Duration::from_secs(self.config.timeout_secs);
        let result = tokio::time::timeout(deadline, self.transformer.transform(request)).await;

        match result {
            Ok(Ok(text)) if !text.trim().is_empty() => {
                self.commit(row_uuid, text).await?;
                info!(id = %prompt_id, "generation completed");
                Ok(GenerationOutcome::Generated)
            }
            Ok(Ok(_)) => {
                self.revert(row_uuid).await?;
                warn!(id = %prompt_id, "transformer returned blank output");
                Ok(GenerationOutcome::Reverted {
                    reason: "transformer returned blank output".to_string(),
                })
            }
            Ok(Err(err)) => {
                self.revert(row_uuid).await?;
                warn!(id = %prompt_id, error = %err, "generation failed");
                Ok(GenerationOutcome::Reverted {
                    reason: err.to_string(),
                })
            }
            Err(_) => {
                self.revert(row_uuid).await?;
                let err = DomainError::TransformTimeout(self.config.timeout_secs);
                warn!(id = %prompt_id, error = %err, "generation timed out");
                Ok(GenerationOutcome::Reverted {
                    reason: err.to_string(),
                })
            }
        }
    }

    /// Fire-and-forget generation; errors are logged, not propagated.
    ///
    /// The task is tracked so [`quiesce`](Self::quiesce) can wait it out
    /// before the process shuts down.
    pub fn spawn(self: &Arc<Self>, prompt_id: Uuid) {
        let this = self.clone();
        let handle = tokio::spawn(async move {
            match this.generate(prompt_id).await {
                Ok(GenerationOutcome::Reverted { reason }) => {
                    debug!(id = %prompt_id, reason, "generation reverted");
                }
                Ok(_) => {}
                Err(err) => warn!(id = %prompt_id, error = %err, "generation errored"),
            }
        });
        if let Ok(mut inflight) = self.inflight.lock() {
            inflight.retain(|h| !h.is_finished());
            inflight.push(handle);
        }
    }

    /// Wait for every spawned generation task to finish.
    ///
    /// Killing the process mid-generation would strand rows in `generating`,
    /// so shutdown paths drain the backlog first.
    pub async fn quiesce(&self) {
        let handles: Vec<_> = match self.inflight.lock() {
            Ok(mut inflight) => inflight.drain(..).collect(),
            Err(_) => return,
        };
        let _ = futures::future::join_all(handles).await;
    }

    /// Force rows stuck between the two completion writes back to todo.
    /// Run on every refresh; returns how many rows were repaired.
    pub async fn repair_stuck(&self, rows: &[Prompt]) -> DomainResult<usize> {
        let stuck = stuck_rows(rows);
        for id in &stuck {
            warn!(id = %id, "repairing prompt stuck in generating");
            let patch = PromptPatch::status(PromptStatus::Todo)
                .with_generation_phase(GenerationPhase::StatusWritten);
            let row = self.store.update(*id, patch).await?;
            self.apply_row(row);
        }
        Ok(stuck.len())
    }

    /// Two writes on purpose: content first, status second. The gap is what
    /// the phase field and the stuck sweep exist for.
    async fn commit(&self, row_uuid: Uuid, text: String) -> DomainResult<()> {
        let content_patch = PromptPatch {
            generated_prompt: Some(text),
            generated_at: Some(Utc::now()),
            generation_phase: Some(GenerationPhase::ContentWritten),
            ..PromptPatch::default()
        };
        let row = self.store.update(row_uuid, content_patch).await?;
        self.apply_row(row);

        let status_patch = PromptPatch::status(PromptStatus::Todo)
            .with_generation_phase(GenerationPhase::StatusWritten);
        let row = self.store.update(row_uuid, status_patch).await?;
        self.apply_row(row);
        Ok(())
    }

    async fn revert(&self, row_uuid: Uuid) -> DomainResult<()> {
        let patch =
            PromptPatch::status(PromptStatus::Todo).with_generation_phase(GenerationPhase::Idle);
        let row = self.store.update(row_uuid, patch).await?;
        self.apply_row(row);
        Ok(())
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::PromptId;

    #[test]
    fn test_strip_markup_removes_tags() {
        assert_eq!(strip_markup("<p>Fix the login bug</p>"), "Fix the login bug");
        assert_eq!(
            strip_markup("<div><strong>Bold</strong> and <em>italic</em></div>"),
            "Bold and italic"
        );
    }

    #[test]
    fn test_strip_markup_decodes_entities() {
        assert_eq!(strip_markup("a&nbsp;&amp;&nbsp;b"), "a & b");
        assert_eq!(strip_markup("1 &lt; 2 &gt; 0"), "1 < 2 > 0");
        assert_eq!(strip_markup("it&#39;s &quot;quoted&quot;"), "it's \"quoted\"");
    }

    #[test]
    fn test_strip_markup_collapses_whitespace() {
        assert_eq!(strip_markup("<p>a</p>\n<p>b</p>   c"), "a b c");
        assert_eq!(strip_markup(""), "");
    }

    #[test]
    fn test_stuck_rows_selects_half_committed_only() {
        let mut stuck = Prompt::new(Uuid::new_v4(), "Stuck");
        stuck.id = PromptId::persisted(Uuid::new_v4());
        stuck.status = PromptStatus::Generating;
        stuck.generation_phase = GenerationPhase::ContentWritten;

        let mut healthy = Prompt::new(Uuid::new_v4(), "Healthy");
        healthy.id = PromptId::persisted(Uuid::new_v4());
        healthy.status = PromptStatus::Generating;
        healthy.generation_phase = GenerationPhase::Idle;

        let ids = stuck_rows(&[stuck.clone(), healthy]);
        assert_eq!(ids, vec![stuck.id.as_uuid()]);
    }
}
