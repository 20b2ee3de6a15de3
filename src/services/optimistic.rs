//! Optimistic mutation engine.
//!
//! Local state is updated before the store acknowledges a write, so the
//! caller sees the effect immediately. If the store rejects the write, the
//! local collection is restored from the pre-mutation snapshot.

use std::future::Future;
use std::sync::Arc;

use tracing::debug;

use crate::domain::errors::DomainResult;
use crate::domain::models::{Prompt, PromptId};
use crate::services::cache::{PromptCache, PromptSnapshot};

/// Applies local mutations ahead of their remote writes.
///
/// The contract per mutation: exactly one local write on entry, and at most
/// one more on failure. The rollback closure receives the pre-mutation
/// snapshot, not the current collection, so concurrent feed updates that
/// landed in between are deliberately discarded in favor of a known-good
/// state; the next feed event re-converges them.
#[derive(Debug, Clone)]
pub struct OptimisticEngine {
    cache: Arc<PromptCache>,
}

impl OptimisticEngine {
    pub fn new(cache: Arc<PromptCache>) -> Self {
        Self { cache }
    }

    pub fn cache(&self) -> &Arc<PromptCache> {
        &self.cache
    }

    /// Run one optimistic mutation.
    ///
    /// `apply` computes the speculative next collection, `op` performs the
    /// remote write, `rollback` computes the collection to restore from the
    /// pre-mutation snapshot when `op` fails.
    pub async fn mutate<T, A, R, Fut>(&self, apply: A, op: Fut, rollback: R) -> DomainResult<T>
    where
        A: FnOnce(&[Prompt]) -> Vec<Prompt>,
        R: FnOnce(&[Prompt]) -> Vec<Prompt>,
        Fut: Future<Output = DomainResult<T>>,
    {
        let (before, _) = self.cache.apply(apply);
        match op.await {
            Ok(value) => Ok(value),
            Err(err) => {
                debug!(error = %err, "optimistic write failed, rolling back");
                self.cache.replace(rollback(&before));
                Err(err)
            }
        }
    }

    /// Replace the draft row for a confirmed insert with the persisted row.
    ///
    /// If the change feed already delivered the persisted row, the draft is
    /// simply dropped; the row is never duplicated.
    pub fn confirm_insert(&self, draft_id: PromptId, persisted: Prompt) {
        self.cache.apply(|rows| {
            let mut next: Vec<Prompt> =
                rows.iter().filter(|p| p.id != draft_id).cloned().collect();
            match next.iter_mut().find(|p| p.id == persisted.id) {
                Some(existing) => *existing = persisted,
                None => next.insert(0, persisted),
            }
            next
        });
    }

    /// Convenience rollback that restores the pre-mutation snapshot as-is.
    pub fn restore(snapshot: &[Prompt]) -> Vec<Prompt> {
        snapshot.to_vec()
    }

    /// Current snapshot of the underlying cache.
    pub fn snapshot(&self) -> PromptSnapshot {
        self.cache.snapshot()
    }
}
