//! In-memory prompt collection shared between the UI-facing service layer,
//! the optimistic mutation engine, and the change-feed reconciler.

use std::sync::Arc;

use tokio::sync::watch;

use crate::domain::models::{Prompt, PromptId};

/// Snapshot of the whole prompt collection at one point in time.
pub type PromptSnapshot = Arc<Vec<Prompt>>;

/// The locally cached prompt collection.
///
/// Every mutation replaces the whole collection atomically; readers only ever
/// observe a fully applied state. Concurrent writers serialize on the channel
/// lock, so interleaved partial updates cannot be observed.
#[derive(Debug)]
pub struct PromptCache {
    tx: watch::Sender<PromptSnapshot>,
}

impl PromptCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        let (tx, _) = watch::channel(Arc::new(Vec::new()));
        Self { tx }
    }

    /// Create a cache seeded with rows.
    pub fn with_rows(rows: Vec<Prompt>) -> Self {
        let (tx, _) = watch::channel(Arc::new(rows));
        Self { tx }
    }

    /// Current snapshot. Cheap to clone, never blocks writers.
    pub fn snapshot(&self) -> PromptSnapshot {
        self.tx.borrow().clone()
    }

    /// Watch for collection replacements.
    pub fn subscribe(&self) -> watch::Receiver<PromptSnapshot> {
        self.tx.subscribe()
    }

    /// Replace the whole collection.
    pub fn replace(&self, rows: Vec<Prompt>) {
        self.tx.send_replace(Arc::new(rows));
    }

    /// Compute the next collection from the current one and swap it in as a
    /// single write. Returns the snapshots before and after the swap.
    pub fn apply<F>(&self, f: F) -> (PromptSnapshot, PromptSnapshot)
    where
        F: FnOnce(&[Prompt]) -> Vec<Prompt>,
    {
        let mut before: PromptSnapshot = Arc::new(Vec::new());
        let mut after: PromptSnapshot = Arc::new(Vec::new());
        self.tx.send_modify(|current| {
            before = current.clone();
            *current = Arc::new(f(current));
            after = current.clone();
        });
        (before, after)
    }

    /// Like [`apply`](Self::apply), but only swaps when the closure returns
    /// `Some`, so watchers are not woken for no-op events. Returns whether a
    /// swap happened.
    pub fn apply_if<F>(&self, f: F) -> bool
    where
        F: FnOnce(&[Prompt]) -> Option<Vec<Prompt>>,
    {
        self.tx.send_if_modified(|current| match f(current) {
            Some(next) => {
                *current = Arc::new(next);
                true
            }
            None => false,
        })
    }

    /// Find a row by id.
    pub fn find(&self, id: PromptId) -> Option<Prompt> {
        self.tx.borrow().iter().find(|p| p.id == id).cloned()
    }

    /// Find a row by its underlying uuid, draft or persisted.
    pub fn find_by_uuid(&self, id: uuid::Uuid) -> Option<Prompt> {
        self.tx.borrow().iter().find(|p| p.id.as_uuid() == id).cloned()
    }

    /// Number of cached rows.
    pub fn len(&self) -> usize {
        self.tx.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tx.borrow().is_empty()
    }
}

impl Default for PromptCache {
    fn default() -> Self {
        Self::new()
    }
}
