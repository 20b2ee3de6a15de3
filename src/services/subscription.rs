//! Change-feed subscription pump.
//!
//! Bridges the store's broadcast feed into a bounded queue consumed by a
//! single reconciliation loop, so events apply to the local collection in
//! receipt order no matter how many places want to observe them.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, watch, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::domain::models::ChangeEvent;
use crate::services::cache::PromptCache;
use crate::services::reconciler::reconcile;

/// Configuration for the subscription pump.
#[derive(Debug, Clone)]
pub struct SubscriptionConfig {
    /// Capacity of the bounded event queue between feed and reconciler.
    pub queue_capacity: usize,
}

impl Default for SubscriptionConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 256,
        }
    }
}

/// Counters for the pump.
#[derive(Debug, Clone, Default)]
pub struct SubscriptionStatus {
    /// Whether both loops are still running.
    pub running: bool,
    /// Events taken off the feed.
    pub received: u64,
    /// Events that changed the collection.
    pub applied: u64,
    /// Events reconciled away as no-ops.
    pub skipped: u64,
    /// Events dropped because the feed lagged past the buffer.
    pub lagged: u64,
}

/// Handle to observe and stop a running subscription.
pub struct SubscriptionHandle {
    shutdown: watch::Sender<bool>,
    status: Arc<RwLock<SubscriptionStatus>>,
    forward_task: JoinHandle<()>,
    apply_task: JoinHandle<()>,
}

impl SubscriptionHandle {
    /// Request the pump to stop and wait for both loops to exit.
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        let _ = self.forward_task.await;
        let _ = self.apply_task.await;
    }

    /// Get current pump counters.
    pub async fn status(&self) -> SubscriptionStatus {
        self.status.read().await.clone()
    }
}

/// Owns the subscription wiring for one workspace.
///
/// Feed events for other workspaces are dropped at the front; deletes pass
/// through unfiltered because they carry only an id and removal by id is
/// harmless when the row was never ours.
pub struct SubscriptionManager {
    cache: Arc<PromptCache>,
    workspace_id: Uuid,
    config: SubscriptionConfig,
}

impl SubscriptionManager {
    pub fn new(cache: Arc<PromptCache>, workspace_id: Uuid, config: SubscriptionConfig) -> Self {
        Self {
            cache,
            workspace_id,
            config,
        }
    }

    pub fn with_defaults(cache: Arc<PromptCache>, workspace_id: Uuid) -> Self {
        Self::new(cache, workspace_id, SubscriptionConfig::default())
    }

    /// Start the pump on a store change feed.
    pub fn run(self, feed: broadcast::Receiver<ChangeEvent>) -> SubscriptionHandle {
        let (shutdown, _) = watch::channel(false);
        let status = Arc::new(RwLock::new(SubscriptionStatus {
            running: true,
            ..SubscriptionStatus::default()
        }));

        let (queue_tx, queue_rx) = mpsc::channel(self.config.queue_capacity);

        let forward_task = tokio::spawn(Self::forward_loop(
            feed,
            queue_tx,
            self.workspace_id,
            shutdown.subscribe(),
            status.clone(),
        ));
        let apply_task = tokio::spawn(Self::apply_loop(
            queue_rx,
            self.cache,
            shutdown.subscribe(),
            status.clone(),
        ));

        SubscriptionHandle {
            shutdown,
            status,
            forward_task,
            apply_task,
        }
    }

    /// Take events off the broadcast feed and push them into the bounded
    /// queue, applying the workspace filter.
    async fn forward_loop(
        mut feed: broadcast::Receiver<ChangeEvent>,
        queue: mpsc::Sender<ChangeEvent>,
        workspace_id: Uuid,
        mut shutdown: watch::Receiver<bool>,
        status: Arc<RwLock<SubscriptionStatus>>,
    ) {
        loop {
            tokio::select! {
                _ = shutdown.changed() => break,
                event = feed.recv() => match event {
                    Ok(event) => {
                        if !Self::relevant(&event, workspace_id) {
                            continue;
                        }
                        status.write().await.received += 1;
                        if queue.send(event).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "change feed lagged, events dropped");
                        status.write().await.lagged += skipped;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
            }
        }
        debug!("change feed forwarder stopped");
    }

    /// Drain the queue in receipt order, reconciling each event into the
    /// cached collection.
    async fn apply_loop(
        mut queue: mpsc::Receiver<ChangeEvent>,
        cache: Arc<PromptCache>,
        mut shutdown: watch::Receiver<bool>,
        status: Arc<RwLock<SubscriptionStatus>>,
    ) {
        loop {
            let event = tokio::select! {
                _ = shutdown.changed() => break,
                event = queue.recv() => match event {
                    Some(event) => event,
                    None => break,
                },
            };

            let changed = cache.apply_if(|rows| reconcile(rows, &event));
            let mut status = status.write().await;
            if changed {
                status.applied += 1;
            } else {
                status.skipped += 1;
                debug!(kind = event.kind(), id = %event.row_id(), "event reconciled to no-op");
            }
        }
        status.write().await.running = false;
        debug!("reconciler loop stopped");
    }

    fn relevant(event: &ChangeEvent, workspace_id: Uuid) -> bool {
        match event {
            ChangeEvent::Inserted { row } | ChangeEvent::Updated { row } => {
                row.workspace_id == workspace_id
            }
            ChangeEvent::Deleted { .. } => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{Prompt, PromptId, PromptStatus};
    use std::time::Duration;

    fn persisted(workspace_id: Uuid, title: &str) -> Prompt {
        let mut p = Prompt::new(workspace_id, title);
        p.id = PromptId::persisted(Uuid::new_v4());
        p
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    #[tokio::test]
    async fn test_events_apply_in_receipt_order() {
        let workspace_id = Uuid::new_v4();
        let cache = Arc::new(PromptCache::new());
        let (feed_tx, feed_rx) = broadcast::channel(16);

        let handle =
            SubscriptionManager::with_defaults(cache.clone(), workspace_id).run(feed_rx);

        let mut row = persisted(workspace_id, "Row");
        feed_tx
            .send(ChangeEvent::Inserted { row: row.clone() })
            .unwrap();
        row.status = PromptStatus::InProgress;
        feed_tx
            .send(ChangeEvent::Updated { row: row.clone() })
            .unwrap();

        settle().await;
        let snapshot = cache.snapshot();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].status, PromptStatus::InProgress);

        handle.stop().await;
    }

    #[tokio::test]
    async fn test_other_workspace_events_filtered() {
        let workspace_id = Uuid::new_v4();
        let cache = Arc::new(PromptCache::new());
        let (feed_tx, feed_rx) = broadcast::channel(16);

        let handle =
            SubscriptionManager::with_defaults(cache.clone(), workspace_id).run(feed_rx);

        let foreign = persisted(Uuid::new_v4(), "Foreign");
        feed_tx.send(ChangeEvent::Inserted { row: foreign }).unwrap();

        settle().await;
        assert!(cache.is_empty());

        handle.stop().await;
    }

    #[tokio::test]
    async fn test_duplicate_insert_counts_as_skip() {
        let workspace_id = Uuid::new_v4();
        let cache = Arc::new(PromptCache::new());
        let (feed_tx, feed_rx) = broadcast::channel(16);

        let handle =
            SubscriptionManager::with_defaults(cache.clone(), workspace_id).run(feed_rx);

        let row = persisted(workspace_id, "Row");
        feed_tx
            .send(ChangeEvent::Inserted { row: row.clone() })
            .unwrap();
        feed_tx.send(ChangeEvent::Inserted { row }).unwrap();

        settle().await;
        assert_eq!(cache.len(), 1);
        let status = handle.status().await;
        assert_eq!(status.applied, 1);
        assert_eq!(status.skipped, 1);

        handle.stop().await;
    }
}
