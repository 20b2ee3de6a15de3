//! Workspace session: composition root for one workspace.

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::models::{ActivityRecord, Config, Epic};
use crate::domain::ports::{AuditStore, CursorAgent, EpicStore, PromptStore, PromptTransformer};
use crate::services::cache::{PromptCache, PromptSnapshot};
use crate::services::dispatch::AgentDispatcher;
use crate::services::generation::GenerationOrchestrator;
use crate::services::optimistic::OptimisticEngine;
use crate::services::prompts::PromptService;
use crate::services::subscription::{SubscriptionConfig, SubscriptionHandle, SubscriptionManager};
use crate::services::automation::{AutomationAction, WorkflowEngine};

/// Wires the cache, the optimistic engine, the services, and the change-feed
/// subscription together for one workspace.
///
/// Construction is cheap and does no I/O; [`start`](Self::start) subscribes
/// to the change feed and loads the initial collection. The subscription is
/// opened before the initial fetch so no event can fall between them; the
/// reconciler makes the overlap harmless.
pub struct WorkspaceSession<S, T, C, E, A>
where
    S: PromptStore + 'static,
    T: PromptTransformer + 'static,
    C: CursorAgent + 'static,
    E: EpicStore + 'static,
    A: AuditStore + 'static,
{
    workspace_id: Uuid,
    cache: Arc<PromptCache>,
    store: Arc<S>,
    epic_store: Arc<E>,
    audit: Arc<A>,
    prompts: PromptService<S, T>,
    dispatcher: AgentDispatcher<S, C>,
    workflow: WorkflowEngine<S, E, A>,
    queue_capacity: usize,
    subscription: Option<SubscriptionHandle>,
}

impl<S, T, C, E, A> WorkspaceSession<S, T, C, E, A>
where
    S: PromptStore + 'static,
    T: PromptTransformer + 'static,
    C: CursorAgent + 'static,
    E: EpicStore + 'static,
    A: AuditStore + 'static,
{
    pub fn new(
        workspace_id: Uuid,
        store: Arc<S>,
        transformer: Arc<T>,
        agent: Arc<C>,
        epic_store: Arc<E>,
        audit: Arc<A>,
        config: &Config,
    ) -> Self {
        let cache = Arc::new(PromptCache::new());
        let engine = OptimisticEngine::new(cache.clone());

        let generation = Arc::new(GenerationOrchestrator::new(
            store.clone(),
            transformer,
            engine.clone(),
            config.generation.clone(),
        ));
        let prompts = PromptService::new(store.clone(), engine.clone(), generation, workspace_id);
        let dispatcher =
            AgentDispatcher::new(store.clone(), agent, engine, config.cursor.clone());
        let workflow = WorkflowEngine::new(
            store.clone(),
            epic_store.clone(),
            audit.clone(),
            config.automation.clone(),
            workspace_id,
        );

        Self {
            workspace_id,
            cache,
            store,
            epic_store,
            audit,
            prompts,
            dispatcher,
            workflow,
            queue_capacity: config.events.queue_capacity,
            subscription: None,
        }
    }

    /// Subscribe to the change feed and load the initial collection.
    pub async fn start(&mut self) -> DomainResult<PromptSnapshot> {
        if self.subscription.is_none() {
            let manager = SubscriptionManager::new(
                self.cache.clone(),
                self.workspace_id,
                SubscriptionConfig {
                    queue_capacity: self.queue_capacity,
                },
            );
            self.subscription = Some(manager.run(self.store.subscribe()));
            info!(workspace = %self.workspace_id, "change feed subscribed");
        }
        self.prompts.refresh().await
    }

    /// Drain in-flight generation, stop the change-feed pump, and drop the
    /// session.
    pub async fn shutdown(mut self) {
        self.prompts.quiesce().await;
        if let Some(handle) = self.subscription.take() {
            handle.stop().await;
        }
    }

    pub const fn workspace_id(&self) -> Uuid {
        self.workspace_id
    }

    pub fn cache(&self) -> &Arc<PromptCache> {
        &self.cache
    }

    pub fn prompts(&self) -> &PromptService<S, T> {
        &self.prompts
    }

    pub fn dispatcher(&self) -> &AgentDispatcher<S, C> {
        &self.dispatcher
    }

    pub fn workflow(&self) -> &WorkflowEngine<S, E, A> {
        &self.workflow
    }

    /// Poll the agent service for unfinished runs and fold the reports in.
    ///
    /// Every prompt a report moved gets a follow-up `task_automation` run,
    /// which audits the change and picks up any further transition the new
    /// linked state implies. Automation failures are logged, not fatal; the
    /// row itself is already written.
    pub async fn sync_agents(&self) -> DomainResult<usize> {
        let snapshot = self.cache.snapshot();
        let moved = self.dispatcher.poll_active(&snapshot).await?;
        for id in &moved {
            if let Err(err) = self
                .workflow
                .run(AutomationAction::TaskAutomation { prompt_id: *id })
                .await
            {
                warn!(id = %id, error = %err, "follow-up automation failed");
            }
        }
        Ok(moved.len())
    }

    /// Create an epic in this workspace.
    pub async fn create_epic(
        &self,
        name: &str,
        description: Option<&str>,
    ) -> DomainResult<Epic> {
        let mut epic = Epic::new(self.workspace_id, name);
        if let Some(description) = description {
            epic = epic.with_description(description);
        }
        epic.validate()?;
        self.epic_store.insert(&epic).await?;
        info!(id = %epic.id, name = %epic.name, "epic created");
        Ok(epic)
    }

    /// List epics in this workspace.
    pub async fn list_epics(&self) -> DomainResult<Vec<Epic>> {
        self.epic_store.list(self.workspace_id).await
    }

    /// Most recent automation activity, newest first.
    pub async fn recent_activity(&self, limit: i64) -> DomainResult<Vec<ActivityRecord>> {
        self.audit.list_recent(self.workspace_id, limit).await
    }
}
