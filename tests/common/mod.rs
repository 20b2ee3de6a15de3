//! Common test utilities for integration tests
//!
//! In-memory implementations of the store and remote-service ports, with
//! failure injection for exercising rollback paths.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::broadcast;
use uuid::Uuid;

use promptdeck::domain::errors::{DomainError, DomainResult, StoreError};
use promptdeck::domain::models::{
    AgentReport, AgentRunStatus, ChangeEvent, Config, Prompt, PromptId,
};
use promptdeck::domain::ports::{
    AgentLaunch, CursorAgent, LaunchRequest, NewPrompt, PromptFilter, PromptPatch, PromptStore,
    PromptTransformer, TransformRequest,
};

/// In-memory [`PromptStore`] with a change feed and one-shot failure
/// injection, mirroring the contract of the SQLite adapter.
pub struct InMemoryStore {
    rows: Mutex<HashMap<Uuid, Prompt>>,
    feed: broadcast::Sender<ChangeEvent>,
    pub fail_next_insert: AtomicBool,
    pub fail_next_update: AtomicBool,
    pub fail_next_delete: AtomicBool,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        let (feed, _) = broadcast::channel(64);
        Self {
            rows: Mutex::new(HashMap::new()),
            feed,
            fail_next_insert: AtomicBool::new(false),
            fail_next_update: AtomicBool::new(false),
            fail_next_delete: AtomicBool::new(false),
        }
    }

    /// Insert a row directly, without an event. For seeding initial state.
    pub fn seed(&self, row: Prompt) {
        self.rows.lock().unwrap().insert(row.id.as_uuid(), row);
    }

    /// Apply and emit an event as if another client had written to the store.
    pub fn emit(&self, event: ChangeEvent) {
        match &event {
            ChangeEvent::Inserted { row } | ChangeEvent::Updated { row } => {
                self.rows
                    .lock()
                    .unwrap()
                    .insert(row.id.as_uuid(), row.clone());
            }
            ChangeEvent::Deleted { id } => {
                self.rows.lock().unwrap().remove(id);
            }
        }
        let _ = self.feed.send(event);
    }

    /// Snapshot of every stored row, unordered.
    pub fn all_rows(&self) -> Vec<Prompt> {
        self.rows.lock().unwrap().values().cloned().collect()
    }

    pub fn row(&self, id: Uuid) -> Option<Prompt> {
        self.rows.lock().unwrap().get(&id).cloned()
    }

    fn injected(flag: &AtomicBool, op: &str) -> DomainResult<()> {
        if flag.swap(false, Ordering::SeqCst) {
            return Err(StoreError::Backend(format!("injected {op} failure")).into());
        }
        Ok(())
    }
}

#[async_trait]
impl PromptStore for InMemoryStore {
    async fn insert(&self, new_prompt: NewPrompt) -> DomainResult<Prompt> {
        Self::injected(&self.fail_next_insert, "insert")?;
        let mut row = new_prompt.draft_row();
        row.id = PromptId::persisted(Uuid::new_v4());
        self.rows
            .lock()
            .unwrap()
            .insert(row.id.as_uuid(), row.clone());
        let _ = self.feed.send(ChangeEvent::Inserted { row: row.clone() });
        Ok(row)
    }

    async fn get(&self, id: Uuid) -> DomainResult<Option<Prompt>> {
        Ok(self.rows.lock().unwrap().get(&id).cloned())
    }

    async fn get_by_agent(&self, cursor_agent_id: &str) -> DomainResult<Option<Prompt>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .values()
            .find(|p| p.cursor_agent_id.as_deref() == Some(cursor_agent_id))
            .cloned())
    }

    async fn list(&self, filter: PromptFilter) -> DomainResult<Vec<Prompt>> {
        let mut rows: Vec<Prompt> = self
            .rows
            .lock()
            .unwrap()
            .values()
            .filter(|p| filter.workspace_id.map_or(true, |w| p.workspace_id == w))
            .filter(|p| filter.status.map_or(true, |s| p.status == s))
            .filter(|p| filter.epic_id.map_or(true, |e| p.epic_id == Some(e)))
            .filter(|p| filter.updated_after.map_or(true, |t| p.updated_at > t))
            .filter(|p| !filter.exclude_debug || !p.is_debug_session)
            .cloned()
            .collect();
        rows.sort_by(|a, b| {
            a.order_index
                .cmp(&b.order_index)
                .then(b.created_at.cmp(&a.created_at))
        });
        if let Some(limit) = filter.limit {
            rows.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        }
        Ok(rows)
    }

    async fn update(&self, id: Uuid, patch: PromptPatch) -> DomainResult<Prompt> {
        Self::injected(&self.fail_next_update, "update")?;
        let row = {
            let mut rows = self.rows.lock().unwrap();
            let row = rows.get_mut(&id).ok_or(StoreError::NotFound {
                entity: "prompt",
                id,
            })?;
            patch.apply_to(row);
            row.clone()
        };
        let _ = self.feed.send(ChangeEvent::Updated { row: row.clone() });
        Ok(row)
    }

    async fn assign_epic(&self, id: Uuid, epic_id: Option<Uuid>) -> DomainResult<Prompt> {
        Self::injected(&self.fail_next_update, "assign_epic")?;
        let row = {
            let mut rows = self.rows.lock().unwrap();
            let row = rows.get_mut(&id).ok_or(StoreError::NotFound {
                entity: "prompt",
                id,
            })?;
            row.epic_id = epic_id;
            row.touch();
            row.clone()
        };
        let _ = self.feed.send(ChangeEvent::Updated { row: row.clone() });
        Ok(row)
    }

    async fn delete(&self, id: Uuid) -> DomainResult<()> {
        Self::injected(&self.fail_next_delete, "delete")?;
        if self.rows.lock().unwrap().remove(&id).is_none() {
            return Err(StoreError::NotFound {
                entity: "prompt",
                id,
            }
            .into());
        }
        let _ = self.feed.send(ChangeEvent::Deleted { id });
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.feed.subscribe()
    }
}

enum TransformMode {
    Ok(String),
    Err(String),
}

/// Scripted [`PromptTransformer`].
pub struct MockTransformer {
    mode: TransformMode,
    queued: Mutex<VecDeque<TransformMode>>,
    delay: Option<Duration>,
    pub calls: AtomicUsize,
}

impl MockTransformer {
    /// Always respond with `text`.
    pub fn returning(text: &str) -> Self {
        Self {
            mode: TransformMode::Ok(text.to_string()),
            queued: Mutex::new(VecDeque::new()),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Always fail with `message`.
    pub fn failing(message: &str) -> Self {
        Self {
            mode: TransformMode::Err(message.to_string()),
            queued: Mutex::new(VecDeque::new()),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Always respond with an empty string.
    pub fn blank() -> Self {
        Self::returning("")
    }

    /// Sleep before responding. For exercising caller-side timeouts.
    pub fn slow(delay: Duration, text: &str) -> Self {
        let mut mock = Self::returning(text);
        mock.delay = Some(delay);
        mock
    }

    /// Queue a one-off response consumed before the standing mode.
    pub fn queue_ok(&self, text: &str) {
        self.queued
            .lock()
            .unwrap()
            .push_back(TransformMode::Ok(text.to_string()));
    }

    pub fn queue_err(&self, message: &str) {
        self.queued
            .lock()
            .unwrap()
            .push_back(TransformMode::Err(message.to_string()));
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PromptTransformer for MockTransformer {
    async fn transform(&self, _request: TransformRequest) -> DomainResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let queued = self.queued.lock().unwrap().pop_front();
        let mode = queued.as_ref().unwrap_or(&self.mode);
        match mode {
            TransformMode::Ok(text) => Ok(text.clone()),
            TransformMode::Err(message) => Err(DomainError::TransformFailed(message.clone())),
        }
    }
}

/// Scripted [`CursorAgent`] that records launches and cancels.
pub struct MockCursor {
    pub launches: Mutex<Vec<LaunchRequest>>,
    pub cancels: Mutex<Vec<String>>,
    reports: Mutex<HashMap<String, AgentReport>>,
    pub fail_launch: AtomicBool,
    counter: AtomicUsize,
}

impl Default for MockCursor {
    fn default() -> Self {
        Self::new()
    }
}

impl MockCursor {
    pub fn new() -> Self {
        Self {
            launches: Mutex::new(Vec::new()),
            cancels: Mutex::new(Vec::new()),
            reports: Mutex::new(HashMap::new()),
            fail_launch: AtomicBool::new(false),
            counter: AtomicUsize::new(0),
        }
    }

    /// Script the report returned by `status` for one agent.
    pub fn set_report(&self, report: AgentReport) {
        self.reports
            .lock()
            .unwrap()
            .insert(report.cursor_agent_id.clone(), report);
    }

    pub fn launch_count(&self) -> usize {
        self.launches.lock().unwrap().len()
    }

    pub fn cancelled(&self) -> Vec<String> {
        self.cancels.lock().unwrap().clone()
    }
}

#[async_trait]
impl CursorAgent for MockCursor {
    async fn launch(&self, request: LaunchRequest) -> DomainResult<AgentLaunch> {
        if self.fail_launch.swap(false, Ordering::SeqCst) {
            return Err(DomainError::AgentRequestFailed(
                "injected launch failure".to_string(),
            ));
        }
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        self.launches.lock().unwrap().push(request);
        Ok(AgentLaunch {
            agent_id: format!("agent-{n}"),
            status: AgentRunStatus::Creating,
            branch_name: None,
        })
    }

    async fn status(&self, agent_id: &str) -> DomainResult<AgentReport> {
        Ok(self
            .reports
            .lock()
            .unwrap()
            .get(agent_id)
            .cloned()
            .unwrap_or_else(|| AgentReport::new(agent_id, AgentRunStatus::Running)))
    }

    async fn cancel(&self, agent_id: &str) -> DomainResult<()> {
        self.cancels.lock().unwrap().push(agent_id.to_string());
        Ok(())
    }
}

/// A persisted prompt row for seeding stores.
pub fn persisted_prompt(workspace_id: Uuid, title: &str) -> Prompt {
    let mut row = Prompt::new(workspace_id, title);
    row.id = PromptId::persisted(Uuid::new_v4());
    row
}

/// Config with timings tightened for tests.
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.generation.timeout_secs = 2;
    config
}
