//! Prompt store port.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::models::{
    AgentRunStatus, ChangeEvent, GenerationPhase, PrStatus, Prompt, PromptId, PromptPriority,
    PromptStatus,
};

/// Fields for a prompt about to be inserted. The store assigns the real id.
#[derive(Debug, Clone)]
pub struct NewPrompt {
    pub workspace_id: Uuid,
    pub product_id: Option<Uuid>,
    pub epic_id: Option<Uuid>,
    pub title: String,
    pub description: Option<String>,
    pub priority: PromptPriority,
    pub order_index: i32,
    pub is_debug_session: bool,
}

impl NewPrompt {
    pub fn new(workspace_id: Uuid, title: impl Into<String>) -> Self {
        Self {
            workspace_id,
            product_id: None,
            epic_id: None,
            title: title.into(),
            description: None,
            priority: PromptPriority::default(),
            order_index: 0,
            is_debug_session: false,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_epic(mut self, epic_id: Uuid) -> Self {
        self.epic_id = Some(epic_id);
        self
    }

    pub fn with_product(mut self, product_id: Uuid) -> Self {
        self.product_id = Some(product_id);
        self
    }

    pub fn with_priority(mut self, priority: PromptPriority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_order_index(mut self, order_index: i32) -> Self {
        self.order_index = order_index;
        self
    }

    pub fn as_debug_session(mut self) -> Self {
        self.is_debug_session = true;
        self
    }

    /// Build the speculative local row shown while the insert is in flight.
    /// Carries a draft id; the store's confirmed row fully replaces it.
    pub fn draft_row(&self) -> Prompt {
        let now = Utc::now();
        Prompt {
            id: PromptId::draft(),
            workspace_id: self.workspace_id,
            product_id: self.product_id,
            epic_id: self.epic_id,
            title: self.title.clone(),
            description: self.description.clone(),
            status: PromptStatus::Todo,
            priority: self.priority,
            order_index: self.order_index,
            generated_prompt: None,
            generated_at: None,
            generation_phase: GenerationPhase::Idle,
            is_debug_session: self.is_debug_session,
            cursor_agent_id: None,
            cursor_agent_status: None,
            cursor_branch_name: None,
            github_pr_url: None,
            github_pr_number: None,
            github_pr_status: None,
            cursor_logs: serde_json::Value::Object(serde_json::Map::new()),
            workflow_metadata: serde_json::Value::Object(serde_json::Map::new()),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update for a prompt. `Some` fields are written, `None` fields are
/// left untouched. The two `merge_*` fields shallow-merge keys into the
/// existing object instead of replacing it, so the maps accumulate the
/// latest observation per key.
#[derive(Debug, Clone, Default)]
pub struct PromptPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<PromptStatus>,
    pub priority: Option<PromptPriority>,
    pub order_index: Option<i32>,
    pub generated_prompt: Option<String>,
    pub generated_at: Option<DateTime<Utc>>,
    pub generation_phase: Option<GenerationPhase>,
    pub cursor_agent_id: Option<String>,
    pub cursor_agent_status: Option<AgentRunStatus>,
    pub cursor_branch_name: Option<String>,
    pub github_pr_url: Option<String>,
    pub github_pr_number: Option<i64>,
    pub github_pr_status: Option<PrStatus>,
    pub merge_cursor_logs: Option<serde_json::Value>,
    pub merge_workflow_metadata: Option<serde_json::Value>,
}

impl PromptPatch {
    /// Patch that only moves status.
    pub fn status(status: PromptStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    /// Patch that only moves priority.
    pub fn priority(priority: PromptPriority) -> Self {
        Self {
            priority: Some(priority),
            ..Self::default()
        }
    }

    pub fn with_status(mut self, status: PromptStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_generation_phase(mut self, phase: GenerationPhase) -> Self {
        self.generation_phase = Some(phase);
        self
    }

    pub fn with_workflow_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.merge_workflow_metadata = Some(metadata);
        self
    }

    /// True when no field would be written.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.status.is_none()
            && self.priority.is_none()
            && self.order_index.is_none()
            && self.generated_prompt.is_none()
            && self.generated_at.is_none()
            && self.generation_phase.is_none()
            && self.cursor_agent_id.is_none()
            && self.cursor_agent_status.is_none()
            && self.cursor_branch_name.is_none()
            && self.github_pr_url.is_none()
            && self.github_pr_number.is_none()
            && self.github_pr_status.is_none()
            && self.merge_cursor_logs.is_none()
            && self.merge_workflow_metadata.is_none()
    }

    /// Apply this patch to a row in place, bumping `updated_at`.
    ///
    /// This is the one definition of patch semantics. Stores fetch the
    /// current row, apply the patch, and persist the result, so every
    /// backend agrees on what a partial update means.
    pub fn apply_to(&self, prompt: &mut Prompt) {
        if let Some(title) = &self.title {
            prompt.title = title.clone();
        }
        if let Some(description) = &self.description {
            prompt.description = Some(description.clone());
        }
        if let Some(status) = self.status {
            prompt.status = status;
        }
        if let Some(priority) = self.priority {
            prompt.priority = priority;
        }
        if let Some(order_index) = self.order_index {
            prompt.order_index = order_index;
        }
        if let Some(generated) = &self.generated_prompt {
            prompt.generated_prompt = Some(generated.clone());
        }
        if let Some(generated_at) = self.generated_at {
            prompt.generated_at = Some(generated_at);
        }
        if let Some(phase) = self.generation_phase {
            prompt.generation_phase = phase;
        }
        if let Some(agent_id) = &self.cursor_agent_id {
            prompt.cursor_agent_id = Some(agent_id.clone());
        }
        if let Some(agent_status) = self.cursor_agent_status {
            prompt.cursor_agent_status = Some(agent_status);
        }
        if let Some(branch) = &self.cursor_branch_name {
            prompt.cursor_branch_name = Some(branch.clone());
        }
        if let Some(pr_url) = &self.github_pr_url {
            prompt.github_pr_url = Some(pr_url.clone());
        }
        if let Some(pr_number) = self.github_pr_number {
            prompt.github_pr_number = Some(pr_number);
        }
        if let Some(pr_status) = self.github_pr_status {
            prompt.github_pr_status = Some(pr_status);
        }
        if let Some(entry) = &self.merge_cursor_logs {
            merge_object(&mut prompt.cursor_logs, entry);
        }
        if let Some(metadata) = &self.merge_workflow_metadata {
            merge_object(&mut prompt.workflow_metadata, metadata);
        }
        prompt.touch();
    }
}

/// Shallow-merge `incoming`'s keys into `target`. A non-object target is
/// replaced with an empty map first so stale scalar data cannot block writes.
fn merge_object(target: &mut serde_json::Value, incoming: &serde_json::Value) {
    if !target.is_object() {
        *target = serde_json::Value::Object(serde_json::Map::new());
    }
    if let (Some(map), Some(entries)) = (target.as_object_mut(), incoming.as_object()) {
        for (key, value) in entries {
            map.insert(key.clone(), value.clone());
        }
    }
}

/// Filter criteria for listing prompts.
#[derive(Debug, Clone, Default)]
pub struct PromptFilter {
    pub workspace_id: Option<Uuid>,
    pub status: Option<PromptStatus>,
    pub epic_id: Option<Uuid>,
    pub product_id: Option<Uuid>,
    pub updated_after: Option<DateTime<Utc>>,
    pub exclude_debug: bool,
    pub limit: Option<i64>,
}

impl PromptFilter {
    pub fn workspace(workspace_id: Uuid) -> Self {
        Self {
            workspace_id: Some(workspace_id),
            ..Self::default()
        }
    }

    pub fn with_status(mut self, status: PromptStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_epic(mut self, epic_id: Uuid) -> Self {
        self.epic_id = Some(epic_id);
        self
    }

    pub fn updated_after(mut self, after: DateTime<Utc>) -> Self {
        self.updated_after = Some(after);
        self
    }

    pub fn without_debug(mut self) -> Self {
        self.exclude_debug = true;
        self
    }
}

/// Repository interface for prompt persistence.
///
/// Every committed write is also emitted on the change feed, so one process's
/// writes loop back through the same reconciliation path as everyone else's.
#[async_trait]
pub trait PromptStore: Send + Sync {
    /// Insert a new prompt and return the persisted row with its real id.
    async fn insert(&self, new_prompt: NewPrompt) -> DomainResult<Prompt>;

    /// Get a prompt by id.
    async fn get(&self, id: Uuid) -> DomainResult<Option<Prompt>>;

    /// Get the prompt linked to a coding-agent run.
    async fn get_by_agent(&self, cursor_agent_id: &str) -> DomainResult<Option<Prompt>>;

    /// List prompts ordered by `order_index` then newest first.
    async fn list(&self, filter: PromptFilter) -> DomainResult<Vec<Prompt>>;

    /// Apply a partial update and return the updated row.
    async fn update(&self, id: Uuid, patch: PromptPatch) -> DomainResult<Prompt>;

    /// Set or clear the epic assignment.
    async fn assign_epic(&self, id: Uuid, epic_id: Option<Uuid>) -> DomainResult<Prompt>;

    /// Delete a prompt by id.
    async fn delete(&self, id: Uuid) -> DomainResult<()>;

    /// Subscribe to the row-level change feed.
    fn subscribe(&self) -> broadcast::Receiver<ChangeEvent>;
}
