//! Activity log model for automation auditing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of entity an activity record refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityEntity {
    Prompt,
    Epic,
    Workspace,
}

impl ActivityEntity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Prompt => "prompt",
            Self::Epic => "epic",
            Self::Workspace => "workspace",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "prompt" => Some(Self::Prompt),
            "epic" => Some(Self::Epic),
            "workspace" => Some(Self::Workspace),
            _ => None,
        }
    }
}

/// One audited automation action.
///
/// Every automation action appends exactly one record, success or failure,
/// so the log is a complete trail of machine writes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityRecord {
    /// Unique identifier
    pub id: Uuid,
    /// Workspace the action happened in
    pub workspace_id: Uuid,
    /// Automation agent that performed the action
    pub agent_id: Uuid,
    /// Entity kind acted on
    pub entity_type: ActivityEntity,
    /// Entity id acted on, when the action targets a single row
    pub entity_id: Option<Uuid>,
    /// Action discriminator, e.g. `auto_status_update`
    pub action: String,
    /// Human-readable outcome summary
    pub details: Option<String>,
    /// Snapshot of the relevant fields before the write
    pub before_state: Option<serde_json::Value>,
    /// Snapshot of the relevant fields after the write
    pub after_state: Option<serde_json::Value>,
    /// Whether the action succeeded
    pub success: bool,
    /// Wall-clock processing time
    pub processing_time_ms: i64,
    /// When recorded
    pub created_at: DateTime<Utc>,
}

impl ActivityRecord {
    /// Start a record for an action against a workspace-level concern.
    pub fn new(workspace_id: Uuid, agent_id: Uuid, action: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            workspace_id,
            agent_id,
            entity_type: ActivityEntity::Workspace,
            entity_id: None,
            action: action.into(),
            details: None,
            before_state: None,
            after_state: None,
            success: true,
            processing_time_ms: 0,
            created_at: Utc::now(),
        }
    }

    /// Point the record at a specific entity.
    pub fn with_entity(mut self, entity_type: ActivityEntity, entity_id: Uuid) -> Self {
        self.entity_type = entity_type;
        self.entity_id = Some(entity_id);
        self
    }

    /// Attach before/after field snapshots.
    pub fn with_states(
        mut self,
        before: Option<serde_json::Value>,
        after: Option<serde_json::Value>,
    ) -> Self {
        self.before_state = before;
        self.after_state = after;
        self
    }

    /// Attach a human-readable summary.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Mark the outcome and processing time.
    pub fn finished(mut self, success: bool, processing_time_ms: i64) -> Self {
        self.success = success;
        self.processing_time_ms = processing_time_ms;
        self
    }
}
