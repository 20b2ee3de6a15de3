//! Audit store port: activity log plus automation agent identity.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::models::{ActivityRecord, WorkflowAgent};

/// Repository interface for the automation audit trail.
#[async_trait]
pub trait AuditStore: Send + Sync {
    /// Append one activity record. Records are immutable once written.
    async fn append(&self, record: &ActivityRecord) -> DomainResult<()>;

    /// List the most recent records for a workspace, newest first.
    async fn list_recent(&self, workspace_id: Uuid, limit: i64) -> DomainResult<Vec<ActivityRecord>>;

    /// Get the workspace's automation agent row, creating it on first use.
    async fn find_or_create_agent(&self, workspace_id: Uuid) -> DomainResult<WorkflowAgent>;

    /// Bump the agent's `last_active_at`.
    async fn touch_agent(&self, agent_id: Uuid) -> DomainResult<()>;
}
