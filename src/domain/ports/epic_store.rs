//! Epic store port.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::models::Epic;

/// Repository interface for epic persistence.
#[async_trait]
pub trait EpicStore: Send + Sync {
    /// Insert a new epic.
    async fn insert(&self, epic: &Epic) -> DomainResult<()>;

    /// Get an epic by id.
    async fn get(&self, id: Uuid) -> DomainResult<Option<Epic>>;

    /// List epics for a workspace, newest first.
    async fn list(&self, workspace_id: Uuid) -> DomainResult<Vec<Epic>>;

    /// Update an existing epic.
    async fn update(&self, epic: &Epic) -> DomainResult<()>;

    /// Delete an epic by id.
    async fn delete(&self, id: Uuid) -> DomainResult<()>;
}
