//! SQLite-backed audit trail store.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use super::{parse_datetime, parse_optional_uuid, parse_uuid};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{ActivityEntity, ActivityRecord, WorkflowAgent};
use crate::domain::ports::AuditStore;

#[derive(Clone)]
pub struct SqliteAuditStore {
    pool: SqlitePool,
}

impl SqliteAuditStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditStore for SqliteAuditStore {
    async fn append(&self, record: &ActivityRecord) -> DomainResult<()> {
        sqlx::query(
            r#"INSERT INTO activity_log (
                id, workspace_id, agent_id, entity_type, entity_id, action,
                details, before_state, after_state, success,
                processing_time_ms, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(record.id.to_string())
        .bind(record.workspace_id.to_string())
        .bind(record.agent_id.to_string())
        .bind(record.entity_type.as_str())
        .bind(record.entity_id.map(|id| id.to_string()))
        .bind(&record.action)
        .bind(&record.details)
        .bind(record.before_state.as_ref().map(ToString::to_string))
        .bind(record.after_state.as_ref().map(ToString::to_string))
        .bind(record.success)
        .bind(record.processing_time_ms)
        .bind(record.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_recent(
        &self,
        workspace_id: Uuid,
        limit: i64,
    ) -> DomainResult<Vec<ActivityRecord>> {
        let rows: Vec<ActivityRow> = sqlx::query_as(
            r#"SELECT * FROM activity_log WHERE workspace_id = ?
               ORDER BY created_at DESC LIMIT ?"#,
        )
        .bind(workspace_id.to_string())
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn find_or_create_agent(&self, workspace_id: Uuid) -> DomainResult<WorkflowAgent> {
        let existing: Option<AgentRow> = sqlx::query_as(
            "SELECT * FROM workflow_agents WHERE workspace_id = ? AND agent_type = ?",
        )
        .bind(workspace_id.to_string())
        .bind(WorkflowAgent::AGENT_TYPE)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(row) = existing {
            return row.try_into();
        }

        let agent = WorkflowAgent::new(workspace_id);
        // A concurrent pass can win the insert; reread on conflict
        let result = sqlx::query(
            r#"INSERT OR IGNORE INTO workflow_agents (
                id, workspace_id, agent_type, display_name, created_at, last_active_at
            ) VALUES (?, ?, ?, ?, ?, ?)"#,
        )
        .bind(agent.id.to_string())
        .bind(agent.workspace_id.to_string())
        .bind(&agent.agent_type)
        .bind(&agent.display_name)
        .bind(agent.created_at.to_rfc3339())
        .bind(agent.last_active_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() > 0 {
            return Ok(agent);
        }

        let row: AgentRow = sqlx::query_as(
            "SELECT * FROM workflow_agents WHERE workspace_id = ? AND agent_type = ?",
        )
        .bind(workspace_id.to_string())
        .bind(WorkflowAgent::AGENT_TYPE)
        .fetch_one(&self.pool)
        .await?;
        row.try_into()
    }

    async fn touch_agent(&self, agent_id: Uuid) -> DomainResult<()> {
        sqlx::query("UPDATE workflow_agents SET last_active_at = ? WHERE id = ?")
            .bind(Utc::now().to_rfc3339())
            .bind(agent_id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[derive(sqlx::FromRow)]
struct ActivityRow {
    id: String,
    workspace_id: String,
    agent_id: String,
    entity_type: String,
    entity_id: Option<String>,
    action: String,
    details: Option<String>,
    before_state: Option<String>,
    after_state: Option<String>,
    success: bool,
    processing_time_ms: i64,
    created_at: String,
}

impl TryFrom<ActivityRow> for ActivityRecord {
    type Error = DomainError;

    fn try_from(row: ActivityRow) -> Result<Self, Self::Error> {
        let entity_type = ActivityEntity::from_str(&row.entity_type).ok_or_else(|| {
            DomainError::SerializationError(format!("Invalid entity type: {}", row.entity_type))
        })?;

        let before_state = row
            .before_state
            .map(|s| serde_json::from_str(&s))
            .transpose()?;
        let after_state = row
            .after_state
            .map(|s| serde_json::from_str(&s))
            .transpose()?;

        Ok(ActivityRecord {
            id: parse_uuid(&row.id)?,
            workspace_id: parse_uuid(&row.workspace_id)?,
            agent_id: parse_uuid(&row.agent_id)?,
            entity_type,
            entity_id: parse_optional_uuid(row.entity_id)?,
            action: row.action,
            details: row.details,
            before_state,
            after_state,
            success: row.success,
            processing_time_ms: row.processing_time_ms,
            created_at: parse_datetime(&row.created_at)?,
        })
    }
}

#[derive(sqlx::FromRow)]
struct AgentRow {
    id: String,
    workspace_id: String,
    agent_type: String,
    display_name: String,
    created_at: String,
    last_active_at: String,
}

impl TryFrom<AgentRow> for WorkflowAgent {
    type Error = DomainError;

    fn try_from(row: AgentRow) -> Result<Self, Self::Error> {
        Ok(WorkflowAgent {
            id: parse_uuid(&row.id)?,
            workspace_id: parse_uuid(&row.workspace_id)?,
            agent_type: row.agent_type,
            display_name: row.display_name,
            created_at: parse_datetime(&row.created_at)?,
            last_active_at: parse_datetime(&row.last_active_at)?,
        })
    }
}
