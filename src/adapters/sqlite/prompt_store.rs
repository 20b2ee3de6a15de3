//! SQLite-backed prompt store.
//!
//! Every committed write is echoed on the broadcast change feed, so the
//! process's own writes reach subscribers through the same path as writes
//! made by anyone else sharing the database.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use std::str::FromStr;
use tokio::sync::broadcast;
use uuid::Uuid;

use super::{parse_datetime, parse_json_or_default, parse_optional_datetime, parse_optional_uuid, parse_uuid};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    AgentRunStatus, ChangeEvent, GenerationPhase, PrStatus, Prompt, PromptId, PromptPriority,
    PromptStatus,
};
use crate::domain::ports::{NewPrompt, PromptFilter, PromptPatch, PromptStore};

const FEED_CAPACITY: usize = 256;

#[derive(Clone)]
pub struct SqlitePromptStore {
    pool: SqlitePool,
    events: broadcast::Sender<ChangeEvent>,
}

impl SqlitePromptStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self::with_feed_capacity(pool, FEED_CAPACITY)
    }

    pub fn with_feed_capacity(pool: SqlitePool, capacity: usize) -> Self {
        let (events, _) = broadcast::channel(capacity);
        Self { pool, events }
    }

    fn emit(&self, event: ChangeEvent) {
        // Ignore send errors - may have no subscribers
        let _ = self.events.send(event);
    }

    async fn fetch(&self, id: Uuid) -> DomainResult<Option<Prompt>> {
        let row: Option<PromptRow> = sqlx::query_as("SELECT * FROM prompts WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn write_row(&self, prompt: &Prompt) -> DomainResult<()> {
        let result = sqlx::query(
            r#"UPDATE prompts SET
                product_id = ?, epic_id = ?, title = ?, description = ?,
                status = ?, priority = ?, order_index = ?,
                generated_prompt = ?, generated_at = ?, generation_phase = ?,
                is_debug_session = ?, cursor_agent_id = ?, cursor_agent_status = ?,
                cursor_branch_name = ?, github_pr_url = ?, github_pr_number = ?,
                github_pr_status = ?, cursor_logs = ?, workflow_metadata = ?,
                updated_at = ?
               WHERE id = ?"#,
        )
        .bind(prompt.product_id.map(|id| id.to_string()))
        .bind(prompt.epic_id.map(|id| id.to_string()))
        .bind(&prompt.title)
        .bind(&prompt.description)
        .bind(prompt.status.as_str())
        .bind(i64::from(u8::from(prompt.priority)))
        .bind(prompt.order_index)
        .bind(&prompt.generated_prompt)
        .bind(prompt.generated_at.map(|t| t.to_rfc3339()))
        .bind(prompt.generation_phase.as_str())
        .bind(prompt.is_debug_session)
        .bind(&prompt.cursor_agent_id)
        .bind(prompt.cursor_agent_status.map(|s| s.to_string()))
        .bind(&prompt.cursor_branch_name)
        .bind(&prompt.github_pr_url)
        .bind(prompt.github_pr_number)
        .bind(prompt.github_pr_status.map(|s| s.to_string()))
        .bind(prompt.cursor_logs.to_string())
        .bind(prompt.workflow_metadata.to_string())
        .bind(prompt.updated_at.to_rfc3339())
        .bind(prompt.id.as_uuid().to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DomainError::PromptNotFound(prompt.id.as_uuid()));
        }
        Ok(())
    }
}

#[async_trait]
impl PromptStore for SqlitePromptStore {
    async fn insert(&self, new_prompt: NewPrompt) -> DomainResult<Prompt> {
        let mut prompt = new_prompt.draft_row();
        prompt.id = PromptId::persisted(Uuid::new_v4());
        let now = Utc::now();
        prompt.created_at = now;
        prompt.updated_at = now;

        sqlx::query(
            r#"INSERT INTO prompts (
                id, workspace_id, product_id, epic_id, title, description,
                status, priority, order_index, generated_prompt, generated_at,
                generation_phase, is_debug_session, cursor_agent_id,
                cursor_agent_status, cursor_branch_name, github_pr_url,
                github_pr_number, github_pr_status, cursor_logs,
                workflow_metadata, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(prompt.id.as_uuid().to_string())
        .bind(prompt.workspace_id.to_string())
        .bind(prompt.product_id.map(|id| id.to_string()))
        .bind(prompt.epic_id.map(|id| id.to_string()))
        .bind(&prompt.title)
        .bind(&prompt.description)
        .bind(prompt.status.as_str())
        .bind(i64::from(u8::from(prompt.priority)))
        .bind(prompt.order_index)
        .bind(&prompt.generated_prompt)
        .bind(prompt.generated_at.map(|t| t.to_rfc3339()))
        .bind(prompt.generation_phase.as_str())
        .bind(prompt.is_debug_session)
        .bind(&prompt.cursor_agent_id)
        .bind(prompt.cursor_agent_status.map(|s| s.to_string()))
        .bind(&prompt.cursor_branch_name)
        .bind(&prompt.github_pr_url)
        .bind(prompt.github_pr_number)
        .bind(prompt.github_pr_status.map(|s| s.to_string()))
        .bind(prompt.cursor_logs.to_string())
        .bind(prompt.workflow_metadata.to_string())
        .bind(prompt.created_at.to_rfc3339())
        .bind(prompt.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        self.emit(ChangeEvent::Inserted {
            row: prompt.clone(),
        });
        Ok(prompt)
    }

    async fn get(&self, id: Uuid) -> DomainResult<Option<Prompt>> {
        self.fetch(id).await
    }

    async fn get_by_agent(&self, cursor_agent_id: &str) -> DomainResult<Option<Prompt>> {
        let row: Option<PromptRow> =
            sqlx::query_as("SELECT * FROM prompts WHERE cursor_agent_id = ?")
                .bind(cursor_agent_id)
                .fetch_optional(&self.pool)
                .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn list(&self, filter: PromptFilter) -> DomainResult<Vec<Prompt>> {
        let mut query = String::from("SELECT * FROM prompts WHERE 1=1");
        let mut bindings: Vec<String> = Vec::new();

        if let Some(workspace_id) = &filter.workspace_id {
            query.push_str(" AND workspace_id = ?");
            bindings.push(workspace_id.to_string());
        }
        if let Some(status) = &filter.status {
            query.push_str(" AND status = ?");
            bindings.push(status.as_str().to_string());
        }
        if let Some(epic_id) = &filter.epic_id {
            query.push_str(" AND epic_id = ?");
            bindings.push(epic_id.to_string());
        }
        if let Some(product_id) = &filter.product_id {
            query.push_str(" AND product_id = ?");
            bindings.push(product_id.to_string());
        }
        if let Some(updated_after) = &filter.updated_after {
            query.push_str(" AND updated_at > ?");
            bindings.push(updated_after.to_rfc3339());
        }
        if filter.exclude_debug {
            query.push_str(" AND is_debug_session = 0");
        }

        query.push_str(" ORDER BY order_index ASC, created_at DESC");
        if let Some(limit) = filter.limit {
            query.push_str(" LIMIT ?");
            bindings.push(limit.to_string());
        }

        let mut q = sqlx::query_as::<_, PromptRow>(&query);
        for binding in &bindings {
            q = q.bind(binding);
        }

        let rows: Vec<PromptRow> = q.fetch_all(&self.pool).await?;
        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn update(&self, id: Uuid, patch: PromptPatch) -> DomainResult<Prompt> {
        let mut prompt = self
            .fetch(id)
            .await?
            .ok_or(DomainError::PromptNotFound(id))?;
        patch.apply_to(&mut prompt);
        self.write_row(&prompt).await?;

        self.emit(ChangeEvent::Updated {
            row: prompt.clone(),
        });
        Ok(prompt)
    }

    async fn assign_epic(&self, id: Uuid, epic_id: Option<Uuid>) -> DomainResult<Prompt> {
        let mut prompt = self
            .fetch(id)
            .await?
            .ok_or(DomainError::PromptNotFound(id))?;
        prompt.epic_id = epic_id;
        prompt.touch();
        self.write_row(&prompt).await?;

        self.emit(ChangeEvent::Updated {
            row: prompt.clone(),
        });
        Ok(prompt)
    }

    async fn delete(&self, id: Uuid) -> DomainResult<()> {
        let result = sqlx::query("DELETE FROM prompts WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DomainError::PromptNotFound(id));
        }

        self.emit(ChangeEvent::Deleted { id });
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.events.subscribe()
    }
}

#[derive(sqlx::FromRow)]
struct PromptRow {
    id: String,
    workspace_id: String,
    product_id: Option<String>,
    epic_id: Option<String>,
    title: String,
    description: Option<String>,
    status: String,
    priority: i64,
    order_index: i32,
    generated_prompt: Option<String>,
    generated_at: Option<String>,
    generation_phase: String,
    is_debug_session: bool,
    cursor_agent_id: Option<String>,
    cursor_agent_status: Option<String>,
    cursor_branch_name: Option<String>,
    github_pr_url: Option<String>,
    github_pr_number: Option<i64>,
    github_pr_status: Option<String>,
    cursor_logs: Option<String>,
    workflow_metadata: Option<String>,
    created_at: String,
    updated_at: String,
}

impl TryFrom<PromptRow> for Prompt {
    type Error = DomainError;

    fn try_from(row: PromptRow) -> Result<Self, Self::Error> {
        let id = PromptId::persisted(parse_uuid(&row.id)?);
        let workspace_id = parse_uuid(&row.workspace_id)?;
        let product_id = parse_optional_uuid(row.product_id)?;
        let epic_id = parse_optional_uuid(row.epic_id)?;

        let status = PromptStatus::from_str(&row.status).ok_or_else(|| {
            DomainError::SerializationError(format!("Invalid status: {}", row.status))
        })?;
        let priority = u8::try_from(row.priority)
            .ok()
            .and_then(|p| PromptPriority::try_from(p).ok())
            .ok_or_else(|| {
                DomainError::SerializationError(format!("Invalid priority: {}", row.priority))
            })?;
        let generation_phase = GenerationPhase::from_str(&row.generation_phase).ok_or_else(|| {
            DomainError::SerializationError(format!(
                "Invalid generation phase: {}",
                row.generation_phase
            ))
        })?;

        let cursor_agent_status = row
            .cursor_agent_status
            .map(|s| AgentRunStatus::from_str(&s))
            .transpose()
            .map_err(|e| DomainError::SerializationError(e.to_string()))?;
        let github_pr_status = row
            .github_pr_status
            .map(|s| PrStatus::from_str(&s))
            .transpose()
            .map_err(|e| DomainError::SerializationError(e.to_string()))?;

        Ok(Prompt {
            id,
            workspace_id,
            product_id,
            epic_id,
            title: row.title,
            description: row.description,
            status,
            priority,
            order_index: row.order_index,
            generated_prompt: row.generated_prompt,
            generated_at: parse_optional_datetime(row.generated_at)?,
            generation_phase,
            is_debug_session: row.is_debug_session,
            cursor_agent_id: row.cursor_agent_id,
            cursor_agent_status,
            cursor_branch_name: row.cursor_branch_name,
            github_pr_url: row.github_pr_url,
            github_pr_number: row.github_pr_number,
            github_pr_status,
            cursor_logs: parse_json_or_default(row.cursor_logs)?,
            workflow_metadata: parse_json_or_default(row.workflow_metadata)?,
            created_at: parse_datetime(&row.created_at)?,
            updated_at: parse_datetime(&row.updated_at)?,
        })
    }
}
