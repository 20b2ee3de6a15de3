//! SQLite-backed epic store.

use async_trait::async_trait;
use sqlx::SqlitePool;
use uuid::Uuid;

use super::{parse_datetime, parse_optional_uuid, parse_uuid};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{Epic, EpicStatus};
use crate::domain::ports::EpicStore;

#[derive(Clone)]
pub struct SqliteEpicStore {
    pool: SqlitePool,
}

impl SqliteEpicStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EpicStore for SqliteEpicStore {
    async fn insert(&self, epic: &Epic) -> DomainResult<()> {
        sqlx::query(
            r#"INSERT INTO epics (id, workspace_id, product_id, name, description, color, status, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(epic.id.to_string())
        .bind(epic.workspace_id.to_string())
        .bind(epic.product_id.map(|id| id.to_string()))
        .bind(&epic.name)
        .bind(&epic.description)
        .bind(&epic.color)
        .bind(epic.status.as_str())
        .bind(epic.created_at.to_rfc3339())
        .bind(epic.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get(&self, id: Uuid) -> DomainResult<Option<Epic>> {
        let row: Option<EpicRow> = sqlx::query_as("SELECT * FROM epics WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn list(&self, workspace_id: Uuid) -> DomainResult<Vec<Epic>> {
        let rows: Vec<EpicRow> =
            sqlx::query_as("SELECT * FROM epics WHERE workspace_id = ? ORDER BY created_at DESC")
                .bind(workspace_id.to_string())
                .fetch_all(&self.pool)
                .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn update(&self, epic: &Epic) -> DomainResult<()> {
        let result = sqlx::query(
            r#"UPDATE epics SET name = ?, description = ?, color = ?, status = ?, updated_at = ?
               WHERE id = ?"#,
        )
        .bind(&epic.name)
        .bind(&epic.description)
        .bind(&epic.color)
        .bind(epic.status.as_str())
        .bind(epic.updated_at.to_rfc3339())
        .bind(epic.id.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DomainError::EpicNotFound(epic.id));
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> DomainResult<()> {
        let result = sqlx::query("DELETE FROM epics WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DomainError::EpicNotFound(id));
        }
        Ok(())
    }
}

#[derive(sqlx::FromRow)]
struct EpicRow {
    id: String,
    workspace_id: String,
    product_id: Option<String>,
    name: String,
    description: Option<String>,
    color: String,
    status: String,
    created_at: String,
    updated_at: String,
}

impl TryFrom<EpicRow> for Epic {
    type Error = DomainError;

    fn try_from(row: EpicRow) -> Result<Self, Self::Error> {
        let status = EpicStatus::from_str(&row.status).ok_or_else(|| {
            DomainError::SerializationError(format!("unknown epic status: {}", row.status))
        })?;

        Ok(Epic {
            id: parse_uuid(&row.id)?,
            workspace_id: parse_uuid(&row.workspace_id)?,
            product_id: parse_optional_uuid(row.product_id)?,
            name: row.name,
            description: row.description,
            color: row.color,
            status,
            created_at: parse_datetime(&row.created_at)?,
            updated_at: parse_datetime(&row.updated_at)?,
        })
    }
}
