//! Epic domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Default display color for new epics.
pub const DEFAULT_EPIC_COLOR: &str = "#6366f1";

/// Epic completion status, recomputed from the linked prompts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EpicStatus {
    Todo,
    InProgress,
    Done,
}

impl EpicStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Todo => "todo",
            Self::InProgress => "in_progress",
            Self::Done => "done",
        }
    }

    /// Parse from the stored string form.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "todo" => Some(Self::Todo),
            "in_progress" => Some(Self::InProgress),
            "done" => Some(Self::Done),
            _ => None,
        }
    }
}

impl fmt::Display for EpicStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A thematic grouping of prompts within a workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Epic {
    /// Unique identifier
    pub id: Uuid,
    /// Owning workspace
    pub workspace_id: Uuid,
    /// Optional owning product
    pub product_id: Option<Uuid>,
    /// Short name, e.g. "Billing"
    pub name: String,
    /// Optional longer description
    pub description: Option<String>,
    /// Display color hint for clients
    pub color: String,
    /// Completion status derived from linked prompts
    pub status: EpicStatus,
    /// When created
    pub created_at: DateTime<Utc>,
    /// When last updated
    pub updated_at: DateTime<Utc>,
}

impl Epic {
    /// Create a new epic.
    pub fn new(workspace_id: Uuid, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            workspace_id,
            product_id: None,
            name: name.into(),
            description: None,
            color: DEFAULT_EPIC_COLOR.to_string(),
            status: EpicStatus::Todo,
            created_at: now,
            updated_at: now,
        }
    }

    /// Set description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the display color.
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }

    /// Set the owning product.
    pub fn with_product(mut self, product_id: Uuid) -> Self {
        self.product_id = Some(product_id);
        self
    }

    /// Combined searchable text (name + description).
    pub fn combined_text(&self) -> String {
        match &self.description {
            Some(desc) => format!("{} {desc}", self.name),
            None => self.name.clone(),
        }
    }

    /// Validate the epic.
    pub fn validate(&self) -> crate::domain::DomainResult<()> {
        if self.name.trim().is_empty() {
            return Err(crate::domain::DomainError::ValidationFailed(
                "epic name cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}
