//! Change-feed events emitted by the store.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::models::prompt::Prompt;

/// One row-level change observed on the prompt collection.
///
/// Events arrive in commit order per row. `Inserted` and `Updated` carry the
/// full row as the store saw it at commit time, which can lag behind writes
/// this process has already applied locally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChangeEvent {
    Inserted { row: Prompt },
    Updated { row: Prompt },
    Deleted { id: Uuid },
}

impl ChangeEvent {
    /// The persisted row id this event is about.
    pub fn row_id(&self) -> Uuid {
        match self {
            Self::Inserted { row } | Self::Updated { row } => row.id.as_uuid(),
            Self::Deleted { id } => *id,
        }
    }

    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Inserted { .. } => "inserted",
            Self::Updated { .. } => "updated",
            Self::Deleted { .. } => "deleted",
        }
    }
}
