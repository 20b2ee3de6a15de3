//! Domain errors for the promptdeck core.

use thiserror::Error;
use uuid::Uuid;

/// Errors surfaced by the remote store ports.
///
/// Foreign-key and required-field failures are kept as distinct variants so
/// callers can render field-specific hints instead of raw database text.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: Uuid },

    #[error("Invalid reference in '{field}': the referenced row does not exist")]
    ForeignKey { field: String },

    #[error("Missing required field '{field}'")]
    RequiredField { field: String },

    #[error("Store operation failed: {0}")]
    Backend(String),
}

impl StoreError {
    /// Classify a raw backend error message into a hint-carrying variant.
    ///
    /// Recognizes the foreign-key and not-null patterns the store emits for
    /// the fields the prompt collection actually references.
    pub fn classify(message: &str) -> Self {
        let lower = message.to_lowercase();
        if lower.contains("foreign key") {
            for field in ["epic_id", "product_id", "workspace_id"] {
                if lower.contains(field) {
                    return Self::ForeignKey {
                        field: field.to_string(),
                    };
                }
            }
            return Self::ForeignKey {
                field: "unknown".to_string(),
            };
        }
        if lower.contains("not null") || lower.contains("null value") {
            for field in ["title", "workspace_id"] {
                if lower.contains(field) {
                    return Self::RequiredField {
                        field: field.to_string(),
                    };
                }
            }
        }
        Self::Backend(message.to_string())
    }

    /// User-facing hint for recognized failure patterns.
    pub fn hint(&self) -> Option<String> {
        match self {
            Self::ForeignKey { field } => Some(match field.as_str() {
                "epic_id" => "The selected epic no longer exists. Refresh and try again.".into(),
                "product_id" => {
                    "The selected product no longer exists. Refresh and try again.".into()
                }
                "workspace_id" => "The workspace is no longer accessible.".into(),
                _ => format!("A referenced row for '{field}' no longer exists."),
            }),
            Self::RequiredField { field } => Some(format!("'{field}' is required.")),
            _ => None,
        }
    }
}

/// Domain-level errors that can occur in the promptdeck system.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Prompt not found: {0}")]
    PromptNotFound(Uuid),

    #[error("Epic not found: {0}")]
    EpicNotFound(Uuid),

    #[error("No agent run linked to prompt: {0}")]
    AgentNotLinked(String),

    #[error("Invalid state transition from {from} to {to}: {reason}")]
    InvalidStateTransition {
        from: String,
        to: String,
        reason: String,
    },

    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    #[error("Generation in progress for prompt {0}; cancel it before deleting")]
    GenerationInProgress(Uuid),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Transform failed: {0}")]
    TransformFailed(String),

    #[error("Transform timed out after {0}s")]
    TransformTimeout(u64),

    #[error("Agent request failed: {0}")]
    AgentRequestFailed(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

pub type DomainResult<T> = Result<T, DomainError>;

impl From<sqlx::Error> for DomainError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db) => DomainError::Store(StoreError::classify(&db.to_string())),
            _ => DomainError::Store(StoreError::Backend(err.to_string())),
        }
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        DomainError::SerializationError(err.to_string())
    }
}

impl From<reqwest::Error> for DomainError {
    fn from(err: reqwest::Error) -> Self {
        DomainError::AgentRequestFailed(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_foreign_key_epic() {
        let err = StoreError::classify("FOREIGN KEY constraint failed: prompts.epic_id");
        assert_eq!(
            err,
            StoreError::ForeignKey {
                field: "epic_id".to_string()
            }
        );
        assert!(err.hint().unwrap().contains("epic"));
    }

    #[test]
    fn test_classify_required_field() {
        let err = StoreError::classify("NOT NULL constraint failed: prompts.title");
        assert_eq!(
            err,
            StoreError::RequiredField {
                field: "title".to_string()
            }
        );
    }

    #[test]
    fn test_classify_opaque_message() {
        let err = StoreError::classify("disk I/O error");
        assert!(matches!(err, StoreError::Backend(_)));
        assert!(err.hint().is_none());
    }
}
