//! Prompt transformation port.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;

/// One transformation request: free-form description in, machine-ready
/// instructions out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformRequest {
    /// Stripped plain-text description to transform
    pub text: String,
    /// Optional workspace knowledge passed through to the model
    pub knowledge_context: Option<String>,
}

impl TransformRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            knowledge_context: None,
        }
    }

    pub fn with_knowledge(mut self, context: impl Into<String>) -> Self {
        self.knowledge_context = Some(context.into());
        self
    }
}

/// Interface to the AI transformation service.
///
/// Implementations own their own retry behavior; callers own the overall
/// deadline. A blank result is the caller's problem to classify.
#[async_trait]
pub trait PromptTransformer: Send + Sync {
    /// Transform a description into machine-ready instructions.
    async fn transform(&self, request: TransformRequest) -> DomainResult<String>;
}
