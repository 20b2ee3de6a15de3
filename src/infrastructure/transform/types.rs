//! Wire types for the transformation endpoint.

use serde::{Deserialize, Serialize};

/// Request body for `POST /transform-prompt`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformApiRequest {
    pub raw_idea: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub knowledge_context: Option<String>,
    pub provider: String,
    pub model: String,
}

/// Response body from the transformation endpoint.
///
/// `success` is absent on older deployments that only ever answer with a
/// prompt or an HTTP error.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformApiResponse {
    pub transformed_prompt: Option<String>,
    pub success: Option<bool>,
    pub error: Option<String>,
}
