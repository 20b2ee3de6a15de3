//! Wire types for the Cursor background-agent API.

use serde::{Deserialize, Serialize};

/// Body of `POST /v0/agents`.
#[derive(Debug, Clone, Serialize)]
pub struct LaunchAgentRequest {
    pub prompt: AgentPrompt,
    pub source: AgentSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub target: AgentTarget,
}

#[derive(Debug, Clone, Serialize)]
pub struct AgentPrompt {
    pub text: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AgentSource {
    pub repository: String,
    #[serde(rename = "ref")]
    pub git_ref: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentTarget {
    pub auto_create_pr: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch_name: Option<String>,
}

/// Agent object returned by launch and status calls.
///
/// Field availability varies by run phase, so everything beyond `id` and
/// `status` is optional.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentResponse {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub status: String,
    #[serde(default)]
    pub source: Option<AgentSourceInfo>,
    #[serde(default)]
    pub target: Option<AgentTargetInfo>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AgentSourceInfo {
    #[serde(default)]
    pub repository: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentTargetInfo {
    #[serde(default)]
    pub branch_name: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub pr_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_launch_request_wire_format() {
        let request = LaunchAgentRequest {
            prompt: AgentPrompt {
                text: "Fix the login flow".to_string(),
            },
            source: AgentSource {
                repository: "https://github.com/acme/app".to_string(),
                git_ref: "main".to_string(),
            },
            model: None,
            target: AgentTarget {
                auto_create_pr: true,
                branch_name: None,
            },
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["prompt"]["text"], "Fix the login flow");
        assert_eq!(value["source"]["ref"], "main");
        assert_eq!(value["target"]["autoCreatePr"], json!(true));
        assert!(value.get("model").is_none());
        assert!(value["target"].get("branchName").is_none());
    }

    #[test]
    fn test_agent_response_minimal() {
        let response: AgentResponse = serde_json::from_str(
            r#"{"id": "bc_abc123", "status": "CREATING"}"#,
        )
        .unwrap();

        assert_eq!(response.id, "bc_abc123");
        assert_eq!(response.status, "CREATING");
        assert!(response.target.is_none());
        assert!(response.summary.is_none());
    }

    #[test]
    fn test_agent_response_full() {
        let response: AgentResponse = serde_json::from_str(
            r#"{
                "id": "bc_abc123",
                "name": "Fix login",
                "status": "FINISHED",
                "source": {"repository": "https://github.com/acme/app"},
                "target": {
                    "branchName": "cursor/fix-login",
                    "url": "https://cursor.com/agents?id=bc_abc123",
                    "prUrl": "https://github.com/acme/app/pull/42"
                },
                "summary": "Fixed the login flow",
                "createdAt": "2025-06-01T12:00:00Z"
            }"#,
        )
        .unwrap();

        let target = response.target.unwrap();
        assert_eq!(target.branch_name.as_deref(), Some("cursor/fix-login"));
        assert_eq!(
            target.pr_url.as_deref(),
            Some("https://github.com/acme/app/pull/42")
        );
        assert_eq!(response.summary.as_deref(), Some("Fixed the login flow"));
    }
}
