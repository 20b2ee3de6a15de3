//! Coding-agent and automation-agent models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Run status reported by the remote coding agent.
///
/// Wire values are upper-case; stored verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AgentRunStatus {
    Creating,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl AgentRunStatus {
    /// Check if the run has finished, successfully or not.
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

impl fmt::Display for AgentRunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Creating => write!(f, "CREATING"),
            Self::Running => write!(f, "RUNNING"),
            Self::Completed => write!(f, "COMPLETED"),
            Self::Failed => write!(f, "FAILED"),
            Self::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

impl FromStr for AgentRunStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "CREATING" => Ok(Self::Creating),
            "RUNNING" => Ok(Self::Running),
            "COMPLETED" | "FINISHED" => Ok(Self::Completed),
            "FAILED" | "ERROR" => Ok(Self::Failed),
            "CANCELLED" | "EXPIRED" => Ok(Self::Cancelled),
            _ => Err(anyhow::anyhow!("Invalid agent run status: {s}")),
        }
    }
}

/// Pull-request state as reported by the hosting provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrStatus {
    Open,
    Draft,
    Merged,
    Closed,
}

impl fmt::Display for PrStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => write!(f, "open"),
            Self::Draft => write!(f, "draft"),
            Self::Merged => write!(f, "merged"),
            Self::Closed => write!(f, "closed"),
        }
    }
}

impl FromStr for PrStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "open" => Ok(Self::Open),
            "draft" => Ok(Self::Draft),
            "merged" => Ok(Self::Merged),
            "closed" => Ok(Self::Closed),
            _ => Err(anyhow::anyhow!("Invalid pull request status: {s}")),
        }
    }
}

/// A status report for one coding-agent run, as ingested from the agent
/// service. Optional fields are written through to the linked prompt only
/// when present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentReport {
    /// Run id assigned by the agent service
    pub cursor_agent_id: String,
    /// Current run status
    pub status: AgentRunStatus,
    /// Branch the agent pushed to, when known
    pub branch_name: Option<String>,
    /// Pull request opened by the run, when known
    pub pr_url: Option<String>,
    pub pr_number: Option<i64>,
    /// Short human-readable summary from the agent
    pub summary: Option<String>,
}

impl AgentReport {
    pub fn new(cursor_agent_id: impl Into<String>, status: AgentRunStatus) -> Self {
        Self {
            cursor_agent_id: cursor_agent_id.into(),
            status,
            branch_name: None,
            pr_url: None,
            pr_number: None,
            summary: None,
        }
    }

    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch_name = Some(branch.into());
        self
    }

    pub fn with_pr(mut self, url: impl Into<String>, number: Option<i64>) -> Self {
        self.pr_url = Some(url.into());
        self.pr_number = number;
        self
    }
}

/// The per-workspace automation agent identity.
///
/// Every automation write is attributed to this row so the activity log can
/// distinguish machine actions from user actions. Find-or-created lazily on
/// the first automation pass for a workspace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowAgent {
    /// Unique agent identifier
    pub id: Uuid,
    /// Workspace this agent acts in
    pub workspace_id: Uuid,
    /// Agent kind discriminator, always `workflow_automation` here
    pub agent_type: String,
    /// Display name shown in activity feeds
    pub display_name: String,
    /// When created
    pub created_at: DateTime<Utc>,
    /// Last time this agent performed any action
    pub last_active_at: DateTime<Utc>,
}

impl WorkflowAgent {
    pub const AGENT_TYPE: &'static str = "workflow_automation";

    /// Create a new workflow automation agent for a workspace.
    pub fn new(workspace_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            workspace_id,
            agent_type: Self::AGENT_TYPE.to_string(),
            display_name: "Workflow Automation".to_string(),
            created_at: now,
            last_active_at: now,
        }
    }

    /// Record activity now.
    pub fn touch_activity(&mut self) {
        self.last_active_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_status_from_str() {
        assert_eq!(
            "RUNNING".parse::<AgentRunStatus>().unwrap(),
            AgentRunStatus::Running
        );
        assert_eq!(
            "running".parse::<AgentRunStatus>().unwrap(),
            AgentRunStatus::Running
        );
        assert_eq!(
            "FINISHED".parse::<AgentRunStatus>().unwrap(),
            AgentRunStatus::Completed
        );
        assert_eq!(
            "EXPIRED".parse::<AgentRunStatus>().unwrap(),
            AgentRunStatus::Cancelled
        );
        assert!("unknown".parse::<AgentRunStatus>().is_err());
    }

    #[test]
    fn test_run_status_finished() {
        assert!(!AgentRunStatus::Creating.is_finished());
        assert!(!AgentRunStatus::Running.is_finished());
        assert!(AgentRunStatus::Completed.is_finished());
        assert!(AgentRunStatus::Failed.is_finished());
        assert!(AgentRunStatus::Cancelled.is_finished());
    }

    #[test]
    fn test_pr_status_roundtrip() {
        for status in [
            PrStatus::Open,
            PrStatus::Draft,
            PrStatus::Merged,
            PrStatus::Closed,
        ] {
            assert_eq!(status.to_string().parse::<PrStatus>().unwrap(), status);
        }
    }

    #[test]
    fn test_workflow_agent_new() {
        let workspace_id = Uuid::new_v4();
        let agent = WorkflowAgent::new(workspace_id);

        assert_eq!(agent.workspace_id, workspace_id);
        assert_eq!(agent.agent_type, WorkflowAgent::AGENT_TYPE);
        assert_eq!(agent.created_at, agent.last_active_at);
    }

    #[test]
    fn test_report_builder() {
        let report = AgentReport::new("bc_abc123", AgentRunStatus::Completed)
            .with_branch("cursor/fix-login")
            .with_pr("https://github.com/acme/app/pull/42", Some(42));

        assert_eq!(report.cursor_agent_id, "bc_abc123");
        assert_eq!(report.branch_name.as_deref(), Some("cursor/fix-login"));
        assert_eq!(report.pr_number, Some(42));
    }
}
