//! Coding-agent service port.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::{AgentReport, AgentRunStatus};

/// Parameters for launching one agent run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchRequest {
    /// Machine-ready instructions for the agent
    pub instructions: String,
    /// Repository the agent works against, e.g. `acme/app`
    pub repository: String,
    /// Base branch to start from
    pub base_branch: String,
    /// Model the agent runs with
    pub model: String,
    /// Ask the agent to open a pull request when finished
    pub auto_create_pr: bool,
}

/// Result of a successful launch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentLaunch {
    /// Run id assigned by the service
    pub agent_id: String,
    /// Initial run status, usually `CREATING`
    pub status: AgentRunStatus,
    /// Branch name, when the service assigns one up front
    pub branch_name: Option<String>,
}

/// Interface to the remote coding-agent service.
#[async_trait]
pub trait CursorAgent: Send + Sync {
    /// Launch a new agent run.
    async fn launch(&self, request: LaunchRequest) -> DomainResult<AgentLaunch>;

    /// Fetch the current status of a run.
    async fn status(&self, agent_id: &str) -> DomainResult<AgentReport>;

    /// Ask the service to stop a run.
    async fn cancel(&self, agent_id: &str) -> DomainResult<()>;
}
