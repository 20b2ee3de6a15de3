//! Domain model types.

pub mod activity;
pub mod agent;
pub mod change;
pub mod config;
pub mod epic;
pub mod prompt;

pub use activity::{ActivityEntity, ActivityRecord};
pub use agent::{AgentReport, AgentRunStatus, PrStatus, WorkflowAgent};
pub use change::ChangeEvent;
pub use config::{
    AutomationConfig, Config, CursorConfig, DatabaseConfig, EventsConfig, GenerationConfig,
    LoggingConfig, RetryConfig, SchedulerConfig, TransformConfig, WorkspaceConfig,
};
pub use epic::{Epic, EpicStatus};
pub use prompt::{GenerationPhase, Prompt, PromptId, PromptPriority, PromptStatus};
