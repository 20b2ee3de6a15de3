//! Promptdeck - Optimistic prompt deck for coding agents
//!
//! Promptdeck keeps a local, instantly-mutable view of a prompt backlog in
//! sync with a shared store, expands short ideas into agent-ready prompts,
//! dispatches them to Cursor background agents, and automates the status
//! bookkeeping in between.
//!
//! # Architecture
//!
//! This crate follows Clean Architecture / Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): Pure business logic and domain models
//! - **Service Layer** (`services`): The optimistic mutation engine, prompt
//!   generation, agent dispatch, and workflow automation
//! - **Application Layer** (`application`): Per-workspace composition and
//!   background scheduling
//! - **Adapters** (`adapters`): SQLite persistence
//! - **Infrastructure Layer** (`infrastructure`): External integrations
//! - **CLI Layer** (`cli`): Command-line interface
//!
//! # Example
//!
//! ```ignore
//! use promptdeck::application::WorkspaceSession;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     // Wire stores and clients, then open a session per workspace
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use application::{AutomationScheduler, SchedulerOptions, WorkspaceSession};
pub use domain::errors::{DomainError, DomainResult};
pub use domain::models::{
    Config, DatabaseConfig, Epic, EpicStatus, LoggingConfig, Prompt, PromptPriority, PromptStatus,
    RetryConfig,
};
pub use domain::ports::{
    AuditStore, CursorAgent, EpicStore, NewPrompt, PromptFilter, PromptPatch, PromptStore,
    PromptTransformer,
};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{
    AgentDispatcher, PromptCache, PromptService, PromptSnapshot, WorkflowEngine,
};
