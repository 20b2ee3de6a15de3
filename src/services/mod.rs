//! Service layer: the prompt lifecycle engine.

pub mod automation;
pub mod cache;
pub mod dispatch;
pub mod generation;
pub mod optimistic;
pub mod prompts;
pub mod reconciler;
pub mod subscription;

pub use automation::{AutomationAction, AutomationOutcome, WorkflowEngine};
pub use cache::{PromptCache, PromptSnapshot};
pub use dispatch::AgentDispatcher;
pub use generation::{GenerationOrchestrator, GenerationOutcome};
pub use optimistic::OptimisticEngine;
pub use prompts::PromptService;
pub use reconciler::reconcile;
pub use subscription::{SubscriptionHandle, SubscriptionManager};
