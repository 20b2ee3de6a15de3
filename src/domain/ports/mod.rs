//! Port trait definitions (Hexagonal Architecture)
//!
//! Async trait interfaces that infrastructure adapters implement:
//! - `PromptStore`: prompt persistence plus the row-level change feed
//! - `EpicStore`: epic persistence
//! - `AuditStore`: activity log and automation agent identity
//! - `PromptTransformer`: AI prompt transformation service
//! - `CursorAgent`: remote coding-agent service
//!
//! These traits keep the domain independent of specific infrastructure.

pub mod audit_store;
pub mod cursor;
pub mod epic_store;
pub mod prompt_store;
pub mod transformer;

pub use audit_store::AuditStore;
pub use cursor::{AgentLaunch, CursorAgent, LaunchRequest};
pub use epic_store::EpicStore;
pub use prompt_store::{NewPrompt, PromptFilter, PromptPatch, PromptStore};
pub use transformer::{PromptTransformer, TransformRequest};
