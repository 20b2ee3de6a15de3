//! Cursor background-agent API integration.
//!
//! Launches remote coding-agent runs, polls their status, and cancels them
//! on request. All calls carry bearer authentication.

pub mod client;
pub mod error;
pub mod types;

pub use client::HttpCursorAgent;
pub use error::CursorApiError;
pub use types::{AgentResponse, LaunchAgentRequest};
