//! Prompt transformation service integration.
//!
//! Turns a short raw idea into a structured, agent-ready prompt by calling
//! the external transformation endpoint. Transient failures are retried
//! with exponential backoff.

pub mod client;
pub mod error;
pub mod types;

pub use client::HttpTransformer;
pub use error::TransformApiError;
pub use types::{TransformApiRequest, TransformApiResponse};
