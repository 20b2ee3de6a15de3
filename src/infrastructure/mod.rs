//! Infrastructure layer module
//!
//! This module contains all infrastructure adapters and external integrations:
//! - Configuration management (figment)
//! - Logging infrastructure
//! - Shared HTTP retry plumbing
//! - Prompt transformation API client
//! - Cursor background-agent API client
//!
//! Infrastructure implementations satisfy the port traits defined in the domain layer.

pub mod config;
pub mod cursor;
pub mod http;
pub mod logging;
pub mod transform;
