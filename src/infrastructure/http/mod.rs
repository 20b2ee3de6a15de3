//! Shared HTTP client plumbing.

pub mod retry;

pub use retry::{RetryPolicy, Transient};
