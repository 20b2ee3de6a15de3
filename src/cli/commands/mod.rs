//! CLI command implementations.

pub mod activity;
pub mod automation;
pub mod epic;
pub mod init;
pub mod prompt;
pub mod watch;
