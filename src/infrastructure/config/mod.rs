//! Configuration loading.
//!
//! Layered figment sources, lowest precedence first: built-in defaults,
//! `.promptdeck/config.yaml`, `.promptdeck/local.yaml`, then
//! `PROMPTDECK_*` environment variables. Loaded configs are validated
//! before use.

pub mod loader;

pub use loader::{ConfigError, ConfigLoader};
