//! Application layer: per-workspace composition and background scheduling.

pub mod scheduler;
pub mod session;

pub use scheduler::{
    AutomationScheduler, SchedulerEvent, SchedulerHandle, SchedulerOptions, SchedulerStatus,
    StopReason,
};
pub use session::WorkspaceSession;
