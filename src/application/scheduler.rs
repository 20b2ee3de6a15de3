//! Background automation scheduler.
//!
//! Runs the workflow automation passes on an interval:
//! - status sweep and priority escalation every tick
//! - epic organization every few ticks
//! - pattern analysis on a much slower cadence

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Timelike;
use tokio::sync::{mpsc, RwLock};
use tokio::time::{interval, Instant};
use tracing::{debug, warn};

use crate::domain::models::SchedulerConfig;
use crate::domain::ports::{AuditStore, EpicStore, PromptStore};
use crate::services::automation::{AutomationAction, WorkflowEngine};

/// Runtime options for the scheduler.
#[derive(Debug, Clone)]
pub struct SchedulerOptions {
    /// Interval between ticks.
    pub tick_interval: Duration,
    /// Hour of day (inclusive) when ticks may run.
    pub active_hours_start: u32,
    /// Hour of day (exclusive) when ticks stop running.
    pub active_hours_end: u32,
    /// Run epic organization every N ticks.
    pub epic_every_ticks: u64,
    /// Run pattern analysis every N ticks.
    pub patterns_every_ticks: u64,
    /// Whether to tick immediately on startup.
    pub run_on_startup: bool,
    /// Maximum consecutive failing ticks before stopping.
    pub max_consecutive_failures: u32,
}

impl Default for SchedulerOptions {
    fn default() -> Self {
        Self::from_config(&SchedulerConfig::default())
    }
}

impl SchedulerOptions {
    pub fn from_config(config: &SchedulerConfig) -> Self {
        Self {
            tick_interval: Duration::from_secs(config.interval_secs),
            active_hours_start: config.active_hours_start,
            active_hours_end: config.active_hours_end,
            epic_every_ticks: config.epic_every_ticks.max(1),
            patterns_every_ticks: config.patterns_every_ticks.max(1),
            run_on_startup: false,
            max_consecutive_failures: 5,
        }
    }

    /// Fast cadence for testing.
    pub fn frequent() -> Self {
        Self {
            tick_interval: Duration::from_millis(50),
            active_hours_start: 0,
            active_hours_end: 24,
            epic_every_ticks: 2,
            patterns_every_ticks: 4,
            run_on_startup: true,
            max_consecutive_failures: 3,
        }
    }
}

/// Event emitted by the scheduler.
#[derive(Debug, Clone)]
pub enum SchedulerEvent {
    /// Scheduler started.
    Started,
    /// A tick began.
    TickStarted { tick: u64 },
    /// A tick was skipped outside active hours.
    TickSkipped { tick: u64, hour: u32 },
    /// One automation action finished.
    ActionFinished {
        tick: u64,
        action: &'static str,
        writes: usize,
    },
    /// One automation action failed.
    ActionFailed {
        tick: u64,
        action: &'static str,
        error: String,
    },
    /// Scheduler stopped.
    Stopped { reason: StopReason },
}

/// Reason the scheduler stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// Requested to stop.
    Requested,
    /// Too many consecutive failing ticks.
    TooManyFailures,
}

/// Status of the scheduler.
#[derive(Debug, Clone, Default)]
pub struct SchedulerStatus {
    /// Whether the loop is running.
    pub running: bool,
    /// Ticks attempted, skipped ones included.
    pub total_ticks: u64,
    /// Actions completed successfully.
    pub actions_run: u64,
    /// Actions that failed.
    pub actions_failed: u64,
    /// Last tick time.
    pub last_tick: Option<Instant>,
}

/// Handle to control the scheduler.
pub struct SchedulerHandle {
    stop_flag: Arc<AtomicBool>,
    status: Arc<RwLock<SchedulerStatus>>,
}

impl SchedulerHandle {
    /// Request the scheduler to stop after the current tick.
    pub fn stop(&self) {
        self.stop_flag.store(true, Ordering::Release);
    }

    /// Check if stop was requested.
    pub fn is_stop_requested(&self) -> bool {
        self.stop_flag.load(Ordering::Acquire)
    }

    /// Get current scheduler status.
    pub async fn status(&self) -> SchedulerStatus {
        self.status.read().await.clone()
    }
}

/// Whether a wall-clock hour falls inside the configured active window.
pub fn within_active_hours(hour: u32, start: u32, end: u32) -> bool {
    if start <= end {
        hour >= start && hour < end
    } else {
        // Window wraps midnight, e.g. 22..6
        hour >= start || hour < end
    }
}

/// Automation scheduler daemon.
pub struct AutomationScheduler<S, E, A>
where
    S: PromptStore + 'static,
    E: EpicStore + 'static,
    A: AuditStore + 'static,
{
    engine: Arc<WorkflowEngine<S, E, A>>,
    options: SchedulerOptions,
    status: Arc<RwLock<SchedulerStatus>>,
    stop_flag: Arc<AtomicBool>,
}

impl<S, E, A> AutomationScheduler<S, E, A>
where
    S: PromptStore + 'static,
    E: EpicStore + 'static,
    A: AuditStore + 'static,
{
    /// Create a new scheduler.
    pub fn new(engine: Arc<WorkflowEngine<S, E, A>>, options: SchedulerOptions) -> Self {
        Self {
            engine,
            options,
            status: Arc::new(RwLock::new(SchedulerStatus::default())),
            stop_flag: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Get a handle to control the scheduler.
    pub fn handle(&self) -> SchedulerHandle {
        SchedulerHandle {
            stop_flag: self.stop_flag.clone(),
            status: self.status.clone(),
        }
    }

    /// Run the scheduler, returning a channel for events.
    pub fn run(self) -> mpsc::Receiver<SchedulerEvent> {
        let (tx, rx) = mpsc::channel(100);
        tokio::spawn(async move {
            self.run_loop(tx).await;
        });
        rx
    }

    /// Main scheduler loop.
    async fn run_loop(self, tx: mpsc::Sender<SchedulerEvent>) {
        {
            let mut status = self.status.write().await;
            status.running = true;
        }
        let _ = tx.send(SchedulerEvent::Started).await;

        let mut consecutive_failures = 0u32;
        let mut tick = 0u64;
        let mut timer = interval(self.options.tick_interval);
        // The first tick of a tokio interval fires immediately
        if !self.options.run_on_startup {
            timer.tick().await;
        }

        let reason = loop {
            if self.stop_flag.load(Ordering::Acquire) {
                break StopReason::Requested;
            }
            timer.tick().await;
            if self.stop_flag.load(Ordering::Acquire) {
                break StopReason::Requested;
            }

            tick += 1;
            {
                let mut status = self.status.write().await;
                status.total_ticks = tick;
                status.last_tick = Some(Instant::now());
            }

            let hour = chrono::Local::now().hour();
            if !within_active_hours(
                hour,
                self.options.active_hours_start,
                self.options.active_hours_end,
            ) {
                debug!(tick, hour, "tick outside active hours");
                let _ = tx.send(SchedulerEvent::TickSkipped { tick, hour }).await;
                continue;
            }

            let _ = tx.send(SchedulerEvent::TickStarted { tick }).await;
            let failed = self.run_tick(tick, &tx).await;
            if failed {
                consecutive_failures += 1;
                if consecutive_failures >= self.options.max_consecutive_failures {
                    break StopReason::TooManyFailures;
                }
            } else {
                consecutive_failures = 0;
            }
        };

        {
            let mut status = self.status.write().await;
            status.running = false;
        }
        let _ = tx.send(SchedulerEvent::Stopped { reason }).await;
    }

    /// Run the actions due at this tick. Returns whether any failed.
    async fn run_tick(&self, tick: u64, tx: &mpsc::Sender<SchedulerEvent>) -> bool {
        let mut actions = vec![
            AutomationAction::AutoStatusUpdate { entity: None },
            AutomationAction::PriorityAdjustment,
        ];
        if tick % self.options.epic_every_ticks == 0 {
            actions.push(AutomationAction::EpicOrganization);
        }
        if tick % self.options.patterns_every_ticks == 0 {
            actions.push(AutomationAction::AnalyzePromptPatterns);
        }

        let mut any_failed = false;
        for action in actions {
            match self.engine.run(action).await {
                Ok(outcome) => {
                    self.status.write().await.actions_run += 1;
                    let _ = tx
                        .send(SchedulerEvent::ActionFinished {
                            tick,
                            action: action.name(),
                            writes: outcome.writes(),
                        })
                        .await;
                }
                Err(err) => {
                    any_failed = true;
                    self.status.write().await.actions_failed += 1;
                    warn!(action = action.name(), error = %err, "scheduled action failed");
                    let _ = tx
                        .send(SchedulerEvent::ActionFailed {
                            tick,
                            action: action.name(),
                            error: err.to_string(),
                        })
                        .await;
                }
            }
        }
        any_failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_active_hours_plain_window() {
        assert!(within_active_hours(8, 8, 22));
        assert!(within_active_hours(21, 8, 22));
        assert!(!within_active_hours(22, 8, 22));
        assert!(!within_active_hours(3, 8, 22));
    }

    #[test]
    fn test_active_hours_wrapping_window() {
        assert!(within_active_hours(23, 22, 6));
        assert!(within_active_hours(2, 22, 6));
        assert!(!within_active_hours(12, 22, 6));
    }

    #[test]
    fn test_full_day_window() {
        for hour in 0..24 {
            assert!(within_active_hours(hour, 0, 24));
        }
    }
}
