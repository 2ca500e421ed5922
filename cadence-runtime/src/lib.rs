//! Cadence Runtime - core of the heartbeat-gated task scheduler
//!
//! This crate provides the task registry, the tick pass, heartbeat gating and
//! the pulse-driven loop. Everything runs on one thread: the scheduler is an
//! `Rc` handle and callbacks get mutable access to their own task through a
//! [`TaskContext`].

mod clock;
mod config;
mod error;
mod pulse;
mod registry;
mod scheduler;
mod task;
mod time_unit;

/// `tracing` target used for every event this crate emits.
pub(crate) const LOG_TARGET: &str = "cadence";

// Re-export public API
pub use clock::{Clock, ManualClock, MonotonicClock};
pub use crate::config::{
    load_toml_config, load_yaml_config, task_defs_from_config, SchedulerOptions, ENV_PREFIX,
    SCHEDULER_SECTION, TASKS_SECTION,
};
pub use error::{CallbackError, CallbackResult, Result, SchedulerError};
pub use pulse::{
    select_mode, AlwaysVisible, ManualPulse, PulseCallback, PulseMode, PulseSource, TokioPulse,
    Visibility, VisibilityFlag, DEFAULT_FALLBACK_DELAY_MS, DEFAULT_FRAME_PERIOD_MS,
};
pub use scheduler::{Pulse, Scheduler, SchedulerBuilder, TickSummary, MAX_HEARTBEAT_MS};
pub use task::{FireOutcome, Runnable, Task, TaskContext, TaskDef, TaskInfo, TaskKind};
pub use time_unit::{parse_millis, TimeUnit, WaitValue};
