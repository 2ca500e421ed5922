//! # Cadence - Heartbeat-Gated Task Scheduling for Single-Threaded Hosts
//!
//! This library multiplexes many named timers onto one external pulse (a
//! render-frame callback, a game loop, a tokio timer) and runs them
//! cooperatively on a single thread.
//!
//! ## Features
//!
//! - **One-shot tasks**: fire once after a delay (`TaskDef::after`)
//! - **Recurring tasks**: fire every interval, optionally a fixed number of
//!   times (`TaskDef::every`)
//! - **Heartbeat gating**: a minimum wait between tick passes that can only grow
//! - **Visibility-aware pulses**: switch to a fallback timer while the host is
//!   hidden (`keep_alive`)
//! - **Config support**: scheduler options and task definitions from TOML/YAML
//!   plus `CADENCE_` env vars
//! - **Failure isolation**: a failing or panicking callback only destroys its own task
//!
//! ## Quick Start
//!
//! ```rust
//! use cadence::{ManualClock, SchedulerBuilder, TaskDef};
//!
//! # fn main() -> Result<(), cadence::SchedulerError> {
//! let clock = ManualClock::new();
//! let scheduler = SchedulerBuilder::new()
//!     .heartbeat(100)
//!     .clock(clock.clone())
//!     .build()?;
//!
//! scheduler.add(TaskDef::after("intro", "1s"), |ctx| {
//!     println!("intro at {}ms", ctx.now());
//!     Ok(())
//! })?;
//! scheduler.add(TaskDef::every("autosave", 500u64).iterations(3), |ctx| {
//!     println!("autosave #{:?}", ctx.task().iteration_count());
//!     Ok(())
//! })?;
//!
//! scheduler.start();
//! for _ in 0..30 {
//!     clock.advance(120);
//!     scheduler.pulse();
//! }
//! assert!(scheduler.is_empty());
//! # Ok(())
//! # }
//! ```
//!
//! ## Driving the loop
//!
//! Without pulse sources the embedder calls [`Scheduler::pulse`] from its own
//! frame callback. With [`SchedulerBuilder::tokio_pulses`] the scheduler
//! re-arms itself on tokio timers inside a [`tokio::task::LocalSet`]:
//!
//! ```rust,no_run
//! use cadence::{SchedulerBuilder, TaskDef};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let scheduler = SchedulerBuilder::new().heartbeat(50).tokio_pulses().build()?;
//!     scheduler.add(TaskDef::after("done", "2s"), |ctx| {
//!         ctx.scheduler().stop();
//!         Ok(())
//!     })?;
//!
//!     let local = tokio::task::LocalSet::new();
//!     local.run_until(scheduler.run_until_stopped()).await;
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration
//!
//! Create `config/cadence.toml`:
//!
//! ```toml
//! [scheduler]
//! heartbeat = "250ms"
//! keep_alive = true
//!
//! [[tasks]]
//! name = "autosave"
//! interval = "30s"
//!
//! [[tasks]]
//! name = "intro"
//! after = 1200
//! ```
//!
//! Or `config/cadence.yaml`:
//!
//! ```yaml
//! scheduler:
//!   heartbeat: 250
//!   keep_alive: true
//! tasks:
//!   - name: autosave
//!     interval: 30s
//! ```
//!
//! You can also use environment variables with `CADENCE_` prefix:
//!
//! ```bash
//! export CADENCE_SCHEDULER__HEARTBEAT=500
//! ```
//!
//! [`Scheduler::pulse`]: cadence_runtime::Scheduler::pulse
//! [`SchedulerBuilder::tokio_pulses`]: cadence_runtime::SchedulerBuilder::tokio_pulses
//! [`tokio::task::LocalSet`]: https://docs.rs/tokio/latest/tokio/task/struct.LocalSet.html

// Re-export core types
pub use cadence_runtime::{
    CallbackError, CallbackResult, FireOutcome, Pulse, Result, Runnable, Scheduler,
    SchedulerBuilder, SchedulerError, Task, TaskContext, TaskDef, TaskInfo, TaskKind,
    TickSummary, TimeUnit, WaitValue, MAX_HEARTBEAT_MS,
};

// Re-export pulse sources and clocks
pub use cadence_runtime::{
    select_mode, AlwaysVisible, Clock, ManualClock, ManualPulse, MonotonicClock, PulseCallback,
    PulseMode, PulseSource, TokioPulse, Visibility, VisibilityFlag, DEFAULT_FALLBACK_DELAY_MS,
    DEFAULT_FRAME_PERIOD_MS,
};

// Re-export config helpers
pub use cadence_runtime::{
    load_toml_config, load_yaml_config, parse_millis, task_defs_from_config, SchedulerOptions,
    ENV_PREFIX, SCHEDULER_SECTION, TASKS_SECTION,
};

pub use cadence_runtime;
