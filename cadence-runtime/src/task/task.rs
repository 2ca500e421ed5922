use super::params::{Schedule, TaskDef};
use super::runnable::{Runnable, TaskContext};
use crate::error::{Result, SchedulerError};
use crate::scheduler::Scheduler;
use crate::LOG_TARGET;
use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, error};

/// Timing state, carrying only the fields that matter for each variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    /// Fires once, after `due_at`.
    OneShot { due_at: u64 },
    /// Fires every `interval`, optionally capped at `iteration_limit` (0 = unlimited).
    Recurring {
        interval: u64,
        last_fired_at: u64,
        iteration_limit: u32,
        iteration_count: u32,
    },
}

/// How a firing ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FireOutcome {
    Completed,
    /// The callback failed; the task has been marked for destruction.
    Failed,
}

/// One scheduled unit of work.
pub struct Task {
    name: String,
    kind: TaskKind,
    active: bool,
    pending_destroy: bool,
    runnable: Option<Box<dyn Runnable>>,
}

/// Read-only view of a task's state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskInfo {
    pub name: String,
    pub kind: TaskKind,
    pub active: bool,
    pub pending_destroy: bool,
}

impl Task {
    pub(crate) fn new(def: &TaskDef, runnable: Box<dyn Runnable>, now: u64) -> Result<Self> {
        let kind = match def.validate()? {
            Schedule::After { delay } => TaskKind::OneShot {
                due_at: now.saturating_add(delay),
            },
            Schedule::Every {
                interval,
                iterations,
            } => TaskKind::Recurring {
                interval,
                last_fired_at: 0,
                iteration_limit: iterations,
                iteration_count: 0,
            },
        };

        Ok(Self {
            name: def.name.clone(),
            kind,
            active: true,
            pending_destroy: false,
            runnable: Some(runnable),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> TaskKind {
        self.kind
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_pending_destroy(&self) -> bool {
        self.pending_destroy
    }

    pub fn enable(&mut self) -> &mut Self {
        self.active = true;
        self
    }

    /// Stop evaluating this task. Elapsed-time bookkeeping is kept as is.
    pub fn disable(&mut self) -> &mut Self {
        self.active = false;
        self
    }

    /// Absolute due time of a one-shot task.
    pub fn due_at(&self) -> Option<u64> {
        match self.kind {
            TaskKind::OneShot { due_at } => Some(due_at),
            TaskKind::Recurring { .. } => None,
        }
    }

    pub fn interval(&self) -> Option<u64> {
        match self.kind {
            TaskKind::Recurring { interval, .. } => Some(interval),
            TaskKind::OneShot { .. } => None,
        }
    }

    pub fn last_fired_at(&self) -> Option<u64> {
        match self.kind {
            TaskKind::Recurring { last_fired_at, .. } => Some(last_fired_at),
            TaskKind::OneShot { .. } => None,
        }
    }

    pub fn iteration_count(&self) -> Option<u32> {
        match self.kind {
            TaskKind::Recurring {
                iteration_count, ..
            } => Some(iteration_count),
            TaskKind::OneShot { .. } => None,
        }
    }

    /// Change the interval of a recurring task, effective on the next
    /// evaluation. Returns false for one-shot tasks, which have no interval.
    pub fn set_interval(&mut self, ms: u64) -> bool {
        match &mut self.kind {
            TaskKind::Recurring { interval, .. } => {
                *interval = ms;
                true
            }
            TaskKind::OneShot { .. } => false,
        }
    }

    /// Flag the task for removal at the end of the current tick pass.
    /// There is no way back.
    pub fn mark_for_destroy(&mut self) {
        self.pending_destroy = true;
    }

    /// Whether the task is due at `now`.
    ///
    /// One-shot tasks need `now` strictly past their due time, recurring tasks
    /// fire as soon as a full interval has elapsed.
    pub fn should_execute(&self, now: u64) -> bool {
        if !self.active {
            return false;
        }
        match self.kind {
            TaskKind::OneShot { due_at } => now > due_at,
            TaskKind::Recurring {
                interval,
                last_fired_at,
                ..
            } => now.saturating_sub(last_fired_at) >= interval,
        }
    }

    pub fn info(&self) -> TaskInfo {
        TaskInfo {
            name: self.name.clone(),
            kind: self.kind,
            active: self.active,
            pending_destroy: self.pending_destroy,
        }
    }

    /// Update counters for a firing at `now` and decide whether this is the
    /// last one. Returns true when the task is now pending destruction.
    fn record_firing(&mut self, now: u64) -> bool {
        let destroy = match &mut self.kind {
            TaskKind::OneShot { .. } => true,
            TaskKind::Recurring {
                last_fired_at,
                iteration_limit,
                iteration_count,
                ..
            } => {
                *iteration_count = iteration_count.saturating_add(1);
                let exhausted = *iteration_limit != 0 && *iteration_count >= *iteration_limit;
                if !exhausted {
                    *last_fired_at = now;
                }
                exhausted
            }
        };
        if destroy {
            self.mark_for_destroy();
        }
        destroy
    }

    /// Run the firing protocol: bookkeeping first, then the callback.
    ///
    /// Callback failures (errors and panics) are contained here and reported
    /// as [`FireOutcome::Failed`]. An `Err` means the task could not be fired
    /// at all.
    pub(crate) fn fire(&mut self, now: u64, scheduler: &Scheduler) -> Result<FireOutcome> {
        let mut runnable = self.runnable.take().ok_or_else(|| SchedulerError::TickFault {
            name: self.name.clone(),
            reason: "callback is already executing".to_string(),
        })?;

        let last = self.record_firing(now);
        debug!(target: LOG_TARGET, task = %self.name, now, last, "firing task");

        let result = {
            let mut ctx = TaskContext::new(self, now, scheduler);
            panic::catch_unwind(AssertUnwindSafe(|| runnable.run(&mut ctx)))
        };
        self.runnable = Some(runnable);

        let failure = match result {
            Ok(Ok(())) => return Ok(FireOutcome::Completed),
            Ok(Err(err)) => err.to_string(),
            Err(payload) => panic_message(payload.as_ref()),
        };

        self.mark_for_destroy();
        let err = SchedulerError::TaskCallback {
            name: self.name.clone(),
            reason: failure,
        };
        error!(
            target: LOG_TARGET,
            task = %self.name,
            error = %err,
            "task callback failed, destroying task"
        );
        Ok(FireOutcome::Failed)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("panicked: {}", message)
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("panicked: {}", message)
    } else {
        "panicked".to_string()
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("active", &self.active)
            .field("pending_destroy", &self.pending_destroy)
            .finish_non_exhaustive()
    }
}
