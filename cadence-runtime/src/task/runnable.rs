use super::task::Task;
use crate::error::CallbackResult;
use crate::scheduler::Scheduler;

/// Work a task performs when it is due.
///
/// Closures taking a [`TaskContext`] implement this automatically; implement it
/// on your own type when the work carries state worth naming.
///
/// # Example
///
/// ```rust
/// use cadence_runtime::{CallbackResult, Runnable, TaskContext};
///
/// struct Autosave {
///     saves: u32,
/// }
///
/// impl Runnable for Autosave {
///     fn run(&mut self, ctx: &mut TaskContext<'_>) -> CallbackResult {
///         self.saves += 1;
///         if self.saves == 3 {
///             ctx.task_mut().disable();
///         }
///         Ok(())
///     }
/// }
/// ```
pub trait Runnable {
    /// Execute the task body.
    ///
    /// Returning an error (or panicking) destroys the task.
    fn run(&mut self, ctx: &mut TaskContext<'_>) -> CallbackResult;
}

impl<F> Runnable for F
where
    F: FnMut(&mut TaskContext<'_>) -> CallbackResult,
{
    fn run(&mut self, ctx: &mut TaskContext<'_>) -> CallbackResult {
        self(ctx)
    }
}

/// What a callback sees while it runs.
///
/// The firing task is reachable mutably here and only here: while its callback
/// runs, scheduler operations naming the same task report it as busy.
pub struct TaskContext<'a> {
    task: &'a mut Task,
    now: u64,
    scheduler: &'a Scheduler,
}

impl<'a> TaskContext<'a> {
    pub(crate) fn new(task: &'a mut Task, now: u64, scheduler: &'a Scheduler) -> Self {
        Self {
            task,
            now,
            scheduler,
        }
    }

    pub fn name(&self) -> &str {
        self.task.name()
    }

    /// Timestamp of the tick that fired the task.
    pub fn now(&self) -> u64 {
        self.now
    }

    pub fn task(&self) -> &Task {
        self.task
    }

    pub fn task_mut(&mut self) -> &mut Task {
        self.task
    }

    /// The scheduler running this tick.
    pub fn scheduler(&self) -> &Scheduler {
        self.scheduler
    }

    /// Ask for this task to be removed once the current tick pass ends.
    pub fn destroy(&mut self) {
        self.task.mark_for_destroy();
    }
}
