use super::builder::SchedulerBuilder;
use super::heartbeat::Heartbeat;
use crate::clock::Clock;
use crate::config::SchedulerOptions;
use crate::error::{CallbackResult, Result, SchedulerError};
use crate::pulse::{PulseMode, PulseSelector};
use crate::registry::{Registry, TaskSlot};
use crate::task::{FireOutcome, Runnable, Task, TaskContext, TaskDef, TaskInfo};
use crate::time_unit::parse_millis;
use crate::LOG_TARGET;
use std::cell::{Cell, Ref, RefCell, RefMut};
use std::fmt;
use std::rc::Rc;
use tokio::sync::Notify;
use tracing::{debug, error, info, trace, warn};

/// What happened during one tick pass, by task name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickSummary {
    /// Tasks whose callback completed.
    pub fired: Vec<String>,
    /// Tasks whose callback failed; they are destroyed.
    pub failed: Vec<String>,
    /// Tasks that could not be evaluated and were removed on the spot.
    pub faulted: Vec<String>,
    /// Tasks removed at the end of the pass.
    pub removed: Vec<String>,
}

/// Outcome of a single pulse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pulse {
    Ticked(TickSummary),
    /// Less than a heartbeat since the last tick; nothing changed.
    Gated,
    /// The scheduler is stopped.
    Dormant,
    /// The tick was refused, e.g. because another pass is in flight.
    Rejected,
}

pub(crate) struct Inner {
    registry: RefCell<Registry>,
    heartbeat: Cell<Heartbeat>,
    running: Cell<bool>,
    ticking: Cell<bool>,
    last_tick_at: Cell<u64>,
    ticks: Cell<u64>,
    generation: Cell<u64>,
    keep_alive: bool,
    clock: Rc<dyn Clock>,
    pulses: Option<PulseSelector>,
    stopped: Notify,
}

/// Cooperative scheduler multiplexing named tasks onto one pulse source.
///
/// `Scheduler` is a cheap handle: clones share the same registry and state.
/// It is `!Send` and meant to live on a single thread; callbacks reach it
/// through [`TaskContext::scheduler`].
///
/// Every operation returns a [`Result`]; failures are also logged under the
/// `cadence` target, so callers that only care about success may check
/// `is_ok()`.
#[derive(Clone)]
pub struct Scheduler {
    inner: Rc<Inner>,
}

/// Clears the in-flight flag when a tick pass ends, even by unwinding.
struct PassGuard<'a>(&'a Cell<bool>);

impl Drop for PassGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

fn rejected(err: SchedulerError) -> SchedulerError {
    warn!(target: LOG_TARGET, error = %err, "operation rejected");
    err
}

impl Scheduler {
    /// Create a scheduler from a heartbeat in milliseconds or full
    /// [`SchedulerOptions`], using a monotonic clock and no pulse source.
    ///
    /// Without a pulse source the embedder drives the loop by calling
    /// [`Scheduler::pulse`]; use [`SchedulerBuilder`] to attach one.
    pub fn new(options: impl Into<SchedulerOptions>) -> Result<Self> {
        SchedulerBuilder::from_options(options.into()).build()
    }

    pub fn builder() -> SchedulerBuilder {
        SchedulerBuilder::new()
    }

    pub(crate) fn from_parts(
        heartbeat: Heartbeat,
        keep_alive: bool,
        clock: Rc<dyn Clock>,
        pulses: Option<PulseSelector>,
    ) -> Self {
        Self {
            inner: Rc::new(Inner {
                registry: RefCell::new(Registry::default()),
                heartbeat: Cell::new(heartbeat),
                running: Cell::new(false),
                ticking: Cell::new(false),
                last_tick_at: Cell::new(0),
                ticks: Cell::new(0),
                generation: Cell::new(0),
                keep_alive,
                clock,
                pulses,
                stopped: Notify::new(),
            }),
        }
    }

    fn registry(&self) -> Result<Ref<'_, Registry>> {
        self.inner
            .registry
            .try_borrow()
            .map_err(|_| SchedulerError::RegistryBusy)
    }

    fn registry_mut(&self) -> Result<RefMut<'_, Registry>> {
        self.inner
            .registry
            .try_borrow_mut()
            .map_err(|_| SchedulerError::RegistryBusy)
    }

    fn slot(&self, name: &str) -> Result<TaskSlot> {
        self.registry()?
            .get(name)
            .cloned()
            .ok_or_else(|| SchedulerError::NotFound(name.to_string()))
    }

    /// Current timestamp according to the scheduler's clock.
    pub fn now(&self) -> u64 {
        self.inner.clock.now_ms()
    }

    // ---- registry operations ----

    /// Register a new task. Fails if the name is taken or the definition is invalid.
    ///
    /// # Example
    ///
    /// ```rust
    /// use cadence_runtime::{Scheduler, TaskDef};
    ///
    /// let scheduler = Scheduler::new(0).unwrap();
    /// scheduler
    ///     .add(TaskDef::every("blink", "500ms"), |ctx| {
    ///         println!("blink #{:?}", ctx.task().iteration_count());
    ///         Ok(())
    ///     })
    ///     .unwrap();
    /// assert!(scheduler.has("blink"));
    /// ```
    pub fn add<F>(&self, def: TaskDef, callback: F) -> Result<()>
    where
        F: FnMut(&mut TaskContext<'_>) -> CallbackResult + 'static,
    {
        self.add_runnable(def, callback)
    }

    /// Register a new task whose work is a [`Runnable`].
    pub fn add_runnable<R>(&self, def: TaskDef, runnable: R) -> Result<()>
    where
        R: Runnable + 'static,
    {
        let slot = self.build_slot(&def, Box::new(runnable))?;
        let outcome = self.registry_mut().map_err(rejected)?.insert(def.name.clone(), slot);
        if let Err(_unused) = outcome {
            return Err(rejected(SchedulerError::DuplicateName(def.name)));
        }
        debug!(target: LOG_TARGET, task = %def.name, "task added");
        Ok(())
    }

    /// Swap the task registered under the definition's name for a new one.
    /// Fails if no such task exists.
    pub fn replace<F>(&self, def: TaskDef, callback: F) -> Result<()>
    where
        F: FnMut(&mut TaskContext<'_>) -> CallbackResult + 'static,
    {
        self.replace_runnable(def, callback)
    }

    pub fn replace_runnable<R>(&self, def: TaskDef, runnable: R) -> Result<()>
    where
        R: Runnable + 'static,
    {
        let slot = self.build_slot(&def, Box::new(runnable))?;
        let outcome = self.registry_mut().map_err(rejected)?.replace(&def.name, slot);
        match outcome {
            Ok(_previous) => {
                debug!(target: LOG_TARGET, task = %def.name, "task replaced");
                Ok(())
            }
            Err(_unused) => Err(rejected(SchedulerError::NotFound(def.name))),
        }
    }

    fn build_slot(&self, def: &TaskDef, runnable: Box<dyn Runnable>) -> Result<TaskSlot> {
        let task = Task::new(def, runnable, self.now()).map_err(rejected)?;
        Ok(Rc::new(RefCell::new(task)))
    }

    /// Remove a task by name.
    pub fn remove(&self, name: &str) -> Result<()> {
        let removed = self.registry_mut().map_err(rejected)?.remove(name);
        match removed {
            Some(_slot) => {
                debug!(target: LOG_TARGET, task = %name, "task removed");
                Ok(())
            }
            None => Err(rejected(SchedulerError::NotFound(name.to_string()))),
        }
    }

    /// Remove several tasks at once. If any name is unknown nothing is
    /// removed. Returns how many tasks were removed.
    pub fn remove_list<I, S>(&self, names: I) -> Result<usize>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let names: Vec<S> = names.into_iter().collect();
        let removed: Vec<TaskSlot> = {
            let mut registry = self.registry_mut().map_err(rejected)?;
            if let Some(missing) = names.iter().find(|name| !registry.contains(name.as_ref())) {
                return Err(rejected(SchedulerError::NotFound(
                    missing.as_ref().to_string(),
                )));
            }
            names
                .iter()
                .filter_map(|name| registry.remove(name.as_ref()))
                .collect()
        };
        debug!(target: LOG_TARGET, count = removed.len(), "tasks removed");
        Ok(removed.len())
    }

    /// Remove every task. Returns how many were removed.
    pub fn empty(&self) -> Result<usize> {
        let drained = self.registry_mut().map_err(rejected)?.drain();
        debug!(target: LOG_TARGET, count = drained.len(), "registry emptied");
        Ok(drained.len())
    }

    pub fn has(&self, name: &str) -> bool {
        self.registry()
            .map(|registry| registry.contains(name))
            .unwrap_or(false)
    }

    /// Like [`Scheduler::has`], but a missing task is an error.
    pub fn require(&self, name: &str) -> Result<()> {
        if self.has(name) {
            Ok(())
        } else {
            Err(rejected(SchedulerError::NotFound(name.to_string())))
        }
    }

    /// Run `f` against the named task.
    ///
    /// Fails with [`SchedulerError::TaskBusy`] while that task's own callback
    /// is running; the callback should use its [`TaskContext`] instead.
    pub fn with_task_mut<R>(&self, name: &str, f: impl FnOnce(&mut Task) -> R) -> Result<R> {
        let slot = self.slot(name).map_err(rejected)?;
        let mut task = slot
            .try_borrow_mut()
            .map_err(|_| rejected(SchedulerError::TaskBusy(name.to_string())))?;
        Ok(f(&mut task))
    }

    /// Snapshot of the named task.
    pub fn task(&self, name: &str) -> Result<TaskInfo> {
        let slot = self.slot(name)?;
        let task = slot
            .try_borrow()
            .map_err(|_| SchedulerError::TaskBusy(name.to_string()))?;
        Ok(task.info())
    }

    pub fn enable_task(&self, name: &str) -> Result<()> {
        self.with_task_mut(name, |task| {
            task.enable();
        })
    }

    /// Disable a task, reporting an error if it does not exist.
    pub fn disable_task(&self, name: &str) -> Result<()> {
        self.with_task_mut(name, |task| {
            task.disable();
        })
    }

    /// Disable a task if it exists. A missing task is not reported.
    pub fn disable_task_if_present(&self, name: &str) -> Result<bool> {
        if !self.has(name) {
            return Ok(false);
        }
        self.disable_task(name).map(|()| true)
    }

    /// Change the interval of a recurring task. Returns whether the change
    /// applied; one-shot tasks have no interval and are left alone.
    pub fn change_task_wait(&self, name: &str, interval_ms: u64) -> Result<bool> {
        let applied = self.with_task_mut(name, |task| task.set_interval(interval_ms))?;
        if applied {
            debug!(target: LOG_TARGET, task = %name, interval_ms, "task interval changed");
        } else {
            debug!(target: LOG_TARGET, task = %name, "one-shot task has no interval to change");
        }
        Ok(applied)
    }

    // ---- heartbeat ----

    pub fn heartbeat(&self) -> u64 {
        self.inner.heartbeat.get().current()
    }

    /// Lowest heartbeat [`Scheduler::change_wait`] currently accepts.
    pub fn floor(&self) -> u64 {
        self.inner.heartbeat.get().floor()
    }

    /// Set a new heartbeat. The value must differ from the current one and lie
    /// within `[floor, MAX_HEARTBEAT_MS]`; on failure nothing changes.
    pub fn change_wait(&self, heartbeat_ms: u64) -> Result<()> {
        let mut heartbeat = self.inner.heartbeat.get();
        let previous = heartbeat.change(heartbeat_ms).map_err(rejected)?;
        self.inner.heartbeat.set(heartbeat);
        info!(target: LOG_TARGET, previous_ms = previous, heartbeat_ms, "heartbeat changed");
        Ok(())
    }

    /// [`Scheduler::change_wait`] for text input such as `"250"`, `"2s"` or
    /// `"3 seconds"`.
    pub fn change_wait_str(&self, heartbeat: &str) -> Result<()> {
        let ms = parse_millis(heartbeat)
            .ok_or_else(|| rejected(SchedulerError::InvalidWait(heartbeat.to_string())))?;
        self.change_wait(ms)
    }

    // ---- running state ----

    pub fn is_running(&self) -> bool {
        self.inner.running.get()
    }

    pub fn keep_alive(&self) -> bool {
        self.inner.keep_alive
    }

    /// Start ticking. Does nothing if already running.
    pub fn start(&self) {
        if self.inner.running.replace(true) {
            debug!(target: LOG_TARGET, "scheduler already running");
            return;
        }
        let generation = self.next_generation();
        info!(
            target: LOG_TARGET,
            heartbeat_ms = self.heartbeat(),
            tasks = self.len(),
            "scheduler started"
        );
        self.arm(generation);
    }

    /// Stop ticking. A pass already in flight completes; due work waits for
    /// the next start.
    pub fn stop(&self) {
        if !self.inner.running.replace(false) {
            return;
        }
        info!(target: LOG_TARGET, "scheduler stopped");
        self.inner.stopped.notify_waiters();
    }

    /// Resolve once the scheduler is stopped.
    pub async fn stopped(&self) {
        loop {
            let notified = self.inner.stopped.notified();
            if !self.is_running() {
                return;
            }
            notified.await;
        }
    }

    /// Start the loop and wait until something stops it.
    ///
    /// With [`TokioPulse`](crate::TokioPulse) sources this must run inside a
    /// [`tokio::task::LocalSet`].
    pub async fn run_until_stopped(&self) {
        self.start();
        self.stopped().await;
    }

    /// Source the loop re-arms through, if pulse sources are attached.
    pub fn pulse_mode(&self) -> Option<PulseMode> {
        self.inner.pulses.as_ref().map(PulseSelector::mode)
    }

    /// Re-read host visibility and switch pulse sources if needed.
    ///
    /// A running loop moves to the new source right away; any pulse still
    /// pending on the old one is ignored when it fires.
    pub fn visibility_changed(&self) -> Option<PulseMode> {
        let pulses = self.inner.pulses.as_ref()?;
        if pulses.reselect() && self.is_running() {
            let generation = self.next_generation();
            self.arm(generation);
        }
        Some(pulses.mode())
    }

    fn next_generation(&self) -> u64 {
        let generation = self.inner.generation.get().wrapping_add(1);
        self.inner.generation.set(generation);
        generation
    }

    /// Request the next pulse for loop `generation`.
    fn arm(&self, generation: u64) {
        let Some(pulses) = &self.inner.pulses else {
            return;
        };
        let inner = Rc::downgrade(&self.inner);
        pulses.request(Box::new(move || {
            if let Some(inner) = inner.upgrade() {
                Scheduler { inner }.on_pulse(generation);
            }
        }));
    }

    fn on_pulse(&self, generation: u64) {
        if generation != self.inner.generation.get() {
            trace!(target: LOG_TARGET, generation, "dropping stale pulse");
            return;
        }
        if !self.is_running() {
            debug!(target: LOG_TARGET, "loop dormant until restarted");
            return;
        }
        self.pulse();
        if self.is_running() {
            self.arm(generation);
        } else {
            debug!(target: LOG_TARGET, "loop dormant until restarted");
        }
    }

    // ---- tick / loop ----

    /// One loop step at the clock's current time.
    pub fn pulse(&self) -> Pulse {
        self.pulse_at(self.now())
    }

    /// One loop step at `now`: tick if more than a heartbeat has passed since
    /// the last tick, otherwise do nothing.
    pub fn pulse_at(&self, now: u64) -> Pulse {
        if !self.is_running() {
            return Pulse::Dormant;
        }
        let delta = now.saturating_sub(self.inner.last_tick_at.get());
        if delta <= self.heartbeat() {
            return Pulse::Gated;
        }
        match self.tick(now) {
            Ok(summary) => {
                self.inner.last_tick_at.set(now);
                Pulse::Ticked(summary)
            }
            Err(_) => Pulse::Rejected,
        }
    }

    /// Evaluate every task once at `now`, in insertion order.
    ///
    /// Does nothing while stopped. Tasks removed or replaced by an earlier
    /// callback in the same pass are skipped. Tasks pending destruction are
    /// removed after the pass, unless their name has meanwhile been given to
    /// a different task.
    pub fn tick(&self, now: u64) -> Result<TickSummary> {
        let mut summary = TickSummary::default();
        if !self.is_running() {
            return Ok(summary);
        }
        if self.inner.ticking.replace(true) {
            return Err(rejected(SchedulerError::TickInProgress));
        }
        let _pass = PassGuard(&self.inner.ticking);

        let snapshot = self.registry().map_err(rejected)?.snapshot();
        let mut evaluated = Vec::with_capacity(snapshot.len());

        for (name, slot) in snapshot {
            if !self.is_current(&name, &slot) {
                trace!(target: LOG_TARGET, task = %name, "task left the registry mid-pass");
                continue;
            }
            match self.evaluate(&name, &slot, now) {
                Ok(Some(FireOutcome::Completed)) => summary.fired.push(name.clone()),
                Ok(Some(FireOutcome::Failed)) => summary.failed.push(name.clone()),
                Ok(None) => {}
                Err(fault) => {
                    error!(
                        target: LOG_TARGET,
                        task = %name,
                        error = %fault,
                        "removing task after tick fault"
                    );
                    self.discard(&name, &slot);
                    summary.faulted.push(name);
                    continue;
                }
            }
            evaluated.push((name, slot));
        }

        for (name, slot) in evaluated {
            let doomed = slot
                .try_borrow()
                .map(|task| task.is_pending_destroy())
                .unwrap_or(false);
            if doomed && self.discard(&name, &slot) {
                debug!(target: LOG_TARGET, task = %name, "task destroyed");
                summary.removed.push(name);
            }
        }

        self.inner.ticks.set(self.inner.ticks.get() + 1);
        trace!(
            target: LOG_TARGET,
            now,
            fired = summary.fired.len(),
            removed = summary.removed.len(),
            "tick complete"
        );
        Ok(summary)
    }

    fn evaluate(&self, name: &str, slot: &TaskSlot, now: u64) -> Result<Option<FireOutcome>> {
        let mut task = slot.try_borrow_mut().map_err(|_| SchedulerError::TickFault {
            name: name.to_string(),
            reason: "task is borrowed outside the tick pass".to_string(),
        })?;
        if task.is_pending_destroy() || !task.should_execute(now) {
            return Ok(None);
        }
        task.fire(now, self).map(Some)
    }

    fn is_current(&self, name: &str, slot: &TaskSlot) -> bool {
        self.registry()
            .map(|registry| registry.is_current(name, slot))
            .unwrap_or(false)
    }

    /// Drop `name` from the registry if it still refers to `slot`.
    fn discard(&self, name: &str, slot: &TaskSlot) -> bool {
        let removed = match self.registry_mut() {
            Ok(mut registry) => registry.remove_if_current(name, slot),
            Err(_) => None,
        };
        removed.is_some()
    }

    // ---- introspection ----

    pub fn len(&self) -> usize {
        self.registry().map(|registry| registry.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.registry()
            .map(|registry| registry.is_empty())
            .unwrap_or(true)
    }

    /// Task names in evaluation order.
    pub fn task_names(&self) -> Vec<String> {
        self.registry()
            .map(|registry| registry.names())
            .unwrap_or_default()
    }

    /// Timestamp of the last tick, 0 before the first.
    pub fn last_tick_at(&self) -> u64 {
        self.inner.last_tick_at.get()
    }

    /// Number of tick passes performed so far.
    pub fn ticks(&self) -> u64 {
        self.inner.ticks.get()
    }
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("running", &self.is_running())
            .field("heartbeat", &self.heartbeat())
            .field("tasks", &self.task_names())
            .field("ticks", &self.ticks())
            .finish()
    }
}
