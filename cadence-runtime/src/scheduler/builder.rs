use super::heartbeat::Heartbeat;
use super::scheduler::Scheduler;
use crate::clock::{Clock, MonotonicClock};
use crate::config::{load_toml_config, load_yaml_config, SchedulerOptions};
use crate::error::Result;
use crate::pulse::{AlwaysVisible, PulseSelector, PulseSource, TokioPulse, Visibility};
use crate::LOG_TARGET;
use config::Config;
use std::path::Path;
use std::rc::Rc;
use std::time::Duration;
use tracing::info;

/// Builder for the scheduler
pub struct SchedulerBuilder {
    options: SchedulerOptions,
    clock: Option<Rc<dyn Clock>>,
    frame: Option<Rc<dyn PulseSource>>,
    fallback: Option<Rc<dyn PulseSource>>,
    visibility: Option<Rc<dyn Visibility>>,
    tokio_pulses: bool,
}

impl Default for SchedulerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SchedulerBuilder {
    /// Create a new scheduler builder with default options
    pub fn new() -> Self {
        Self::from_options(SchedulerOptions::default())
    }

    pub fn from_options(options: SchedulerOptions) -> Self {
        Self {
            options,
            clock: None,
            frame: None,
            fallback: None,
            visibility: None,
            tokio_pulses: false,
        }
    }

    /// Create with the `[scheduler]` table of a TOML config file
    pub fn with_toml<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::with_config(&load_toml_config(path)?)
    }

    /// Create with the `scheduler` section of a YAML config file
    pub fn with_yaml<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::with_config(&load_yaml_config(path)?)
    }

    /// Create with custom config
    pub fn with_config(config: &Config) -> Result<Self> {
        Ok(Self::from_options(SchedulerOptions::from_config(config)?))
    }

    pub fn heartbeat(mut self, heartbeat_ms: u64) -> Self {
        self.options.heartbeat = heartbeat_ms.into();
        self
    }

    pub fn keep_alive(mut self, keep_alive: bool) -> Self {
        self.options.keep_alive = keep_alive;
        self
    }

    pub fn clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Some(Rc::new(clock));
        self
    }

    /// Source used while the host is visible (and while hidden without keep-alive).
    pub fn frame_source(mut self, source: impl PulseSource + 'static) -> Self {
        self.frame = Some(Rc::new(source));
        self
    }

    /// Source used while the host is hidden and keep-alive is on.
    /// Defaults to the frame source.
    pub fn fallback_source(mut self, source: impl PulseSource + 'static) -> Self {
        self.fallback = Some(Rc::new(source));
        self
    }

    pub fn visibility(mut self, visibility: impl Visibility + 'static) -> Self {
        self.visibility = Some(Rc::new(visibility));
        self
    }

    /// Drive the loop with tokio timers, using the configured frame period
    /// and fallback delay. Explicitly set sources take precedence.
    pub fn tokio_pulses(mut self) -> Self {
        self.tokio_pulses = true;
        self
    }

    /// Build the scheduler (does not start it yet)
    ///
    /// # Example
    ///
    /// ```rust
    /// use cadence_runtime::{ManualClock, SchedulerBuilder};
    ///
    /// # fn main() -> Result<(), cadence_runtime::SchedulerError> {
    /// let scheduler = SchedulerBuilder::new()
    ///     .heartbeat(100)
    ///     .clock(ManualClock::new())
    ///     .build()?;
    /// assert!(!scheduler.is_running());
    /// # Ok(())
    /// # }
    /// ```
    pub fn build(self) -> Result<Scheduler> {
        let heartbeat = Heartbeat::new(self.options.heartbeat_ms()?)?;

        let (mut frame, mut fallback) = (self.frame, self.fallback);
        if self.tokio_pulses {
            let period = Duration::from_millis(self.options.frame_period_ms()?);
            let delay = Duration::from_millis(self.options.fallback_delay_ms()?);
            if frame.is_none() {
                frame = Some(Rc::new(TokioPulse::new(period)));
            }
            if fallback.is_none() {
                fallback = Some(Rc::new(TokioPulse::fallback(delay)));
            }
        }

        let pulses = frame.map(|frame| {
            let fallback = fallback.unwrap_or_else(|| frame.clone());
            let visibility = self
                .visibility
                .unwrap_or_else(|| Rc::new(AlwaysVisible) as Rc<dyn Visibility>);
            PulseSelector::new(frame, fallback, visibility, self.options.keep_alive)
        });

        info!(
            target: LOG_TARGET,
            heartbeat_ms = heartbeat.current(),
            keep_alive = self.options.keep_alive,
            pulse_mode = ?pulses.as_ref().map(PulseSelector::mode),
            "Building scheduler"
        );

        let clock = self
            .clock
            .unwrap_or_else(|| Rc::new(MonotonicClock::new()) as Rc<dyn Clock>);
        Ok(Scheduler::from_parts(
            heartbeat,
            self.options.keep_alive,
            clock,
            pulses,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SchedulerError;
    use crate::pulse::{ManualPulse, PulseMode, VisibilityFlag};
    use crate::time_unit::WaitValue;

    #[test]
    fn defaults() {
        let scheduler = SchedulerBuilder::new().build().unwrap();
        assert_eq!(scheduler.heartbeat(), 0);
        assert!(!scheduler.keep_alive());
        assert_eq!(scheduler.pulse_mode(), None);
    }

    #[test]
    fn heartbeat_above_maximum_is_rejected() {
        let result = SchedulerBuilder::new().heartbeat(86_400_001).build();
        assert!(matches!(result, Err(SchedulerError::OutOfRange { .. })));
    }

    #[test]
    fn textual_heartbeat_is_resolved() {
        let options = SchedulerOptions {
            heartbeat: WaitValue::from("1m"),
            ..SchedulerOptions::default()
        };
        let scheduler = SchedulerBuilder::from_options(options).build().unwrap();
        assert_eq!(scheduler.heartbeat(), 60_000);
        assert_eq!(scheduler.floor(), 60_000);
    }

    #[test]
    fn hidden_keep_alive_host_starts_on_fallback() {
        let scheduler = SchedulerBuilder::new()
            .keep_alive(true)
            .frame_source(ManualPulse::new())
            .fallback_source(ManualPulse::new())
            .visibility(VisibilityFlag::new(false))
            .build()
            .unwrap();
        assert_eq!(scheduler.pulse_mode(), Some(PulseMode::Fallback));
    }
}
