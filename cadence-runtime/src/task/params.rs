use crate::error::{Result, SchedulerError};
use crate::time_unit::WaitValue;
use serde::de::{self, Deserializer, Visitor};
use serde::Deserialize;
use std::fmt;

/// Parameters for creating a task, without its callback.
///
/// A definition with an `after` delay describes a one-shot task; otherwise an
/// `interval` is required and the task recurs, optionally capped at
/// `iterations` firings. When `after` is present, `interval` and `iterations`
/// are ignored. Unknown fields are ignored when deserializing.
///
/// # Example
///
/// ```rust
/// use cadence_runtime::TaskDef;
///
/// let splash = TaskDef::after("hide-splash", 1500);
/// let poll = TaskDef::every("poll", "5s").iterations(10);
/// # let _ = (splash, poll);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TaskDef {
    #[serde(default, deserialize_with = "name_from_str")]
    pub name: String,
    #[serde(default)]
    pub after: Option<WaitValue>,
    #[serde(default)]
    pub interval: Option<WaitValue>,
    #[serde(default)]
    pub iterations: Option<u32>,
}

/// Accept only string names. Numbers and booleans are not coerced, so
/// `name = 5` in a config file fails instead of becoming `"5"`.
fn name_from_str<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    struct NameVisitor;

    impl<'de> Visitor<'de> for NameVisitor {
        type Value = String;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a task name string")
        }

        fn visit_str<E: de::Error>(self, value: &str) -> std::result::Result<String, E> {
            Ok(value.to_string())
        }

        fn visit_string<E: de::Error>(self, value: String) -> std::result::Result<String, E> {
            Ok(value)
        }
    }

    deserializer.deserialize_any(NameVisitor)
}

/// Validated timing for a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Schedule {
    After { delay: u64 },
    Every { interval: u64, iterations: u32 },
}

impl TaskDef {
    /// One-shot task firing once `delay` has passed.
    pub fn after(name: impl Into<String>, delay: impl Into<WaitValue>) -> Self {
        Self {
            name: name.into(),
            after: Some(delay.into()),
            ..Self::default()
        }
    }

    /// Recurring task firing every `interval`.
    pub fn every(name: impl Into<String>, interval: impl Into<WaitValue>) -> Self {
        Self {
            name: name.into(),
            interval: Some(interval.into()),
            ..Self::default()
        }
    }

    /// Cap a recurring task at `count` firings (0 = unlimited).
    pub fn iterations(mut self, count: u32) -> Self {
        self.iterations = Some(count);
        self
    }

    pub(crate) fn validate(&self) -> Result<Schedule> {
        if self.name.trim().is_empty() {
            return Err(SchedulerError::validation(
                &self.name,
                "name must be a non-empty string",
            ));
        }

        if let Some(after) = &self.after {
            let delay = after.to_millis().map_err(|text| {
                SchedulerError::validation(&self.name, format!("'after' is not a wait: {}", text))
            })?;
            return Ok(Schedule::After { delay });
        }

        let interval = self
            .interval
            .as_ref()
            .ok_or_else(|| {
                SchedulerError::validation(&self.name, "either 'after' or 'interval' is required")
            })?
            .to_millis()
            .map_err(|text| {
                SchedulerError::validation(
                    &self.name,
                    format!("'interval' is not a wait: {}", text),
                )
            })?;

        Ok(Schedule::Every {
            interval,
            iterations: self.iterations.unwrap_or(0),
        })
    }
}
