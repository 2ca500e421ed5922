use crate::error::{Result, SchedulerError};
use crate::pulse::{DEFAULT_FALLBACK_DELAY_MS, DEFAULT_FRAME_PERIOD_MS};
use crate::task::TaskDef;
use crate::time_unit::WaitValue;
use config::{Config, File, FileFormat};
use serde::Deserialize;
use std::path::Path;

/// Table holding scheduler options in a config file.
pub const SCHEDULER_SECTION: &str = "scheduler";

/// Table holding task definitions in a config file.
pub const TASKS_SECTION: &str = "tasks";

/// Prefix of environment variables layered over config files,
/// e.g. `CADENCE_SCHEDULER__HEARTBEAT=250`.
pub const ENV_PREFIX: &str = "CADENCE";

/// Construction options for a scheduler.
///
/// A bare number converts into options with that heartbeat.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SchedulerOptions {
    /// Minimum wait between ticks; also the floor for later heartbeat changes.
    pub heartbeat: WaitValue,
    /// Keep running on the fallback timer while the host is hidden.
    #[serde(alias = "keepAlive", alias = "keepalive")]
    pub keep_alive: bool,
    #[serde(alias = "fallbackDelay", alias = "fallbackdelay")]
    pub fallback_delay: WaitValue,
    #[serde(alias = "framePeriod", alias = "frameperiod")]
    pub frame_period: WaitValue,
}

impl Default for SchedulerOptions {
    fn default() -> Self {
        Self {
            heartbeat: WaitValue::Millis(0),
            keep_alive: false,
            fallback_delay: WaitValue::Millis(DEFAULT_FALLBACK_DELAY_MS),
            frame_period: WaitValue::Millis(DEFAULT_FRAME_PERIOD_MS),
        }
    }
}

impl From<u64> for SchedulerOptions {
    fn from(heartbeat: u64) -> Self {
        Self {
            heartbeat: WaitValue::Millis(heartbeat),
            ..Self::default()
        }
    }
}

impl SchedulerOptions {
    pub fn heartbeat_ms(&self) -> Result<u64> {
        self.heartbeat.to_millis().map_err(SchedulerError::InvalidWait)
    }

    pub fn fallback_delay_ms(&self) -> Result<u64> {
        self.fallback_delay.to_millis().map_err(SchedulerError::InvalidWait)
    }

    pub fn frame_period_ms(&self) -> Result<u64> {
        self.frame_period.to_millis().map_err(SchedulerError::InvalidWait)
    }

    /// Read the `[scheduler]` table, falling back to defaults when absent.
    pub fn from_config(config: &Config) -> Result<Self> {
        match config.get::<SchedulerOptions>(SCHEDULER_SECTION) {
            Ok(options) => Ok(options),
            Err(config::ConfigError::NotFound(_)) => Ok(Self::default()),
            Err(err) => Err(err.into()),
        }
    }
}

fn load_config(path: &Path, format: FileFormat) -> Result<Config> {
    let config = Config::builder()
        .add_source(File::from(path).format(format))
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;
    Ok(config)
}

/// Load config from a specific TOML file
pub fn load_toml_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    load_config(path.as_ref(), FileFormat::Toml)
}

/// Load config from a specific YAML file
pub fn load_yaml_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    load_config(path.as_ref(), FileFormat::Yaml)
}

/// Read the `[[tasks]]` array of task definitions. Missing means none.
///
/// A definition with a field of the wrong type, such as `name = 5`, fails as a
/// validation error.
pub fn task_defs_from_config(config: &Config) -> Result<Vec<TaskDef>> {
    match config.get::<Vec<TaskDef>>(TASKS_SECTION) {
        Ok(defs) => Ok(defs),
        Err(config::ConfigError::NotFound(_)) => Ok(Vec::new()),
        Err(err) => Err(SchedulerError::validation(TASKS_SECTION, err.to_string())),
    }
}
