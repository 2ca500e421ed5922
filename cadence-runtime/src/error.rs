use thiserror::Error;

/// Errors returned by scheduler and task operations.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// Task parameters failed validation
    #[error("invalid parameters for task '{name}': {reason}")]
    Validation { name: String, reason: String },

    #[error("task '{0}' already exists, use replace to overwrite it")]
    DuplicateName(String),

    #[error("task '{0}' does not exist")]
    NotFound(String),

    /// Heartbeat candidate equal to the current value or outside the allowed range
    #[error("heartbeat {value}ms rejected: {reason}")]
    OutOfRange { value: u64, reason: String },

    #[error("'{0}' is not a valid wait value")]
    InvalidWait(String),

    /// User callback returned an error or panicked
    #[error("callback of task '{name}' failed: {reason}")]
    TaskCallback { name: String, reason: String },

    /// Scheduler bookkeeping failed while evaluating a task
    #[error("tick fault while evaluating task '{name}': {reason}")]
    TickFault { name: String, reason: String },

    #[error("task '{0}' is running its callback")]
    TaskBusy(String),

    #[error("a tick pass is already in progress")]
    TickInProgress,

    #[error("task registry is in use by another operation")]
    RegistryBusy,

    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type alias for scheduler operations
pub type Result<T> = std::result::Result<T, SchedulerError>;

/// Error type user callbacks may return
pub type CallbackError = Box<dyn std::error::Error>;

/// Return type of task callbacks
pub type CallbackResult = std::result::Result<(), CallbackError>;

impl From<config::ConfigError> for SchedulerError {
    fn from(err: config::ConfigError) -> Self {
        SchedulerError::Config(err.to_string())
    }
}

impl SchedulerError {
    pub(crate) fn validation(name: &str, reason: impl Into<String>) -> Self {
        SchedulerError::Validation {
            name: name.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn out_of_range(value: u64, reason: impl Into<String>) -> Self {
        SchedulerError::OutOfRange {
            value,
            reason: reason.into(),
        }
    }
}
