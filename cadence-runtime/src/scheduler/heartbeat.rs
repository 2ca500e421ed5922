use crate::error::{Result, SchedulerError};

/// Upper bound for the heartbeat: one day.
pub const MAX_HEARTBEAT_MS: u64 = 24 * 60 * 60 * 1000;

/// Minimum wait between tick evaluations.
///
/// The floor starts at the construction value and rises with every accepted
/// change, so the heartbeat can only grow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Heartbeat {
    floor: u64,
    current: u64,
}

impl Heartbeat {
    pub(crate) fn new(ms: u64) -> Result<Self> {
        if ms > MAX_HEARTBEAT_MS {
            return Err(SchedulerError::out_of_range(
                ms,
                format!("above the maximum of {}ms", MAX_HEARTBEAT_MS),
            ));
        }
        Ok(Self {
            floor: ms,
            current: ms,
        })
    }

    pub(crate) fn current(&self) -> u64 {
        self.current
    }

    pub(crate) fn floor(&self) -> u64 {
        self.floor
    }

    /// Check `ms` against the current value and `[floor, MAX_HEARTBEAT_MS]`.
    pub(crate) fn check(&self, ms: u64) -> Result<()> {
        if ms == self.current {
            return Err(SchedulerError::out_of_range(ms, "equal to the current heartbeat"));
        }
        if ms < self.floor {
            return Err(SchedulerError::out_of_range(
                ms,
                format!("below the floor of {}ms", self.floor),
            ));
        }
        if ms > MAX_HEARTBEAT_MS {
            return Err(SchedulerError::out_of_range(
                ms,
                format!("above the maximum of {}ms", MAX_HEARTBEAT_MS),
            ));
        }
        Ok(())
    }

    /// Apply a checked value, returning the previous heartbeat.
    pub(crate) fn change(&mut self, ms: u64) -> Result<u64> {
        self.check(ms)?;
        let previous = self.current;
        self.current = ms;
        self.floor = self.floor.max(ms);
        Ok(previous)
    }
}
