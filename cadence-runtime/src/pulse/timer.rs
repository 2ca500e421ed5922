use super::{PulseCallback, PulseSource};
use std::time::Duration;

/// Frame period used for the frame role, roughly 60 pulses per second.
pub const DEFAULT_FRAME_PERIOD_MS: u64 = 16;

/// Default minimum delay of the fallback timer.
pub const DEFAULT_FALLBACK_DELAY_MS: u64 = 100;

/// Pulse source backed by `tokio::time::sleep`.
///
/// Pulses are spawned with [`tokio::task::spawn_local`], so requests must be
/// made from inside a [`tokio::task::LocalSet`]; this keeps the scheduler and
/// every callback on one thread.
#[derive(Debug, Clone, Copy)]
pub struct TokioPulse {
    period: Duration,
}

impl TokioPulse {
    pub fn new(period: Duration) -> Self {
        Self { period }
    }

    /// Source for the frame role.
    pub fn frame() -> Self {
        Self::new(Duration::from_millis(DEFAULT_FRAME_PERIOD_MS))
    }

    /// Source for the fallback role: fires after at least `delay`.
    pub fn fallback(delay: Duration) -> Self {
        Self::new(delay)
    }

    pub fn period(&self) -> Duration {
        self.period
    }
}

impl PulseSource for TokioPulse {
    fn request(&self, pulse: PulseCallback) {
        let period = self.period;
        tokio::task::spawn_local(async move {
            tokio::time::sleep(period).await;
            pulse();
        });
    }
}
