mod builder;
mod heartbeat;
#[allow(clippy::module_inception)]
mod scheduler;

pub use builder::SchedulerBuilder;
pub use heartbeat::MAX_HEARTBEAT_MS;
pub use scheduler::{Pulse, Scheduler, TickSummary};
