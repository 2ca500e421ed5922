mod params;
mod runnable;
#[allow(clippy::module_inception)]
mod task;

pub use params::TaskDef;
pub use runnable::{Runnable, TaskContext};
pub use task::{FireOutcome, Task, TaskInfo, TaskKind};
