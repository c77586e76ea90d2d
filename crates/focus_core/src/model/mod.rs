mod stage;
mod task;

pub use stage::{DEFAULT_STAGE_DURATION_MINUTES, Stage, StageId, StageStatus};
pub use task::Task;
