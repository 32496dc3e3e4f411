// Pipeline orchestration: stage sequencing, progress reporting and the
// background worker.

pub mod orchestrator;
pub mod progress;
pub mod worker;

pub use orchestrator::{Pipeline, PipelineOutcome};
pub use progress::ProgressLog;
pub use worker::{spawn_pipeline, PipelineHandle};
