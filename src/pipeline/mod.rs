// file: src/pipeline/mod.rs
// description: pipeline module exports and public api
// reference: pipeline orchestration

mod aggregator;
mod orchestrator;
mod processor;
mod progress;
mod response;
mod state;

pub use aggregator::{SummaryAggregator, aggregate, undocumented};
pub use orchestrator::PipelineOrchestrator;
pub use processor::FileProcessor;
pub use progress::{PipelineStats, ProgressTracker};
pub use response::{PipelineReport, PipelineRequest, PipelineResponse};
pub use state::{PipelineState, RunState};
