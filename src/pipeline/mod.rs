pub mod classification;
pub mod ingest;
pub mod runner;


pub use runner::{
    output_key, PersistedOutput, PipelineConfig, PipelineError, PipelineRunner, RunOutcome,
    SkipReason,
};
