//! Batch classification engine.
//!
//! Normalizes one free-text column into a closed taxonomy by sending batches of
//! distinct values to an LLM completion API:
//! ```text
//! dedup → batcher → prompt → client → parser → retry → engine → apply
//! ```
//!
//! Nothing in this module fails past its own boundary. Transport errors and
//! malformed model output are retried and finally degrade to the sentinel label;
//! the worst case is a fully sentinel-labeled dataset, never an aborted run.

pub mod types;
pub mod taxonomy;
pub mod dedup;
pub mod batcher;
pub mod prompt;
pub mod parser;
pub mod client;
pub mod retry;
pub mod engine;
pub mod apply;
pub mod stats;

pub use types::*;
pub use taxonomy::TaxonomyEntry;
pub use dedup::unique_values;
pub use batcher::batches;
pub use prompt::build_prompt;
pub use parser::{parse_model_response, parse_results};
pub use client::{LlmClient, MockLlmClient, ScriptedLlmClient, YandexGptClient, YandexGptConfig};
pub use retry::{classify_batch, evaluate_response, BatchReport, Evaluation};
pub use engine::{classify_records, classify_values, ClassificationPass};
pub use apply::apply_mapping;
pub use stats::LabelDistribution;

use thiserror::Error;

/// Failure of a single completion call. Absorbed by the retry controller.
#[derive(Error, Debug)]
pub enum ClassificationError {
    #[error("Completion API is unreachable at {0}")]
    Connection(String),

    #[error("Completion API returned error (status {status}): {body}")]
    Api { status: u16, body: String },

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Unexpected completion response shape: {0}")]
    ResponseShape(String),
}
