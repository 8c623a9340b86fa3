//! One end-to-end enrichment run.
//!
//! Stages, strictly sequential:
//! ```text
//! find sources → load + merge → title pass → field pass → persist
//! ```
//! An empty source listing or an empty merged dataset short-circuits the run
//! without writing anything. Classification passes never fail the run.

use std::time::Instant;

use chrono::NaiveDateTime;
use thiserror::Error;
use uuid::Uuid;

use super::classification::{
    classify_records, ClassificationTarget, ClassifierConfig, LabelDistribution, LlmClient,
};
use super::ingest::{
    decode_csv, encode_csv, merge_sources, select_source_keys, IngestError, MergeOutcome,
    DEFAULT_MAX_SOURCE_FILES,
};
use crate::config::{OUTPUT_PREFIX, SOURCE_PREFIX};
use crate::models::Dataset;
use crate::storage::{ObjectStore, StorageError};

/// Column with the compact run timestamp (`%Y%m%d_%H%M%S`).
pub const PROCESSING_DATE_FIELD: &str = "_processing_date";
/// Column with the ISO-8601 run timestamp.
pub const PROCESSING_TIMESTAMP_FIELD: &str = "_processing_timestamp";

const OUTPUT_CONTENT_TYPE: &str = "text/csv";
const TOP_LABELS_LOGGED: usize = 5;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Ingestion error: {0}")]
    Ingest(#[from] IngestError),
}

/// Knobs for one run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub source_prefix: String,
    pub output_prefix: String,
    pub max_source_files: usize,
    pub classifier: ClassifierConfig,
    pub title_target: ClassificationTarget,
    pub field_target: ClassificationTarget,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            source_prefix: SOURCE_PREFIX.to_string(),
            output_prefix: OUTPUT_PREFIX.to_string(),
            max_source_files: DEFAULT_MAX_SOURCE_FILES,
            classifier: ClassifierConfig::default(),
            title_target: ClassificationTarget::title(),
            field_target: ClassificationTarget::field_of_activity(),
        }
    }
}

/// Why a run produced no output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NoSourceFiles,
    NoRecords,
}

/// Where the enriched dataset went.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedOutput {
    pub key: String,
    pub record_count: usize,
    pub size_bytes: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Stored(PersistedOutput),
    Skipped(SkipReason),
}

/// Runs the enrichment stages against a store and a completion client.
pub struct PipelineRunner<'a> {
    store: &'a dyn ObjectStore,
    llm: &'a dyn LlmClient,
    config: PipelineConfig,
}

impl<'a> PipelineRunner<'a> {
    pub fn new(store: &'a dyn ObjectStore, llm: &'a dyn LlmClient, config: PipelineConfig) -> Self {
        Self { store, llm, config }
    }

    /// Run with the current local time as the processing timestamp.
    pub fn run(&self) -> Result<RunOutcome, PipelineError> {
        self.run_at(chrono::Local::now().naive_local())
    }

    /// Run with an explicit processing timestamp.
    pub fn run_at(&self, now: NaiveDateTime) -> Result<RunOutcome, PipelineError> {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("pipeline_run", %run_id);
        let _guard = span.enter();
        let start = Instant::now();

        let keys = self.find_source_files()?;
        if keys.is_empty() {
            tracing::warn!(prefix = %self.config.source_prefix, "No source files to process");
            return Ok(RunOutcome::Skipped(SkipReason::NoSourceFiles));
        }

        let merged = self.load_records(&keys)?;
        if merged.dataset.is_empty() {
            tracing::warn!(files = keys.len(), "No records found in source files");
            return Ok(RunOutcome::Skipped(SkipReason::NoRecords));
        }

        let enriched = self.enrich(merged.dataset);
        let output = self.persist(enriched, now)?;

        tracing::info!(
            key = %output.key,
            records = output.record_count,
            duration_ms = start.elapsed().as_millis() as u64,
            "Pipeline run complete"
        );
        Ok(RunOutcome::Stored(output))
    }

    /// Stage 1: the newest CSV exports under the source prefix.
    pub fn find_source_files(&self) -> Result<Vec<String>, PipelineError> {
        let listing = self.store.list_keys(&self.config.source_prefix)?;
        let selected = select_source_keys(&listing, self.config.max_source_files);
        tracing::info!(
            listed = listing.len(),
            selected = selected.len(),
            files = ?selected,
            "Source files selected"
        );
        Ok(selected)
    }

    /// Stage 2: fetch, decode and merge the selected exports.
    pub fn load_records(&self, keys: &[String]) -> Result<MergeOutcome, PipelineError> {
        let mut sources = Vec::with_capacity(keys.len());
        for key in keys {
            let text = self.store.get_text(key)?;
            let decoded = decode_csv(key, &text)?;
            tracing::info!(
                key = %key,
                records = decoded.dataset.len(),
                skipped = decoded.skipped,
                "Source file loaded"
            );
            sources.push(decoded.dataset);
        }

        let merged = merge_sources(sources);
        tracing::info!(
            input_rows = merged.input_rows,
            exact_duplicates = merged.exact_duplicates,
            id_duplicates = merged.id_duplicates,
            records = merged.dataset.len(),
            "Sources merged"
        );
        Ok(merged)
    }

    /// Stages 3 and 4: title pass, then field-of-activity pass.
    pub fn enrich(&self, mut dataset: Dataset) -> Dataset {
        for target in [&self.config.title_target, &self.config.field_target] {
            let (enriched, _pass) =
                classify_records(self.llm, target, &self.config.classifier, &dataset.records);
            dataset.records = enriched;

            for field in target.output_fields() {
                dataset.ensure_column(field);
                LabelDistribution::from_records(&dataset.records, field)
                    .log(field, TOP_LABELS_LOGGED);
            }
        }
        dataset
    }

    /// Stage 5: stamp, encode and store the enriched dataset.
    pub fn persist(
        &self,
        dataset: Dataset,
        now: NaiveDateTime,
    ) -> Result<PersistedOutput, PipelineError> {
        let processing_date = now.format("%Y%m%d_%H%M%S").to_string();
        let processing_timestamp = now.format("%Y-%m-%dT%H:%M:%S%.6f").to_string();

        let mut dataset = dataset;
        dataset.ensure_column(PROCESSING_DATE_FIELD);
        dataset.ensure_column(PROCESSING_TIMESTAMP_FIELD);
        for record in &mut dataset.records {
            record.insert(PROCESSING_DATE_FIELD, processing_date.as_str());
            record.insert(PROCESSING_TIMESTAMP_FIELD, processing_timestamp.as_str());
        }

        let body = encode_csv(&dataset)?;
        let key = output_key(&self.config.output_prefix, &processing_date);
        self.store.put_object(&key, &body, OUTPUT_CONTENT_TYPE)?;

        tracing::info!(
            key = %key,
            records = dataset.len(),
            columns = dataset.columns.len(),
            size = body.len(),
            "Enriched dataset stored"
        );

        Ok(PersistedOutput {
            key,
            record_count: dataset.len(),
            size_bytes: body.len(),
        })
    }
}

/// `{prefix}vacancies_normalized_{processing_date}.csv`
pub fn output_key(prefix: &str, processing_date: &str) -> String {
    format!("{prefix}vacancies_normalized_{processing_date}.csv")
}
