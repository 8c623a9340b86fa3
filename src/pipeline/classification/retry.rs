//! Per-batch retry controller.
//!
//! Each batch runs its own attempt loop (attempts `0..=max_retries`):
//! ```text
//! current = batch
//! loop attempt:
//!   current empty            → done
//!   call API
//!     transport error        → last attempt ? sentinel(current), done : backoff, retry same set
//!     reply                  → parse, drop foreign entries, split successful / failed
//!                              accumulate successful; current = failed values
//!                              failed empty ? done : pause, next attempt
//! leftover current           → sentinel
//! ```
//! Every outcome is a value; nothing escapes as an error.

use std::collections::HashSet;
use std::thread;
use std::time::Duration;

use super::client::LlmClient;
use super::parser::{parse_model_response, parse_results};
use super::prompt::build_prompt;
use super::types::*;
use super::ClassificationError;

/// Result of checking one reply against the values that were submitted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Evaluation {
    /// Accepted results, at most one per submitted value.
    pub successful: Vec<ClassificationResult>,
    /// Submitted values still lacking a valid label, in submission order.
    pub failed: Vec<String>,
    /// Entries naming values that were not submitted.
    pub foreign_dropped: usize,
    /// True when nothing could be recovered from the reply text.
    pub unparsable: bool,
}

/// What a single attempt produced.
#[derive(Debug)]
enum AttemptOutcome {
    Responded(Evaluation),
    TransportFailed(ClassificationError),
}

/// Final state of one batch after its attempt loop.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    /// One entry per batch value; sentinel entries for unresolved ones.
    pub results: Vec<ClassificationResult>,
    /// API calls made.
    pub attempts: u32,
    /// Values that ended on the sentinel label.
    pub unresolved: usize,
}

impl BatchReport {
    pub fn classified(&self) -> usize {
        self.results.len() - self.unresolved
    }
}

/// Classify one batch, retrying only the values that failed.
pub fn classify_batch(
    llm: &dyn LlmClient,
    target: &ClassificationTarget,
    config: &ClassifierConfig,
    batch: &[String],
) -> BatchReport {
    let mut current: Vec<String> = dedup_preserving_order(batch);
    let mut accumulated: Vec<ClassificationResult> = Vec::with_capacity(current.len());
    let mut attempts = 0;

    for attempt in 0..=config.max_retries {
        if current.is_empty() {
            break;
        }
        let is_last = attempt == config.max_retries;

        tracing::debug!(
            target_kind = target.kind.as_str(),
            attempt = attempt + 1,
            values = current.len(),
            "Submitting batch attempt"
        );
        attempts += 1;

        match run_attempt(llm, target, config, &current, attempt) {
            AttemptOutcome::TransportFailed(e) => {
                tracing::warn!(
                    target_kind = target.kind.as_str(),
                    attempt = attempt + 1,
                    error = %e,
                    "Classification request failed"
                );
                if is_last {
                    break;
                }
                pause(config.error_backoff);
            }
            AttemptOutcome::Responded(evaluation) => {
                if evaluation.unparsable {
                    tracing::warn!(
                        target_kind = target.kind.as_str(),
                        attempt = attempt + 1,
                        "No valid JSON in model reply"
                    );
                }
                if evaluation.foreign_dropped > 0 {
                    tracing::debug!(
                        dropped = evaluation.foreign_dropped,
                        "Dropped entries for values outside the batch"
                    );
                }
                tracing::debug!(
                    classified = evaluation.successful.len(),
                    failed = evaluation.failed.len(),
                    "Attempt evaluated"
                );

                accumulated.extend(evaluation.successful);
                current = evaluation.failed;

                if current.is_empty() {
                    break;
                }
                if !is_last {
                    pause(config.retry_delay);
                }
            }
        }
    }

    let unresolved = current.len();
    accumulated.extend(
        current
            .iter()
            .map(|v| ClassificationResult::sentinel(v, target)),
    );

    BatchReport {
        results: accumulated,
        attempts,
        unresolved,
    }
}

fn run_attempt(
    llm: &dyn LlmClient,
    target: &ClassificationTarget,
    config: &ClassifierConfig,
    current: &[String],
    attempt: u32,
) -> AttemptOutcome {
    let prompt = build_prompt(target, current, attempt);
    match llm.generate(&prompt) {
        Ok(reply) => AttemptOutcome::Responded(evaluate_response(target, config, current, &reply)),
        Err(e) => AttemptOutcome::TransportFailed(e),
    }
}

/// Parse a reply and split it against the submitted values.
///
/// A submitted value is successful when at least one entry for it carries a
/// non-empty label other than the sentinel (and, where the target says so,
/// other than the catch-all). Values with no acceptable entry, including
/// values the reply never mentions, are failed.
pub fn evaluate_response(
    target: &ClassificationTarget,
    config: &ClassifierConfig,
    submitted: &[String],
    reply: &str,
) -> Evaluation {
    let values = parse_model_response(reply);
    let unparsable = values.is_empty();
    let parsed = parse_results(&values, target);

    let members: HashSet<&str> = submitted.iter().map(String::as_str).collect();
    let mut resolved: HashSet<String> = HashSet::new();
    let mut successful = Vec::new();
    let mut foreign_dropped = 0;

    for result in parsed {
        if !members.contains(result.original.as_str()) {
            foreign_dropped += 1;
            continue;
        }
        if resolved.contains(&result.original) || !is_acceptable(target, config, &result) {
            continue;
        }
        resolved.insert(result.original.clone());
        successful.push(result);
    }

    let failed = submitted
        .iter()
        .filter(|v| !resolved.contains(v.as_str()))
        .cloned()
        .collect();

    Evaluation {
        successful,
        failed,
        foreign_dropped,
        unparsable,
    }
}

fn is_acceptable(
    target: &ClassificationTarget,
    config: &ClassifierConfig,
    result: &ClassificationResult,
) -> bool {
    let label = result.label.as_str();
    if label.is_empty() || label == SENTINEL_LABEL || label == NOT_SPECIFIED_LABEL {
        return false;
    }
    if target.catch_all_is_failure && label == CATCH_ALL_LABEL {
        return false;
    }
    if !target.in_taxonomy(label) {
        tracing::warn!(
            target_kind = target.kind.as_str(),
            label,
            strict = config.strict_taxonomy,
            "Model returned a label outside the taxonomy"
        );
        return !config.strict_taxonomy;
    }
    true
}

fn dedup_preserving_order(values: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .iter()
        .filter(|v| seen.insert(v.as_str()))
        .cloned()
        .collect()
}

fn pause(duration: Duration) {
    if !duration.is_zero() {
        thread::sleep(duration);
    }
}
