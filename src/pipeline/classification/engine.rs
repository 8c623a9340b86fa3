//! Full classification pass over one target.
//!
//! Stateless entry points: everything a pass needs (client, target, policy)
//! comes in as arguments, and the outcome is returned as a value.

use std::collections::HashSet;
use std::time::Instant;

use super::apply::apply_mapping;
use super::batcher::{batch_count, batches};
use super::client::LlmClient;
use super::dedup::unique_values;
use super::retry::classify_batch;
use super::types::*;
use crate::models::Record;

/// Outcome of classifying every distinct value of one target.
#[derive(Debug, Clone, Default)]
pub struct ClassificationPass {
    pub mapping: LabelMapping,
    pub batches: usize,
    pub api_calls: u32,
    pub duration_ms: u64,
}

impl ClassificationPass {
    pub fn classified(&self) -> usize {
        self.mapping.len() - self.mapping.unresolved_count()
    }

    pub fn unresolved(&self) -> usize {
        self.mapping.unresolved_count()
    }
}

/// Classify a set of distinct values, batch by batch, strictly in sequence.
///
/// Every input value ends up in the mapping exactly once, either with a label
/// from the model or with the sentinel.
pub fn classify_values(
    llm: &dyn LlmClient,
    target: &ClassificationTarget,
    config: &ClassifierConfig,
    values: &[String],
) -> ClassificationPass {
    let start = Instant::now();
    let total = batch_count(values.len(), target.batch_size);

    tracing::info!(
        target_kind = target.kind.as_str(),
        unique_values = values.len(),
        batch_size = target.batch_size,
        batches = total,
        "Starting classification pass"
    );

    let mut seen: HashSet<String> = HashSet::new();
    let mut mapping = LabelMapping::new();
    let mut api_calls = 0;

    for (i, batch) in batches(values, target.batch_size).enumerate() {
        tracing::info!(
            target_kind = target.kind.as_str(),
            batch = i + 1,
            total,
            size = batch.len(),
            "Classifying batch"
        );

        let report = classify_batch(llm, target, config, batch);
        api_calls += report.attempts;

        tracing::info!(
            batch = i + 1,
            classified = report.classified(),
            size = batch.len(),
            attempts = report.attempts,
            "Batch done"
        );

        // First occurrence wins across batches.
        for result in report.results {
            if seen.insert(result.original.clone()) {
                mapping.insert(result);
            }
        }
    }

    let pass = ClassificationPass {
        mapping,
        batches: total,
        api_calls,
        duration_ms: start.elapsed().as_millis() as u64,
    };

    tracing::info!(
        target_kind = target.kind.as_str(),
        classified = pass.classified(),
        unresolved = pass.unresolved(),
        api_calls = pass.api_calls,
        duration_ms = pass.duration_ms,
        "Classification pass complete"
    );

    pass
}

/// Deduplicate, classify and project labels back onto every record.
///
/// Returns the enriched copies alongside the pass summary; the input records
/// are left untouched.
pub fn classify_records(
    llm: &dyn LlmClient,
    target: &ClassificationTarget,
    config: &ClassifierConfig,
    records: &[Record],
) -> (Vec<Record>, ClassificationPass) {
    let values = unique_values(records, target.source_field);
    let pass = classify_values(llm, target, config, &values);
    let enriched = apply_mapping(records, target, &pass.mapping);
    (enriched, pass)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::classification::client::{MockLlmClient, ScriptedLlmClient};
    use serde_json::json;

    fn config() -> ClassifierConfig {
        ClassifierConfig::default().without_delays()
    }

    fn values(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("v{i}")).collect()
    }

    #[test]
    fn every_value_is_mapped_exactly_once() {
        // Model answers for a subset only and invents an extra value.
        let llm = MockLlmClient::new(
            r#"[{"original":"v0","normalized_title":"Разработчик"},{"original":"zzz","normalized_title":"Маркетолог"}]"#,
        );
        let vs = values(23);
        let target = ClassificationTarget::title().with_batch_size(5);
        let pass = classify_values(&llm, &target, &config(), &vs);

        assert_eq!(pass.mapping.len(), vs.len());
        assert!(!pass.mapping.contains("zzz"));
        assert_eq!(pass.batches, 5);
        assert_eq!(pass.classified(), 1);
        assert_eq!(pass.unresolved(), 22);
    }

    #[test]
    fn transport_failures_everywhere_still_cover_all_values() {
        let llm = ScriptedLlmClient::new();
        let vs = values(12);
        let pass = classify_values(&llm, &ClassificationTarget::field_of_activity(), &config(), &vs);

        assert_eq!(pass.mapping.len(), 12);
        assert_eq!(pass.unresolved(), 12);
        // two batches, two attempts each
        assert_eq!(pass.api_calls, 4);
        assert_eq!(llm.call_count(), 4);
    }

    #[test]
    fn empty_values_make_no_calls() {
        let llm = ScriptedLlmClient::new();
        let pass = classify_values(&llm, &ClassificationTarget::title(), &config(), &[]);
        assert_eq!(llm.call_count(), 0);
        assert!(pass.mapping.is_empty());
        assert_eq!(pass.batches, 0);
    }

    #[test]
    fn classify_records_enriches_copies() {
        let llm = MockLlmClient::new(
            r#"```json
[{"original":"Дата сайентист","normalized_title":"Аналитик данных"}]
```"#,
        );
        let records = vec![
            Record::from_json(json!({"id": 1, "title": "Дата сайентист"})).unwrap(),
            Record::from_json(json!({"id": 2, "title": " Дата сайентист "})).unwrap(),
            Record::from_json(json!({"id": 3})).unwrap(),
        ];
        let (enriched, pass) =
            classify_records(&llm, &ClassificationTarget::title(), &config(), &records);

        assert_eq!(pass.api_calls, 1);
        assert_eq!(enriched.len(), 3);
        assert_eq!(enriched[0].text("normalized_title").as_deref(), Some("Аналитик данных"));
        assert_eq!(enriched[1].text("normalized_title").as_deref(), Some("Аналитик данных"));
        assert_eq!(enriched[2].text("normalized_title").as_deref(), Some(NOT_SPECIFIED_LABEL));
        assert!(records[0].get("normalized_title").is_none());
    }
}
