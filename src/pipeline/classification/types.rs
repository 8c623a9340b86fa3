use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::taxonomy::{self, TaxonomyEntry, FIELD_TAXONOMY, TITLE_TAXONOMY};

// ═══════════════════════════════════════════
// Reserved labels
// ═══════════════════════════════════════════

/// Assigned to values that exhaust their retry budget without a valid label.
pub const SENTINEL_LABEL: &str = "Не определена";

/// Assigned to records whose source field is missing or blank.
pub const NOT_SPECIFIED_LABEL: &str = "Не указано";

/// The taxonomies' own catch-all. A valid but non-specific classification.
pub const CATCH_ALL_LABEL: &str = "Другое";

// ═══════════════════════════════════════════
// Classification target
// ═══════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    Title,
    FieldOfActivity,
}

impl TargetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::FieldOfActivity => "field_of_activity",
        }
    }
}

impl std::fmt::Display for TargetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything that differs between the title pass and the field pass.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationTarget {
    pub kind: TargetKind,
    /// Record column holding the free text to normalize.
    pub source_field: &'static str,
    /// Response key and output column for the primary label.
    pub label_field: &'static str,
    /// Response key and output column for the optional secondary label.
    pub secondary_field: Option<&'static str>,
    pub taxonomy: &'static [TaxonomyEntry],
    pub batch_size: usize,
    /// When true, a catch-all answer is retried like an unresolved one.
    pub catch_all_is_failure: bool,
}

impl ClassificationTarget {
    /// Job-title normalization: `title` → `normalized_title`.
    pub fn title() -> Self {
        Self {
            kind: TargetKind::Title,
            source_field: "title",
            label_field: "normalized_title",
            secondary_field: None,
            taxonomy: TITLE_TAXONOMY,
            batch_size: 15,
            catch_all_is_failure: false,
        }
    }

    /// Field-of-activity normalization: `ai_field_of_activity` → `category` + `specialization`.
    pub fn field_of_activity() -> Self {
        Self {
            kind: TargetKind::FieldOfActivity,
            source_field: "ai_field_of_activity",
            label_field: "category",
            secondary_field: Some("specialization"),
            taxonomy: FIELD_TAXONOMY,
            batch_size: 10,
            catch_all_is_failure: true,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Columns this target adds to every record.
    pub fn output_fields(&self) -> Vec<&'static str> {
        let mut fields = vec![self.label_field];
        fields.extend(self.secondary_field);
        fields
    }

    pub fn in_taxonomy(&self, label: &str) -> bool {
        taxonomy::contains(self.taxonomy, label)
    }
}

// ═══════════════════════════════════════════
// Results
// ═══════════════════════════════════════════

/// One classified value as reported by the model (or synthesized on fallback).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassificationResult {
    pub original: String,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secondary: Option<String>,
}

impl ClassificationResult {
    /// Sentinel-labeled entry for a value that could not be classified.
    pub fn sentinel(original: &str, target: &ClassificationTarget) -> Self {
        Self {
            original: original.to_string(),
            label: SENTINEL_LABEL.to_string(),
            secondary: target
                .secondary_field
                .map(|_| SENTINEL_LABEL.to_string()),
        }
    }

    pub fn is_sentinel(&self) -> bool {
        self.label == SENTINEL_LABEL
    }
}

/// Accumulated original value → result table for one pass.
///
/// Once a value holds a non-sentinel result it is never overwritten.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabelMapping {
    entries: HashMap<String, ClassificationResult>,
}

impl LabelMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one result in. Returns `true` when the mapping changed.
    pub fn insert(&mut self, result: ClassificationResult) -> bool {
        match self.entries.get(&result.original) {
            Some(existing) if !existing.is_sentinel() => false,
            Some(existing) if result.is_sentinel() && existing.is_sentinel() => false,
            _ => {
                self.entries.insert(result.original.clone(), result);
                true
            }
        }
    }

    pub fn get(&self, original: &str) -> Option<&ClassificationResult> {
        self.entries.get(original)
    }

    pub fn contains(&self, original: &str) -> bool {
        self.entries.contains_key(original)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of values that ended on the sentinel label.
    pub fn unresolved_count(&self) -> usize {
        self.entries.values().filter(|r| r.is_sentinel()).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ClassificationResult> {
        self.entries.values()
    }
}

// ═══════════════════════════════════════════
// Configuration
// ═══════════════════════════════════════════

/// Retry policy and acceptance rules shared by every batch of a pass.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifierConfig {
    /// Additional attempts after the first one (attempts are 0..=max_retries).
    pub max_retries: u32,
    /// Pause before resubmitting values the model failed to classify.
    pub retry_delay: Duration,
    /// Pause after a transport or HTTP failure.
    pub error_backoff: Duration,
    /// Reject labels that are not in the target taxonomy.
    pub strict_taxonomy: bool,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            max_retries: 1,
            retry_delay: Duration::from_secs(2),
            error_backoff: Duration::from_secs(3),
            strict_taxonomy: false,
        }
    }
}

impl ClassifierConfig {
    /// Same policy with every pause removed.
    pub fn without_delays(mut self) -> Self {
        self.retry_delay = Duration::ZERO;
        self.error_backoff = Duration::ZERO;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(original: &str, label: &str) -> ClassificationResult {
        ClassificationResult {
            original: original.into(),
            label: label.into(),
            secondary: None,
        }
    }

    #[test]
    fn title_target_defaults() {
        let t = ClassificationTarget::title();
        assert_eq!(t.batch_size, 15);
        assert_eq!(t.output_fields(), vec!["normalized_title"]);
        assert!(!t.catch_all_is_failure);
    }

    #[test]
    fn field_target_defaults() {
        let t = ClassificationTarget::field_of_activity();
        assert_eq!(t.batch_size, 10);
        assert_eq!(t.output_fields(), vec!["category", "specialization"]);
        assert!(t.catch_all_is_failure);
        assert!(t.in_taxonomy("Финансы"));
    }

    #[test]
    fn sentinel_fills_secondary_only_when_target_has_one() {
        let title = ClassificationResult::sentinel("x", &ClassificationTarget::title());
        assert_eq!(title.secondary, None);
        let field =
            ClassificationResult::sentinel("x", &ClassificationTarget::field_of_activity());
        assert_eq!(field.secondary.as_deref(), Some(SENTINEL_LABEL));
    }

    #[test]
    fn mapping_never_overwrites_valid_label() {
        let mut mapping = LabelMapping::new();
        assert!(mapping.insert(result("a", "Разработчик")));
        assert!(!mapping.insert(result("a", "Маркетолог")));
        assert!(!mapping.insert(result("a", SENTINEL_LABEL)));
        assert_eq!(mapping.get("a").unwrap().label, "Разработчик");
    }

    #[test]
    fn mapping_upgrades_sentinel() {
        let mut mapping = LabelMapping::new();
        mapping.insert(result("a", SENTINEL_LABEL));
        assert_eq!(mapping.unresolved_count(), 1);
        assert!(mapping.insert(result("a", "Маркетолог")));
        assert_eq!(mapping.unresolved_count(), 0);
        assert_eq!(mapping.len(), 1);
    }

    #[test]
    fn default_config_matches_pipeline_policy() {
        let config = ClassifierConfig::default();
        assert_eq!(config.max_retries, 1);
        assert_eq!(config.retry_delay, Duration::from_secs(2));
        assert_eq!(config.error_backoff, Duration::from_secs(3));
        assert!(!config.strict_taxonomy);
    }

    #[test]
    fn without_delays_keeps_retry_budget() {
        let config = ClassifierConfig::default().without_delays();
        assert_eq!(config.max_retries, 1);
        assert!(config.retry_delay.is_zero());
        assert!(config.error_backoff.is_zero());
    }

    #[test]
    fn target_kind_serde() {
        let json = serde_json::to_string(&TargetKind::FieldOfActivity).unwrap();
        assert_eq!(json, "\"field_of_activity\"");
    }

    #[test]
    fn result_serializes_without_missing_secondary() {
        let result = ClassificationResult::sentinel("QA", &ClassificationTarget::title());
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"original": "QA", "label": SENTINEL_LABEL})
        );
    }
}
