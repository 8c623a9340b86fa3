//! Label distribution and success rate of an enriched dataset.

use std::collections::HashMap;

use super::types::{CATCH_ALL_LABEL, NOT_SPECIFIED_LABEL, SENTINEL_LABEL};
use crate::models::Record;

/// Count of records per label for one output column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabelDistribution {
    /// (label, count), most frequent first; ties by label.
    pub counts: Vec<(String, usize)>,
    pub total: usize,
}

impl LabelDistribution {
    pub fn from_records(records: &[Record], field: &str) -> Self {
        let mut counts: HashMap<String, usize> = HashMap::new();
        for record in records {
            let label = record.text(field).unwrap_or_else(|| SENTINEL_LABEL.to_string());
            *counts.entry(label).or_default() += 1;
        }

        let mut counts: Vec<(String, usize)> = counts.into_iter().collect();
        counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        Self {
            counts,
            total: records.len(),
        }
    }

    pub fn count(&self, label: &str) -> usize {
        self.counts
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, c)| *c)
            .unwrap_or(0)
    }

    /// Records with a specific label: not the sentinel, blank-source or catch-all.
    pub fn specific_count(&self) -> usize {
        self.counts
            .iter()
            .filter(|(l, _)| {
                l != SENTINEL_LABEL && l != NOT_SPECIFIED_LABEL && l != CATCH_ALL_LABEL
            })
            .map(|(_, c)| c)
            .sum()
    }

    /// Share of records with a specific label, in percent. Zero for an empty set.
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.specific_count() as f64 * 100.0 / self.total as f64
    }

    pub fn top(&self, n: usize) -> &[(String, usize)] {
        &self.counts[..n.min(self.counts.len())]
    }

    /// Log the top labels and the success rate.
    pub fn log(&self, column: &str, top_n: usize) {
        for (label, count) in self.top(top_n) {
            let share = *count as f64 * 100.0 / self.total.max(1) as f64;
            tracing::info!(column, label = %label, count, share = %format!("{share:.1}%"), "Label share");
        }
        tracing::info!(
            column,
            records = self.total,
            specific = self.specific_count(),
            undetermined = self.count(SENTINEL_LABEL),
            success_rate = %format!("{:.1}%", self.success_rate()),
            "Classification summary"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn records(labels: &[&str]) -> Vec<Record> {
        labels
            .iter()
            .enumerate()
            .map(|(i, l)| Record::from_json(json!({"id": i, "category": l})).unwrap())
            .collect()
    }

    #[test]
    fn counts_sorted_by_frequency() {
        let dist = LabelDistribution::from_records(&records(&["IT", "Финансы", "IT"]), "category");
        assert_eq!(dist.counts[0], ("IT".to_string(), 2));
        assert_eq!(dist.count("Финансы"), 1);
        assert_eq!(dist.count("Туризм"), 0);
    }

    #[test]
    fn success_rate_excludes_reserved_labels() {
        let dist = LabelDistribution::from_records(
            &records(&["IT", SENTINEL_LABEL, NOT_SPECIFIED_LABEL, CATCH_ALL_LABEL]),
            "category",
        );
        assert_eq!(dist.specific_count(), 1);
        assert!((dist.success_rate() - 25.0).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_dataset_has_zero_rate() {
        let dist = LabelDistribution::from_records(&[], "category");
        assert_eq!(dist.success_rate(), 0.0);
        assert!(dist.top(5).is_empty());
    }

    #[test]
    fn top_is_bounded() {
        let dist = LabelDistribution::from_records(&records(&["IT", "Финансы"]), "category");
        assert_eq!(dist.top(10).len(), 2);
        assert_eq!(dist.top(1).len(), 1);
    }
}
