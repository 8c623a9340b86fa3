use std::collections::HashSet;

use crate::models::{Dataset, Record};

/// Merged dataset plus what the merge removed.
#[derive(Debug, Clone, Default)]
pub struct MergeOutcome {
    pub dataset: Dataset,
    pub input_rows: usize,
    /// Rows identical to an earlier row in every field.
    pub exact_duplicates: usize,
    /// Rows sharing an earlier row's id but differing elsewhere.
    pub id_duplicates: usize,
}

/// Concatenate exports in order and drop duplicate vacancies.
///
/// Columns are the union of all headers in first-seen order. Exact duplicate
/// rows go first, then any row repeating an already kept `id`; the first
/// occurrence always wins.
pub fn merge_sources(sources: Vec<Dataset>) -> MergeOutcome {
    let mut merged = Dataset::default();
    let mut seen_rows: HashSet<Vec<(String, String)>> = HashSet::new();
    let mut kept_ids: HashSet<String> = HashSet::new();
    let mut outcome = MergeOutcome::default();

    for source in sources {
        for column in &source.columns {
            merged.ensure_column(column);
        }

        for record in source.records {
            outcome.input_rows += 1;
            if !seen_rows.insert(row_key(&record)) {
                outcome.exact_duplicates += 1;
                continue;
            }
            if !kept_ids.insert(record.id()) {
                outcome.id_duplicates += 1;
                continue;
            }
            merged.records.push(record);
        }
    }

    outcome.dataset = merged;
    outcome
}

fn row_key(record: &Record) -> Vec<(String, String)> {
    record
        .fields()
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::ingest::decode_csv;
    use serde_json::json;

    fn dataset(columns: &[&str], rows: serde_json::Value) -> Dataset {
        Dataset::new(
            columns.iter().map(|c| c.to_string()).collect(),
            rows.as_array()
                .unwrap()
                .iter()
                .map(|r| Record::from_json(r.clone()).unwrap())
                .collect(),
        )
    }

    #[test]
    fn union_of_columns_in_first_seen_order() {
        let a = dataset(&["id", "title"], json!([{"id": 1, "title": "A"}]));
        let b = dataset(&["id", "city", "title"], json!([{"id": 2, "city": "Москва"}]));
        let outcome = merge_sources(vec![a, b]);
        assert_eq!(outcome.dataset.columns, vec!["id", "title", "city"]);
        assert_eq!(outcome.dataset.len(), 2);
    }

    #[test]
    fn drops_exact_and_id_duplicates_first_wins() {
        let a = dataset(&["id", "title"], json!([
            {"id": 1, "title": "A"},
            {"id": 2, "title": "B"},
        ]));
        let b = dataset(&["id", "title"], json!([
            {"id": 1, "title": "A"},
            {"id": 2, "title": "B updated"},
            {"id": 3, "title": "C"},
        ]));
        let outcome = merge_sources(vec![a, b]);
        assert_eq!(outcome.input_rows, 5);
        assert_eq!(outcome.exact_duplicates, 1);
        assert_eq!(outcome.id_duplicates, 1);
        let titles: Vec<String> = outcome
            .dataset
            .records
            .iter()
            .filter_map(|r| r.text("title"))
            .collect();
        assert_eq!(titles, vec!["A", "B", "C"]);
    }

    #[test]
    fn numeric_and_text_ids_of_same_value_collide() {
        let a = dataset(&["id", "title"], json!([{"id": 7, "title": "A"}]));
        let b = dataset(&["id", "title"], json!([{"id": "7", "title": "B"}]));
        let outcome = merge_sources(vec![a, b]);
        assert_eq!(outcome.dataset.len(), 1);
        assert_eq!(outcome.id_duplicates, 1);
    }

    #[test]
    fn repeated_dropped_row_counts_as_exact_duplicate() {
        let a = dataset(&["id", "title"], json!([{"id": 1, "title": "x"}]));
        let b = dataset(&["id", "title"], json!([
            {"id": 1, "title": "y"},
            {"id": 1, "title": "y"},
        ]));
        let outcome = merge_sources(vec![a, b]);
        assert_eq!(outcome.dataset.len(), 1);
        assert_eq!(outcome.id_duplicates, 1);
        assert_eq!(outcome.exact_duplicates, 1);
    }

    #[test]
    fn distinct_csv_ids_never_collide() {
        let a = decode_csv("k", "id,title\n98765432109876543210,A\n007,B\n").unwrap();
        let b = decode_csv("k", "id,title\n98765432109876543211,C\n7,D\n").unwrap();
        let outcome = merge_sources(vec![a.dataset, b.dataset]);
        assert_eq!(outcome.dataset.len(), 4);
        assert_eq!(outcome.id_duplicates, 0);
    }

    #[test]
    fn empty_sources_merge_to_empty() {
        let outcome = merge_sources(Vec::new());
        assert!(outcome.dataset.is_empty());
        assert_eq!(outcome.input_rows, 0);
    }
}
