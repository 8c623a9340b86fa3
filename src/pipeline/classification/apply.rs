use super::types::*;
use crate::models::Record;

/// Project a label mapping onto every record.
///
/// Each record is copied and extended with the target's output columns.
/// Blank or missing source values get the blank-source label; values absent
/// from the mapping get the sentinel.
pub fn apply_mapping(
    records: &[Record],
    target: &ClassificationTarget,
    mapping: &LabelMapping,
) -> Vec<Record> {
    records
        .iter()
        .map(|record| {
            let (label, secondary) = match record.text(target.source_field) {
                None => (NOT_SPECIFIED_LABEL, Some(NOT_SPECIFIED_LABEL)),
                Some(value) => match mapping.get(&value) {
                    Some(result) => (
                        result.label.as_str(),
                        Some(result.secondary.as_deref().unwrap_or(SENTINEL_LABEL)),
                    ),
                    None => (SENTINEL_LABEL, Some(SENTINEL_LABEL)),
                },
            };

            let mut enriched = record.with_field(target.label_field, label);
            if let (Some(field), Some(secondary)) = (target.secondary_field, secondary) {
                enriched.insert(field, secondary);
            }
            enriched
        })
        .collect()
}
