use std::collections::HashSet;

use crate::models::Record;

/// Distinct trimmed, non-empty values of `field`, in first-seen order.
///
/// Records with a missing or blank value are skipped here; the mapping step
/// gives them the blank-source label.
pub fn unique_values(records: &[Record], field: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    records
        .iter()
        .filter_map(|r| r.text(field))
        .filter(|v| seen.insert(v.clone()))
        .collect()
}
