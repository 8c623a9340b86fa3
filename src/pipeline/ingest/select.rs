/// How many of the newest exports a run merges.
pub const DEFAULT_MAX_SOURCE_FILES: usize = 4;

/// Keys this short are folder markers or stray names, not exports.
pub const MIN_KEY_LEN: usize = 10;

/// Pick the newest CSV exports from a key listing.
///
/// Keeps keys ending in `.csv` longer than [`MIN_KEY_LEN`], sorts them
/// (export names carry a timestamp, so lexicographic order is chronological)
/// and returns the last `max_files`, oldest first.
pub fn select_source_keys(keys: &[String], max_files: usize) -> Vec<String> {
    let mut candidates: Vec<String> = keys
        .iter()
        .filter(|k| k.ends_with(".csv") && k.chars().count() > MIN_KEY_LEN)
        .cloned()
        .collect();
    candidates.sort();
    let skip = candidates.len().saturating_sub(max_files);
    candidates.split_off(skip)
}
