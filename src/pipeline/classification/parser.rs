//! Best-effort recovery of the JSON array embedded in a model reply.
//!
//! The completion model is not schema-constrained: replies come wrapped in
//! Markdown fences, prefixed with chatter, or cut off mid-array. Every path
//! here degrades to an empty result; nothing is ever returned as an error.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use super::types::{ClassificationResult, ClassificationTarget};

/// First `[ { ... } ]` span, across newlines.
static ARRAY_OF_OBJECTS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\[\s*\{.*\}\s*\]").expect("valid regex"));

/// Recover an array of JSON values from raw model text.
///
/// 1. Trim, strip code-fence backticks and a leading `json` language tag.
/// 2. Strict parse.
/// 3. First balanced-looking `[ { ... } ]` span.
/// 4. Truncated reply: cut after the last complete object and close the array.
/// 5. Otherwise empty.
pub fn parse_model_response(text: &str) -> Vec<Value> {
    let cleaned = strip_fences(text);

    if let Some(values) = parse_array(cleaned) {
        return values;
    }

    if let Some(m) = ARRAY_OF_OBJECTS_RE.find(cleaned) {
        if let Some(values) = parse_array(m.as_str()) {
            return values;
        }
    }

    if let Some(values) = repair_truncated(cleaned) {
        tracing::debug!(recovered = values.len(), "Recovered truncated model reply");
        return values;
    }

    Vec::new()
}

/// Turn recovered JSON values into results for `target`.
///
/// Entries that are not objects or lack a textual `original` are skipped.
/// A missing label becomes the empty string (the retry controller treats it
/// as unresolved); a missing secondary label stays `None`.
pub fn parse_results(values: &[Value], target: &ClassificationTarget) -> Vec<ClassificationResult> {
    values
        .iter()
        .filter_map(|v| {
            let obj = v.as_object()?;
            let original = obj.get("original")?.as_str()?.trim();
            if original.is_empty() {
                return None;
            }
            let label = obj
                .get(target.label_field)
                .and_then(Value::as_str)
                .map(str::trim)
                .unwrap_or_default();
            let secondary = target.secondary_field.and_then(|key| {
                obj.get(key)
                    .and_then(Value::as_str)
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
            });
            Some(ClassificationResult {
                original: original.to_string(),
                label: label.to_string(),
                secondary,
            })
        })
        .collect()
}

fn strip_fences(text: &str) -> &str {
    let stripped = text.trim().trim_matches('`').trim();
    match stripped.strip_prefix("json") {
        Some(rest) => rest.trim(),
        None => stripped,
    }
}

fn parse_array(text: &str) -> Option<Vec<Value>> {
    match serde_json::from_str::<Value>(text).ok()? {
        Value::Array(items) => Some(items),
        obj @ Value::Object(_) => Some(vec![obj]),
        _ => None,
    }
}

/// Close an array whose tail was cut off by the token limit.
fn repair_truncated(text: &str) -> Option<Vec<Value>> {
    let start = text.find('[')?;
    let mut body = &text[start..];
    // Walk back through `}` positions until the prefix parses.
    while let Some(end) = body.rfind('}') {
        let candidate = format!("{}]", &body[..=end]);
        if let Some(values) = parse_array(&candidate) {
            if !values.is_empty() {
                return Some(values);
            }
        }
        body = &body[..end];
    }
    None
}
