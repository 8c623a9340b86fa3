//! Vacancy records as read from the CSV exports.
//!
//! A record is an open mapping from column name to scalar value. The only
//! structural requirement is a non-empty `id`, checked whenever a record is
//! constructed, so every `Record` in the pipeline can be deduplicated by id.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Column every record must carry.
pub const ID_FIELD: &str = "id";

#[derive(Error, Debug, PartialEq)]
pub enum RecordError {
    #[error("Record has no '{ID_FIELD}' value")]
    MissingId,

    #[error("Field '{field}' has unsupported value: {reason}")]
    InvalidField { field: String, reason: String },

    #[error("Record must be a JSON object")]
    NotAnObject,
}

/// One scalar cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl FieldValue {
    /// Value of a raw CSV cell. Empty cells carry no value.
    ///
    /// Cells stay text verbatim: `01234`, `+79991234567` and `150000.0` must
    /// be written back exactly as read.
    pub fn parse_cell(raw: &str) -> Option<Self> {
        if raw.is_empty() {
            return None;
        }
        Some(Self::Text(raw.to_string()))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<i64> for FieldValue {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

/// One vacancy listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Record {
    fields: BTreeMap<String, FieldValue>,
}

impl Record {
    /// Build a record, rejecting it when the id is missing or blank.
    pub fn new(fields: BTreeMap<String, FieldValue>) -> Result<Self, RecordError> {
        match fields.get(ID_FIELD) {
            Some(FieldValue::Text(s)) if s.trim().is_empty() => Err(RecordError::MissingId),
            Some(_) => Ok(Self { fields }),
            None => Err(RecordError::MissingId),
        }
    }

    /// Build a record from a JSON object. Nulls are treated as absent fields.
    pub fn from_json(value: serde_json::Value) -> Result<Self, RecordError> {
        let serde_json::Value::Object(map) = value else {
            return Err(RecordError::NotAnObject);
        };

        let mut fields = BTreeMap::new();
        for (name, v) in map {
            let field = match v {
                serde_json::Value::Null => continue,
                serde_json::Value::String(s) => FieldValue::Text(s),
                serde_json::Value::Number(n) => match (n.as_i64(), n.as_f64()) {
                    (Some(i), _) => FieldValue::Integer(i),
                    (None, Some(f)) => FieldValue::Float(f),
                    _ => {
                        return Err(RecordError::InvalidField {
                            field: name,
                            reason: format!("number {n} out of range"),
                        })
                    }
                },
                serde_json::Value::Bool(b) => FieldValue::Text(b.to_string()),
                other => {
                    return Err(RecordError::InvalidField {
                        field: name,
                        reason: format!("non-scalar value {other}"),
                    })
                }
            };
            fields.insert(name, field);
        }

        Self::new(fields)
    }

    /// Identifier rendered as text, used as the deduplication key.
    pub fn id(&self) -> String {
        self.fields
            .get(ID_FIELD)
            .map(|v| v.to_string())
            .unwrap_or_default()
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// Trimmed textual value of a field, `None` when missing or blank.
    pub fn text(&self, name: &str) -> Option<String> {
        let rendered = self.fields.get(name)?.to_string();
        let trimmed = rendered.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }

    /// Set a field. A blank `id` is ignored so the record stays valid.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
        let name = name.into();
        let value = value.into();
        if name == ID_FIELD && value.to_string().trim().is_empty() {
            tracing::warn!("Ignoring blank id assignment");
            return;
        }
        self.fields.insert(name, value);
    }

    /// Copy of this record extended with one field.
    pub fn with_field(&self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        let mut copy = self.clone();
        copy.insert(name, value);
        copy
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Records plus the column order they were read with.
///
/// Column order matters only for CSV output; records themselves are keyed by
/// name and never depend on position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    pub columns: Vec<String>,
    pub records: Vec<Record>,
}

impl Dataset {
    pub fn new(columns: Vec<String>, records: Vec<Record>) -> Self {
        Self { columns, records }
    }

    /// Append a column name unless it is already present.
    pub fn ensure_column(&mut self, name: &str) {
        if !self.columns.iter().any(|c| c == name) {
            self.columns.push(name.to_string());
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
