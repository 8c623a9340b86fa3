//! Object storage collaborator.
//!
//! The pipeline only needs three operations: list keys under a prefix, fetch
//! an object as text, and store a byte payload. Keys are `/`-separated paths
//! relative to the store root, as in an S3 bucket.

pub mod local;
pub mod memory;

pub use local::LocalObjectStore;
pub use memory::{MemoryObjectStore, StoredObject};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Invalid object key: {0}")]
    InvalidKey(String),

    #[error("Object {key} is not valid UTF-8")]
    NotUtf8 { key: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),
}

/// Minimal object-store surface used by the pipeline.
pub trait ObjectStore: Send + Sync {
    /// All keys starting with `prefix`, in lexicographic order.
    fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StorageError>;

    /// Fetch an object and decode it as UTF-8. A leading BOM is removed.
    fn get_text(&self, key: &str) -> Result<String, StorageError>;

    /// Create or replace an object.
    fn put_object(&self, key: &str, body: &[u8], content_type: &str) -> Result<(), StorageError>;
}

/// Reject empty keys, absolute paths and parent-directory segments.
pub(crate) fn validate_key(key: &str) -> Result<(), StorageError> {
    let bad = key.is_empty()
        || key.starts_with('/')
        || key.ends_with('/')
        || key.split('/').any(|seg| seg.is_empty() || seg == "." || seg == "..");
    if bad {
        return Err(StorageError::InvalidKey(key.to_string()));
    }
    Ok(())
}

/// Decode object bytes, dropping a UTF-8 byte-order mark.
pub(crate) fn decode_text(key: &str, bytes: Vec<u8>) -> Result<String, StorageError> {
    let text = String::from_utf8(bytes).map_err(|_| StorageError::NotUtf8 {
        key: key.to_string(),
    })?;
    Ok(match text.strip_prefix('\u{feff}') {
        Some(rest) => rest.to_string(),
        None => text,
    })
}
