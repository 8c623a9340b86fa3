use std::collections::BTreeMap;
use std::sync::Mutex;

use super::{decode_text, validate_key, ObjectStore, StorageError};

/// A stored object and its declared content type.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredObject {
    pub body: Vec<u8>,
    pub content_type: String,
}

/// In-process object store. Used by tests and dry runs.
#[derive(Default)]
pub struct MemoryObjectStore {
    objects: Mutex<BTreeMap<String, StoredObject>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an object, builder style.
    pub fn with_object(self, key: &str, body: &str) -> Self {
        if let Ok(mut objects) = self.objects.lock() {
            objects.insert(
                key.to_string(),
                StoredObject {
                    body: body.as_bytes().to_vec(),
                    content_type: "text/csv".to_string(),
                },
            );
        }
        self
    }

    pub fn object(&self, key: &str) -> Option<StoredObject> {
        self.objects.lock().ok()?.get(key).cloned()
    }

    pub fn keys(&self) -> Vec<String> {
        self.objects
            .lock()
            .map(|o| o.keys().cloned().collect())
            .unwrap_or_default()
    }
}

fn poisoned() -> StorageError {
    StorageError::Io(std::io::Error::other("memory store lock poisoned"))
}

impl ObjectStore for MemoryObjectStore {
    fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let objects = self.objects.lock().map_err(|_| poisoned())?;
        Ok(objects
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }

    fn get_text(&self, key: &str) -> Result<String, StorageError> {
        let body = {
            let objects = self.objects.lock().map_err(|_| poisoned())?;
            objects
                .get(key)
                .map(|o| o.body.clone())
                .ok_or_else(|| StorageError::NotFound(key.to_string()))?
        };
        decode_text(key, body)
    }

    fn put_object(&self, key: &str, body: &[u8], content_type: &str) -> Result<(), StorageError> {
        validate_key(key)?;
        let mut objects = self.objects.lock().map_err(|_| poisoned())?;
        objects.insert(
            key.to_string(),
            StoredObject {
                body: body.to_vec(),
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }
}
