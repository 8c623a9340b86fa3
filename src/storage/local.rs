use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use super::{decode_text, validate_key, ObjectStore, StorageError};

/// Object store backed by a local directory; keys map to relative file paths.
pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        validate_key(key)?;
        Ok(key.split('/').fold(self.root.clone(), |p, seg| p.join(seg)))
    }

    fn key_for(&self, path: &Path) -> Option<String> {
        let rel = path.strip_prefix(&self.root).ok()?;
        let segments: Option<Vec<&str>> = rel.components().map(|c| c.as_os_str().to_str()).collect();
        Some(segments?.join("/"))
    }
}

impl ObjectStore for LocalObjectStore {
    fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        if !self.root.exists() {
            tracing::warn!(root = %self.root.display(), "Store root does not exist");
            return Ok(Vec::new());
        }

        let mut keys = Vec::new();
        for entry in WalkDir::new(&self.root).follow_links(false) {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            match self.key_for(entry.path()) {
                Some(key) if key.starts_with(prefix) => keys.push(key),
                Some(_) => {}
                None => tracing::debug!(
                    path = %entry.path().display(),
                    "Skipping file with non-UTF-8 path"
                ),
            }
        }
        keys.sort();
        Ok(keys)
    }

    fn get_text(&self, key: &str) -> Result<String, StorageError> {
        let path = self.path_for(key)?;
        let bytes = std::fs::read(&path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => StorageError::NotFound(key.to_string()),
            _ => StorageError::Io(e),
        })?;
        decode_text(key, bytes)
    }

    fn put_object(&self, key: &str, body: &[u8], content_type: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, body)?;
        tracing::debug!(
            key,
            size = body.len(),
            content_type,
            "Object written"
        );
        Ok(())
    }
}
