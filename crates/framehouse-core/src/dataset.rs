//! Dataset-root scoped storage.
//!
//! A Framehouse dataset lives under a single configured path prefix (the
//! dataset root). This module wraps a [`StorageBackend`] with that prefix so
//! every catalog component receives the root as an explicit constructor
//! argument instead of consulting process-global state. The prefix is
//! validated once, at construction, and is read-only afterwards.
//!
//! # Security
//!
//! This module enforces strict path hygiene:
//! - All relative paths are joined under the dataset root
//! - Path traversal attempts (`..`) are rejected
//! - Absolute paths, backslashes, and control characters are rejected

use bytes::Bytes;
use std::ops::Range;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::storage::{ObjectMeta, StorageBackend, WritePrecondition, WriteResult};

/// Storage handle scoped to one dataset root.
///
/// Cloning is cheap; clones share the underlying backend.
#[derive(Clone)]
pub struct DatasetStorage {
    backend: Arc<dyn StorageBackend>,
    root: String,
}

impl std::fmt::Debug for DatasetStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatasetStorage")
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}

impl DatasetStorage {
    /// Creates a new storage handle for the dataset rooted at `root`.
    ///
    /// A trailing `/` on the root is accepted and normalized away.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` if the root is empty, absolute, or
    /// contains traversal segments, backslashes, or control characters.
    pub fn new(backend: Arc<dyn StorageBackend>, root: impl Into<String>) -> Result<Self> {
        let mut root = root.into();
        while root.ends_with('/') {
            root.pop();
        }

        if root.is_empty() {
            return Err(Error::InvalidInput("dataset root cannot be empty".into()));
        }
        Self::validate_path(&root)?;

        Ok(Self { backend, root })
    }

    /// Validates a relative path for use under the dataset root.
    fn validate_path(path: &str) -> Result<()> {
        if path.starts_with('/') || path.starts_with('\\') {
            return Err(Error::InvalidInput(format!(
                "absolute paths not allowed: {path}"
            )));
        }

        if path.contains('\\') {
            return Err(Error::InvalidInput(format!(
                "backslashes not allowed in paths: {path}"
            )));
        }

        if path.contains('\n') || path.contains('\r') || path.contains('\0') {
            return Err(Error::InvalidInput(format!(
                "control characters not allowed in paths: {path}"
            )));
        }

        for segment in path.split('/') {
            if segment.is_empty() || segment == "." || segment == ".." {
                return Err(Error::InvalidInput(format!(
                    "path traversal not allowed: {path}"
                )));
            }
        }

        Ok(())
    }

    /// Returns the configured dataset root.
    #[must_use]
    pub fn root(&self) -> &str {
        &self.root
    }

    /// Returns the backend for advanced operations.
    #[must_use]
    pub fn backend(&self) -> &Arc<dyn StorageBackend> {
        &self.backend
    }

    /// Returns the full backend path for a dataset-relative path.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` if the relative path is malformed.
    pub fn full_path(&self, path: &str) -> Result<String> {
        Self::validate_path(path)?;
        Ok(format!("{}/{path}", self.root))
    }

    // === Scoped I/O ===

    /// Reads the whole object at a dataset-relative path.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` if the object doesn't exist, or any backend
    /// failure.
    pub async fn get(&self, path: &str) -> Result<Bytes> {
        self.backend.get(&self.full_path(path)?).await
    }

    /// Reads a byte range from the object at a dataset-relative path.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` for missing objects and
    /// `Error::InvalidInput` for malformed ranges.
    pub async fn get_range(&self, path: &str, range: Range<u64>) -> Result<Bytes> {
        self.backend.get_range(&self.full_path(path)?, range).await
    }

    /// Writes the object at a dataset-relative path.
    ///
    /// # Errors
    ///
    /// Returns any backend failure. Precondition failures are a normal
    /// result, not an error.
    pub async fn put(
        &self,
        path: &str,
        data: Bytes,
        precondition: WritePrecondition,
    ) -> Result<WriteResult> {
        self.backend
            .put(&self.full_path(path)?, data, precondition)
            .await
    }

    /// Deletes the object at a dataset-relative path (idempotent).
    ///
    /// # Errors
    ///
    /// Returns any backend failure.
    pub async fn delete(&self, path: &str) -> Result<()> {
        self.backend.delete(&self.full_path(path)?).await
    }

    /// Lists objects under a dataset-relative prefix.
    ///
    /// Returned paths are stripped back to dataset-relative form.
    ///
    /// # Errors
    ///
    /// Returns any backend failure.
    pub async fn list(&self, prefix: &str) -> Result<Vec<ObjectMeta>> {
        Self::validate_path(prefix.trim_end_matches('/'))?;
        let full_prefix = format!("{}/{prefix}", self.root);
        let strip = format!("{}/", self.root);
        let mut metas = self.backend.list(&full_prefix).await?;
        for meta in &mut metas {
            if let Some(rel) = meta.path.strip_prefix(&strip) {
                meta.path = rel.to_string();
            }
        }
        Ok(metas)
    }

    /// Gets object metadata at a dataset-relative path without reading it.
    ///
    /// # Errors
    ///
    /// Returns any backend failure.
    pub async fn head(&self, path: &str) -> Result<Option<ObjectMeta>> {
        self.backend.head(&self.full_path(path)?).await
    }

    /// Returns whether an object exists at a dataset-relative path.
    ///
    /// # Errors
    ///
    /// Returns any backend failure.
    pub async fn exists(&self, path: &str) -> Result<bool> {
        self.backend.exists(&self.full_path(path)?).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryBackend;

    fn storage() -> DatasetStorage {
        DatasetStorage::new(Arc::new(MemoryBackend::new()), "datasets/demo").expect("valid root")
    }

    #[test]
    fn test_root_normalization() {
        let s = DatasetStorage::new(Arc::new(MemoryBackend::new()), "datasets/demo/")
            .expect("valid root");
        assert_eq!(s.root(), "datasets/demo");
    }

    #[test]
    fn test_invalid_roots_rejected() {
        let backend: Arc<dyn StorageBackend> = Arc::new(MemoryBackend::new());
        assert!(DatasetStorage::new(backend.clone(), "").is_err());
        assert!(DatasetStorage::new(backend.clone(), "/absolute").is_err());
        assert!(DatasetStorage::new(backend.clone(), "a/../b").is_err());
        assert!(DatasetStorage::new(backend, "a\\b").is_err());
    }

    #[test]
    fn test_traversal_rejected_in_relative_paths() {
        let s = storage();
        assert!(s.full_path("../escape").is_err());
        assert!(s.full_path("a/./b").is_err());
        assert!(s.full_path("/rooted").is_err());
        assert!(s.full_path("a//b").is_err());
    }

    #[tokio::test]
    async fn test_scoped_roundtrip() {
        let s = storage();
        s.put("x/y.json", Bytes::from("{}"), WritePrecondition::None)
            .await
            .expect("put");

        // Visible through the scope
        assert_eq!(s.get("x/y.json").await.expect("get"), Bytes::from("{}"));

        // Physically stored under the root prefix
        let raw = s
            .backend()
            .get("datasets/demo/x/y.json")
            .await
            .expect("raw get");
        assert_eq!(raw, Bytes::from("{}"));
    }

    #[tokio::test]
    async fn test_list_strips_root_prefix() {
        let s = storage();
        s.put("tables/0/table.meta.json", Bytes::from("{}"), WritePrecondition::None)
            .await
            .expect("put");

        let listed = s.list("tables/").await.expect("list");
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].path, "tables/0/table.meta.json");
    }

    #[tokio::test]
    async fn test_scopes_are_isolated() {
        let backend = Arc::new(MemoryBackend::new());
        let a = DatasetStorage::new(backend.clone(), "datasets/a").expect("a");
        let b = DatasetStorage::new(backend, "datasets/b").expect("b");

        a.put("f.json", Bytes::from("a"), WritePrecondition::None)
            .await
            .expect("put");

        assert!(a.exists("f.json").await.expect("exists"));
        assert!(!b.exists("f.json").await.expect("exists"));
    }
}
