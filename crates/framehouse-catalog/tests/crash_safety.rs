//! Crash-safety failure injection tests.
//!
//! The persistence protocol writes leaf descriptors before the root catalog
//! record. These tests interrupt the protocol between the two writes and
//! verify the invariants:
//!
//! 1. **No dangling references**: a reloaded catalog never names a table or
//!    job whose descriptor was not persisted
//! 2. **Orphans are harmless**: leaf records written before the crash stay
//!    on storage, unreferenced and invisible
//! 3. **Unrelated state survives**: a failed operation does not disturb
//!    entities already persisted

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::collections::HashSet;
use std::ops::Range;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use bytes::Bytes;

use framehouse_core::{
    ColumnId, DatasetPaths, DatasetStorage, Error as CoreError, ItemId, MemoryBackend, ObjectMeta,
    Result as CoreResult, StorageBackend, TableId, WritePrecondition, WriteResult,
};

use framehouse_catalog::{
    CatalogReader, CatalogWriter, Column, ColumnType, DatabaseMetadata, JobDraft, TableDraft,
    TableSampleDraft, TaskDraft,
};

// ============================================================================
// FailingBackend - Configurable failure injection
// ============================================================================

/// Backend wrapper that injects failures at configurable paths.
///
/// Used for testing crash recovery of the leaf-before-root write protocol.
#[derive(Debug)]
struct FailingBackend {
    inner: MemoryBackend,
    /// Paths that should fail on next write (exact match, single-shot).
    fail_on_write: Arc<RwLock<HashSet<String>>>,
    /// If true, fail all operations (simulates total backend failure).
    fail_all: AtomicBool,
}

impl FailingBackend {
    fn new() -> Self {
        Self {
            inner: MemoryBackend::new(),
            fail_on_write: Arc::new(RwLock::new(HashSet::new())),
            fail_all: AtomicBool::new(false),
        }
    }

    /// Configure the backend to fail the next write to `path`.
    fn fail_on_write(&self, path: &str) {
        self.fail_on_write.write().unwrap().insert(path.to_string());
    }

    /// Configure the backend to fail all operations.
    fn fail_all(&self) {
        self.fail_all.store(true, Ordering::SeqCst);
    }

    fn should_fail_write(&self, path: &str) -> bool {
        if self.fail_all.load(Ordering::SeqCst) {
            return true;
        }
        self.fail_on_write.write().unwrap().remove(path)
    }
}

#[async_trait]
impl StorageBackend for FailingBackend {
    async fn get(&self, path: &str) -> CoreResult<Bytes> {
        if self.fail_all.load(Ordering::SeqCst) {
            return Err(CoreError::storage(format!("injected read failure: {path}")));
        }
        self.inner.get(path).await
    }

    async fn get_range(&self, path: &str, range: Range<u64>) -> CoreResult<Bytes> {
        if self.fail_all.load(Ordering::SeqCst) {
            return Err(CoreError::storage(format!("injected read failure: {path}")));
        }
        self.inner.get_range(path, range).await
    }

    async fn put(
        &self,
        path: &str,
        data: Bytes,
        precondition: WritePrecondition,
    ) -> CoreResult<WriteResult> {
        if self.should_fail_write(path) {
            return Err(CoreError::storage(format!(
                "injected write failure: {path}"
            )));
        }
        self.inner.put(path, data, precondition).await
    }

    async fn delete(&self, path: &str) -> CoreResult<()> {
        if self.should_fail_write(path) {
            return Err(CoreError::storage(format!(
                "injected delete failure: {path}"
            )));
        }
        self.inner.delete(path).await
    }

    async fn list(&self, prefix: &str) -> CoreResult<Vec<ObjectMeta>> {
        if self.fail_all.load(Ordering::SeqCst) {
            return Err(CoreError::storage(format!(
                "injected list failure: {prefix}"
            )));
        }
        self.inner.list(prefix).await
    }

    async fn head(&self, path: &str) -> CoreResult<Option<ObjectMeta>> {
        if self.fail_all.load(Ordering::SeqCst) {
            return Err(CoreError::storage(format!("injected head failure: {path}")));
        }
        self.inner.head(path).await
    }
}

// ============================================================================
// Helpers
// ============================================================================

const ROOT: &str = "datasets/crash";

fn scoped(path: &str) -> String {
    format!("{ROOT}/{path}")
}

fn harness() -> (Arc<FailingBackend>, DatasetStorage) {
    let backend = Arc::new(FailingBackend::new());
    let storage = DatasetStorage::new(backend.clone(), ROOT).expect("storage");
    (backend, storage)
}

fn frames_draft() -> TableDraft {
    TableDraft::new(
        "frames",
        512,
        128,
        vec![Column::new(ColumnId::from(0), "frame", ColumnType::Video)],
    )
    .expect("draft")
}

// ============================================================================
// Failure Injection Tests
// ============================================================================

/// Crash between the leaf table write and the root catalog write: the
/// reloaded catalog must not know the table, while the orphan leaf record
/// remains on storage.
#[tokio::test]
async fn crash_between_leaf_and_root_leaves_table_invisible() {
    let (backend, storage) = harness();
    let writer = CatalogWriter::new(storage.clone());
    let reader = CatalogReader::new(storage.clone());

    // Bootstrap an empty catalog record.
    let mut db = DatabaseMetadata::new();
    writer.write_database(&db).await.expect("bootstrap");

    // The root write fails after the leaf write succeeded.
    backend.fail_on_write(&scoped(DatasetPaths::DATABASE));

    let result = writer.create_table(&mut db, frames_draft()).await;
    assert!(result.is_err(), "create_table must surface the root failure");

    // Reload: the table is absent, no invariant violated.
    let reloaded = reader.load_database().await.expect("reload");
    assert!(!reloaded.has_table("frames"));
    assert!(!reloaded.has_table_id(TableId::from(0)));

    // The orphan leaf record exists but nothing references it.
    assert!(
        storage
            .exists(&DatasetPaths::table_descriptor(TableId::from(0)))
            .await
            .expect("exists"),
        "expected orphaned leaf record after interrupted protocol"
    );

    // The writer rolled the in-memory entry back too, so retrying works,
    // under a fresh id, since issued ids are never reused.
    let retried = writer
        .create_table(&mut db, frames_draft())
        .await
        .expect("retry");
    assert_eq!(retried.id(), TableId::from(1));
    let reloaded = reader.load_database().await.expect("reload");
    assert_eq!(reloaded.table_name(TableId::from(1)).expect("name"), "frames");
}

/// Crash before the leaf write: nothing is persisted at all.
#[tokio::test]
async fn crash_on_leaf_write_persists_nothing() {
    let (backend, storage) = harness();
    let writer = CatalogWriter::new(storage.clone());
    let reader = CatalogReader::new(storage.clone());

    let mut db = DatabaseMetadata::new();
    writer.write_database(&db).await.expect("bootstrap");

    backend.fail_on_write(&scoped(&DatasetPaths::table_descriptor(TableId::from(0))));

    let result = writer.create_table(&mut db, frames_draft()).await;
    assert!(result.is_err());

    let reloaded = reader.load_database().await.expect("reload");
    assert!(!reloaded.has_table("frames"));
    assert!(
        !storage
            .exists(&DatasetPaths::table_descriptor(TableId::from(0)))
            .await
            .expect("exists")
    );
}

/// Job creation has the same shape: job leaf (and new table leaves) before
/// root. Interrupting the root write leaves neither the job nor its new
/// output table visible.
#[tokio::test]
async fn crash_during_job_creation_leaves_job_invisible() {
    let (backend, storage) = harness();
    let writer = CatalogWriter::new(storage.clone());
    let reader = CatalogReader::new(storage.clone());

    let mut db = DatabaseMetadata::new();
    writer
        .create_table(&mut db, frames_draft())
        .await
        .expect("create frames");

    backend.fail_on_write(&scoped(DatasetPaths::DATABASE));

    let draft = JobDraft::new(
        "detect",
        1024,
        128,
        2,
        Vec::new(),
        vec![TaskDraft::new(
            "detections",
            vec![TableSampleDraft::new("frames", (0..64).collect())],
        )],
    )
    .expect("draft");
    let detections = TableDraft::new("detections", 64, 128, Vec::new()).expect("draft");

    let result = writer.create_job(&mut db, draft, vec![detections]).await;
    assert!(result.is_err());

    // Neither the job nor the new table is referenced after reload.
    let reloaded = reader.load_database().await.expect("reload");
    assert!(!reloaded.has_job("detect"));
    assert!(!reloaded.has_table("detections"));

    // The already-committed table is untouched.
    assert!(reloaded.has_table("frames"));
    reader.load_table(TableId::from(0)).await.expect("load");

    // Orphaned leaves from the interrupted protocol are present but inert.
    assert!(storage.list("jobs/").await.expect("list").len() == 1);
}

/// A failed remove keeps the entry: the in-memory catalog is restored so it
/// still matches what storage says.
#[tokio::test]
async fn failed_remove_restores_entry() {
    let (backend, storage) = harness();
    let writer = CatalogWriter::new(storage.clone());
    let reader = CatalogReader::new(storage);

    let mut db = DatabaseMetadata::new();
    let table = writer
        .create_table(&mut db, frames_draft())
        .await
        .expect("create");

    backend.fail_on_write(&scoped(DatasetPaths::DATABASE));

    let result = writer.remove_table(&mut db, table.id()).await;
    assert!(result.is_err());

    // In-memory and persisted state agree: the table is still there.
    assert!(db.has_table("frames"));
    let reloaded = reader.load_database().await.expect("reload");
    assert!(reloaded.has_table("frames"));
}

/// Total backend failure aborts the current operation without poisoning
/// entities that were already loaded.
#[tokio::test]
async fn backend_outage_does_not_corrupt_loaded_state() {
    let (backend, storage) = harness();
    let writer = CatalogWriter::new(storage.clone());
    let reader = CatalogReader::new(storage);

    let mut db = DatabaseMetadata::new();
    let table = writer
        .create_table(&mut db, frames_draft())
        .await
        .expect("create");
    let loaded = reader.load_table(table.id()).await.expect("load");

    backend.fail_all();

    assert!(reader.load_database().await.is_err());
    assert!(
        reader
            .load_video(table.id(), ColumnId::from(0), ItemId::from(0))
            .await
            .is_err()
    );

    // The previously loaded entities still answer from memory.
    assert_eq!(loaded.name(), "frames");
    assert_eq!(loaded.column_id("frame").expect("id"), ColumnId::from(0));
    assert_eq!(db.table_name(table.id()).expect("name"), "frames");
}

// ============================================================================
// FailingBackend sanity
// ============================================================================

#[tokio::test]
async fn failing_backend_single_shot_failure() {
    let backend = FailingBackend::new();

    backend.fail_on_write("test.txt");

    // First write fails
    let result = backend
        .put("test.txt", Bytes::from("data"), WritePrecondition::None)
        .await;
    assert!(result.is_err(), "first write should fail");

    // Second write succeeds (failure consumed)
    let result = backend
        .put("test.txt", Bytes::from("data"), WritePrecondition::None)
        .await;
    assert!(result.is_ok(), "second write should succeed");
}
