//! Catalog write operations.
//!
//! The writer implements the persistence protocol for catalog mutation:
//! leaf descriptors are written **before** the root catalog record that
//! references them. A crash between the two leaves an orphaned, unreferenced
//! leaf record (invisible and harmless) but never a catalog entry whose
//! descriptor does not exist. The inverse ordering would risk dangling
//! references and is therefore forbidden.
//!
//! Mutating operations assume a single active writer per dataset (see
//! [`CatalogLock`](crate::lock::CatalogLock)); the root record is rewritten
//! wholesale, last writer wins. Per-item media descriptors are write-once
//! and need no coordination across writers at distinct coordinates.

use serde::Serialize;

use framehouse_core::{
    ColumnId, DatasetPaths, DatasetStorage, Error as CoreError, ItemId, JobId, TableId,
    WritePrecondition, WriteResult,
};

use crate::database::DatabaseMetadata;
use crate::error::{CatalogError, Result};
use crate::image_group::ImageFormatGroupDescriptor;
use crate::job::{JobDraft, JobMetadata, Task, TableSample};
use crate::serialize::encode;
use crate::table::{TableDescriptor, TableDraft, TableMetadata};
use crate::video::VideoDescriptor;

/// Writer for catalog mutations.
#[derive(Debug, Clone)]
pub struct CatalogWriter {
    storage: DatasetStorage,
}

impl CatalogWriter {
    /// Creates a new writer over the given dataset.
    #[must_use]
    pub fn new(storage: DatasetStorage) -> Self {
        Self { storage }
    }

    /// Returns the dataset storage this writer is scoped to.
    #[must_use]
    pub fn storage(&self) -> &DatasetStorage {
        &self.storage
    }

    /// Persists the database catalog record.
    ///
    /// Whole-record rewrite, unconditional: serializing mutators is the
    /// caller's contract, and a conditional write here would only mask a
    /// double allocation that already happened in memory.
    ///
    /// # Errors
    ///
    /// Returns `Backend` on I/O failure.
    pub async fn write_database(&self, database: &DatabaseMetadata) -> Result<()> {
        self.put_record(
            DatasetPaths::DATABASE,
            &database.to_descriptor(),
            WritePrecondition::None,
        )
        .await?;
        Ok(())
    }

    /// Creates a table: allocates its id, writes its descriptor, then the
    /// updated catalog record.
    ///
    /// On failure after allocation, the in-memory entry is removed again so
    /// the catalog matches persisted state; the allocated id stays consumed
    /// and is never reissued.
    ///
    /// # Errors
    ///
    /// Returns `Duplicate` (before any I/O) if a present table already has
    /// the draft's name, or `Backend` on I/O failure.
    pub async fn create_table(
        &self,
        database: &mut DatabaseMetadata,
        draft: TableDraft,
    ) -> Result<TableMetadata> {
        let table_id = database.add_table(draft.name())?;
        let descriptor = draft.into_descriptor(table_id);

        let written = self.write_table_then_catalog(database, &descriptor).await;
        if let Err(e) = written {
            let _ = database.remove_table(table_id);
            return Err(e);
        }

        tracing::info!(table = %descriptor.name, id = %table_id, "created table");
        Ok(TableMetadata::new(descriptor))
    }

    async fn write_table_then_catalog(
        &self,
        database: &DatabaseMetadata,
        descriptor: &TableDescriptor,
    ) -> Result<()> {
        self.write_table(descriptor).await?;
        self.write_database(database).await
    }

    /// Persists one table descriptor at its canonical path.
    ///
    /// Unconditional: a table's descriptor may be fully rewritten on schema
    /// change.
    ///
    /// # Errors
    ///
    /// Returns `Backend` on invalid descriptor or I/O failure.
    pub async fn write_table(&self, descriptor: &TableDescriptor) -> Result<()> {
        descriptor
            .validate()
            .map_err(|m| CoreError::InvalidInput(format!("table descriptor: {m}")))?;
        self.put_record(
            &DatasetPaths::table_descriptor(descriptor.id),
            descriptor,
            WritePrecondition::None,
        )
        .await?;
        Ok(())
    }

    /// Creates a job, together with any output tables it introduces.
    ///
    /// Allocation and name resolution happen before any I/O: the job name
    /// and every new table name must be free (`Duplicate` otherwise), and
    /// every table a task references by name must be present in the
    /// catalog or introduced by `new_tables` (`NotFound` otherwise). All
    /// leaf records (new tables, then the job) are written before the single
    /// root-record rewrite that makes the job visible.
    ///
    /// On failure after allocation, the in-memory entries are removed again;
    /// the allocated ids stay consumed.
    ///
    /// # Errors
    ///
    /// Returns `Duplicate`, `NotFound` (both before any I/O), or `Backend`
    /// on I/O failure.
    pub async fn create_job(
        &self,
        database: &mut DatabaseMetadata,
        draft: JobDraft,
        new_tables: Vec<TableDraft>,
    ) -> Result<JobMetadata> {
        // Reject every name collision before mutating anything.
        if database.has_job(draft.name()) {
            return Err(CatalogError::duplicate(format!("job {:?}", draft.name())));
        }
        for (index, table) in new_tables.iter().enumerate() {
            if database.has_table(table.name()) {
                return Err(CatalogError::duplicate(format!("table {:?}", table.name())));
            }
            if new_tables[..index].iter().any(|t| t.name() == table.name()) {
                return Err(CatalogError::duplicate(format!(
                    "table {:?} appears twice in new_tables",
                    table.name()
                )));
            }
        }

        // Allocate ids; the checks above make these adds infallible.
        let mut table_descriptors = Vec::with_capacity(new_tables.len());
        let mut added_tables = Vec::with_capacity(new_tables.len());
        for table in new_tables {
            let table_id = database.add_table(table.name())?;
            added_tables.push(table_id);
            table_descriptors.push(table.into_descriptor(table_id));
        }
        let job_id = match database.add_job(draft.name()) {
            Ok(id) => id,
            Err(e) => {
                Self::rollback(database, &added_tables, None);
                return Err(e);
            }
        };

        // Resolve task table names against the catalog (new tables included).
        let tasks = match Self::resolve_tasks(database, &draft) {
            Ok(tasks) => tasks,
            Err(e) => {
                Self::rollback(database, &added_tables, Some(job_id));
                return Err(e);
            }
        };

        let job_name = draft.name().to_string();
        let descriptor = draft.into_descriptor(job_id, tasks);

        let written = async {
            for table in &table_descriptors {
                self.write_table(table).await?;
            }
            self.put_record(
                &DatasetPaths::job_descriptor(job_id),
                &descriptor,
                WritePrecondition::None,
            )
            .await?;
            self.write_database(database).await
        }
        .await;

        if let Err(e) = written {
            Self::rollback(database, &added_tables, Some(job_id));
            return Err(e);
        }

        tracing::info!(
            job = %job_name,
            id = %job_id,
            tables = added_tables.len(),
            tasks = descriptor.tasks.len(),
            "created job"
        );
        Ok(JobMetadata::new(descriptor))
    }

    fn resolve_tasks(database: &DatabaseMetadata, draft: &JobDraft) -> Result<Vec<Task>> {
        draft
            .tasks()
            .iter()
            .map(|task| {
                let output_table_id = database.table_id(&task.output_table)?;
                let samples = task
                    .samples
                    .iter()
                    .map(|sample| {
                        Ok(TableSample {
                            table_id: database.table_id(&sample.table)?,
                            rows: sample.rows.clone(),
                        })
                    })
                    .collect::<Result<Vec<_>>>()?;
                Ok(Task {
                    output_table_id,
                    samples,
                })
            })
            .collect()
    }

    fn rollback(database: &mut DatabaseMetadata, tables: &[TableId], job: Option<JobId>) {
        for &table_id in tables {
            let _ = database.remove_table(table_id);
        }
        if let Some(job_id) = job {
            let _ = database.remove_job(job_id);
        }
    }

    /// Removes a table entry and persists the updated catalog record.
    ///
    /// The leaf table descriptor (and any per-item descriptors under it)
    /// are left in place as unreferenced orphans; cleaning them up is an
    /// operational concern, not this layer's.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no present table has this id, or `Backend` on
    /// I/O failure (the in-memory removal is restored in that case).
    pub async fn remove_table(
        &self,
        database: &mut DatabaseMetadata,
        id: TableId,
    ) -> Result<()> {
        let name = database.table_name(id)?.to_string();
        database.remove_table(id)?;

        if let Err(e) = self.write_database(database).await {
            database.insert_table_entry(id, name);
            return Err(e);
        }

        tracing::info!(table = %name, id = %id, "removed table");
        Ok(())
    }

    /// Removes a job entry and persists the updated catalog record.
    ///
    /// The leaf job descriptor is left in place as an unreferenced orphan.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no present job has this id, or `Backend` on
    /// I/O failure (the in-memory removal is restored in that case).
    pub async fn remove_job(&self, database: &mut DatabaseMetadata, id: JobId) -> Result<()> {
        let name = database.job_name(id)?.to_string();
        database.remove_job(id)?;

        if let Err(e) = self.write_database(database).await {
            database.insert_job_entry(id, name);
            return Err(e);
        }

        tracing::info!(job = %name, id = %id, "removed job");
        Ok(())
    }

    /// Persists one video descriptor at its canonical coordinate path.
    ///
    /// Write-once: per-item descriptors are immutable, so the write carries
    /// the `DoesNotExist` precondition. Distinct coordinates never collide,
    /// so workers may call this fully concurrently with no coordination.
    ///
    /// # Errors
    ///
    /// Returns `Duplicate` if a descriptor already exists at this
    /// coordinate, or `Backend` on invalid descriptor or I/O failure.
    pub async fn write_video(&self, descriptor: &VideoDescriptor) -> Result<()> {
        descriptor
            .validate()
            .map_err(|m| CoreError::InvalidInput(format!("video descriptor: {m}")))?;

        let path = DatasetPaths::video_descriptor(
            descriptor.table_id,
            descriptor.column_id,
            descriptor.item_id,
        );
        match self
            .put_record(&path, descriptor, WritePrecondition::DoesNotExist)
            .await?
        {
            WriteResult::Success { .. } => Ok(()),
            WriteResult::PreconditionFailed { .. } => Err(CatalogError::duplicate(format!(
                "video descriptor at {path}"
            ))),
        }
    }

    /// Persists one image-format-group descriptor at its canonical
    /// coordinate path.
    ///
    /// Write-once, like [`write_video`](Self::write_video). The coordinate
    /// is passed explicitly because the record itself carries none.
    ///
    /// # Errors
    ///
    /// Returns `Duplicate` if a descriptor already exists at this
    /// coordinate, or `Backend` on invalid descriptor or I/O failure.
    pub async fn write_image_group(
        &self,
        table_id: TableId,
        column_id: ColumnId,
        item_id: ItemId,
        descriptor: &ImageFormatGroupDescriptor,
    ) -> Result<()> {
        descriptor
            .validate()
            .map_err(|m| CoreError::InvalidInput(format!("image group descriptor: {m}")))?;

        let path = DatasetPaths::image_group_descriptor(table_id, column_id, item_id);
        match self
            .put_record(&path, descriptor, WritePrecondition::DoesNotExist)
            .await?
        {
            WriteResult::Success { .. } => Ok(()),
            WriteResult::PreconditionFailed { .. } => Err(CatalogError::duplicate(format!(
                "image group descriptor at {path}"
            ))),
        }
    }

    async fn put_record<T>(
        &self,
        path: &str,
        value: &T,
        precondition: WritePrecondition,
    ) -> Result<WriteResult>
    where
        T: Serialize + Sync,
    {
        let bytes = encode(value)?;
        Ok(self.storage.put(path, bytes, precondition).await?)
    }
}
