//! Catalog read operations.
//!
//! The reader loads persisted records by canonical path, decodes and
//! validates them, and hands back the in-memory views. Reads never take the
//! mutation lock: records are only ever replaced wholesale, so a concurrent
//! reader observes either the old or the new whole record.
//!
//! Error mapping is uniform across all loads:
//! - missing record → recoverable [`CatalogError::NotFound`]
//! - undecodable or invalid record → [`CatalogError::CorruptRecord`]
//! - backend I/O failure → [`CatalogError::Backend`], propagated verbatim

use serde::de::DeserializeOwned;

use framehouse_core::{ColumnId, DatasetPaths, DatasetStorage, ItemId, JobId, TableId};

use crate::database::{DatabaseDescriptor, DatabaseMetadata};
use crate::error::{CatalogError, Result};
use crate::image_group::{ImageFormatGroupDescriptor, ImageFormatGroupMetadata};
use crate::job::{JobDescriptor, JobMetadata};
use crate::serialize::decode;
use crate::table::{TableDescriptor, TableMetadata};
use crate::video::{VideoDescriptor, VideoMetadata};

/// Reader for catalog records.
#[derive(Debug, Clone)]
pub struct CatalogReader {
    storage: DatasetStorage,
}

impl CatalogReader {
    /// Creates a new reader over the given dataset.
    #[must_use]
    pub fn new(storage: DatasetStorage) -> Self {
        Self { storage }
    }

    /// Returns the dataset storage this reader is scoped to.
    #[must_use]
    pub fn storage(&self) -> &DatasetStorage {
        &self.storage
    }

    /// Loads the database catalog.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when no catalog record exists yet, a valid and
    /// recoverable state meaning "no dataset here"; start from
    /// [`DatabaseMetadata::new`] in that case.
    pub async fn load_database(&self) -> Result<DatabaseMetadata> {
        let descriptor: DatabaseDescriptor = self
            .read_record(DatasetPaths::DATABASE, "database catalog")
            .await?;
        descriptor
            .validate()
            .map_err(|m| CatalogError::corrupt(DatasetPaths::DATABASE, m))?;
        Ok(DatabaseMetadata::from_descriptor(&descriptor))
    }

    /// Loads one table's catalog entry.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no record exists for this id, `CorruptRecord`
    /// if the record fails to decode or validate.
    pub async fn load_table(&self, id: TableId) -> Result<TableMetadata> {
        let path = DatasetPaths::table_descriptor(id);
        let descriptor: TableDescriptor = self.read_record(&path, "table descriptor").await?;
        descriptor
            .validate()
            .map_err(|m| CatalogError::corrupt(&path, m))?;
        if descriptor.id != id {
            return Err(CatalogError::corrupt(
                &path,
                format!("record carries table id {}, expected {id}", descriptor.id),
            ));
        }
        Ok(TableMetadata::new(descriptor))
    }

    /// Loads one job's catalog entry.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no record exists for this id, `CorruptRecord`
    /// if the record fails to decode or validate.
    pub async fn load_job(&self, id: JobId) -> Result<JobMetadata> {
        let path = DatasetPaths::job_descriptor(id);
        let descriptor: JobDescriptor = self.read_record(&path, "job descriptor").await?;
        descriptor
            .validate()
            .map_err(|m| CatalogError::corrupt(&path, m))?;
        if descriptor.id != id {
            return Err(CatalogError::corrupt(
                &path,
                format!("record carries job id {}, expected {id}", descriptor.id),
            ));
        }
        Ok(JobMetadata::new(descriptor))
    }

    /// Loads the video descriptor for one `(table, column, item)` coordinate.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no record exists at this coordinate,
    /// `CorruptRecord` if the record fails to decode or validate.
    pub async fn load_video(
        &self,
        table_id: TableId,
        column_id: ColumnId,
        item_id: ItemId,
    ) -> Result<VideoMetadata> {
        let path = DatasetPaths::video_descriptor(table_id, column_id, item_id);
        let descriptor: VideoDescriptor = self.read_record(&path, "video descriptor").await?;
        descriptor
            .validate()
            .map_err(|m| CatalogError::corrupt(&path, m))?;
        if (descriptor.table_id, descriptor.column_id, descriptor.item_id)
            != (table_id, column_id, item_id)
        {
            return Err(CatalogError::corrupt(
                &path,
                format!(
                    "record carries coordinate ({}, {}, {}), expected ({table_id}, {column_id}, {item_id})",
                    descriptor.table_id, descriptor.column_id, descriptor.item_id
                ),
            ));
        }
        Ok(VideoMetadata::new(descriptor))
    }

    /// Loads the image-format-group descriptor for one
    /// `(table, column, item)` coordinate.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no record exists at this coordinate,
    /// `CorruptRecord` if the record fails to decode or validate.
    pub async fn load_image_group(
        &self,
        table_id: TableId,
        column_id: ColumnId,
        item_id: ItemId,
    ) -> Result<ImageFormatGroupMetadata> {
        let path = DatasetPaths::image_group_descriptor(table_id, column_id, item_id);
        let descriptor: ImageFormatGroupDescriptor =
            self.read_record(&path, "image group descriptor").await?;
        descriptor
            .validate()
            .map_err(|m| CatalogError::corrupt(&path, m))?;
        Ok(ImageFormatGroupMetadata::new(descriptor))
    }

    async fn read_record<T>(&self, path: &str, what: &str) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let bytes = match self.storage.get(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.is_not_found() => {
                return Err(CatalogError::not_found(format!("{what} at {path}")));
            }
            Err(e) => return Err(e.into()),
        };
        decode(path, &bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use framehouse_core::{MemoryBackend, WritePrecondition};
    use std::sync::Arc;

    fn storage() -> DatasetStorage {
        DatasetStorage::new(Arc::new(MemoryBackend::new()), "datasets/demo").expect("storage")
    }

    #[tokio::test]
    async fn test_load_database_not_found_is_recoverable() {
        let reader = CatalogReader::new(storage());
        let err = reader.load_database().await.expect_err("no dataset yet");
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_load_database_corrupt_record() {
        let storage = storage();
        storage
            .put(
                DatasetPaths::DATABASE,
                Bytes::from("{ truncated"),
                WritePrecondition::None,
            )
            .await
            .expect("put");

        let reader = CatalogReader::new(storage);
        let err = reader.load_database().await.expect_err("must fail");
        assert!(matches!(err, CatalogError::CorruptRecord { .. }));
    }

    #[tokio::test]
    async fn test_load_table_rejects_mismatched_id() {
        let storage = storage();

        // A table record stored at id 3's path but carrying id 4.
        let descriptor = crate::table::TableDraft::new("frames", 10, 5, Vec::new())
            .expect("draft")
            .into_descriptor(TableId::from(4));
        let bytes = crate::serialize::encode(&descriptor).expect("encode");
        storage
            .put(
                &DatasetPaths::table_descriptor(TableId::from(3)),
                bytes,
                WritePrecondition::None,
            )
            .await
            .expect("put");

        let reader = CatalogReader::new(storage);
        let err = reader
            .load_table(TableId::from(3))
            .await
            .expect_err("must fail");
        assert!(matches!(err, CatalogError::CorruptRecord { .. }));
    }
}
