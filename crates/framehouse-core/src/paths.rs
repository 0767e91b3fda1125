//! Canonical storage paths for catalog records.
//!
//! This module is the **single source of truth** for all descriptor storage
//! paths. All readers and writers must use these functions to construct
//! paths. No hardcoded path strings should exist outside this module.
//!
//! All paths are relative to the configured dataset root; the
//! [`DatasetStorage`](crate::dataset::DatasetStorage) handle applies the
//! prefix.
//!
//! # Path Layout
//!
//! ```text
//! {dataset_root}/
//! ├── catalog/
//! │   └── database.meta.json                 # Root catalog record
//! ├── locks/
//! │   └── catalog.lock.json                  # Mutation lock
//! ├── tables/
//! │   └── {table_id}/
//! │       ├── table.meta.json                # Table descriptor
//! │       └── items/
//! │           ├── {col}_{item}.video.meta.json
//! │           └── {col}_{item}.imagegroup.meta.json
//! └── jobs/
//!     └── {job_id}/
//!         └── job.meta.json                  # Job descriptor
//! ```
//!
//! Every entity kind gets its own directory or file suffix, so two entities
//! of different kinds can never resolve to the same path even when their
//! numeric ids coincide.

use crate::id::{ColumnId, ItemId, JobId, TableId};

/// Canonical path generator for catalog storage.
///
/// # Example
///
/// ```
/// use framehouse_core::paths::DatasetPaths;
/// use framehouse_core::id::TableId;
///
/// assert_eq!(DatasetPaths::DATABASE, "catalog/database.meta.json");
/// assert_eq!(
///     DatasetPaths::table_descriptor(TableId::from(4)),
///     "tables/4/table.meta.json"
/// );
/// ```
pub struct DatasetPaths;

impl DatasetPaths {
    // =========================================================================
    // Constants
    // =========================================================================

    /// Root catalog record path (entry point for all readers).
    pub const DATABASE: &'static str = "catalog/database.meta.json";

    /// Lock file serializing catalog mutations across writers.
    pub const CATALOG_LOCK: &'static str = "locks/catalog.lock.json";

    // =========================================================================
    // Table Paths
    // =========================================================================

    /// Returns the descriptor path for a table.
    #[must_use]
    pub fn table_descriptor(table_id: TableId) -> String {
        format!("tables/{table_id}/table.meta.json")
    }

    /// Returns the directory holding everything belonging to a table.
    #[must_use]
    pub fn table_dir(table_id: TableId) -> String {
        format!("tables/{table_id}/")
    }

    // =========================================================================
    // Job Paths
    // =========================================================================

    /// Returns the descriptor path for a job.
    #[must_use]
    pub fn job_descriptor(job_id: JobId) -> String {
        format!("jobs/{job_id}/job.meta.json")
    }

    /// Returns the directory holding everything belonging to a job.
    #[must_use]
    pub fn job_dir(job_id: JobId) -> String {
        format!("jobs/{job_id}/")
    }

    // =========================================================================
    // Per-Item Media Descriptor Paths
    // =========================================================================

    /// Returns the video descriptor path for one `(table, column, item)`
    /// coordinate.
    #[must_use]
    pub fn video_descriptor(table_id: TableId, column_id: ColumnId, item_id: ItemId) -> String {
        format!("tables/{table_id}/items/{column_id}_{item_id}.video.meta.json")
    }

    /// Returns the image-format-group descriptor path for one
    /// `(table, column, item)` coordinate.
    #[must_use]
    pub fn image_group_descriptor(
        table_id: TableId,
        column_id: ColumnId,
        item_id: ItemId,
    ) -> String {
        format!("tables/{table_id}/items/{column_id}_{item_id}.imagegroup.meta.json")
    }

    /// Returns the directory holding all per-item descriptors of a table.
    #[must_use]
    pub fn items_dir(table_id: TableId) -> String {
        format!("tables/{table_id}/items/")
    }
}
