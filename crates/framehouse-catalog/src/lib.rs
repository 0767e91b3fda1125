//! # framehouse-catalog
//!
//! Metadata catalog for Framehouse media datasets.
//!
//! This crate is the single source of truth a cluster of worker processes
//! shares about a dataset: which logical tables and processing jobs exist,
//! what their stable identifiers are, and where every per-item media
//! descriptor lives. It provides:
//!
//! - **Database Catalog**: the root index of tables and jobs, with
//!   monotonic id allocation and name uniqueness
//! - **Table & Job Entries**: schema and row-count bookkeeping per entity
//! - **Per-Item Media Descriptors**: keyframe and image-group indexes for
//!   random access into compressed blobs
//! - **Persistence Protocol**: leaf-before-root ordering so a crash never
//!   leaves the catalog referencing a missing descriptor
//!
//! ## Storage Layout
//!
//! ```text
//! {dataset_root}/
//! ├── catalog/
//! │   └── database.meta.json       # Root catalog record
//! ├── locks/
//! │   └── catalog.lock.json        # Mutation lock
//! ├── tables/
//! │   └── {table_id}/
//! │       ├── table.meta.json      # Table descriptor
//! │       └── items/               # Per-item media descriptors
//! └── jobs/
//!     └── {job_id}/
//!         └── job.meta.json        # Job descriptor
//! ```
//!
//! ## Concurrency Contract
//!
//! Catalog mutation (create/remove table or job) must be serialized to one
//! active writer per dataset; [`CatalogLock`] is the reference mechanism.
//! Per-item descriptor writes at distinct `(table, column, item)`
//! coordinates, and all reads, need no coordination.
//!
//! ## Example
//!
//! ```rust,ignore
//! use framehouse_catalog::prelude::*;
//!
//! let reader = CatalogReader::new(storage.clone());
//! let writer = CatalogWriter::new(storage);
//!
//! let mut db = match reader.load_database().await {
//!     Ok(db) => db,
//!     Err(e) if e.is_not_found() => DatabaseMetadata::new(),
//!     Err(e) => return Err(e),
//! };
//!
//! let table = writer.create_table(&mut db, draft).await?;
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]

pub mod column;
pub mod database;
pub mod error;
pub mod image_group;
pub mod job;
pub mod lock;
pub mod reader;
pub mod serialize;
pub mod table;
pub mod video;
pub mod writer;

// Re-export main types at crate root
pub use column::{Column, ColumnType};
pub use database::{DatabaseDescriptor, DatabaseMetadata, JobEntry, TableEntry};
pub use error::{CatalogError, Result};
pub use image_group::{
    ImageColorSpace, ImageEncodingType, ImageFormatGroupDescriptor, ImageFormatGroupMetadata,
};
pub use job::{
    JobDescriptor, JobDraft, JobMetadata, TableSample, TableSampleDraft, Task, TaskDraft,
};
pub use lock::{CatalogLock, LockGuard, LockInfo};
pub use reader::CatalogReader;
pub use table::{DraftError, TableDescriptor, TableDraft, TableMetadata};
pub use video::{VideoDescriptor, VideoMetadata};
pub use writer::CatalogWriter;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::column::{Column, ColumnType};
    pub use crate::database::DatabaseMetadata;
    pub use crate::error::{CatalogError, Result};
    pub use crate::image_group::{ImageFormatGroupDescriptor, ImageFormatGroupMetadata};
    pub use crate::job::{JobDraft, JobMetadata, TableSampleDraft, TaskDraft};
    pub use crate::lock::CatalogLock;
    pub use crate::reader::CatalogReader;
    pub use crate::table::{TableDraft, TableMetadata};
    pub use crate::video::{VideoDescriptor, VideoMetadata};
    pub use crate::writer::CatalogWriter;
}
