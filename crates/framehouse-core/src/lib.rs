//! # framehouse-core
//!
//! Core abstractions for the Framehouse media dataset catalog.
//!
//! This crate provides the foundational types and traits used across all
//! Framehouse components:
//!
//! - **Storage Contract**: Abstract object-storage interface the catalog
//!   writes descriptors through
//! - **Identifiers**: Strongly-typed sequential ids for tables, jobs,
//!   columns, and items
//! - **Canonical Paths**: The single source of truth for descriptor storage
//!   locations
//! - **Dataset Scoping**: A storage handle bound to one configured dataset
//!   root
//! - **Error Types**: Shared error definitions and result types
//!
//! ## Crate Boundary
//!
//! `framehouse-core` is the **only** crate allowed to define shared
//! primitives. The catalog crate builds its domain types on top of these.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use framehouse_core::prelude::*;
//!
//! let backend = Arc::new(MemoryBackend::new());
//! let storage = DatasetStorage::new(backend, "datasets/demo").unwrap();
//! assert_eq!(storage.root(), "datasets/demo");
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]

pub mod dataset;
pub mod error;
pub mod id;
pub mod observability;
pub mod paths;
pub mod storage;

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```rust
/// use framehouse_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::dataset::DatasetStorage;
    pub use crate::error::{Error, Result};
    pub use crate::id::{ColumnId, ItemId, JobId, TableId};
    pub use crate::paths::DatasetPaths;
    pub use crate::storage::{
        MemoryBackend, ObjectMeta, StorageBackend, WritePrecondition, WriteResult,
    };
}

// Re-export key types at crate root for ergonomics
pub use dataset::DatasetStorage;
pub use error::{Error, Result};
pub use id::{ColumnId, ItemId, JobId, TableId};
pub use observability::{init_logging, LogFormat};
pub use paths::DatasetPaths;
pub use storage::{MemoryBackend, ObjectMeta, StorageBackend, WritePrecondition, WriteResult};
