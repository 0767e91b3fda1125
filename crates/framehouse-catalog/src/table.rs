//! Table catalog entries.
//!
//! A table is the logical unit of row-addressable data. Its descriptor holds
//! the schema and row-count bookkeeping; the rows themselves are chunked
//! into items of `rows_per_item` rows, each independently stored and
//! independently described (see [`crate::video`] and
//! [`crate::image_group`]).

use serde::{Deserialize, Serialize};
use thiserror::Error;

use framehouse_core::{ColumnId, TableId};

use crate::column::{Column, ColumnType};
use crate::error::{CatalogError, Result};
use crate::serialize::DESCRIPTOR_VERSION;

/// Maximum length of a table or job name, in bytes.
pub const MAX_NAME_LEN: usize = 255;

/// Persistent record shape of one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableDescriptor {
    /// Record format version.
    pub version: u32,

    /// Table id, allocated by the database catalog.
    pub id: TableId,

    /// Table name.
    pub name: String,

    /// Total number of rows.
    pub num_rows: u64,

    /// Rows per storage item; always at least 1.
    pub rows_per_item: u64,

    /// Ordered column schema.
    pub columns: Vec<Column>,
}

impl TableDescriptor {
    /// Checks the record's structural invariants.
    ///
    /// # Errors
    ///
    /// Returns a message describing the first violation: a zero
    /// `rows_per_item` or a repeated column id or name.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.rows_per_item == 0 {
            return Err("rows_per_item must be at least 1".into());
        }
        validate_columns(&self.columns)
    }
}

pub(crate) fn validate_columns(columns: &[Column]) -> std::result::Result<(), String> {
    let mut ids = std::collections::HashSet::new();
    let mut names = std::collections::HashSet::new();
    for column in columns {
        if !ids.insert(column.id) {
            return Err(format!("column id {} appears twice", column.id));
        }
        if !names.insert(column.name.as_str()) {
            return Err(format!("column name {:?} appears twice", column.name));
        }
    }
    Ok(())
}

/// Errors for draft validation.
///
/// Drafts are validated at construction, before they touch the catalog, so
/// a writer never has to roll anything back for malformed input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DraftError {
    /// Name is empty.
    #[error("name cannot be empty")]
    EmptyName,

    /// Name exceeds [`MAX_NAME_LEN`].
    #[error("name is too long ({len} > {MAX_NAME_LEN} bytes)")]
    NameTooLong {
        /// The actual length.
        len: usize,
    },

    /// `rows_per_item` was zero.
    #[error("rows_per_item must be at least 1")]
    ZeroRowsPerItem,

    /// Two columns share a name.
    #[error("column name {name:?} appears twice")]
    DuplicateColumnName {
        /// The repeated name.
        name: String,
    },

    /// Two columns share an id.
    #[error("column id {id} appears twice")]
    DuplicateColumnId {
        /// The repeated id.
        id: ColumnId,
    },

    /// A job task carried no samples.
    #[error("task {task_index} has no samples")]
    EmptySamples {
        /// Index of the offending task.
        task_index: usize,
    },
}

pub(crate) fn validate_name(name: &str) -> std::result::Result<(), DraftError> {
    if name.is_empty() {
        return Err(DraftError::EmptyName);
    }
    if name.len() > MAX_NAME_LEN {
        return Err(DraftError::NameTooLong { len: name.len() });
    }
    Ok(())
}

pub(crate) fn validate_draft_columns(columns: &[Column]) -> std::result::Result<(), DraftError> {
    let mut ids = std::collections::HashSet::new();
    let mut names = std::collections::HashSet::new();
    for column in columns {
        if !ids.insert(column.id) {
            return Err(DraftError::DuplicateColumnId { id: column.id });
        }
        if !names.insert(column.name.as_str()) {
            return Err(DraftError::DuplicateColumnName {
                name: column.name.clone(),
            });
        }
    }
    Ok(())
}

/// Validated input for creating a table.
///
/// The id is assigned by the catalog when the draft is persisted via
/// [`CatalogWriter::create_table`](crate::writer::CatalogWriter::create_table).
#[derive(Debug, Clone)]
pub struct TableDraft {
    name: String,
    num_rows: u64,
    rows_per_item: u64,
    columns: Vec<Column>,
}

impl TableDraft {
    /// Creates a table draft.
    ///
    /// # Errors
    ///
    /// Returns a [`DraftError`] for an empty or overlong name, a zero
    /// `rows_per_item`, or duplicate column names or ids.
    pub fn new(
        name: impl Into<String>,
        num_rows: u64,
        rows_per_item: u64,
        columns: Vec<Column>,
    ) -> std::result::Result<Self, DraftError> {
        let name = name.into();
        validate_name(&name)?;
        if rows_per_item == 0 {
            return Err(DraftError::ZeroRowsPerItem);
        }
        validate_draft_columns(&columns)?;

        Ok(Self {
            name,
            num_rows,
            rows_per_item,
            columns,
        })
    }

    /// Returns the draft's table name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn into_descriptor(self, id: TableId) -> TableDescriptor {
        TableDescriptor {
            version: DESCRIPTOR_VERSION,
            id,
            name: self.name,
            num_rows: self.num_rows,
            rows_per_item: self.rows_per_item,
            columns: self.columns,
        }
    }
}

/// In-memory view of one table's catalog entry.
///
/// Wraps a validated [`TableDescriptor`]. Column lookups are linear scans:
/// table schemas are small (tens of columns), so no index is kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableMetadata {
    descriptor: TableDescriptor,
}

impl TableMetadata {
    /// Wraps a descriptor. The descriptor is assumed validated (the reader
    /// runs [`TableDescriptor::validate`] before handing records here).
    #[must_use]
    pub fn new(descriptor: TableDescriptor) -> Self {
        Self { descriptor }
    }

    /// Returns the table id.
    #[must_use]
    pub fn id(&self) -> TableId {
        self.descriptor.id
    }

    /// Returns the table name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    /// Returns the total number of rows.
    #[must_use]
    pub fn num_rows(&self) -> u64 {
        self.descriptor.num_rows
    }

    /// Returns the number of rows per storage item.
    #[must_use]
    pub fn rows_per_item(&self) -> u64 {
        self.descriptor.rows_per_item
    }

    /// Returns the number of storage items holding this table's rows.
    #[must_use]
    pub fn num_items(&self) -> u64 {
        self.descriptor.num_rows.div_ceil(self.descriptor.rows_per_item)
    }

    /// Returns the ordered column schema.
    #[must_use]
    pub fn columns(&self) -> &[Column] {
        &self.descriptor.columns
    }

    /// Looks up a column id by name.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no column has this name. Probing for optional
    /// columns this way is normal control flow, not a fault.
    pub fn column_id(&self, name: &str) -> Result<ColumnId> {
        self.descriptor
            .columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.id)
            .ok_or_else(|| {
                CatalogError::not_found(format!(
                    "column {name:?} in table {:?}",
                    self.descriptor.name
                ))
            })
    }

    /// Looks up a column name by id.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no column has this id.
    pub fn column_name(&self, id: ColumnId) -> Result<&str> {
        self.descriptor
            .columns
            .iter()
            .find(|c| c.id == id)
            .map(|c| c.name.as_str())
            .ok_or_else(|| {
                CatalogError::not_found(format!(
                    "column id {id} in table {:?}",
                    self.descriptor.name
                ))
            })
    }

    /// Looks up a column type by id.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no column has this id.
    pub fn column_type(&self, id: ColumnId) -> Result<ColumnType> {
        self.descriptor
            .columns
            .iter()
            .find(|c| c.id == id)
            .map(|c| c.column_type)
            .ok_or_else(|| {
                CatalogError::not_found(format!(
                    "column id {id} in table {:?}",
                    self.descriptor.name
                ))
            })
    }

    /// Returns the underlying descriptor.
    #[must_use]
    pub fn descriptor(&self) -> &TableDescriptor {
        &self.descriptor
    }

    /// Consumes the view, returning the descriptor.
    #[must_use]
    pub fn into_descriptor(self) -> TableDescriptor {
        self.descriptor
    }
}
