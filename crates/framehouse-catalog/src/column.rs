//! Column schema types shared by tables and jobs.
//!
//! A column describes one stream of per-row data. Its identity is the pair
//! of its owning table or job and its id; the name must be unique within
//! that owner (enforced at draft construction, see
//! [`TableDraft`](crate::table::TableDraft)).

use serde::{Deserialize, Serialize};

use framehouse_core::ColumnId;

/// Kind of data a column holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum ColumnType {
    /// Opaque per-row byte blobs.
    #[default]
    Bytes,
    /// Compressed video, indexed per item by a video descriptor.
    Video,
    /// Encoded images, indexed per item by an image-format-group descriptor.
    Image,
}

/// One column of a table's or job's schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    /// Column id, unique within the owning table or job.
    pub id: ColumnId,

    /// Column name, unique within the owning table or job.
    pub name: String,

    /// Kind of data the column holds.
    pub column_type: ColumnType,
}

impl Column {
    /// Creates a new column.
    #[must_use]
    pub fn new(id: ColumnId, name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            id,
            name: name.into(),
            column_type,
        }
    }
}
