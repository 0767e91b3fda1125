//! Job catalog entries.
//!
//! A job records one completed unit of processing work: the columns it
//! produced, the output tables it wrote, and, per table, which row indices
//! it wrote. Downstream consumers use jobs to answer "how many rows does
//! table T have" without scanning the table itself, and to replay how work
//! was chunked into I/O and work units across a cluster.
//!
//! A job descriptor is immutable once the job completes; everything derived
//! from it in memory (including the row-count cache) relies on that.

use std::collections::HashMap;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use framehouse_core::{ColumnId, JobId, TableId};

use crate::column::Column;
use crate::error::{CatalogError, Result};
use crate::serialize::DESCRIPTOR_VERSION;
use crate::table::{validate_columns, validate_draft_columns, validate_name, DraftError};

/// Row indices a task wrote, sampled from one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableSample {
    /// Table the rows were sampled from.
    pub table_id: TableId,

    /// Ordered row indices.
    pub rows: Vec<u64>,
}

/// One unit of output work within a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Table this task wrote.
    pub output_table_id: TableId,

    /// Input samples; never empty.
    pub samples: Vec<TableSample>,
}

/// Persistent record shape of one job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobDescriptor {
    /// Record format version.
    pub version: u32,

    /// Job id, allocated by the database catalog.
    pub id: JobId,

    /// Job name.
    pub name: String,

    /// Rows grouped per I/O unit when the job ran.
    pub io_item_size: u64,

    /// Rows grouped per work unit when the job ran.
    pub work_item_size: u64,

    /// Number of cluster nodes the job ran on.
    pub num_nodes: u32,

    /// Ordered column schema the job produced.
    pub columns: Vec<Column>,

    /// Ordered output tasks.
    pub tasks: Vec<Task>,
}

impl JobDescriptor {
    /// Checks the record's structural invariants.
    ///
    /// # Errors
    ///
    /// Returns a message describing the first violation: a task without
    /// samples, or a repeated column id or name.
    pub fn validate(&self) -> std::result::Result<(), String> {
        for (index, task) in self.tasks.iter().enumerate() {
            if task.samples.is_empty() {
                return Err(format!("task {index} has no samples"));
            }
        }
        validate_columns(&self.columns)
    }
}

/// One task of a job draft, referencing tables by name.
///
/// Names are resolved to ids against the database catalog when the draft is
/// persisted, so a draft can target tables the same
/// [`create_job`](crate::writer::CatalogWriter::create_job) call introduces.
#[derive(Debug, Clone)]
pub struct TaskDraft {
    /// Name of the table this task wrote.
    pub output_table: String,

    /// Input samples, referencing tables by name; must not be empty.
    pub samples: Vec<TableSampleDraft>,
}

/// One sample of a task draft.
#[derive(Debug, Clone)]
pub struct TableSampleDraft {
    /// Name of the table the rows were sampled from.
    pub table: String,

    /// Ordered row indices.
    pub rows: Vec<u64>,
}

impl TableSampleDraft {
    /// Creates a sample draft.
    #[must_use]
    pub fn new(table: impl Into<String>, rows: Vec<u64>) -> Self {
        Self {
            table: table.into(),
            rows,
        }
    }
}

impl TaskDraft {
    /// Creates a task draft.
    #[must_use]
    pub fn new(output_table: impl Into<String>, samples: Vec<TableSampleDraft>) -> Self {
        Self {
            output_table: output_table.into(),
            samples,
        }
    }
}

/// Validated input for creating a job.
///
/// The id is assigned by the catalog when the draft is persisted.
#[derive(Debug, Clone)]
pub struct JobDraft {
    name: String,
    io_item_size: u64,
    work_item_size: u64,
    num_nodes: u32,
    columns: Vec<Column>,
    tasks: Vec<TaskDraft>,
}

impl JobDraft {
    /// Creates a job draft.
    ///
    /// # Errors
    ///
    /// Returns a [`DraftError`] for an empty or overlong name, duplicate
    /// column names or ids, or a task without samples.
    pub fn new(
        name: impl Into<String>,
        io_item_size: u64,
        work_item_size: u64,
        num_nodes: u32,
        columns: Vec<Column>,
        tasks: Vec<TaskDraft>,
    ) -> std::result::Result<Self, DraftError> {
        let name = name.into();
        validate_name(&name)?;
        validate_draft_columns(&columns)?;
        for (task_index, task) in tasks.iter().enumerate() {
            if task.samples.is_empty() {
                return Err(DraftError::EmptySamples { task_index });
            }
        }

        Ok(Self {
            name,
            io_item_size,
            work_item_size,
            num_nodes,
            columns,
            tasks,
        })
    }

    /// Returns the draft's job name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn tasks(&self) -> &[TaskDraft] {
        &self.tasks
    }

    pub(crate) fn into_descriptor(self, id: JobId, tasks: Vec<Task>) -> JobDescriptor {
        JobDescriptor {
            version: DESCRIPTOR_VERSION,
            id,
            name: self.name,
            io_item_size: self.io_item_size,
            work_item_size: self.work_item_size,
            num_nodes: self.num_nodes,
            columns: self.columns,
            tasks,
        }
    }
}

/// In-memory view of one job's catalog entry.
///
/// Wraps a validated [`JobDescriptor`] together with a name→id column map
/// and a lazily populated per-table row-count cache. The cache is never
/// invalidated: a completed job's descriptor is immutable, so an entry
/// computed once stays correct for the lifetime of this value. If mutation
/// of completed jobs is ever introduced, this cache must be invalidated
/// explicitly.
#[derive(Debug)]
pub struct JobMetadata {
    descriptor: JobDescriptor,
    column_ids: HashMap<String, ColumnId>,
    table_ids: Vec<TableId>,
    rows_cache: Mutex<HashMap<TableId, u64>>,
}

impl JobMetadata {
    /// Wraps a descriptor. The descriptor is assumed validated (the reader
    /// runs [`JobDescriptor::validate`] before handing records here).
    #[must_use]
    pub fn new(descriptor: JobDescriptor) -> Self {
        let column_ids = descriptor
            .columns
            .iter()
            .map(|c| (c.name.clone(), c.id))
            .collect();
        let table_ids = descriptor
            .tasks
            .iter()
            .map(|t| t.output_table_id)
            .collect();
        Self {
            descriptor,
            column_ids,
            table_ids,
            rows_cache: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the job id.
    #[must_use]
    pub fn id(&self) -> JobId {
        self.descriptor.id
    }

    /// Returns the job name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    /// Returns how many rows were grouped per I/O unit.
    #[must_use]
    pub fn io_item_size(&self) -> u64 {
        self.descriptor.io_item_size
    }

    /// Returns how many rows were grouped per work unit.
    #[must_use]
    pub fn work_item_size(&self) -> u64 {
        self.descriptor.work_item_size
    }

    /// Returns how many cluster nodes the job ran on.
    #[must_use]
    pub fn num_nodes(&self) -> u32 {
        self.descriptor.num_nodes
    }

    /// Returns the ordered column schema the job produced.
    #[must_use]
    pub fn columns(&self) -> &[Column] {
        &self.descriptor.columns
    }

    /// Looks up a produced column's id by name.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the job produced no column with this name.
    pub fn column_id(&self, name: &str) -> Result<ColumnId> {
        self.column_ids.get(name).copied().ok_or_else(|| {
            CatalogError::not_found(format!(
                "column {name:?} in job {:?}",
                self.descriptor.name
            ))
        })
    }

    /// Returns the output table ids, one per task, in task order.
    #[must_use]
    pub fn table_ids(&self) -> &[TableId] {
        &self.table_ids
    }

    /// Returns whether any task wrote to this table.
    #[must_use]
    pub fn has_table(&self, table_id: TableId) -> bool {
        self.table_ids.contains(&table_id)
    }

    /// Returns the row count this job wrote to `table_id`.
    ///
    /// Scans the tasks for the first one whose output targets `table_id`
    /// and returns its first sample's row count, memoizing per table id.
    /// When several tasks target the same table only the first is counted
    /// here, while [`total_rows`](Self::total_rows) sums across all tasks,
    /// so the two disagree for such jobs. Callers relying on either figure
    /// for multi-task-per-table jobs should audit which one they need.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no task references `table_id`.
    pub fn rows_in_table(&self, table_id: TableId) -> Result<u64> {
        let mut cache = self
            .rows_cache
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        if let Some(&rows) = cache.get(&table_id) {
            return Ok(rows);
        }

        let rows = self
            .descriptor
            .tasks
            .iter()
            .find(|task| task.output_table_id == table_id)
            .and_then(|task| task.samples.first())
            .map(|sample| sample.rows.len() as u64)
            .ok_or_else(|| {
                CatalogError::not_found(format!(
                    "table id {table_id} in job {:?}",
                    self.descriptor.name
                ))
            })?;

        cache.insert(table_id, rows);
        Ok(rows)
    }

    /// Returns the total rows produced across all of the job's tasks.
    ///
    /// Sums every task's first-sample row count, without deduplicating
    /// across tasks that target the same output table; see
    /// [`rows_in_table`](Self::rows_in_table) for the aggregation mismatch
    /// this implies.
    #[must_use]
    pub fn total_rows(&self) -> u64 {
        self.descriptor
            .tasks
            .iter()
            .filter_map(|task| task.samples.first())
            .map(|sample| sample.rows.len() as u64)
            .sum()
    }

    /// Returns the underlying descriptor.
    #[must_use]
    pub fn descriptor(&self) -> &JobDescriptor {
        &self.descriptor
    }
}
