//! The database catalog: the root index of all tables and jobs.
//!
//! One [`DatabaseMetadata`] instance exists per dataset root. It owns the
//! id↔name mapping for tables and jobs and allocates their identifiers;
//! it never stores leaf descriptor content. The in-memory state
//! materializes to a [`DatabaseDescriptor`] record which is rewritten
//! wholesale after every mutation (see
//! [`CatalogWriter`](crate::writer::CatalogWriter)).
//!
//! Id allocation is monotonic and never reissues: removing an entry leaves
//! `next_table_id`/`next_job_id` untouched, so a later entity can never
//! silently reuse the removed entity's canonical paths.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use framehouse_core::{JobId, TableId};

use crate::error::{CatalogError, Result};
use crate::serialize::DESCRIPTOR_VERSION;

/// One table entry of the root catalog record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableEntry {
    /// Table id.
    pub id: TableId,
    /// Table name, unique among present entries.
    pub name: String,
}

/// One job entry of the root catalog record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobEntry {
    /// Job id.
    pub id: JobId,
    /// Job name, unique among present entries.
    pub name: String,
}

/// Persistent record shape of the database catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseDescriptor {
    /// Record format version.
    pub version: u32,

    /// Next table id to allocate; strictly greater than every entry's id.
    pub next_table_id: u32,

    /// Next job id to allocate; strictly greater than every entry's id.
    pub next_job_id: u32,

    /// Present tables.
    pub tables: Vec<TableEntry>,

    /// Present jobs.
    pub jobs: Vec<JobEntry>,
}

impl DatabaseDescriptor {
    /// Checks the record's structural invariants.
    ///
    /// # Errors
    ///
    /// Returns a message describing the first violation: an entry id at or
    /// above its counter, a repeated id, or a repeated name.
    pub fn validate(&self) -> std::result::Result<(), String> {
        let mut table_ids = std::collections::HashSet::new();
        let mut table_names = std::collections::HashSet::new();
        for table in &self.tables {
            if table.id.as_u32() >= self.next_table_id {
                return Err(format!(
                    "table id {} is not below next_table_id {}",
                    table.id, self.next_table_id
                ));
            }
            if !table_ids.insert(table.id) {
                return Err(format!("table id {} appears twice", table.id));
            }
            if !table_names.insert(table.name.as_str()) {
                return Err(format!("table name {:?} appears twice", table.name));
            }
        }

        let mut job_ids = std::collections::HashSet::new();
        let mut job_names = std::collections::HashSet::new();
        for job in &self.jobs {
            if job.id.as_u32() >= self.next_job_id {
                return Err(format!(
                    "job id {} is not below next_job_id {}",
                    job.id, self.next_job_id
                ));
            }
            if !job_ids.insert(job.id) {
                return Err(format!("job id {} appears twice", job.id));
            }
            if !job_names.insert(job.name.as_str()) {
                return Err(format!("job name {:?} appears twice", job.name));
            }
        }

        Ok(())
    }
}

/// In-memory database catalog state.
///
/// All mutation happens through `add_*`/`remove_*`; none of these perform
/// I/O; persistence is the caller's responsibility and goes through
/// [`CatalogWriter`](crate::writer::CatalogWriter).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DatabaseMetadata {
    next_table_id: u32,
    next_job_id: u32,
    table_names: BTreeMap<TableId, String>,
    job_names: BTreeMap<JobId, String>,
}

impl DatabaseMetadata {
    /// Creates an empty catalog: counters at zero, no entries.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds in-memory state from a decoded record.
    ///
    /// The record is assumed validated (see [`DatabaseDescriptor::validate`];
    /// the reader runs it before handing records here).
    #[must_use]
    pub fn from_descriptor(descriptor: &DatabaseDescriptor) -> Self {
        let table_names = descriptor
            .tables
            .iter()
            .map(|t| (t.id, t.name.clone()))
            .collect();
        let job_names = descriptor
            .jobs
            .iter()
            .map(|j| (j.id, j.name.clone()))
            .collect();
        Self {
            next_table_id: descriptor.next_table_id,
            next_job_id: descriptor.next_job_id,
            table_names,
            job_names,
        }
    }

    /// Materializes the current state into the persistent record shape.
    ///
    /// Pure: no side effect beyond read. Entries are ordered by id.
    #[must_use]
    pub fn to_descriptor(&self) -> DatabaseDescriptor {
        DatabaseDescriptor {
            version: DESCRIPTOR_VERSION,
            next_table_id: self.next_table_id,
            next_job_id: self.next_job_id,
            tables: self
                .table_names
                .iter()
                .map(|(&id, name)| TableEntry {
                    id,
                    name: name.clone(),
                })
                .collect(),
            jobs: self
                .job_names
                .iter()
                .map(|(&id, name)| JobEntry {
                    id,
                    name: name.clone(),
                })
                .collect(),
        }
    }

    // === Tables ===

    /// Returns whether a table with this name is present.
    #[must_use]
    pub fn has_table(&self, name: &str) -> bool {
        self.table_names.values().any(|n| n == name)
    }

    /// Returns whether a table with this id is present.
    #[must_use]
    pub fn has_table_id(&self, id: TableId) -> bool {
        self.table_names.contains_key(&id)
    }

    /// Looks up a table id by name.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no present table has this name.
    pub fn table_id(&self, name: &str) -> Result<TableId> {
        self.table_names
            .iter()
            .find(|(_, n)| n.as_str() == name)
            .map(|(&id, _)| id)
            .ok_or_else(|| CatalogError::not_found(format!("table {name:?}")))
    }

    /// Looks up a table name by id.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no present table has this id.
    pub fn table_name(&self, id: TableId) -> Result<&str> {
        self.table_names
            .get(&id)
            .map(String::as_str)
            .ok_or_else(|| CatalogError::not_found(format!("table id {id}")))
    }

    /// Adds a table, allocating its id.
    ///
    /// No I/O happens here; on `Duplicate` the catalog is untouched.
    ///
    /// # Errors
    ///
    /// Returns `Duplicate` if a present table already has this name.
    pub fn add_table(&mut self, name: impl Into<String>) -> Result<TableId> {
        let name = name.into();
        if self.has_table(&name) {
            return Err(CatalogError::duplicate(format!("table {name:?}")));
        }
        let id = TableId::from(self.next_table_id);
        self.next_table_id += 1;
        self.table_names.insert(id, name);
        Ok(id)
    }

    /// Removes a table entry.
    ///
    /// The leaf table descriptor record is left in place; the catalog does
    /// no garbage collection. The id is never reallocated.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no present table has this id.
    pub fn remove_table(&mut self, id: TableId) -> Result<()> {
        self.table_names
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| CatalogError::not_found(format!("table id {id}")))
    }

    /// Returns present `(id, name)` table entries, ordered by id.
    pub fn table_entries(&self) -> impl Iterator<Item = (TableId, &str)> {
        self.table_names.iter().map(|(&id, name)| (id, name.as_str()))
    }

    /// Reinserts a table entry under an already-allocated id. Used by the
    /// writer to restore in-memory state when a persist fails mid-protocol.
    pub(crate) fn insert_table_entry(&mut self, id: TableId, name: String) {
        self.table_names.insert(id, name);
    }

    // === Jobs ===

    /// Returns whether a job with this name is present.
    #[must_use]
    pub fn has_job(&self, name: &str) -> bool {
        self.job_names.values().any(|n| n == name)
    }

    /// Returns whether a job with this id is present.
    #[must_use]
    pub fn has_job_id(&self, id: JobId) -> bool {
        self.job_names.contains_key(&id)
    }

    /// Looks up a job id by name.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no present job has this name.
    pub fn job_id(&self, name: &str) -> Result<JobId> {
        self.job_names
            .iter()
            .find(|(_, n)| n.as_str() == name)
            .map(|(&id, _)| id)
            .ok_or_else(|| CatalogError::not_found(format!("job {name:?}")))
    }

    /// Looks up a job name by id.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no present job has this id.
    pub fn job_name(&self, id: JobId) -> Result<&str> {
        self.job_names
            .get(&id)
            .map(String::as_str)
            .ok_or_else(|| CatalogError::not_found(format!("job id {id}")))
    }

    /// Adds a job, allocating its id.
    ///
    /// # Errors
    ///
    /// Returns `Duplicate` if a present job already has this name.
    pub fn add_job(&mut self, name: impl Into<String>) -> Result<JobId> {
        let name = name.into();
        if self.has_job(&name) {
            return Err(CatalogError::duplicate(format!("job {name:?}")));
        }
        let id = JobId::from(self.next_job_id);
        self.next_job_id += 1;
        self.job_names.insert(id, name);
        Ok(id)
    }

    /// Removes a job entry.
    ///
    /// The leaf job descriptor record is left in place. The id is never
    /// reallocated.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no present job has this id.
    pub fn remove_job(&mut self, id: JobId) -> Result<()> {
        self.job_names
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| CatalogError::not_found(format!("job id {id}")))
    }

    /// Returns present `(id, name)` job entries, ordered by id.
    pub fn job_entries(&self) -> impl Iterator<Item = (JobId, &str)> {
        self.job_names.iter().map(|(&id, name)| (id, name.as_str()))
    }

    /// Reinserts a job entry under an already-allocated id. Used by the
    /// writer to restore in-memory state when a persist fails mid-protocol.
    pub(crate) fn insert_job_entry(&mut self, id: JobId, name: String) {
        self.job_names.insert(id, name);
    }
}
