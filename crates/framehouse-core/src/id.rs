//! Strongly-typed identifiers for catalog entities.
//!
//! All identifiers are sequential `u32` values allocated by the database
//! catalog (tables and jobs) or by the writer that produced the entity
//! (columns within a schema, items within a table). The newtype wrappers
//! prevent mixing up id kinds at compile time while serializing as plain
//! numbers on the wire.
//!
//! Unlike ad-hoc global counters, allocation state lives in the catalog
//! record itself (`next_table_id` / `next_job_id`), so a freshly loaded
//! catalog resumes allocation exactly where the persisted record left off.
//!
//! # Example
//!
//! ```rust
//! use framehouse_core::id::{TableId, JobId};
//!
//! let table = TableId::from(3);
//! assert_eq!(table.as_u32(), 3);
//!
//! // Ids are different types - this won't compile:
//! // let wrong: TableId = JobId::from(3);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! catalog_id {
    ($(#[$docs:meta])* $name:ident) => {
        $(#[$docs])*
        #[derive(
            Debug, Copy, Clone, Eq, PartialOrd, Ord, PartialEq, Serialize, Deserialize, Hash,
        )]
        pub struct $name(u32);

        impl $name {
            /// Returns the raw numeric value.
            #[must_use]
            pub const fn as_u32(&self) -> u32 {
                self.0
            }
        }

        impl From<u32> for $name {
            fn from(value: u32) -> Self {
                Self(value)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

catalog_id! {
    /// Identifier of a logical table, allocated by the database catalog.
    TableId
}

catalog_id! {
    /// Identifier of a processing job, allocated by the database catalog.
    JobId
}

catalog_id! {
    /// Identifier of a column within one table's or job's schema.
    ColumnId
}

catalog_id! {
    /// Index of one storage item (a `rows_per_item`-sized chunk) of a table.
    ItemId
}
