//! Descriptor wire encoding.
//!
//! Descriptors are persisted as camelCase JSON. The format is a durability
//! contract: it must stay readable for the lifetime of a dataset. Two rules
//! keep it evolvable:
//!
//! - every record carries a `version` field, and
//! - unknown-but-present fields are tolerated on decode (serde's default),
//!   so records written by a newer release remain readable.
//!
//! Truncated or otherwise malformed input fails with
//! [`CatalogError::CorruptRecord`] naming the offending record's path.

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{CatalogError, Result};

/// Current descriptor format version, stamped into every record written.
pub const DESCRIPTOR_VERSION: u32 = 1;

/// Encodes a descriptor to its persistent byte representation.
///
/// # Errors
///
/// Returns a serialization failure wrapped as a backend error. This cannot
/// occur for the descriptor types in this crate (plain structs, string keys).
pub fn encode<T: Serialize>(value: &T) -> Result<Bytes> {
    let vec = serde_json::to_vec_pretty(value).map_err(|e| {
        CatalogError::Backend(framehouse_core::Error::Serialization {
            message: format!("encode descriptor: {e}"),
        })
    })?;
    Ok(Bytes::from(vec))
}

/// Decodes a descriptor from its persistent byte representation.
///
/// `path` is the dataset-relative location the bytes came from; it is
/// reported in the error on failure.
///
/// # Errors
///
/// Returns `CatalogError::CorruptRecord` on truncated or malformed input.
pub fn decode<T: DeserializeOwned>(path: &str, bytes: &[u8]) -> Result<T> {
    serde_json::from_slice(bytes).map_err(|e| CatalogError::corrupt(path, e.to_string()))
}
