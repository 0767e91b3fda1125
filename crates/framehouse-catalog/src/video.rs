//! Per-item video descriptors.
//!
//! One video descriptor exists per `(table, column, item)` coordinate of a
//! video column: it describes the decoded shape of that item's compressed
//! blob and carries the keyframe index used for random access without
//! decoding from the start. Descriptors are written once, when the item's
//! blob is finalized, and never modified.

use serde::{Deserialize, Serialize};

use framehouse_core::{ColumnId, ItemId, TableId};

use crate::serialize::DESCRIPTOR_VERSION;

/// Persistent record shape of one video item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoDescriptor {
    /// Record format version.
    pub version: u32,

    /// Owning table.
    pub table_id: TableId,

    /// Owning column.
    pub column_id: ColumnId,

    /// Item index within the table.
    pub item_id: ItemId,

    /// Number of frames in this item.
    pub frames: u64,

    /// Frame width in pixels.
    pub width: u32,

    /// Frame height in pixels.
    pub height: u32,

    /// Frame indices of keyframes; strictly increasing.
    pub keyframe_positions: Vec<u64>,

    /// Byte offsets of keyframes into the compressed blob; strictly
    /// increasing, parallel to `keyframe_positions`.
    pub keyframe_byte_offsets: Vec<u64>,
}

impl VideoDescriptor {
    /// Creates a descriptor for one item.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        table_id: TableId,
        column_id: ColumnId,
        item_id: ItemId,
        frames: u64,
        width: u32,
        height: u32,
        keyframe_positions: Vec<u64>,
        keyframe_byte_offsets: Vec<u64>,
    ) -> Self {
        Self {
            version: DESCRIPTOR_VERSION,
            table_id,
            column_id,
            item_id,
            frames,
            width,
            height,
            keyframe_positions,
            keyframe_byte_offsets,
        }
    }

    /// Checks the record's structural invariants.
    ///
    /// # Errors
    ///
    /// Returns a message describing the first violation: keyframe sequences
    /// of different lengths, or a sequence that is not strictly increasing.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.keyframe_positions.len() != self.keyframe_byte_offsets.len() {
            return Err(format!(
                "keyframe index lengths differ: {} positions, {} byte offsets",
                self.keyframe_positions.len(),
                self.keyframe_byte_offsets.len()
            ));
        }
        if !strictly_increasing(&self.keyframe_positions) {
            return Err("keyframe_positions must be strictly increasing".into());
        }
        if !strictly_increasing(&self.keyframe_byte_offsets) {
            return Err("keyframe_byte_offsets must be strictly increasing".into());
        }
        Ok(())
    }
}

fn strictly_increasing(values: &[u64]) -> bool {
    values.windows(2).all(|pair| pair[0] < pair[1])
}

/// In-memory view of one video item's descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoMetadata {
    descriptor: VideoDescriptor,
}

impl VideoMetadata {
    /// Wraps a descriptor. The descriptor is assumed validated (the reader
    /// runs [`VideoDescriptor::validate`] before handing records here).
    #[must_use]
    pub fn new(descriptor: VideoDescriptor) -> Self {
        Self { descriptor }
    }

    /// Returns the owning table.
    #[must_use]
    pub fn table_id(&self) -> TableId {
        self.descriptor.table_id
    }

    /// Returns the owning column.
    #[must_use]
    pub fn column_id(&self) -> ColumnId {
        self.descriptor.column_id
    }

    /// Returns the item index within the table.
    #[must_use]
    pub fn item_id(&self) -> ItemId {
        self.descriptor.item_id
    }

    /// Returns the number of frames in this item.
    #[must_use]
    pub fn frames(&self) -> u64 {
        self.descriptor.frames
    }

    /// Returns the frame width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.descriptor.width
    }

    /// Returns the frame height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.descriptor.height
    }

    /// Returns the frame indices of keyframes.
    #[must_use]
    pub fn keyframe_positions(&self) -> &[u64] {
        &self.descriptor.keyframe_positions
    }

    /// Returns the keyframe byte offsets into the compressed blob.
    #[must_use]
    pub fn keyframe_byte_offsets(&self) -> &[u64] {
        &self.descriptor.keyframe_byte_offsets
    }

    /// Returns the underlying descriptor.
    #[must_use]
    pub fn descriptor(&self) -> &VideoDescriptor {
        &self.descriptor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serialize::{decode, encode};

    fn sample() -> VideoDescriptor {
        VideoDescriptor::new(
            TableId::from(1),
            ColumnId::from(0),
            ItemId::from(4),
            300,
            1920,
            1080,
            vec![0, 120, 240],
            vec![0, 65536, 120000],
        )
    }

    #[test]
    fn test_accessors() {
        let video = VideoMetadata::new(sample());
        assert_eq!(video.table_id(), TableId::from(1));
        assert_eq!(video.column_id(), ColumnId::from(0));
        assert_eq!(video.item_id(), ItemId::from(4));
        assert_eq!(video.frames(), 300);
        assert_eq!(video.width(), 1920);
        assert_eq!(video.height(), 1080);
        assert_eq!(video.keyframe_positions(), &[0, 120, 240]);
        assert_eq!(video.keyframe_byte_offsets(), &[0, 65536, 120000]);
    }

    #[test]
    fn test_validate_accepts_empty_index() {
        let mut descriptor = sample();
        descriptor.keyframe_positions.clear();
        descriptor.keyframe_byte_offsets.clear();
        descriptor.validate().expect("valid");
    }

    #[test]
    fn test_validate_rejects_length_mismatch() {
        let mut descriptor = sample();
        descriptor.keyframe_byte_offsets.pop();
        assert!(descriptor.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_non_increasing_sequences() {
        let mut descriptor = sample();
        descriptor.keyframe_positions = vec![0, 120, 120];
        assert!(descriptor.validate().is_err());

        let mut descriptor = sample();
        descriptor.keyframe_byte_offsets = vec![65536, 0, 120000];
        assert!(descriptor.validate().is_err());
    }

    #[test]
    fn test_descriptor_roundtrip() {
        let descriptor = sample();
        let bytes = encode(&descriptor).expect("encode");
        let decoded: VideoDescriptor = decode("v.json", &bytes).expect("decode");
        assert_eq!(decoded, descriptor);
    }

    #[test]
    fn test_descriptor_roundtrip_zero_frames() {
        let descriptor = VideoDescriptor::new(
            TableId::from(0),
            ColumnId::from(0),
            ItemId::from(0),
            0,
            0,
            0,
            Vec::new(),
            Vec::new(),
        );
        let bytes = encode(&descriptor).expect("encode");
        let decoded: VideoDescriptor = decode("v.json", &bytes).expect("decode");
        assert_eq!(decoded, descriptor);
        decoded.validate().expect("valid");
    }
}
