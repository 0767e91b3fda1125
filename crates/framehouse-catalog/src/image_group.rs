//! Per-item image-format-group descriptors.
//!
//! One image-format-group descriptor exists per `(table, column, item)`
//! coordinate of an image column: it describes a run of same-format,
//! same-size encoded images concatenated into one blob. Prefix-summing
//! `compressed_sizes` yields each image's byte offset into the blob.
//!
//! Unlike video descriptors the record carries no coordinate fields; the
//! coordinate is encoded in the record's canonical path.

use serde::{Deserialize, Serialize};

use crate::serialize::DESCRIPTOR_VERSION;

/// Encoding of the images in a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum ImageEncodingType {
    /// JPEG-encoded images.
    #[default]
    Jpeg,
    /// PNG-encoded images.
    Png,
    /// Raw (unencoded) pixel data.
    Raw,
}

/// Color space of the images in a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum ImageColorSpace {
    /// Three-channel RGB.
    #[default]
    Rgb,
    /// Four-channel RGB with alpha.
    Rgba,
    /// Single-channel grayscale.
    Gray,
}

/// Persistent record shape of one image-format-group item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageFormatGroupDescriptor {
    /// Record format version.
    pub version: u32,

    /// Number of images in the group.
    pub num_images: u32,

    /// Image width in pixels.
    pub width: u32,

    /// Image height in pixels.
    pub height: u32,

    /// Encoding shared by all images in the group.
    pub encoding_type: ImageEncodingType,

    /// Color space shared by all images in the group.
    pub color_space: ImageColorSpace,

    /// Compressed size of each image, in order; length equals `num_images`.
    pub compressed_sizes: Vec<u64>,
}

impl ImageFormatGroupDescriptor {
    /// Creates a descriptor for one group.
    #[must_use]
    pub fn new(
        width: u32,
        height: u32,
        encoding_type: ImageEncodingType,
        color_space: ImageColorSpace,
        compressed_sizes: Vec<u64>,
    ) -> Self {
        Self {
            version: DESCRIPTOR_VERSION,
            num_images: u32::try_from(compressed_sizes.len()).unwrap_or(u32::MAX),
            width,
            height,
            encoding_type,
            color_space,
            compressed_sizes,
        }
    }

    /// Checks the record's structural invariants.
    ///
    /// # Errors
    ///
    /// Returns a message when `compressed_sizes` does not have exactly
    /// `num_images` entries.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.compressed_sizes.len() as u64 != u64::from(self.num_images) {
            return Err(format!(
                "compressed_sizes has {} entries, expected num_images = {}",
                self.compressed_sizes.len(),
                self.num_images
            ));
        }
        Ok(())
    }
}

/// In-memory view of one image-format-group item's descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFormatGroupMetadata {
    descriptor: ImageFormatGroupDescriptor,
}

impl ImageFormatGroupMetadata {
    /// Wraps a descriptor. The descriptor is assumed validated (the reader
    /// runs [`ImageFormatGroupDescriptor::validate`] before handing records
    /// here).
    #[must_use]
    pub fn new(descriptor: ImageFormatGroupDescriptor) -> Self {
        Self { descriptor }
    }

    /// Returns the number of images in the group.
    #[must_use]
    pub fn num_images(&self) -> u32 {
        self.descriptor.num_images
    }

    /// Returns the image width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.descriptor.width
    }

    /// Returns the image height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.descriptor.height
    }

    /// Returns the group's encoding.
    #[must_use]
    pub fn encoding_type(&self) -> ImageEncodingType {
        self.descriptor.encoding_type
    }

    /// Returns the group's color space.
    #[must_use]
    pub fn color_space(&self) -> ImageColorSpace {
        self.descriptor.color_space
    }

    /// Returns the compressed size of each image, in order.
    #[must_use]
    pub fn compressed_sizes(&self) -> &[u64] {
        &self.descriptor.compressed_sizes
    }

    /// Returns each image's byte offset into the group's blob.
    ///
    /// The offsets are the prefix sums of `compressed_sizes`: image `i`
    /// occupies `offsets[i]..offsets[i] + compressed_sizes[i]`.
    #[must_use]
    pub fn byte_offsets(&self) -> Vec<u64> {
        let mut offsets = Vec::with_capacity(self.descriptor.compressed_sizes.len());
        let mut offset = 0u64;
        for &size in &self.descriptor.compressed_sizes {
            offsets.push(offset);
            offset += size;
        }
        offsets
    }

    /// Returns the underlying descriptor.
    #[must_use]
    pub fn descriptor(&self) -> &ImageFormatGroupDescriptor {
        &self.descriptor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serialize::{decode, encode};

    fn sample() -> ImageFormatGroupDescriptor {
        ImageFormatGroupDescriptor::new(
            640,
            480,
            ImageEncodingType::Jpeg,
            ImageColorSpace::Rgb,
            vec![1000, 2500, 800],
        )
    }

    #[test]
    fn test_accessors() {
        let group = ImageFormatGroupMetadata::new(sample());
        assert_eq!(group.num_images(), 3);
        assert_eq!(group.width(), 640);
        assert_eq!(group.height(), 480);
        assert_eq!(group.encoding_type(), ImageEncodingType::Jpeg);
        assert_eq!(group.color_space(), ImageColorSpace::Rgb);
        assert_eq!(group.compressed_sizes(), &[1000, 2500, 800]);
    }

    #[test]
    fn test_byte_offsets_are_prefix_sums() {
        let group = ImageFormatGroupMetadata::new(sample());
        assert_eq!(group.byte_offsets(), vec![0, 1000, 3500]);
    }

    #[test]
    fn test_byte_offsets_empty_group() {
        let group = ImageFormatGroupMetadata::new(ImageFormatGroupDescriptor::new(
            0,
            0,
            ImageEncodingType::Raw,
            ImageColorSpace::Gray,
            Vec::new(),
        ));
        assert_eq!(group.num_images(), 0);
        assert!(group.byte_offsets().is_empty());
    }

    #[test]
    fn test_validate_rejects_count_mismatch() {
        let mut descriptor = sample();
        descriptor.num_images = 2;
        assert!(descriptor.validate().is_err());
    }

    #[test]
    fn test_descriptor_roundtrip() {
        let descriptor = sample();
        descriptor.validate().expect("valid");
        let bytes = encode(&descriptor).expect("encode");
        let decoded: ImageFormatGroupDescriptor = decode("g.json", &bytes).expect("decode");
        assert_eq!(decoded, descriptor);
    }

    #[test]
    fn test_enum_wire_names() {
        let json = serde_json::to_string(&sample()).expect("serialize");
        assert!(json.contains("\"encodingType\":\"jpeg\""));
        assert!(json.contains("\"colorSpace\":\"rgb\""));
    }
}
