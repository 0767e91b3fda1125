//! Path contract tests.
//!
//! Canonical paths are a durability contract: records written today must be
//! findable forever. These tests pin the exact layout and verify that
//! distinct identity tuples can never resolve to the same location.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::collections::HashSet;
use std::sync::Arc;

use framehouse_core::{
    ColumnId, DatasetPaths, DatasetStorage, ItemId, JobId, MemoryBackend, TableId,
};

use framehouse_catalog::{
    CatalogReader, CatalogWriter, DatabaseMetadata, ImageColorSpace, ImageEncodingType,
    ImageFormatGroupDescriptor, TableDraft, VideoDescriptor,
};

/// The canonical layout is pinned: changing any of these strings breaks
/// every existing dataset.
#[test]
fn canonical_paths_are_stable() {
    assert_eq!(DatasetPaths::DATABASE, "catalog/database.meta.json");
    assert_eq!(DatasetPaths::CATALOG_LOCK, "locks/catalog.lock.json");
    assert_eq!(
        DatasetPaths::table_descriptor(TableId::from(12)),
        "tables/12/table.meta.json"
    );
    assert_eq!(
        DatasetPaths::job_descriptor(JobId::from(12)),
        "jobs/12/job.meta.json"
    );
    assert_eq!(
        DatasetPaths::video_descriptor(TableId::from(1), ColumnId::from(2), ItemId::from(3)),
        "tables/1/items/2_3.video.meta.json"
    );
    assert_eq!(
        DatasetPaths::image_group_descriptor(TableId::from(1), ColumnId::from(2), ItemId::from(3)),
        "tables/1/items/2_3.imagegroup.meta.json"
    );
}

/// Distinct identity tuples resolve to distinct paths, across kinds and
/// across coordinates, even when every numeric id coincides.
#[test]
fn no_two_identities_share_a_path() {
    let mut seen = HashSet::new();

    seen.insert(DatasetPaths::DATABASE.to_string());
    seen.insert(DatasetPaths::CATALOG_LOCK.to_string());

    for id in 0..4u32 {
        assert!(seen.insert(DatasetPaths::table_descriptor(TableId::from(id))));
        assert!(seen.insert(DatasetPaths::job_descriptor(JobId::from(id))));
        for column in 0..4u32 {
            for item in 0..4u32 {
                assert!(seen.insert(DatasetPaths::video_descriptor(
                    TableId::from(id),
                    ColumnId::from(column),
                    ItemId::from(item),
                )));
                assert!(seen.insert(DatasetPaths::image_group_descriptor(
                    TableId::from(id),
                    ColumnId::from(column),
                    ItemId::from(item),
                )));
            }
        }
    }
}

/// Numeric id formatting is unambiguous: `(12, 3)` and `(1, 23)` style
/// coordinate pairs must not produce the same file name.
#[test]
fn coordinate_formatting_is_unambiguous() {
    let a = DatasetPaths::video_descriptor(TableId::from(0), ColumnId::from(12), ItemId::from(3));
    let b = DatasetPaths::video_descriptor(TableId::from(0), ColumnId::from(1), ItemId::from(23));
    assert_ne!(a, b);
}

/// A video descriptor and an image-group descriptor at the same coordinate
/// coexist: their kind-specific suffixes keep them apart on storage.
#[tokio::test]
async fn video_and_image_group_coexist_at_same_coordinate() {
    let storage =
        DatasetStorage::new(Arc::new(MemoryBackend::new()), "datasets/paths").expect("storage");
    let writer = CatalogWriter::new(storage.clone());
    let reader = CatalogReader::new(storage);

    let mut db = DatabaseMetadata::new();
    let table = writer
        .create_table(
            &mut db,
            TableDraft::new("mixed", 10, 5, Vec::new()).expect("draft"),
        )
        .await
        .expect("create");

    let coordinate = (table.id(), ColumnId::from(0), ItemId::from(0));

    writer
        .write_video(&VideoDescriptor::new(
            coordinate.0,
            coordinate.1,
            coordinate.2,
            10,
            640,
            480,
            vec![0],
            vec![0],
        ))
        .await
        .expect("write video");

    writer
        .write_image_group(
            coordinate.0,
            coordinate.1,
            coordinate.2,
            &ImageFormatGroupDescriptor::new(
                640,
                480,
                ImageEncodingType::Jpeg,
                ImageColorSpace::Rgb,
                vec![100],
            ),
        )
        .await
        .expect("write image group");

    // Both load back independently.
    let video = reader
        .load_video(coordinate.0, coordinate.1, coordinate.2)
        .await
        .expect("load video");
    assert_eq!(video.frames(), 10);

    let group = reader
        .load_image_group(coordinate.0, coordinate.1, coordinate.2)
        .await
        .expect("load group");
    assert_eq!(group.num_images(), 1);
}
