//! Copyright © 2025-2026 Wenze Wei. All Rights Reserved.
//!
//! This file is part of Prepline.
//! The Prepline project belongs to the Dunimd project team.

use prepline::metadata::{ColumnMetadata, ColumnType, RowMetadata};
use prepline::PrepError;
use proptest::prelude::*;

#[test]
fn test_insert_after_splices_with_fresh_id() {
    let mut metadata = RowMetadata::with_names(["first", "last", "email"]);
    let id = metadata
        .insert_after("0000", ColumnMetadata::new("middle", ColumnType::String))
        .unwrap();

    assert_eq!(id, "0003");
    assert_eq!(metadata.ids(), vec!["0000", "0003", "0001", "0002"]);
    assert_eq!(metadata.get_by_name("middle").map(|c| c.id.as_str()), Some("0003"));
}

#[test]
fn test_insert_after_unknown_column_fails() {
    let mut metadata = RowMetadata::with_names(["a"]);
    let err = metadata
        .insert_after("0042", ColumnMetadata::new("b", ColumnType::String))
        .unwrap_err();
    assert!(matches!(err, PrepError::Schema { .. }));
    assert_eq!(metadata.len(), 1);
}

#[test]
fn test_diff_lists_created_columns() {
    let before = RowMetadata::with_names(["a"]);
    let mut after = before.clone();
    after.add_column(ColumnMetadata::new("b", ColumnType::String));
    after.add_column(ColumnMetadata::new("c", ColumnType::String));

    assert_eq!(after.diff(&before).created_columns, vec!["0001", "0002"]);
    assert!(before.diff(&after).is_empty());
}

#[test]
fn test_metadata_serializes_column_type() {
    let metadata = RowMetadata::with_names(["a"]);
    let json = serde_json::to_value(&metadata).unwrap();
    assert_eq!(json["columns"][0]["type"], "string");
    assert_eq!(json["columns"][0]["id"], "0000");
}

#[test]
fn test_deserialized_schema_allocates_past_existing_ids() {
    let mut metadata: RowMetadata =
        serde_json::from_str(r#"{"columns":[{"id":"0000","name":"city"}]}"#).unwrap();
    let id = metadata
        .insert_after("0000", ColumnMetadata::new("city_copy", ColumnType::String))
        .unwrap();

    assert_eq!(id, "0001");
    assert_eq!(metadata.ids(), vec!["0000", "0001"]);
}

#[test]
fn test_deserialized_schema_keeps_higher_stored_counter() {
    let mut metadata: RowMetadata = serde_json::from_str(
        r#"{"columns":[{"id":"0001","name":"a"}],"next_id":5}"#,
    )
    .unwrap();
    metadata.add_column(ColumnMetadata::new("b", ColumnType::String));
    assert_eq!(metadata.ids(), vec!["0001", "0005"]);
}

#[test]
fn test_deserialized_schema_rejects_duplicate_ids() {
    let parsed = serde_json::from_str::<RowMetadata>(
        r#"{"columns":[{"id":"0000","name":"a"},{"id":"0000","name":"b"}]}"#,
    );
    assert!(parsed.is_err());
}

proptest! {
    #[test]
    fn prop_ids_stay_unique(ops in proptest::collection::vec((any::<bool>(), 0usize..8), 1..40)) {
        let mut metadata = RowMetadata::with_names(["seed"]);
        for (insert, position) in ops {
            let ids = metadata.ids();
            if insert || ids.is_empty() {
                match ids.get(position % ids.len().max(1)) {
                    Some(after) => {
                        metadata
                            .insert_after(after, ColumnMetadata::new("c", ColumnType::String))
                            .unwrap();
                    }
                    None => {
                        metadata.add_column(ColumnMetadata::new("c", ColumnType::String));
                    }
                }
            } else {
                metadata.delete_column(&ids[position % ids.len()]);
            }
            let mut ids = metadata.ids();
            let count = ids.len();
            ids.sort();
            ids.dedup();
            prop_assert_eq!(ids.len(), count);
        }
    }
}
