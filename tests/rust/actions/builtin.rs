//! Copyright © 2025-2026 Wenze Wei. All Rights Reserved.
//!
//! This file is part of Prepline.
//! The Prepline project belongs to the Dunimd project team.

use prepline::action::COLUMN_ID;
use prepline::pipeline::Pipeline;
use prepline::{Action, ActionRegistry, PrepError, Row, RowMetadata};

fn execute(actions: &[Action], rows: Vec<Row>, metadata: &RowMetadata) -> Pipeline {
    let mut pipeline = Pipeline::builder().actions(actions).build().unwrap();
    pipeline.execute(rows, metadata);
    pipeline
}

#[test]
fn test_default_registry_resolves_bundled_actions() {
    let registry = ActionRegistry::with_defaults();
    for name in ["uppercase", "copy", "split"] {
        assert_eq!(registry.lookup(name).unwrap().name(), name);
    }
    assert!(matches!(
        registry.lookup("delete_lines"),
        Err(PrepError::UnknownAction { .. })
    ));
}

#[test]
fn test_split_then_uppercase_new_column() {
    let actions = [
        Action::new("split")
            .with_parameter(COLUMN_ID, "0000")
            .with_parameter("separator", "@"),
        Action::new("uppercase").with_parameter(COLUMN_ID, "0003"),
    ];
    let pipeline = execute(
        &actions,
        vec![Row::new().with("0000", "jane@example.com").with("0001", "42")],
        &RowMetadata::with_names(["email", "age"]),
    );

    let row = &pipeline.output().rows()[0];
    assert_eq!(row.get_str("0002"), Some("jane"));
    assert_eq!(row.get_str("0003"), Some("EXAMPLE.COM"));
    let metadata = pipeline.output().metadata().unwrap();
    assert_eq!(metadata.ids(), vec!["0000", "0002", "0003", "0001"]);
    assert_eq!(
        metadata.get_by_id("0002").map(|c| c.name.as_str()),
        Some("email_split")
    );
}

#[test]
fn test_copy_of_missing_column_changes_nothing() {
    let actions = [Action::new("copy").with_parameter(COLUMN_ID, "0005")];
    let row = Row::new().with("0000", "x");
    let metadata = RowMetadata::with_names(["only"]);
    let pipeline = execute(&actions, vec![row.clone()], &metadata);

    assert_eq!(pipeline.output().rows(), vec![row]);
    assert_eq!(pipeline.output().metadata(), Some(metadata));
}

#[test]
fn test_two_copies_of_same_column() {
    let actions = [
        Action::new("copy").with_parameter(COLUMN_ID, "0000"),
        Action::new("copy").with_parameter(COLUMN_ID, "0000"),
    ];
    let pipeline = execute(
        &actions,
        vec![Row::new().with("0000", "v")],
        &RowMetadata::with_names(["col"]),
    );
    let metadata = pipeline.output().metadata().unwrap();
    assert_eq!(metadata.ids(), vec!["0000", "0002", "0001"]);
    let row = &pipeline.output().rows()[0];
    assert_eq!(row.get_str("0001"), Some("v"));
    assert_eq!(row.get_str("0002"), Some("v"));
}

#[test]
fn test_split_without_value_leaves_cells_unset() {
    let actions = [Action::new("split").with_parameter(COLUMN_ID, "0000")];
    let pipeline = execute(
        &actions,
        vec![Row::new().with("0001", "other")],
        &RowMetadata::with_names(["email", "age"]),
    );
    let row = &pipeline.output().rows()[0];
    assert!(row.get("0002").is_none());
    assert_eq!(pipeline.output().metadata().map(|m| m.len()), Some(4));
}
