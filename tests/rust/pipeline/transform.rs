//! Copyright © 2025-2026 Wenze Wei. All Rights Reserved.
//!
//! This file is part of Prepline.
//! The Prepline project belongs to the Dunimd project team.

use std::sync::{Arc, Mutex};

use prepline::action::{ActionContext, ActionContract, Parameters, COLUMN_ID};
use prepline::actions::{CopyColumn, Uppercase};
use prepline::pipeline::{
    transform, ActionNode, BasicNode, CompileNode, Node, NodeBuilder, NodeKind, Pipeline,
    StepNodeTransformer,
};
use prepline::{Action, PrepError, PreparationActions, Row, RowMetadata, Step};
use proptest::prelude::*;

fn pair(action: Arc<dyn ActionContract>) -> (Node, Node) {
    let mut parameters = Parameters::new();
    parameters.insert(COLUMN_ID.to_string(), "0000".to_string());
    let context = Arc::new(Mutex::new(ActionContext::new(parameters)));
    (
        Node::Compile(CompileNode::new(Arc::clone(&action), Arc::clone(&context))),
        Node::Action(ActionNode::new(action, context)),
    )
}

fn flat_pipeline(count: usize, trailing: bool) -> Pipeline {
    let mut builder = NodeBuilder::source();
    for i in 0..count {
        let action: Arc<dyn ActionContract> = if i % 2 == 0 {
            Arc::new(Uppercase)
        } else {
            Arc::new(CopyColumn)
        };
        let (compile, apply) = pair(action);
        builder = builder.to(compile).to(apply);
    }
    if trailing {
        builder = builder.to(Node::Basic(BasicNode::new()));
    }
    builder.into_pipeline()
}

fn chain(count: usize) -> Vec<Step> {
    let mut steps = vec![Step::root()];
    let mut content = PreparationActions::root();
    for i in 0..count {
        content = content.append([Action::new(format!("action{i}"))], "1.0");
        let step = Step::new(&steps[i], &content, "1.0");
        steps.push(step);
    }
    steps
}

fn bound_steps(pipeline: &Pipeline) -> Vec<String> {
    pipeline.executed_steps().iter().map(Step::id).collect()
}

#[test]
fn test_pairs_become_step_nodes() {
    let pipeline = flat_pipeline(2, false);
    let steps = chain(2);

    let transformed = pipeline.transform(&steps).unwrap();
    assert_eq!(
        transformed.node_kinds(),
        vec![NodeKind::Source, NodeKind::Step, NodeKind::Step]
    );
    assert_eq!(bound_steps(&transformed), vec![steps[1].id(), steps[2].id()]);
}

#[test]
fn test_missing_steps_fail_before_any_row() {
    let pipeline = flat_pipeline(2, false);
    let err = pipeline.transform(&[Step::root()]).unwrap_err();
    assert!(matches!(err, PrepError::InsufficientSteps { available: 0 }));
    assert!(pipeline.output().is_empty());
}

#[test]
fn test_one_step_short_fails() {
    let pipeline = flat_pipeline(2, false);
    let err = pipeline.transform(&chain(1)).unwrap_err();
    assert!(matches!(err, PrepError::InsufficientSteps { available: 1 }));
}

#[test]
fn test_trailing_node_is_preserved() {
    let pipeline = flat_pipeline(2, true);
    let transformed = pipeline.transform(&chain(2)).unwrap();
    assert_eq!(
        transformed.node_kinds(),
        vec![NodeKind::Source, NodeKind::Step, NodeKind::Step, NodeKind::Basic]
    );
}

#[test]
fn test_surplus_steps_are_tolerated() {
    let pipeline = flat_pipeline(1, false);
    let steps = chain(3);
    let transformed = pipeline.transform(&steps).unwrap();
    assert_eq!(bound_steps(&transformed), vec![steps[1].id()]);
}

#[test]
fn test_transform_is_idempotent() {
    let steps = chain(2);
    let once = flat_pipeline(2, true).transform(&steps).unwrap();
    let twice = once.transform(&steps).unwrap();
    assert_eq!(once.node_kinds(), twice.node_kinds());
    assert_eq!(bound_steps(&once), bound_steps(&twice));
}

#[test]
fn test_input_pipeline_is_left_untouched() {
    let pipeline = flat_pipeline(2, false);
    let before = pipeline.node_kinds();
    let _ = pipeline.transform(&chain(2)).unwrap();
    assert_eq!(pipeline.node_kinds(), before);
}

#[test]
fn test_input_and_transformed_pipelines_run_independently() {
    let (compile, apply) = pair(Arc::new(CopyColumn));
    let mut flat = NodeBuilder::source().to(compile).to(apply).into_pipeline();
    let mut transformed = flat.transform(&chain(1)).unwrap();
    let cities = RowMetadata::with_names(["city"]);

    transformed.execute(vec![Row::new().with("0000", "nantes")], &cities);
    transformed.output().clear();
    flat.execute(
        vec![Row::new().with("0000", "x").with("0001", "y")],
        &RowMetadata::with_names(["a", "b"]),
    );
    assert_eq!(flat.output().rows()[0].get_str("0002"), Some("x"));
    flat.output().clear();
    transformed.execute(vec![Row::new().with("0000", "nantes")], &cities);

    let rows = transformed.output().rows();
    let schema = transformed.output().metadata().unwrap();
    assert_eq!(schema.ids(), vec!["0000", "0001"]);
    assert_eq!(rows[0].get_str("0001"), Some("nantes"));
    for id in rows[0].values.keys() {
        assert!(schema.contains(id), "column {id} missing from schema");
    }
}

#[test]
fn test_transformed_pipeline_runs_both_actions() {
    let mut transformed = flat_pipeline(2, false).transform(&chain(2)).unwrap();
    transformed.execute(
        vec![Row::new().with("0000", "brest")],
        &RowMetadata::with_names(["city"]),
    );
    let rows = transformed.output().rows();
    assert_eq!(rows[0].get_str("0000"), Some("BREST"));
    assert_eq!(rows[0].get_str("0001"), Some("BREST"));
}

#[test]
fn test_free_function_matches_method() {
    let pipeline = flat_pipeline(1, false);
    let head = transform(pipeline.head(), &chain(1)).unwrap();
    assert_eq!(head.kind(), NodeKind::Source);
}

#[test]
fn test_invalidation_keeps_leading_caches() {
    let mut steps = chain(2);
    steps[1] = steps[1]
        .clone()
        .with_row_metadata(Some(RowMetadata::with_names(["city"])));
    let pipeline = flat_pipeline(2, false);
    let head = StepNodeTransformer::new(&steps)
        .invalidate_downstream()
        .transform(pipeline.head())
        .unwrap();
    let transformed = Pipeline::new(head, pipeline.output().clone());
    let executed = transformed.executed_steps();
    assert!(executed[0].row_metadata().is_some());
    assert!(executed[1].row_metadata().is_none());
}

proptest! {
    #[test]
    fn prop_one_step_node_per_pair(count in 0usize..12) {
        let pipeline = flat_pipeline(count, false);
        let transformed = pipeline.transform(&chain(count)).unwrap();
        let step_nodes = transformed
            .node_kinds()
            .into_iter()
            .filter(|kind| *kind == NodeKind::Step)
            .count();
        prop_assert_eq!(step_nodes, count);
        prop_assert_eq!(transformed.executed_steps().len(), count);
    }
}
