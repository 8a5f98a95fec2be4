//! Copyright © 2025-2026 Wenze Wei. All Rights Reserved.
//!
//! This file is part of Prepline.
//! The Prepline project belongs to the Dunimd project team.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use prepline::action::{ActionContext, ActionContract, COLUMN_ID};
use prepline::chain::{diff_chain, InMemoryRepository, PreparationRepository, StepChain};
use prepline::metadata::{ColumnMetadata, ColumnType};
use prepline::pipeline::Pipeline;
use prepline::{Action, ActionRegistry, PreparationConfig, Result, Row, RowMetadata, ROOT_STEP_ID};

/// Adds a `flag` column and counts its compilations.
#[derive(Debug, Default)]
struct CountingFlag {
    compiles: AtomicUsize,
}

impl ActionContract for CountingFlag {
    fn name(&self) -> &'static str {
        "flag"
    }

    fn compile(&self, context: &mut ActionContext) -> Result<()> {
        self.compiles.fetch_add(1, Ordering::SeqCst);
        let after = context.parameter_or(COLUMN_ID, "0000").to_string();
        context.column("flag", |metadata| {
            metadata.insert_after(&after, ColumnMetadata::new("flag", ColumnType::Boolean))
        })?;
        Ok(())
    }

    fn apply(&self, row: &mut Row, context: &ActionContext) -> Result<()> {
        if let Some(id) = context.column_id("flag") {
            row.set(id, true);
        }
        Ok(())
    }
}

fn rows(count: usize) -> Vec<Row> {
    (0..count)
        .map(|i| Row::new().with("0000", format!("value {i}")).with_tdp_id(i as u64))
        .collect()
}

fn registry_with(flag: Arc<CountingFlag>) -> ActionRegistry {
    let mut registry = ActionRegistry::with_defaults();
    registry.register(flag).unwrap();
    registry
}

#[test]
fn test_schema_is_computed_once_per_run() {
    let flag = Arc::new(CountingFlag::default());
    let registry = registry_with(Arc::clone(&flag));
    let repository = InMemoryRepository::new();
    let chain = StepChain::new(&repository);
    let head = chain.append(ROOT_STEP_ID, Action::new("flag")).unwrap();

    let mut pipeline = Pipeline::builder()
        .actions(chain.head_actions(&head.id()).unwrap().actions())
        .registry(&registry)
        .steps(chain.list_steps(&head.id()).unwrap())
        .build()
        .unwrap();
    pipeline.execute(rows(50), &RowMetadata::with_names(["text"]));

    assert_eq!(flag.compiles.load(Ordering::SeqCst), 1);
    let output = pipeline.output();
    assert_eq!(output.len(), 50);
    assert!(output.rows().iter().all(|row| row.get("0001") == Some(&serde_json::Value::Bool(true))));
    assert_eq!(output.metadata().map(|m| m.len()), Some(2));
}

#[test]
fn test_executed_steps_carry_schema_and_diff() {
    let repository = InMemoryRepository::new();
    let chain = StepChain::new(&repository);
    let first = chain
        .append(
            ROOT_STEP_ID,
            Action::new("copy").with_parameter(COLUMN_ID, "0000"),
        )
        .unwrap();
    let head = chain
        .append(
            &first.id(),
            Action::new("uppercase").with_parameter(COLUMN_ID, "0001"),
        )
        .unwrap();

    let mut pipeline = Pipeline::builder()
        .actions(chain.head_actions(&head.id()).unwrap().actions())
        .steps(chain.list_steps(&head.id()).unwrap())
        .build()
        .unwrap();
    pipeline.execute(rows(3), &RowMetadata::with_names(["text"]));

    let executed = pipeline.executed_steps();
    assert_eq!(executed.len(), 2);
    assert_eq!(executed[0].id(), first.id());
    let diffs = diff_chain(&executed);
    assert_eq!(diffs[0].as_ref().map(|d| d.created_columns.clone()), Some(vec!["0001".to_string()]));
    assert!(diffs[1].as_ref().map(|d| d.is_empty()).unwrap_or(false));
    assert_eq!(executed[1].row_metadata().map(|m| m.len()), Some(2));

    let rows = pipeline.output().rows();
    assert_eq!(rows[0].get_str("0000"), Some("value 0"));
    assert_eq!(rows[0].get_str("0001"), Some("VALUE 0"));
}

#[test]
fn test_stored_schema_is_authoritative() {
    let repository = InMemoryRepository::new();
    let chain = StepChain::new(&repository);
    let head = chain
        .append(
            ROOT_STEP_ID,
            Action::new("uppercase").with_parameter(COLUMN_ID, "0000"),
        )
        .unwrap();
    let cached = RowMetadata::with_names(["TEXT"]);
    repository.add_step(head.clone().with_row_metadata(Some(cached.clone())));

    let mut pipeline = Pipeline::builder()
        .actions(chain.head_actions(&head.id()).unwrap().actions())
        .steps(chain.list_steps(&head.id()).unwrap())
        .build()
        .unwrap();
    pipeline.execute(rows(2), &RowMetadata::with_names(["text"]));

    assert_eq!(pipeline.output().metadata(), Some(cached));
}

#[test]
fn test_rerun_after_persisting_reuses_cache() {
    let flag = Arc::new(CountingFlag::default());
    let registry = registry_with(Arc::clone(&flag));
    let repository = InMemoryRepository::new();
    let chain = StepChain::new(&repository);
    let head = chain.append(ROOT_STEP_ID, Action::new("flag")).unwrap();
    let actions = chain.head_actions(&head.id()).unwrap();

    let mut first = Pipeline::builder()
        .actions(actions.actions())
        .registry(&registry)
        .steps(chain.list_steps(&head.id()).unwrap())
        .build()
        .unwrap();
    first.execute(rows(1), &RowMetadata::with_names(["text"]));
    for step in first.executed_steps() {
        repository.add_step(step);
    }

    let steps = chain.list_steps(&head.id()).unwrap();
    assert!(steps[1].row_metadata().is_some());

    let mut second = Pipeline::builder()
        .actions(actions.actions())
        .registry(&registry)
        .steps(steps)
        .build()
        .unwrap();
    second.execute(rows(5), &RowMetadata::with_names(["text"]));
    assert_eq!(second.output().metadata(), first.output().metadata());
    assert_eq!(second.executed_steps(), first.executed_steps());
}

#[test]
fn test_caching_off_runs_flat_pipeline() {
    let config = PreparationConfig::default().step_caching(false);
    let actions = [Action::new("copy").with_parameter(COLUMN_ID, "0000")];
    let mut pipeline = Pipeline::builder()
        .actions(&actions)
        .config(&config)
        .steps(vec![prepline::Step::root()])
        .build()
        .unwrap();
    pipeline.execute(rows(2), &RowMetadata::with_names(["text"]));

    assert!(pipeline.executed_steps().is_empty());
    assert_eq!(pipeline.output().rows()[1].get_str("0001"), Some("value 1"));
}
