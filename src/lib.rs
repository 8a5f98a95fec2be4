//! Copyright © 2025-2026 Wenze Wei. All Rights Reserved.
//!
//! This file is part of Prepline.
//! The Prepline project belongs to the Dunimd Team.
//!
//! Licensed under the Apache License, Version 2.0 (the "License");
//! You may not use this file except in compliance with the License.
//! You may obtain a copy of the License at
//!
//!     http://www.apache.org/licenses/LICENSE-2.0
//!
//! Unless required by applicable law or agreed to in writing, software
//! distributed under the License is distributed on an "AS IS" BASIS,
//! WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//! See the License for the specific language governing permissions and
//! limitations under the License.

//! # Prepline Core Library
//!
//! Replayable data preparations: an immutable, content-addressed chain of
//! versioned steps, and a streaming node graph that executes those steps
//! over dataset rows while caching the schema each step produces.
//!
//! ## Module Overview
//!
//! - **row** / **metadata**: in-memory records and their column schema
//! - **action**: the two-phase compile/apply contract of row transforms
//! - **actions**: a few bundled actions
//! - **registry**: name to action resolution
//! - **step** / **chain**: versioned steps and operations over their chain
//! - **pipeline**: nodes, links, visitors and the step grouping transform
//! - **config**: pipeline assembly settings
//!
//! ## Quick Start
//!
//! ```rust
//! use prepline::{Action, InMemoryRepository, Pipeline, Row, RowMetadata, StepChain, ROOT_STEP_ID};
//!
//! let repository = InMemoryRepository::new();
//! let chain = StepChain::new(&repository);
//! let action = Action::new("uppercase").with_parameter("column_id", "0000");
//! let head = chain.append(ROOT_STEP_ID, action).unwrap();
//!
//! let steps = chain.list_steps(&head.id()).unwrap();
//! let actions = chain.head_actions(&head.id()).unwrap();
//! let mut pipeline = Pipeline::builder()
//!     .actions(actions.actions())
//!     .steps(steps)
//!     .build()
//!     .unwrap();
//!
//! pipeline.execute(vec![Row::new().with("0000", "nantes")], &RowMetadata::with_names(["city"]));
//! let executed = pipeline.executed_steps();
//! assert!(executed[0].row_metadata().is_some());
//! ```
//!
//! ## Error Handling
//!
//! Fallible operations return [`Result<T>`] with a [`PrepError`]. Chain
//! inconsistencies are fatal; a canceled or failing action is not an error
//! and lets rows through unchanged.

pub mod action;
pub mod actions;
pub mod chain;
pub mod config;
pub mod errors;
pub mod hashing;
pub mod metadata;
pub mod pipeline;
pub mod registry;
pub mod row;
pub mod step;

pub use action::{Action, ActionContext, ActionContract, ActionStatus, Parameters};
pub use chain::{InMemoryRepository, PreparationRepository, StepChain};
pub use config::PreparationConfig;
pub use errors::{PrepError, Result};
pub use metadata::{ColumnMetadata, ColumnType, RowMetadata};
pub use pipeline::{Collector, Node, NodeBuilder, NodeKind, Pipeline, PipelineBuilder, Signal};
pub use registry::ActionRegistry;
pub use row::Row;
pub use step::{PreparationActions, Step, StepDiff, ROOT_ACTIONS_ID, ROOT_STEP_ID};
