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

//! # Prepline Action Module
//!
//! Actions are the per-row transforms a preparation is made of. Each
//! implementation of [`ActionContract`] works in two phases:
//!
//! - `compile` runs once per schema. It inspects the [`RowMetadata`] held by
//!   the [`ActionContext`], may cancel the action (for instance when a
//!   required column is missing) and may create output columns.
//! - `apply` runs once per row with the compiled context. The context is
//!   borrowed immutably, so only `compile` can change the schema.
//!
//! ## Lazy Columns
//!
//! Output columns are requested by logical name through
//! [`ActionContext::column`]. The factory closure only runs the first time a
//! name is resolved in a context; later calls return the cached physical id.
//! Columns are therefore never created for an action that cancels before
//! asking for them, and never created twice.
//!
//! ```rust
//! use prepline::action::ActionContext;
//! use prepline::metadata::{ColumnMetadata, ColumnType, RowMetadata};
//!
//! let mut context = ActionContext::new(Default::default());
//! context.set_row_metadata(RowMetadata::with_names(["city"]));
//! let id = context
//!     .column("result", |metadata| {
//!         metadata.insert_after("0000", ColumnMetadata::new("city_copy", ColumnType::String))
//!     })
//!     .unwrap();
//! assert_eq!(context.column_id("result"), Some(id.as_str()));
//! ```

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::{PrepError, Result};
use crate::metadata::RowMetadata;
use crate::row::Row;

/// Flat string parameters of an action, sorted by key.
pub type Parameters = BTreeMap<String, String>;

/// Parameter naming the column an action works on.
pub const COLUMN_ID: &str = "column_id";

/// A named operation and its parameters, as stored in a preparation.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Action {
    name: String,
    #[serde(default)]
    parameters: Parameters,
}

impl Action {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parameters: Parameters::new(),
        }
    }

    /// Returns a copy of this action with one more parameter.
    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    pub fn with_parameters(mut self, parameters: Parameters) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }
}

/// Outcome of the compile phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionStatus {
    Ok,
    Canceled,
}

/// State shared by the compile and apply phases of one action.
#[derive(Clone, Debug)]
pub struct ActionContext {
    status: ActionStatus,
    row_metadata: RowMetadata,
    parameters: Parameters,
    columns: HashMap<String, String>,
}

impl ActionContext {
    pub fn new(parameters: Parameters) -> Self {
        Self {
            status: ActionStatus::Ok,
            row_metadata: RowMetadata::new(),
            parameters,
            columns: HashMap::new(),
        }
    }

    pub fn status(&self) -> ActionStatus {
        self.status
    }

    pub fn is_canceled(&self) -> bool {
        self.status == ActionStatus::Canceled
    }

    /// Marks the action as not applicable; rows will pass through untouched.
    pub fn cancel(&mut self) {
        self.status = ActionStatus::Canceled;
    }

    pub fn row_metadata(&self) -> &RowMetadata {
        &self.row_metadata
    }

    pub fn row_metadata_mut(&mut self) -> &mut RowMetadata {
        &mut self.row_metadata
    }

    pub fn set_row_metadata(&mut self, metadata: RowMetadata) {
        self.row_metadata = metadata;
    }

    /// Prepares the context for a new compilation against `metadata`.
    ///
    /// Status goes back to `Ok` and lazily created columns are forgotten,
    /// since their ids belonged to the previous schema.
    pub fn reset(&mut self, metadata: RowMetadata) {
        self.status = ActionStatus::Ok;
        self.row_metadata = metadata;
        self.columns.clear();
    }

    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    pub fn parameter(&self, key: &str) -> Option<&str> {
        self.parameters.get(key).map(String::as_str)
    }

    pub fn parameter_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.parameter(key).unwrap_or(default)
    }

    /// Resolves the logical column `name`, creating it with `factory` on
    /// first use. The factory receives the context schema and returns the
    /// physical id of the column it created.
    pub fn column<F>(&mut self, name: &str, factory: F) -> Result<String>
    where
        F: FnOnce(&mut RowMetadata) -> Result<String>,
    {
        if let Some(id) = self.columns.get(name) {
            return Ok(id.clone());
        }
        let id = factory(&mut self.row_metadata)?;
        self.columns.insert(name.to_string(), id.clone());
        Ok(id)
    }

    /// Physical id of a logical column created during compile.
    pub fn column_id(&self, name: &str) -> Option<&str> {
        self.columns.get(name).map(String::as_str)
    }
}

/// Contract every row-level action fulfills.
pub trait ActionContract: fmt::Debug + Send + Sync {
    /// Unique name used for registry lookup and logging.
    fn name(&self) -> &'static str;

    /// Inspects the schema held by `context` before any row is applied.
    fn compile(&self, _context: &mut ActionContext) -> Result<()> {
        Ok(())
    }

    /// Transforms one row in place.
    fn apply(&self, row: &mut Row, context: &ActionContext) -> Result<()>;
}

/// Runs the compile phase and attaches the action name to failures.
pub fn compile_action(action: &dyn ActionContract, context: &mut ActionContext) -> Result<()> {
    action
        .compile(context)
        .map_err(|err| PrepError::action(action.name(), err.to_string()))
}

/// Runs the apply phase and attaches the action name to failures.
pub fn apply_action(
    action: &dyn ActionContract,
    row: &mut Row,
    context: &ActionContext,
) -> Result<()> {
    action
        .apply(row, context)
        .map_err(|err| PrepError::action(action.name(), err.to_string()))
}
