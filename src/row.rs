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

//! # Prepline Row Module
//!
//! A [`Row`] is the unit of data streamed through a pipeline: an ordered
//! mapping from column id to cell value. Rows have no identity beyond their
//! position in the stream; actions mutate them in place.
//!
//! ```rust
//! use prepline::row::Row;
//!
//! let mut row = Row::new().with("0000", "Lyon").with("0001", "69001");
//! row.set("0000", "LYON");
//! assert_eq!(row.get_str("0000"), Some("LYON"));
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Cell values keyed by column id, in insertion order.
pub type RowValues = Map<String, Value>;

/// One record of a dataset stream.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Row {
    /// Position of the row in the source stream, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tdp_id: Option<u64>,

    /// Cell values keyed by column id.
    pub values: RowValues,

    /// Marks rows removed by an action; they still flow downstream.
    #[serde(default)]
    pub deleted: bool,
}

impl Row {
    /// Creates an empty row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a row from textual cells.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let values = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), Value::String(v.into())))
            .collect();
        Row {
            tdp_id: None,
            values,
            deleted: false,
        }
    }

    /// Builder-style variant of [`Row::set`].
    pub fn with(mut self, column_id: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(column_id, value);
        self
    }

    /// Sets the stream position.
    pub fn with_tdp_id(mut self, tdp_id: u64) -> Self {
        self.tdp_id = Some(tdp_id);
        self
    }

    pub fn get(&self, column_id: &str) -> Option<&Value> {
        self.values.get(column_id)
    }

    /// Returns the cell as text when it holds a string.
    pub fn get_str(&self, column_id: &str) -> Option<&str> {
        self.values.get(column_id).and_then(Value::as_str)
    }

    /// Sets a cell, appending the column when the row does not have it yet.
    pub fn set(&mut self, column_id: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(column_id.into(), value.into());
    }

    pub fn remove(&mut self, column_id: &str) -> Option<Value> {
        self.values.shift_remove(column_id)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn set_deleted(&mut self, deleted: bool) {
        self.deleted = deleted;
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted
    }
}
