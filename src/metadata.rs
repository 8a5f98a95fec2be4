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

//! # Prepline Row Metadata Module
//!
//! Column schema of a row stream. [`RowMetadata`] is an ordered list of
//! [`ColumnMetadata`] keyed by id. Ids are zero-padded four digit decimal
//! strings allocated by the owning instance and never reused, so they stay
//! unique even after columns are deleted.

use serde::{Deserialize, Serialize};

use crate::errors::{PrepError, Result};
use crate::step::StepDiff;

/// Inferred type of a column.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    String,
    Integer,
    Double,
    Boolean,
    Date,
    Any,
}

impl Default for ColumnType {
    fn default() -> Self {
        Self::String
    }
}

/// Description of one column.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnMetadata {
    /// Physical id. Empty until the column is added to a [`RowMetadata`].
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(rename = "type", default)]
    pub column_type: ColumnType,
}

impl ColumnMetadata {
    /// Creates a column with no id yet.
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            id: String::new(),
            name: name.into(),
            column_type,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }
}

/// Ordered, id-keyed column schema.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "StoredRowMetadata")]
pub struct RowMetadata {
    columns: Vec<ColumnMetadata>,
    next_id: u32,
}

/// Serialized form; the allocator is rebuilt from the columns on load.
#[derive(Deserialize)]
struct StoredRowMetadata {
    columns: Vec<ColumnMetadata>,
    #[serde(default)]
    next_id: u32,
}

impl TryFrom<StoredRowMetadata> for RowMetadata {
    type Error = PrepError;

    fn try_from(stored: StoredRowMetadata) -> Result<Self> {
        let mut metadata = RowMetadata::from_columns(stored.columns)?;
        metadata.next_id = metadata.next_id.max(stored.next_id);
        Ok(metadata)
    }
}

/// Formats a numeric column id.
pub fn format_column_id(index: u32) -> String {
    format!("{index:04}")
}

impl RowMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a schema from columns; columns without an id receive one.
    ///
    /// Fails when two columns share the same id.
    pub fn from_columns(columns: Vec<ColumnMetadata>) -> Result<Self> {
        let mut metadata = RowMetadata::new();
        for column in &columns {
            if let Ok(numeric) = column.id.parse::<u32>() {
                metadata.next_id = metadata.next_id.max(numeric.saturating_add(1));
            }
        }
        for column in columns {
            if column.id.is_empty() {
                metadata.add_column(column);
            } else {
                if metadata.get_by_id(&column.id).is_some() {
                    return Err(PrepError::schema(format!(
                        "duplicate column id '{}'",
                        column.id
                    )));
                }
                metadata.columns.push(column);
            }
        }
        Ok(metadata)
    }

    /// Builds a schema of string columns named after `names`.
    pub fn with_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut metadata = RowMetadata::new();
        for name in names {
            metadata.add_column(ColumnMetadata::new(name, ColumnType::String));
        }
        metadata
    }

    pub fn columns(&self) -> &[ColumnMetadata] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn get_by_id(&self, id: &str) -> Option<&ColumnMetadata> {
        self.columns.iter().find(|column| column.id == id)
    }

    pub fn get_by_name(&self, name: &str) -> Option<&ColumnMetadata> {
        self.columns.iter().find(|column| column.name == name)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get_by_id(id).is_some()
    }

    fn next_column_id(&mut self) -> String {
        loop {
            let id = format_column_id(self.next_id);
            self.next_id += 1;
            if !self.contains(&id) {
                return id;
            }
        }
    }

    /// Appends a column with a fresh id and returns that id.
    pub fn add_column(&mut self, mut column: ColumnMetadata) -> String {
        let id = self.next_column_id();
        column.id = id.clone();
        self.columns.push(column);
        id
    }

    /// Inserts `column` right after the column `after_id`, assigning it a
    /// fresh id which is returned.
    pub fn insert_after(&mut self, after_id: &str, mut column: ColumnMetadata) -> Result<String> {
        let position = self
            .columns
            .iter()
            .position(|c| c.id == after_id)
            .ok_or_else(|| PrepError::schema(format!("unknown column id '{after_id}'")))?;
        let id = self.next_column_id();
        column.id = id.clone();
        self.columns.insert(position + 1, column);
        Ok(id)
    }

    /// Removes a column, returning it when it existed.
    pub fn delete_column(&mut self, id: &str) -> Option<ColumnMetadata> {
        let position = self.columns.iter().position(|c| c.id == id)?;
        Some(self.columns.remove(position))
    }

    /// Column ids in schema order.
    pub fn ids(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.id.clone()).collect()
    }

    /// Changes from `previous` to `self`.
    pub fn diff(&self, previous: &RowMetadata) -> StepDiff {
        let created_columns = self
            .columns
            .iter()
            .filter(|column| !previous.contains(&column.id))
            .map(|column| column.id.clone())
            .collect();
        StepDiff { created_columns }
    }
}
