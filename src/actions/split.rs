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

use regex::Regex;

use crate::action::{ActionContext, ActionContract, COLUMN_ID};
use crate::actions::target_column;
use crate::errors::Result;
use crate::metadata::{ColumnMetadata, ColumnType};
use crate::row::Row;

const SEPARATOR: &str = "separator";
const MANUAL_SEPARATOR: &str = "manual_separator";
const LIMIT: &str = "limit";
const DEFAULT_SEPARATOR: &str = ":";
const DEFAULT_LIMIT: usize = 2;

/// Splits a column on a separator pattern into `limit` new columns.
///
/// The separator is a regular expression read from `separator`, or from
/// `manual_separator` when `separator` is `other`. New columns are named
/// `<name>_split` and inserted one after the other behind the source column.
/// Rows get empty cells when the pattern does not compile.
#[derive(Debug, Default, Clone, Copy)]
pub struct SplitColumn;

impl SplitColumn {
    pub const NAME: &'static str = "split";
    pub const SUFFIX: &'static str = "_split";

    fn separator(context: &ActionContext) -> &str {
        match context.parameter_or(SEPARATOR, DEFAULT_SEPARATOR) {
            "other" => context.parameter_or(MANUAL_SEPARATOR, ""),
            separator => separator,
        }
    }

    fn limit(context: &ActionContext) -> usize {
        context
            .parameter(LIMIT)
            .and_then(|raw| raw.trim().parse::<usize>().ok())
            .filter(|limit| *limit > 0)
            .unwrap_or(DEFAULT_LIMIT)
    }

    fn part_column(index: usize) -> String {
        format!("part_{index}")
    }
}

impl ActionContract for SplitColumn {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn compile(&self, context: &mut ActionContext) -> Result<()> {
        let Some(source) = target_column(context, Self::NAME) else {
            return Ok(());
        };
        if Self::separator(context).is_empty() {
            log::debug!("split: empty separator, action canceled");
            context.cancel();
            return Ok(());
        }

        let limit = Self::limit(context);
        if let Some(raw) = context.parameter(LIMIT) {
            if raw.trim().parse::<usize>().map_or(true, |l| l == 0) {
                log::debug!("split: invalid limit '{raw}', using {DEFAULT_LIMIT}");
            }
        }

        let mut previous = source.id.clone();
        for index in 0..limit {
            let name = format!("{}{}", source.name, Self::SUFFIX);
            previous = context.column(&Self::part_column(index), |metadata| {
                metadata.insert_after(&previous, ColumnMetadata::new(name, ColumnType::String))
            })?;
        }
        Ok(())
    }

    fn apply(&self, row: &mut Row, context: &ActionContext) -> Result<()> {
        let Some(column_id) = context.parameter(COLUMN_ID) else {
            return Ok(());
        };
        let Some(value) = row.get_str(column_id).map(str::to_string) else {
            return Ok(());
        };

        let limit = Self::limit(context);
        let parts: Vec<String> = match Regex::new(Self::separator(context)) {
            Ok(pattern) => pattern.splitn(&value, limit).map(str::to_string).collect(),
            Err(_) => Vec::new(),
        };

        for index in 0..limit {
            if let Some(target) = context.column_id(&Self::part_column(index)) {
                let cell = parts.get(index).cloned().unwrap_or_default();
                row.set(target, cell);
            }
        }
        Ok(())
    }
}
