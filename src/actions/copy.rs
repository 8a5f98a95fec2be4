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

use crate::action::{ActionContext, ActionContract, COLUMN_ID};
use crate::actions::target_column;
use crate::errors::Result;
use crate::metadata::ColumnMetadata;
use crate::row::Row;

const COPY_COLUMN: &str = "copy";

/// Duplicates a column into a new `<name>_copy` column placed right after it.
#[derive(Debug, Default, Clone, Copy)]
pub struct CopyColumn;

impl CopyColumn {
    pub const NAME: &'static str = "copy";
    pub const SUFFIX: &'static str = "_copy";
}

impl ActionContract for CopyColumn {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn compile(&self, context: &mut ActionContext) -> Result<()> {
        let Some(source) = target_column(context, Self::NAME) else {
            return Ok(());
        };
        context.column(COPY_COLUMN, |metadata| {
            let copy = ColumnMetadata::new(
                format!("{}{}", source.name, Self::SUFFIX),
                source.column_type,
            );
            metadata.insert_after(&source.id, copy)
        })?;
        Ok(())
    }

    fn apply(&self, row: &mut Row, context: &ActionContext) -> Result<()> {
        let (Some(source), Some(target)) = (
            context.parameter(COLUMN_ID),
            context.column_id(COPY_COLUMN),
        ) else {
            return Ok(());
        };
        let value = row.get(source).cloned().unwrap_or_default();
        row.set(target, value);
        Ok(())
    }
}
