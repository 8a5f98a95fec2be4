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

use serde_json::Value;

use crate::action::{ActionContext, ActionContract, COLUMN_ID};
use crate::actions::target_column;
use crate::errors::Result;
use crate::row::Row;

/// Upper-cases the text of one column.
#[derive(Debug, Default, Clone, Copy)]
pub struct Uppercase;

impl Uppercase {
    pub const NAME: &'static str = "uppercase";
}

impl ActionContract for Uppercase {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn compile(&self, context: &mut ActionContext) -> Result<()> {
        target_column(context, Self::NAME);
        Ok(())
    }

    fn apply(&self, row: &mut Row, context: &ActionContext) -> Result<()> {
        let Some(column_id) = context.parameter(COLUMN_ID) else {
            return Ok(());
        };
        if let Some(Value::String(text)) = row.get(column_id) {
            let upper = text.to_uppercase();
            row.set(column_id, upper);
        }
        Ok(())
    }
}
