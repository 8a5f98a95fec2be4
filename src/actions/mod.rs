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

//! # Prepline Built-in Actions
//!
//! A small set of column actions implementing [`ActionContract`]. They are
//! registered by [`ActionRegistry::with_defaults`](crate::registry::ActionRegistry::with_defaults).
//!
//! Every action reads the column to work on from the `column_id` parameter
//! and cancels itself during compile when that column is not in the schema.

mod copy;
mod split;
mod uppercase;

pub use copy::CopyColumn;
pub use split::SplitColumn;
pub use uppercase::Uppercase;

use crate::action::{ActionContext, COLUMN_ID};
use crate::metadata::ColumnMetadata;

/// Column targeted by the action, or `None` after canceling the context.
pub(crate) fn target_column(context: &mut ActionContext, action: &str) -> Option<ColumnMetadata> {
    let column = context
        .parameter(COLUMN_ID)
        .and_then(|id| context.row_metadata().get_by_id(id))
        .cloned();
    if column.is_none() {
        log::warn!(
            "{action}: column '{}' not found, action canceled",
            context.parameter_or(COLUMN_ID, "")
        );
        context.cancel();
    }
    column
}
