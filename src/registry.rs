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

use std::collections::HashMap;
use std::sync::Arc;

use crate::action::ActionContract;
use crate::actions::{CopyColumn, SplitColumn, Uppercase};
use crate::errors::{PrepError, Result};

/// Resolves action names to their implementation.
#[derive(Debug, Default, Clone)]
pub struct ActionRegistry {
    actions: HashMap<String, Arc<dyn ActionContract>>,
}

impl ActionRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry pre-loaded with the bundled actions.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register_defaults();
        registry
    }

    fn register_defaults(&mut self) {
        self.actions
            .insert(Uppercase::NAME.to_string(), Arc::new(Uppercase));
        self.actions
            .insert(CopyColumn::NAME.to_string(), Arc::new(CopyColumn));
        self.actions
            .insert(SplitColumn::NAME.to_string(), Arc::new(SplitColumn));
    }

    /// Registers `action` under its own name.
    ///
    /// Existing registrations are never replaced.
    pub fn register(&mut self, action: Arc<dyn ActionContract>) -> Result<()> {
        let name = action.name();
        if self.actions.contains_key(name) {
            return Err(PrepError::validation(format!(
                "action '{name}' already registered"
            )));
        }
        self.actions.insert(name.to_string(), action);
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Result<Arc<dyn ActionContract>> {
        self.actions
            .get(name)
            .cloned()
            .ok_or_else(|| PrepError::UnknownAction {
                name: name.to_string(),
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.actions.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.actions.keys().cloned().collect();
        names.sort();
        names
    }
}
