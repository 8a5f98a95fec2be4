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

//! # Prepline Configuration Module
//!
//! [`PreparationConfig`] gathers the knobs of pipeline assembly and chain
//! walking. It can be built in code with builder-style setters or loaded
//! from YAML or JSON.
//!
//! ```yaml
//! app_version: "2.1.0"
//! step_caching: true
//! invalidate_downstream: true
//! max_chain_depth: 10000
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::chain::DEFAULT_MAX_CHAIN_DEPTH;
use crate::errors::{PrepError, Result};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreparationConfig {
    /// Version stamped on new steps and action lists.
    pub app_version: String,
    /// Whether built pipelines are grouped into step nodes when steps are given.
    pub step_caching: bool,
    /// Whether a step without cached schema invalidates the caches after it.
    pub invalidate_downstream: bool,
    /// Longest chain walked before giving up.
    pub max_chain_depth: usize,
}

impl Default for PreparationConfig {
    fn default() -> Self {
        Self {
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            step_caching: true,
            invalidate_downstream: true,
            max_chain_depth: DEFAULT_MAX_CHAIN_DEPTH,
        }
    }
}

impl PreparationConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn app_version(mut self, version: &str) -> Self {
        self.app_version = version.to_string();
        self
    }

    pub fn step_caching(mut self, enabled: bool) -> Self {
        self.step_caching = enabled;
        self
    }

    pub fn invalidate_downstream(mut self, enabled: bool) -> Self {
        self.invalidate_downstream = enabled;
        self
    }

    pub fn max_chain_depth(mut self, depth: usize) -> Self {
        self.max_chain_depth = depth;
        self
    }

    pub fn from_yaml_str(source: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(source)?;
        config.validate()
    }

    pub fn from_json_str(source: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(source)?;
        config.validate()
    }

    /// Loads a `.yaml`, `.yml` or `.json` file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = fs::read_to_string(path)?;
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("yaml") | Some("yml") => Self::from_yaml_str(&source),
            Some("json") => Self::from_json_str(&source),
            _ => Err(PrepError::config(format!(
                "unsupported config format: {}",
                path.display()
            ))),
        }
    }

    fn validate(self) -> Result<Self> {
        if self.max_chain_depth == 0 {
            return Err(PrepError::config("max_chain_depth must be positive"));
        }
        Ok(self)
    }
}
