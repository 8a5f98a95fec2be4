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

//! # Prepline Step Module
//!
//! Versioned, content-addressed preparation history.
//!
//! A [`Step`] points at its parent and at a [`PreparationActions`] list by
//! hash. Its own id is never stored: it is `sha1(parent_id + content_id)`, so
//! two chains with the same history always produce the same ids. Every chain
//! starts from the root sentinel returned by [`Step::root`], whose content is
//! the empty action list [`PreparationActions::root`].
//!
//! Steps also carry two pieces of execution output, the schema as of just
//! after the step and a [`StepDiff`]. They take no part in [`Step::id`].

use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::action::Action;
use crate::hashing::sha1_hex;
use crate::metadata::RowMetadata;

/// Id of the root step.
pub const ROOT_STEP_ID: &str = "f6e172c33bdacbc69bca9d32b2bd78174712a171";

/// Id of the empty action list referenced by the root step.
pub const ROOT_ACTIONS_ID: &str = "cdcd5c9a3a475f2298b5ee3f4258f8207ba10879";

/// Schema changes caused by executing one step.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StepDiff {
    /// Ids of the columns the step created.
    #[serde(rename = "createdColumns", default)]
    pub created_columns: Vec<String>,
}

impl StepDiff {
    pub fn is_empty(&self) -> bool {
        self.created_columns.is_empty()
    }
}

/// Immutable ordered list of actions.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreparationActions {
    actions: Vec<Action>,
    #[serde(rename = "app-version", default)]
    app_version: String,
}

impl PreparationActions {
    /// The empty list every chain starts from.
    pub fn root() -> Self {
        Self {
            actions: Vec::new(),
            app_version: String::new(),
        }
    }

    pub fn new(actions: Vec<Action>, app_version: impl Into<String>) -> Self {
        Self {
            actions,
            app_version: app_version.into(),
        }
    }

    /// Content hash of the ordered actions. Any empty list is the root list.
    pub fn id(&self) -> String {
        if self.actions.is_empty() {
            return ROOT_ACTIONS_ID.to_string();
        }
        let canonical = serde_json::to_string(&self.actions).unwrap_or_default();
        sha1_hex([canonical])
    }

    pub fn is_root(&self) -> bool {
        self.actions.is_empty()
    }

    /// New list made of these actions followed by `actions`.
    pub fn append<I>(&self, actions: I, app_version: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = Action>,
    {
        let mut combined = self.actions.clone();
        combined.extend(actions);
        Self::new(combined, app_version)
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn app_version(&self) -> &str {
        &self.app_version
    }
}

/// One entry of a preparation's version chain.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Step {
    #[serde(default)]
    parent: Option<String>,
    content: String,
    #[serde(rename = "app-version", default)]
    app_version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    diff: Option<StepDiff>,
    #[serde(rename = "rowMetadata", default, skip_serializing_if = "Option::is_none")]
    row_metadata: Option<RowMetadata>,
}

impl Step {
    /// The root sentinel.
    pub fn root() -> Self {
        Self {
            parent: None,
            content: ROOT_ACTIONS_ID.to_string(),
            app_version: String::new(),
            diff: None,
            row_metadata: None,
        }
    }

    /// A step following `parent` whose content is `content`.
    pub fn new(parent: &Step, content: &PreparationActions, app_version: impl Into<String>) -> Self {
        Self::from_ids(parent.id(), content.id(), app_version)
    }

    /// A step built from stored parent and content ids.
    pub fn from_ids(
        parent_id: impl Into<String>,
        content_id: impl Into<String>,
        app_version: impl Into<String>,
    ) -> Self {
        Self {
            parent: Some(parent_id.into()),
            content: content_id.into(),
            app_version: app_version.into(),
            diff: None,
            row_metadata: None,
        }
    }

    /// Content-addressed id.
    pub fn id(&self) -> String {
        match &self.parent {
            None => ROOT_STEP_ID.to_string(),
            Some(parent) => sha1_hex([parent.as_str(), self.content.as_str()]),
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Parent id; `None` only for the root.
    pub fn parent_id(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    /// Id of the [`PreparationActions`] this step references.
    pub fn content_id(&self) -> &str {
        &self.content
    }

    pub fn app_version(&self) -> &str {
        &self.app_version
    }

    pub fn diff(&self) -> Option<&StepDiff> {
        self.diff.as_ref()
    }

    /// Schema cached by the last execution, if any.
    pub fn row_metadata(&self) -> Option<&RowMetadata> {
        self.row_metadata.as_ref()
    }

    pub fn with_diff(mut self, diff: Option<StepDiff>) -> Self {
        self.diff = diff;
        self
    }

    pub fn with_row_metadata(mut self, metadata: Option<RowMetadata>) -> Self {
        self.row_metadata = metadata;
        self
    }

    /// Same step without execution output.
    pub fn without_cache(self) -> Self {
        self.with_diff(None).with_row_metadata(None)
    }
}

impl PartialEq for Step {
    fn eq(&self, other: &Self) -> bool {
        self.parent == other.parent
            && self.content == other.content
            && self.app_version == other.app_version
            && self.diff == other.diff
    }
}

impl Eq for Step {}

impl Hash for Step {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.parent.hash(state);
        self.content.hash(state);
        self.app_version.hash(state);
        self.diff.hash(state);
    }
}
