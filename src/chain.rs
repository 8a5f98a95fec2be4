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

//! # Prepline Step Chain Module
//!
//! Operations over the version chain of a preparation. Steps and action
//! lists live in a [`PreparationRepository`] keyed by their content hash;
//! a chain is only ever extended by adding new entries, never by changing
//! stored ones.
//!
//! Editing or removing an action in the middle of a chain produces a new
//! descendant chain from the edit point: every later step gets a new content
//! list and therefore a new id, and carries no cached schema.

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use crate::action::Action;
use crate::config::PreparationConfig;
use crate::errors::{PrepError, Result};
use crate::step::{PreparationActions, Step, StepDiff};

/// Default bound on the number of steps walked by [`StepChain::list_steps`].
pub const DEFAULT_MAX_CHAIN_DEPTH: usize = 10_000;

/// Id-addressed storage for steps and action lists.
pub trait PreparationRepository: Send + Sync {
    fn get_step(&self, id: &str) -> Option<Step>;

    fn get_actions(&self, id: &str) -> Option<PreparationActions>;

    /// Stores a step under [`Step::id`], replacing any previous value.
    fn add_step(&self, step: Step);

    /// Stores an action list under [`PreparationActions::id`].
    fn add_actions(&self, actions: PreparationActions);
}

/// Repository held in memory, seeded with the root sentinels.
#[derive(Debug)]
pub struct InMemoryRepository {
    steps: RwLock<HashMap<String, Step>>,
    actions: RwLock<HashMap<String, PreparationActions>>,
}

impl Default for InMemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryRepository {
    pub fn new() -> Self {
        let root = Step::root();
        let root_actions = PreparationActions::root();
        let mut steps = HashMap::new();
        steps.insert(root.id(), root);
        let mut actions = HashMap::new();
        actions.insert(root_actions.id(), root_actions);
        Self {
            steps: RwLock::new(steps),
            actions: RwLock::new(actions),
        }
    }

    pub fn step_count(&self) -> usize {
        self.steps.read().unwrap_or_else(|e| e.into_inner()).len()
    }
}

impl PreparationRepository for InMemoryRepository {
    fn get_step(&self, id: &str) -> Option<Step> {
        self.steps
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(id)
            .cloned()
    }

    fn get_actions(&self, id: &str) -> Option<PreparationActions> {
        self.actions
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(id)
            .cloned()
    }

    fn add_step(&self, step: Step) {
        self.steps
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(step.id(), step);
    }

    fn add_actions(&self, actions: PreparationActions) {
        self.actions
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(actions.id(), actions);
    }
}

/// Chain operations bound to a repository.
///
/// New steps and action lists are stamped with the chain's application
/// version.
pub struct StepChain<'a, R: PreparationRepository + ?Sized> {
    repository: &'a R,
    app_version: String,
    max_depth: usize,
}

impl<'a, R: PreparationRepository + ?Sized> StepChain<'a, R> {
    pub fn new(repository: &'a R) -> Self {
        Self::with_config(repository, &PreparationConfig::default())
    }

    /// Chain operations using the version and depth limit of `config`.
    pub fn with_config(repository: &'a R, config: &PreparationConfig) -> Self {
        Self {
            repository,
            app_version: config.app_version.clone(),
            max_depth: config.max_chain_depth,
        }
    }

    pub fn with_app_version(mut self, app_version: impl Into<String>) -> Self {
        self.app_version = app_version.into();
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Version stamped on the steps this chain creates.
    pub fn app_version(&self) -> &str {
        &self.app_version
    }

    pub fn step(&self, id: &str) -> Result<Step> {
        self.repository
            .get_step(id)
            .ok_or_else(|| PrepError::missing("step", id))
    }

    pub fn actions(&self, id: &str) -> Result<PreparationActions> {
        self.repository
            .get_actions(id)
            .ok_or_else(|| PrepError::missing("actions", id))
    }

    /// Action list of the step `head_id`.
    pub fn head_actions(&self, head_id: &str) -> Result<PreparationActions> {
        let head = self.step(head_id)?;
        self.actions(head.content_id())
    }

    /// Walks parents from `head_id` back to the root; root first.
    pub fn list_steps(&self, head_id: &str) -> Result<Vec<Step>> {
        let mut seen = HashSet::new();
        let mut steps = Vec::new();
        let mut current = Some(head_id.to_string());

        while let Some(id) = current {
            if !seen.insert(id.clone()) {
                return Err(PrepError::ChainCycle { step: id });
            }
            if steps.len() >= self.max_depth {
                return Err(PrepError::ChainTooDeep {
                    depth: self.max_depth,
                });
            }
            let step = self.step(&id)?;
            current = step.parent_id().map(str::to_string);
            steps.push(step);
        }

        steps.reverse();
        log::debug!("listed {} step(s) from head {}", steps.len(), head_id);
        Ok(steps)
    }

    /// Adds a step introducing `action` after `head_id` and returns it.
    pub fn append(&self, head_id: &str, action: Action) -> Result<Step> {
        let head = self.step(head_id)?;
        let content = self
            .actions(head.content_id())?
            .append([action], &self.app_version);
        let step = Step::new(&head, &content, &self.app_version);
        self.repository.add_actions(content);
        self.repository.add_step(step.clone());
        log::debug!("appended step {} after {}", step.id(), head_id);
        Ok(step)
    }

    /// Replaces the action introduced by `step_id` and returns the new head.
    pub fn edit(&self, head_id: &str, step_id: &str, action: Action) -> Result<Step> {
        self.rewrite(head_id, step_id, Some(action))
    }

    /// Drops the action introduced by `step_id` and returns the new head.
    pub fn remove(&self, head_id: &str, step_id: &str) -> Result<Step> {
        self.rewrite(head_id, step_id, None)
    }

    fn rewrite(&self, head_id: &str, step_id: &str, replacement: Option<Action>) -> Result<Step> {
        let steps = self.list_steps(head_id)?;
        let index = steps
            .iter()
            .position(|step| step.id() == step_id)
            .ok_or_else(|| PrepError::missing("step", step_id))?;
        if index == 0 {
            return Err(PrepError::validation("the root step cannot be changed"));
        }

        let mut actions = self.head_actions(head_id)?.actions().to_vec();
        if actions.len() != steps.len() - 1 {
            return Err(PrepError::validation(format!(
                "head '{head_id}' holds {} action(s) for {} step(s)",
                actions.len(),
                steps.len() - 1
            )));
        }

        let introduced = index - 1;
        match replacement {
            Some(action) => actions[introduced] = action,
            None => {
                actions.remove(introduced);
            }
        }

        let mut parent = steps[index - 1].clone();
        for end in introduced..actions.len() {
            let content = PreparationActions::new(actions[..=end].to_vec(), &self.app_version);
            let step = Step::new(&parent, &content, &self.app_version);
            self.repository.add_actions(content);
            self.repository.add_step(step.clone());
            parent = step;
        }

        log::debug!(
            "rewrote chain of {} from step {}: new head {}",
            head_id,
            step_id,
            parent.id()
        );
        Ok(parent)
    }
}

/// Ids of `steps`, in order.
pub fn step_ids(steps: &[Step]) -> Vec<String> {
    steps.iter().map(Step::id).collect()
}

/// Diff of every non-root step; `None` for steps not executed yet.
pub fn diff_chain(steps: &[Step]) -> Vec<Option<StepDiff>> {
    steps
        .iter()
        .filter(|step| !step.is_root())
        .map(|step| step.diff().cloned())
        .collect()
}
