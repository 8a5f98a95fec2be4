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

//! # Prepline Pipeline Module
//!
//! Streaming execution of a preparation.
//!
//! A pipeline is assembled from a list of [`Action`]s as
//! `Source -> (Compile -> Action)* -> output`. Given the step chain of the
//! preparation, [`PipelineBuilder`] then groups every compile/action pair
//! into a [`StepNode`] so the schema produced by each step is computed once
//! and reported back through [`Pipeline::executed_steps`].
//!
//! ```rust
//! use prepline::action::Action;
//! use prepline::metadata::RowMetadata;
//! use prepline::pipeline::Pipeline;
//! use prepline::row::Row;
//!
//! let actions = [Action::new("uppercase").with_parameter("column_id", "0000")];
//! let mut pipeline = Pipeline::builder().actions(&actions).build().unwrap();
//! pipeline.execute(
//!     vec![Row::new().with("0000", "lyon")],
//!     &RowMetadata::with_names(["city"]),
//! );
//! assert_eq!(pipeline.output().rows()[0].get_str("0000"), Some("LYON"));
//! ```

pub mod link;
pub mod node;
pub mod transform;
pub mod visitor;

use std::sync::{Arc, Mutex};

pub use link::{Collector, Link, Signal};
pub use node::{
    ActionNode, BasicNode, CompileNode, ContextMap, Node, NodeKind, SharedContext, SourceNode,
    StepNode,
};
pub use transform::{transform, StepNodeTransformer};
pub use visitor::{link_nodes, walk, ExecutedSteps, KindCollector, NodeBuilder, NodeCopy, Visitor};

use crate::action::{Action, ActionContext};
use crate::config::PreparationConfig;
use crate::errors::Result;
use crate::metadata::RowMetadata;
use crate::registry::ActionRegistry;
use crate::row::Row;
use crate::step::Step;

/// A head node and the collector its chain ends on.
#[derive(Debug)]
pub struct Pipeline {
    head: Node,
    output: Collector,
}

impl Pipeline {
    pub fn new(head: Node, output: Collector) -> Self {
        Self { head, output }
    }

    pub fn builder<'a>() -> PipelineBuilder<'a> {
        PipelineBuilder::new()
    }

    pub fn head(&self) -> &Node {
        &self.head
    }

    /// Pushes `rows`, all valid for `metadata`, then signals end of stream.
    pub fn execute<I>(&mut self, rows: I, metadata: &RowMetadata)
    where
        I: IntoIterator<Item = Row>,
    {
        let mut count = 0usize;
        for row in rows {
            self.head.receive(row, metadata);
            count += 1;
        }
        self.head.signal(Signal::EndOfStream);
        log::debug!("pipeline executed over {count} row(s)");
    }

    /// Sends `signal` down the pipeline.
    pub fn signal(&mut self, signal: Signal) {
        self.head.signal(signal);
    }

    pub fn output(&self) -> &Collector {
        &self.output
    }

    /// Node kinds in traversal order.
    pub fn node_kinds(&self) -> Vec<NodeKind> {
        let mut kinds = KindCollector::default();
        self.head.accept(&mut kinds);
        kinds.into_kinds()
    }

    /// Steps bound to this pipeline, carrying the schema and diff computed
    /// while executing.
    pub fn executed_steps(&self) -> Vec<Step> {
        let mut steps = ExecutedSteps::default();
        self.head.accept(&mut steps);
        steps.into_steps()
    }

    /// Groups compile/action pairs into step nodes bound to `steps`.
    pub fn transform(&self, steps: &[Step]) -> Result<Pipeline> {
        let head = StepNodeTransformer::new(steps).transform(&self.head)?;
        Ok(Pipeline::new(head, self.output.clone()))
    }
}

/// Assembles a [`Pipeline`] from actions.
#[derive(Debug, Default)]
pub struct PipelineBuilder<'a> {
    actions: Vec<Action>,
    registry: Option<&'a ActionRegistry>,
    steps: Option<Vec<Step>>,
    config: PreparationConfig,
}

impl<'a> PipelineBuilder<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn actions(mut self, actions: &[Action]) -> Self {
        self.actions = actions.to_vec();
        self
    }

    /// Registry resolving action names; bundled actions when not set.
    pub fn registry(mut self, registry: &'a ActionRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Step chain, root first, to bind the actions to.
    pub fn steps(mut self, steps: Vec<Step>) -> Self {
        self.steps = Some(steps);
        self
    }

    pub fn config(mut self, config: &PreparationConfig) -> Self {
        self.config = config.clone();
        self
    }

    pub fn build(self) -> Result<Pipeline> {
        let defaults;
        let registry = match self.registry {
            Some(registry) => registry,
            None => {
                defaults = ActionRegistry::with_defaults();
                &defaults
            }
        };

        let mut builder = NodeBuilder::source();
        for action in &self.actions {
            let contract = registry.lookup(action.name())?;
            let context: SharedContext =
                Arc::new(Mutex::new(ActionContext::new(action.parameters().clone())));
            builder = builder
                .to(Node::Compile(CompileNode::new(
                    Arc::clone(&contract),
                    Arc::clone(&context),
                )))
                .to(Node::Action(ActionNode::new(contract, context)));
        }
        let pipeline = builder.into_pipeline();

        match self.steps {
            Some(steps) if self.config.step_caching => {
                let mut transformer = StepNodeTransformer::new(&steps);
                if self.config.invalidate_downstream {
                    transformer = transformer.invalidate_downstream();
                }
                let head = transformer.transform(pipeline.head())?;
                log::debug!(
                    "built pipeline of {} action(s) bound to {} step(s)",
                    self.actions.len(),
                    steps.len().saturating_sub(1)
                );
                Ok(Pipeline::new(head, pipeline.output.clone()))
            }
            _ => Ok(pipeline),
        }
    }
}
