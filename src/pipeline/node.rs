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

//! # Prepline Pipeline Nodes
//!
//! Rows are pushed through a chain of [`Node`]s. Each node does its part of
//! the work and hands the row, together with the schema it is valid for, to
//! its outgoing [`Link`].
//!
//! A [`CompileNode`] and the [`ActionNode`] following it share one
//! [`ActionContext`]: the compile node prepares it whenever the schema of
//! incoming rows changes, the action node applies the action with it. A
//! [`StepNode`] wraps such a pair for one step of a preparation and caches
//! the schema the pair produces.

use std::sync::{Arc, Mutex, MutexGuard, OnceLock};

use serde::{Deserialize, Serialize};

use crate::action::{apply_action, compile_action, ActionContext, ActionContract};
use crate::metadata::RowMetadata;
use crate::pipeline::link::{Collector, Link, Signal};
use crate::pipeline::visitor::{link_nodes, NodeCopy, Visitor};
use crate::row::Row;
use crate::step::{Step, StepDiff};

/// Action context shared by a compile node and its action node.
pub type SharedContext = Arc<Mutex<ActionContext>>;

fn lock(context: &SharedContext) -> MutexGuard<'_, ActionContext> {
    context.lock().unwrap_or_else(|e| e.into_inner())
}

/// Pairs contexts of copied nodes with the fresh contexts of their copies.
///
/// A compile node and its action node share one context. Copying both
/// through the same map gives the copies one new context of their own, so a
/// copy never sees the original recompile.
#[derive(Debug, Default)]
pub struct ContextMap {
    entries: Vec<(SharedContext, SharedContext)>,
}

impl ContextMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Context standing in for `original` in the copies.
    pub fn fresh(&mut self, original: &SharedContext) -> SharedContext {
        if let Some((_, copy)) = self
            .entries
            .iter()
            .find(|(seen, _)| Arc::ptr_eq(seen, original))
        {
            return Arc::clone(copy);
        }
        let parameters = lock(original).parameters().clone();
        let copy = Arc::new(Mutex::new(ActionContext::new(parameters)));
        self.entries.push((Arc::clone(original), Arc::clone(&copy)));
        copy
    }
}

fn forward(link: &mut Option<Link>, row: Row, metadata: &RowMetadata) {
    if let Some(link) = link {
        link.emit(row, metadata);
    }
}

/// Kind of a [`Node`], used for introspection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    Source,
    Compile,
    Action,
    Step,
    Basic,
}

#[derive(Debug)]
pub enum Node {
    Source(SourceNode),
    Compile(CompileNode),
    Action(ActionNode),
    Step(StepNode),
    Basic(BasicNode),
}

impl Node {
    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Source(_) => NodeKind::Source,
            Node::Compile(_) => NodeKind::Compile,
            Node::Action(_) => NodeKind::Action,
            Node::Step(_) => NodeKind::Step,
            Node::Basic(_) => NodeKind::Basic,
        }
    }

    /// Pushes one row valid for `metadata`.
    pub fn receive(&mut self, row: Row, metadata: &RowMetadata) {
        match self {
            Node::Source(node) => forward(&mut node.link, row, metadata),
            Node::Basic(node) => forward(&mut node.link, row, metadata),
            Node::Compile(node) => node.receive(row, metadata),
            Node::Action(node) => node.receive(row, metadata),
            Node::Step(node) => node.receive(row, metadata),
        }
    }

    pub fn signal(&mut self, signal: Signal) {
        if let Node::Step(node) = self {
            node.entry.signal(signal);
        }
        if let Some(link) = self.link_slot() {
            link.signal(signal);
        }
    }

    pub fn accept<V: Visitor + ?Sized>(&self, visitor: &mut V) {
        match self {
            Node::Source(node) => visitor.visit_source(node),
            Node::Compile(node) => visitor.visit_compile(node),
            Node::Action(node) => visitor.visit_action(node),
            Node::Step(node) => visitor.visit_step(node),
            Node::Basic(node) => visitor.visit_basic(node),
        }
    }

    /// Same kind and configuration, without outgoing link.
    pub fn copy_shallow(&self) -> Node {
        self.copy_with(&mut ContextMap::new())
    }

    /// Shallow copy taking action contexts from `contexts`.
    pub fn copy_with(&self, contexts: &mut ContextMap) -> Node {
        match self {
            Node::Source(_) => Node::Source(SourceNode::new()),
            Node::Compile(node) => Node::Compile(node.copy_with(contexts)),
            Node::Action(node) => Node::Action(node.copy_with(contexts)),
            Node::Step(node) => Node::Step(node.copy_shallow()),
            Node::Basic(_) => Node::Basic(BasicNode::new()),
        }
    }

    /// Copy of this node and everything behind it.
    pub fn deep_copy(&self) -> Node {
        self.deep_copy_with(&mut ContextMap::new())
    }

    pub(crate) fn deep_copy_with(&self, contexts: &mut ContextMap) -> Node {
        let mut copy = self.copy_with(contexts);
        copy.set_link(self.link().map(|link| link.deep_copy_with(contexts)));
        copy
    }

    pub fn link(&self) -> Option<&Link> {
        match self {
            Node::Source(node) => node.link.as_ref(),
            Node::Compile(node) => node.link.as_ref(),
            Node::Action(node) => node.link.as_ref(),
            Node::Step(node) => node.link.as_ref(),
            Node::Basic(node) => node.link.as_ref(),
        }
    }

    fn link_slot(&mut self) -> &mut Option<Link> {
        match self {
            Node::Source(node) => &mut node.link,
            Node::Compile(node) => &mut node.link,
            Node::Action(node) => &mut node.link,
            Node::Step(node) => &mut node.link,
            Node::Basic(node) => &mut node.link,
        }
    }

    /// Replaces the outgoing link, returning the previous one.
    pub fn set_link(&mut self, link: Option<Link>) -> Option<Link> {
        std::mem::replace(self.link_slot(), link)
    }
}

/// Entry point of a pipeline.
#[derive(Debug, Default)]
pub struct SourceNode {
    link: Option<Link>,
}

impl SourceNode {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_link(mut self, link: Link) -> Self {
        self.link = Some(link);
        self
    }

    pub fn link(&self) -> Option<&Link> {
        self.link.as_ref()
    }
}

/// Passthrough node.
#[derive(Debug, Default)]
pub struct BasicNode {
    link: Option<Link>,
}

impl BasicNode {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_link(mut self, link: Link) -> Self {
        self.link = Some(link);
        self
    }

    pub fn link(&self) -> Option<&Link> {
        self.link.as_ref()
    }
}

/// Compiles an action against the schema of incoming rows.
#[derive(Debug)]
pub struct CompileNode {
    action: Arc<dyn ActionContract>,
    context: SharedContext,
    compiled_for: Option<RowMetadata>,
    output: RowMetadata,
    link: Option<Link>,
}

impl CompileNode {
    pub fn new(action: Arc<dyn ActionContract>, context: SharedContext) -> Self {
        Self {
            action,
            context,
            compiled_for: None,
            output: RowMetadata::new(),
            link: None,
        }
    }

    pub fn action(&self) -> &Arc<dyn ActionContract> {
        &self.action
    }

    pub fn context(&self) -> &SharedContext {
        &self.context
    }

    pub fn link(&self) -> Option<&Link> {
        self.link.as_ref()
    }

    fn compile(&mut self, metadata: &RowMetadata) {
        let mut context = lock(&self.context);
        context.reset(metadata.clone());
        match compile_action(self.action.as_ref(), &mut context) {
            Ok(()) if context.is_canceled() => {
                log::debug!("{} canceled during compile", self.action.name());
                context.reset(metadata.clone());
                context.cancel();
            }
            Ok(()) => {}
            Err(err) => {
                log::warn!("compile failed, action canceled: {err}");
                context.reset(metadata.clone());
                context.cancel();
            }
        }
        self.output = context.row_metadata().clone();
        self.compiled_for = Some(metadata.clone());
    }

    fn receive(&mut self, row: Row, metadata: &RowMetadata) {
        if self.compiled_for.as_ref() != Some(metadata) {
            self.compile(metadata);
        }
        forward(&mut self.link, row, &self.output);
    }

    /// Copy with a context of its own; compiles again on first row.
    pub fn copy_shallow(&self) -> Self {
        self.copy_with(&mut ContextMap::new())
    }

    pub fn copy_with(&self, contexts: &mut ContextMap) -> Self {
        Self::new(Arc::clone(&self.action), contexts.fresh(&self.context))
    }
}

/// Applies a compiled action to every row.
///
/// The action works on a clone of each row so that a failed apply forwards
/// the row as it came in. That costs one row clone per action on every row,
/// successful or not.
#[derive(Debug)]
pub struct ActionNode {
    action: Arc<dyn ActionContract>,
    context: SharedContext,
    link: Option<Link>,
}

impl ActionNode {
    pub fn new(action: Arc<dyn ActionContract>, context: SharedContext) -> Self {
        Self {
            action,
            context,
            link: None,
        }
    }

    pub fn action(&self) -> &Arc<dyn ActionContract> {
        &self.action
    }

    pub fn context(&self) -> &SharedContext {
        &self.context
    }

    pub fn link(&self) -> Option<&Link> {
        self.link.as_ref()
    }

    fn receive(&mut self, row: Row, metadata: &RowMetadata) {
        let row = {
            let context = lock(&self.context);
            if context.is_canceled() {
                row
            } else {
                let mut candidate = row.clone();
                match apply_action(self.action.as_ref(), &mut candidate, &context) {
                    Ok(()) => candidate,
                    Err(err) => {
                        log::warn!("row {:?} left unchanged: {err}", row.tdp_id);
                        row
                    }
                }
            }
        };
        forward(&mut self.link, row, metadata);
    }

    /// Copy with a context of its own. Use [`ActionNode::copy_with`] to keep
    /// it paired with a copied compile node.
    pub fn copy_shallow(&self) -> Self {
        self.copy_with(&mut ContextMap::new())
    }

    pub fn copy_with(&self, contexts: &mut ContextMap) -> Self {
        Self::new(Arc::clone(&self.action), contexts.fresh(&self.context))
    }
}

#[derive(Debug, Clone)]
struct StepCache {
    row_metadata: RowMetadata,
    diff: Option<StepDiff>,
}

/// Runs the sub-pipeline of one step and caches the schema it produces.
#[derive(Debug)]
pub struct StepNode {
    step: Step,
    entry: Box<Node>,
    output: Collector,
    cache: OnceLock<StepCache>,
    link: Option<Link>,
}

impl StepNode {
    /// Binds `step` to the unlinked nodes of its sub-pipeline.
    pub fn new(step: Step, nodes: Vec<Node>) -> Self {
        let output = Collector::new();
        let entry = link_nodes(nodes, Some(Link::Collect(output.clone())))
            .unwrap_or_else(|| Node::Basic(BasicNode::new().with_link(Link::Collect(output.clone()))));
        let cache = OnceLock::new();
        if let Some(metadata) = step.row_metadata() {
            let _ = cache.set(StepCache {
                row_metadata: metadata.clone(),
                diff: step.diff().cloned(),
            });
        }
        Self {
            step,
            entry: Box::new(entry),
            output,
            cache,
            link: None,
        }
    }

    /// The step as bound, without execution output.
    pub fn step(&self) -> &Step {
        &self.step
    }

    /// First node of the private sub-pipeline.
    pub fn entry(&self) -> &Node {
        &self.entry
    }

    pub fn link(&self) -> Option<&Link> {
        self.link.as_ref()
    }

    /// Schema produced by this step, once known.
    pub fn cached_metadata(&self) -> Option<&RowMetadata> {
        self.cache.get().map(|cache| &cache.row_metadata)
    }

    /// The bound step carrying the cached schema and diff.
    pub fn executed_step(&self) -> Step {
        match self.cache.get() {
            Some(cache) => self
                .step
                .clone()
                .with_row_metadata(Some(cache.row_metadata.clone()))
                .with_diff(cache.diff.clone()),
            None => self.step.clone(),
        }
    }

    fn receive(&mut self, row: Row, metadata: &RowMetadata) {
        self.entry.receive(row, metadata);
        let rows = self.output.drain();

        if self.cache.get().is_none() {
            if let Some(produced) = self.output.metadata() {
                let diff = produced.diff(metadata);
                log::debug!(
                    "step {} schema computed: {} column(s), {} created",
                    self.step.id(),
                    produced.len(),
                    diff.created_columns.len()
                );
                let _ = self.cache.set(StepCache {
                    row_metadata: produced,
                    diff: Some(diff),
                });
            }
        }

        let schema = self
            .cache
            .get()
            .map(|cache| &cache.row_metadata)
            .unwrap_or(metadata);
        for row in rows {
            forward(&mut self.link, row, schema);
        }
    }

    /// Copies the sub-pipeline; the copy starts from the bound step's cache.
    pub fn copy_shallow(&self) -> Self {
        let mut copy = NodeCopy::until_action();
        self.entry.accept(&mut copy);
        Self::new(self.step.clone(), copy.into_nodes())
    }
}
