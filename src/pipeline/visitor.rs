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

//! Traversal and construction of node chains.

use crate::pipeline::link::{Collector, Link};
use crate::pipeline::node::{
    ActionNode, BasicNode, CompileNode, ContextMap, Node, NodeKind, SourceNode, StepNode,
};
use crate::pipeline::Pipeline;
use crate::step::Step;

/// Double-dispatch visitor over [`Node`] variants.
///
/// Every method defaults to following the visited node's link, so an
/// implementation only overrides the variants it cares about.
pub trait Visitor {
    fn visit_source(&mut self, node: &SourceNode) {
        walk(self, node.link());
    }

    fn visit_compile(&mut self, node: &CompileNode) {
        walk(self, node.link());
    }

    fn visit_action(&mut self, node: &ActionNode) {
        walk(self, node.link());
    }

    fn visit_step(&mut self, node: &StepNode) {
        walk(self, node.link());
    }

    fn visit_basic(&mut self, node: &BasicNode) {
        walk(self, node.link());
    }

    fn visit_link(&mut self, link: &Link) {
        match link {
            Link::Basic(node) => node.accept(self),
            Link::Clone(targets) => {
                for node in targets {
                    node.accept(self);
                }
            }
            Link::Collect(_) => {}
        }
    }
}

/// Visits `link` when there is one.
pub fn walk<V: Visitor + ?Sized>(visitor: &mut V, link: Option<&Link>) {
    if let Some(link) = link {
        link.accept(visitor);
    }
}

/// Links `nodes` in order, ending with `tail`, and returns the first one.
pub fn link_nodes(nodes: Vec<Node>, tail: Option<Link>) -> Option<Node> {
    let mut nodes = nodes.into_iter().rev();
    let mut current = nodes.next()?;
    current.set_link(tail);
    for mut node in nodes {
        node.set_link(Some(Link::to(current)));
        current = node;
    }
    Some(current)
}

/// Collects shallow copies of the nodes it visits.
///
/// Copied compile/action pairs share one fresh context.
#[derive(Debug, Default)]
pub struct NodeCopy {
    nodes: Vec<Node>,
    contexts: ContextMap,
    stop_at_action: bool,
    done: bool,
}

impl NodeCopy {
    /// Copies a whole chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Copies up to and including the first action node.
    pub fn until_action() -> Self {
        Self {
            stop_at_action: true,
            ..Self::default()
        }
    }

    pub fn into_nodes(self) -> Vec<Node> {
        self.nodes
    }

    fn copy(&mut self, node: Node, link: Option<&Link>) {
        if self.done {
            return;
        }
        let is_action = node.kind() == NodeKind::Action;
        self.nodes.push(node);
        if is_action && self.stop_at_action {
            self.done = true;
            return;
        }
        walk(self, link);
    }
}

impl Visitor for NodeCopy {
    fn visit_source(&mut self, node: &SourceNode) {
        self.copy(Node::Source(SourceNode::new()), node.link());
    }

    fn visit_compile(&mut self, node: &CompileNode) {
        let copy = node.copy_with(&mut self.contexts);
        self.copy(Node::Compile(copy), node.link());
    }

    fn visit_action(&mut self, node: &ActionNode) {
        let copy = node.copy_with(&mut self.contexts);
        self.copy(Node::Action(copy), node.link());
    }

    fn visit_step(&mut self, node: &StepNode) {
        self.copy(Node::Step(node.copy_shallow()), node.link());
    }

    fn visit_basic(&mut self, node: &BasicNode) {
        self.copy(Node::Basic(BasicNode::new()), node.link());
    }
}

/// Lists node kinds in traversal order.
#[derive(Debug, Default)]
pub struct KindCollector {
    kinds: Vec<NodeKind>,
}

impl KindCollector {
    pub fn into_kinds(self) -> Vec<NodeKind> {
        self.kinds
    }
}

impl Visitor for KindCollector {
    fn visit_source(&mut self, node: &SourceNode) {
        self.kinds.push(NodeKind::Source);
        walk(self, node.link());
    }

    fn visit_compile(&mut self, node: &CompileNode) {
        self.kinds.push(NodeKind::Compile);
        walk(self, node.link());
    }

    fn visit_action(&mut self, node: &ActionNode) {
        self.kinds.push(NodeKind::Action);
        walk(self, node.link());
    }

    fn visit_step(&mut self, node: &StepNode) {
        self.kinds.push(NodeKind::Step);
        walk(self, node.link());
    }

    fn visit_basic(&mut self, node: &BasicNode) {
        self.kinds.push(NodeKind::Basic);
        walk(self, node.link());
    }
}

/// Gathers the steps of every step node, with their execution output.
#[derive(Debug, Default)]
pub struct ExecutedSteps {
    steps: Vec<Step>,
}

impl ExecutedSteps {
    pub fn into_steps(self) -> Vec<Step> {
        self.steps
    }
}

impl Visitor for ExecutedSteps {
    fn visit_step(&mut self, node: &StepNode) {
        self.steps.push(node.executed_step());
        walk(self, node.link());
    }
}

/// Assembles a chain from unlinked nodes.
///
/// ```rust
/// use prepline::pipeline::{Collector, Node, NodeBuilder, BasicNode};
///
/// let output = Collector::new();
/// let head = NodeBuilder::source()
///     .to(Node::Basic(BasicNode::new()))
///     .collect_into(output.clone())
///     .build();
/// ```
#[derive(Debug)]
pub struct NodeBuilder {
    nodes: Vec<Node>,
    tail: Option<Link>,
}

impl NodeBuilder {
    /// Starts a chain with a source node.
    pub fn source() -> Self {
        Self::from_node(Node::Source(SourceNode::new()))
    }

    pub fn from_node(node: Node) -> Self {
        Self {
            nodes: vec![node],
            tail: None,
        }
    }

    pub fn to(mut self, node: Node) -> Self {
        self.nodes.push(node);
        self
    }

    /// Ends the chain on a fan-out to `targets`.
    pub fn fan_out(mut self, targets: Vec<Node>) -> Self {
        self.tail = Some(Link::Clone(targets));
        self
    }

    /// Ends the chain on `collector`.
    pub fn collect_into(mut self, collector: Collector) -> Self {
        self.tail = Some(Link::Collect(collector));
        self
    }

    pub fn build(self) -> Node {
        match link_nodes(self.nodes, self.tail) {
            Some(head) => head,
            None => Node::Source(SourceNode::new()),
        }
    }

    /// Ends the chain on a new collector and wraps it as a pipeline.
    pub fn into_pipeline(self) -> Pipeline {
        let output = Collector::new();
        let head = self.collect_into(output.clone()).build();
        Pipeline::new(head, output)
    }
}
