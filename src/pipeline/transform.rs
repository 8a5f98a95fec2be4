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

//! # Prepline Step Transformer
//!
//! Rewrites a flat pipeline `Source -> Compile -> Action -> Compile -> ...`
//! into `Source -> Step -> Step -> ...`, binding each compile/action pair to
//! the next step of a preparation's chain.
//!
//! The pass is driven by a [`Visitor`] and a three-state machine:
//!
//! | State      | Compile                    | Action            | Other              |
//! |------------|----------------------------|-------------------|--------------------|
//! | `Dispatch` | go to `Step`, reprocess    | go to `Default`   | go to `Default`    |
//! | `Step`     | emit a step node           | back to `Dispatch`| skip (already copied) |
//! | `Default`  | emit a copy, `Dispatch`    | same              | same               |
//!
//! The output is rebuilt from shallow copies only, so the input pipeline is
//! left as it was. Copies get action contexts of their own, so running the
//! input pipeline afterwards does not affect the output one. Step nodes go through `Default` unchanged, which makes the
//! transformation idempotent. Only the main chain of `Basic` links is
//! rewritten; a fan-out or collector ending it is carried over as is.

use crate::errors::{PrepError, Result};
use crate::pipeline::link::Link;
use crate::pipeline::node::{
    ActionNode, BasicNode, CompileNode, ContextMap, Node, SourceNode, StepNode,
};
use crate::pipeline::visitor::{link_nodes, NodeCopy, Visitor};
use crate::step::Step;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    Dispatch,
    Step,
    Default,
}

enum Visited<'a> {
    Compile(&'a CompileNode),
    Action(&'a ActionNode),
    Other(Node),
}

/// Groups compile/action pairs into step nodes.
#[derive(Debug)]
pub struct StepNodeTransformer {
    steps: std::vec::IntoIter<Step>,
    available: usize,
    state: State,
    output: Vec<Node>,
    contexts: ContextMap,
    tail: Option<Link>,
    error: Option<PrepError>,
}

impl StepNodeTransformer {
    /// `steps` is a chain as listed from its head, root first. The root is
    /// not bound to any node.
    pub fn new(steps: &[Step]) -> Self {
        let steps: Vec<Step> = steps.iter().filter(|s| !s.is_root()).cloned().collect();
        Self {
            available: steps.len(),
            steps: steps.into_iter(),
            state: State::Dispatch,
            output: Vec::new(),
            contexts: ContextMap::new(),
            tail: None,
            error: None,
        }
    }

    /// Drops cached schemas downstream of the first step that has none.
    pub fn invalidate_downstream(mut self) -> Self {
        let steps: Vec<Step> = self.steps.collect();
        let mut stale = false;
        let steps = steps
            .into_iter()
            .map(|step| {
                if stale {
                    return step.without_cache();
                }
                if step.row_metadata().is_none() {
                    stale = true;
                }
                step
            })
            .collect::<Vec<_>>();
        self.steps = steps.into_iter();
        self
    }

    /// Returns the head of the transformed pipeline.
    pub fn transform(mut self, head: &Node) -> Result<Node> {
        head.accept(&mut self);
        if let Some(err) = self.error {
            return Err(err);
        }

        let surplus = self.steps.len();
        if surplus > 0 {
            log::warn!(
                "{surplus} step(s) out of {} not bound to any action",
                self.available
            );
        }

        link_nodes(self.output, self.tail)
            .ok_or_else(|| PrepError::pipeline("transform", "empty pipeline"))
    }

    fn process(&mut self, node: Visited<'_>) {
        loop {
            match (self.state, &node) {
                (State::Dispatch, Visited::Compile(_)) => self.state = State::Step,
                (State::Dispatch, _) => self.state = State::Default,
                (State::Step, Visited::Compile(compile)) => {
                    let Some(step) = self.steps.next() else {
                        self.error = Some(PrepError::InsufficientSteps {
                            available: self.available,
                        });
                        return;
                    };
                    let mut copy = NodeCopy::until_action();
                    copy.visit_compile(compile);
                    log::debug!("binding step {} to {}", step.id(), compile.action().name());
                    self.output
                        .push(Node::Step(StepNode::new(step, copy.into_nodes())));
                    return;
                }
                (State::Step, Visited::Action(_)) => {
                    self.state = State::Dispatch;
                    return;
                }
                (State::Step, Visited::Other(_)) => return,
                (State::Default, _) => break,
            }
        }

        let copy = match node {
            Visited::Compile(compile) => Node::Compile(compile.copy_with(&mut self.contexts)),
            Visited::Action(action) => Node::Action(action.copy_with(&mut self.contexts)),
            Visited::Other(node) => node,
        };
        self.output.push(copy);
        self.state = State::Dispatch;
    }

    fn follow(&mut self, link: Option<&Link>) {
        if self.error.is_some() {
            return;
        }
        match link {
            Some(Link::Basic(next)) => next.accept(self),
            Some(other) => self.tail = Some(other.deep_copy_with(&mut self.contexts)),
            None => {}
        }
    }
}

impl Visitor for StepNodeTransformer {
    fn visit_source(&mut self, node: &SourceNode) {
        self.process(Visited::Other(Node::Source(SourceNode::new())));
        self.follow(node.link());
    }

    fn visit_compile(&mut self, node: &CompileNode) {
        self.process(Visited::Compile(node));
        self.follow(node.link());
    }

    fn visit_action(&mut self, node: &ActionNode) {
        self.process(Visited::Action(node));
        self.follow(node.link());
    }

    fn visit_step(&mut self, node: &StepNode) {
        self.process(Visited::Other(Node::Step(node.copy_shallow())));
        self.follow(node.link());
    }

    fn visit_basic(&mut self, node: &BasicNode) {
        self.process(Visited::Other(Node::Basic(BasicNode::new())));
        self.follow(node.link());
    }
}

/// Binds the compile/action pairs behind `head` to `steps`.
pub fn transform(head: &Node, steps: &[Step]) -> Result<Node> {
    StepNodeTransformer::new(steps).transform(head)
}
