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

//! Links connect a node to what comes after it.

use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};

use crate::metadata::RowMetadata;
use crate::pipeline::node::{ContextMap, Node};
use crate::pipeline::visitor::Visitor;
use crate::row::Row;

/// Out-of-band message travelling along links.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Signal {
    /// No more rows will be pushed.
    EndOfStream,
    Stop,
    Cancel,
}

/// Outgoing edge of a node.
#[derive(Debug)]
pub enum Link {
    /// Single downstream node.
    Basic(Box<Node>),
    /// Fan-out: every target gets its own clone of each row.
    Clone(Vec<Node>),
    /// Terminal buffer.
    Collect(Collector),
}

impl Link {
    pub fn to(node: Node) -> Self {
        Link::Basic(Box::new(node))
    }

    pub fn emit(&mut self, row: Row, metadata: &RowMetadata) {
        match self {
            Link::Basic(node) => node.receive(row, metadata),
            Link::Clone(targets) => {
                if let Some((last, rest)) = targets.split_last_mut() {
                    for target in rest {
                        target.receive(row.clone(), metadata);
                    }
                    last.receive(row, metadata);
                }
            }
            Link::Collect(collector) => collector.push(row, metadata),
        }
    }

    pub fn signal(&mut self, signal: Signal) {
        match self {
            Link::Basic(node) => node.signal(signal),
            Link::Clone(targets) => targets.iter_mut().for_each(|t| t.signal(signal)),
            Link::Collect(collector) => collector.signal(signal),
        }
    }

    pub fn accept<V: Visitor + ?Sized>(&self, visitor: &mut V) {
        visitor.visit_link(self);
    }

    /// Copy of this link and everything behind it. Collectors stay shared.
    pub fn deep_copy(&self) -> Link {
        self.deep_copy_with(&mut ContextMap::new())
    }

    pub(crate) fn deep_copy_with(&self, contexts: &mut ContextMap) -> Link {
        match self {
            Link::Basic(node) => Link::to(node.deep_copy_with(contexts)),
            Link::Clone(targets) => Link::Clone(
                targets
                    .iter()
                    .map(|target| target.deep_copy_with(contexts))
                    .collect(),
            ),
            Link::Collect(collector) => Link::Collect(collector.clone()),
        }
    }
}

#[derive(Debug, Default)]
struct CollectorState {
    rows: Vec<Row>,
    metadata: Option<RowMetadata>,
    signals: Vec<Signal>,
}

/// Shared sink recording rows, the last schema seen and signals.
///
/// Clones share the same buffer.
#[derive(Debug, Default, Clone)]
pub struct Collector {
    state: Arc<Mutex<CollectorState>>,
}

impl Collector {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, CollectorState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn push(&self, row: Row, metadata: &RowMetadata) {
        let mut state = self.lock();
        state.rows.push(row);
        if state.metadata.as_ref() != Some(metadata) {
            state.metadata = Some(metadata.clone());
        }
    }

    pub fn signal(&self, signal: Signal) {
        self.lock().signals.push(signal);
    }

    /// Rows received so far.
    pub fn rows(&self) -> Vec<Row> {
        self.lock().rows.clone()
    }

    /// Removes and returns the buffered rows.
    pub fn drain(&self) -> Vec<Row> {
        std::mem::take(&mut self.lock().rows)
    }

    /// Schema of the last row received.
    pub fn metadata(&self) -> Option<RowMetadata> {
        self.lock().metadata.clone()
    }

    pub fn signals(&self) -> Vec<Signal> {
        self.lock().signals.clone()
    }

    pub fn len(&self) -> usize {
        self.lock().rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().rows.is_empty()
    }

    pub fn clear(&self) {
        let mut state = self.lock();
        state.rows.clear();
        state.metadata = None;
        state.signals.clear();
    }
}
