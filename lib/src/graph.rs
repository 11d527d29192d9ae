// Copyright 2026 The Ferry Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The change graph.
//!
//! History between two revisions is a DAG: nodes are changes, edges point
//! from child to parent in VCS parent order (first parent first). The graph
//! is closed under its node set: a parent outside the enumerated range is
//! simply dropped, never represented as a dangling edge.
//!
//! Mutation happens only through [`ChangeGraphBuilder`]; the finished
//! [`ChangeGraph`] is immutable.

use std::collections::HashMap;
use std::collections::VecDeque;

use crate::change::Change;
use crate::change::Revision;

/// A builder assembling a [`ChangeGraph`] from a raw change listing.
///
/// The intended use mirrors how VCS log output is consumed: add every change
/// first, then link each change to the parents that made it into the node
/// set. Insertion order is preserved and used to break ordering ties in
/// [`ChangeGraph::linearize`].
#[derive(Debug)]
pub struct ChangeGraphBuilder<R: Revision> {
    nodes: Vec<Change<R>>,
    parents: Vec<Vec<usize>>,
    index: HashMap<String, usize>,
}

impl<R: Revision> ChangeGraphBuilder<R> {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            parents: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Adds a node. Returns `false` (and keeps the first occurrence) when a
    /// change with the same canonical revision was already added.
    pub fn add_change(&mut self, change: Change<R>) -> bool {
        let key = change.revision().as_string();
        if self.index.contains_key(&key) {
            return false;
        }
        self.index.insert(key, self.nodes.len());
        self.nodes.push(change);
        self.parents.push(Vec::new());
        true
    }

    /// Adds a child→parent edge.
    ///
    /// Returns `false` without recording anything when either endpoint is
    /// not a member of the node set or the edge would be a self-loop; both
    /// keep the graph closed and loop-free by construction.
    pub fn add_parent(&mut self, child: &R, parent: &R) -> bool {
        let child_key = child.as_string();
        let parent_key = parent.as_string();
        if child_key == parent_key {
            return false;
        }
        let (Some(&child_idx), Some(&parent_idx)) =
            (self.index.get(&child_key), self.index.get(&parent_key))
        else {
            return false;
        };
        if self.parents[child_idx].contains(&parent_idx) {
            return false;
        }
        self.parents[child_idx].push(parent_idx);
        true
    }

    /// Finalizes the graph.
    pub fn build(self) -> ChangeGraph<R> {
        ChangeGraph {
            nodes: self.nodes,
            parents: self.parents,
            index: self.index,
        }
    }
}

impl<R: Revision> Default for ChangeGraphBuilder<R> {
    fn default() -> Self {
        Self::new()
    }
}

/// An immutable DAG of changes. See the module docs for the edge invariants.
#[derive(Debug)]
pub struct ChangeGraph<R: Revision> {
    nodes: Vec<Change<R>>,
    parents: Vec<Vec<usize>>,
    index: HashMap<String, usize>,
}

impl<R: Revision> ChangeGraph<R> {
    /// Number of changes in the graph.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the graph has no changes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All changes in insertion order.
    pub fn changes(&self) -> &[Change<R>] {
        &self.nodes
    }

    /// The change for a revision, if it is a member.
    pub fn get(&self, revision: &R) -> Option<&Change<R>> {
        self.index
            .get(&revision.as_string())
            .map(|&idx| &self.nodes[idx])
    }

    /// Parent node indices of the node at `idx`, in VCS parent order.
    pub fn parents_of(&self, idx: usize) -> &[usize] {
        &self.parents[idx]
    }

    /// Linearizes the graph into ancestor→descendant (oldest-first) order.
    ///
    /// This is a reverse-topological walk: every change appears after all of
    /// its in-graph parents. Ties between independent branches are broken by
    /// node insertion order.
    pub fn linearize(&self) -> Vec<Change<R>> {
        let mut children: Vec<Vec<usize>> = vec![Vec::new(); self.nodes.len()];
        let mut pending_parents: Vec<usize> = vec![0; self.nodes.len()];
        for (child, parents) in self.parents.iter().enumerate() {
            pending_parents[child] = parents.len();
            for &parent in parents {
                children[parent].push(child);
            }
        }

        let mut queue: VecDeque<usize> = (0..self.nodes.len())
            .filter(|&idx| pending_parents[idx] == 0)
            .collect();
        let mut ordered = Vec::with_capacity(self.nodes.len());
        while let Some(idx) = queue.pop_front() {
            ordered.push(self.nodes[idx].clone());
            for &child in &children[idx] {
                pending_parents[child] -= 1;
                if pending_parents[child] == 0 {
                    queue.push_back(child);
                }
            }
        }
        debug_assert_eq!(ordered.len(), self.nodes.len(), "change graph has a cycle");
        ordered
    }
}
