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

//! The origin side of a migration.
//!
//! An [`Origin`] resolves references, enumerates history as a change graph,
//! and materialises working trees. Origins without history (folder
//! snapshots) implement only `resolve` and `checkout` and report
//! `supports_history() == false`; workflows consult that capability before
//! asking for changes.

use std::path::Path;

use crate::change::Change;
use crate::change::Revision;
use crate::error::MigrateResult;
use crate::graph::ChangeGraph;

/// Why a [`ChangesResponse`] carries no changes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EmptyReason {
    /// The range contains no commits at all.
    NoChanges,
    /// The range has commits, but none touch the requested file roots.
    ToFilesExcluded,
    /// The two revisions do not share history.
    UnrelatedRevisions,
}

/// The result of enumerating changes between two revisions: either a
/// non-empty graph or a reason there is nothing to enumerate.
#[derive(Debug)]
pub enum ChangesResponse<R: Revision> {
    /// The enumerated changes.
    Changes(ChangeGraph<R>),
    /// Nothing to enumerate, and why.
    NoChanges(EmptyReason),
}

impl<R: Revision> ChangesResponse<R> {
    /// Wraps a graph, degrading an empty graph to
    /// `NoChanges(EmptyReason::NoChanges)` so `Changes` always carries at
    /// least one node.
    pub fn for_changes(graph: ChangeGraph<R>) -> Self {
        if graph.is_empty() {
            ChangesResponse::NoChanges(EmptyReason::NoChanges)
        } else {
            ChangesResponse::Changes(graph)
        }
    }

    /// An empty response with the given reason.
    pub fn no_changes(reason: EmptyReason) -> Self {
        ChangesResponse::NoChanges(reason)
    }
}

/// Visitor verdict for [`Origin::visit_changes`]: keep walking or stop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VisitResult {
    /// Continue with the next ancestor.
    Continue,
    /// Stop the traversal.
    Terminate,
}

/// A history-walk callback. Iteration control is by return value, never by
/// error.
pub type ChangesVisitor<'a, R> = dyn FnMut(&Change<R>) -> VisitResult + 'a;

/// The repository changes are read from.
pub trait Origin: Send + Sync {
    /// The origin's revision type.
    type Rev: Revision;

    /// Resolves a human reference (branch, tag, hash) to a revision.
    ///
    /// `None` or an empty string selects the configured default reference.
    /// May fetch from a remote as a side effect. Fails with
    /// `CannotResolveRevision` when the reference does not exist.
    fn resolve(&self, reference: Option<&str>) -> MigrateResult<Self::Rev>;

    /// Materialises the tree of `revision` into `work_dir`.
    ///
    /// `work_dir` must exist; its previous contents are deleted. Fails with
    /// a validation error when the revision's tree is empty ("the origin
    /// repository is empty") and a repo error for VCS or I/O failures.
    fn checkout(&self, revision: &Self::Rev, work_dir: &Path) -> MigrateResult<()>;

    /// Enumerates commits in the half-open range `(from, to]`.
    ///
    /// `None` for `from` means all ancestors of `to`. The returned graph
    /// keeps only parent edges whose endpoints are inside the range.
    fn changes(
        &self,
        from: Option<&Self::Rev>,
        to: &Self::Rev,
    ) -> MigrateResult<ChangesResponse<Self::Rev>>;

    /// Fetches exactly one change. Fails with `EmptyChange` when the
    /// reference resolves to nothing.
    fn change(&self, revision: &Self::Rev) -> MigrateResult<Change<Self::Rev>>;

    /// Walks the ancestors of `start` in reverse-chronological order,
    /// first parent preferred, visiting each change at most once, until the
    /// visitor returns [`VisitResult::Terminate`] or history is exhausted.
    fn visit_changes(
        &self,
        start: &Self::Rev,
        visitor: &mut ChangesVisitor<'_, Self::Rev>,
    ) -> MigrateResult<()>;

    /// Whether this origin has history at all.
    fn supports_history(&self) -> bool {
        true
    }

    /// The label under which destinations record this origin's revisions,
    /// e.g. `GitOrigin-RevId`.
    fn label_name(&self) -> String;
}
