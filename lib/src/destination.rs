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

//! The destination side of a migration.
//!
//! A [`Destination`] creates one writer session per workflow run; the run
//! helper owns that session exclusively. The writer accepts transformed
//! trees plus metadata and produces commits or reviews. "Last imported
//! revision" state is never persisted by the engine: the destination is the
//! source of truth, queried through [`DestinationWriter::previous_ref`].

use std::path::Path;

use crate::change::Change;
use crate::change::Metadata;
use crate::change::Revision;
use crate::console::Console;
use crate::error::MigrateResult;

/// Outcome of a destination write.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WriterResult {
    /// The write completed; the caller may continue immediately.
    Ok,
    /// The write completed, but the destination wants the user to confirm
    /// before the next commit (e.g. the first commit of a long run just
    /// opened a review).
    PromptToContinue,
}

/// The change context handed to the writer: what is being written now, and
/// what this run already wrote.
///
/// `current` is in ancestor-first order; `already_migrated` is
/// most-recent-first. Downstream templating observes both orders, so
/// intermediate filtering must not reorder them.
#[derive(Clone, Debug)]
pub struct ComputedChanges<R> {
    current: Vec<Change<R>>,
    already_migrated: Vec<Change<R>>,
}

impl<R> Default for ComputedChanges<R> {
    fn default() -> Self {
        Self {
            current: Vec::new(),
            already_migrated: Vec::new(),
        }
    }
}

impl<R: Revision> ComputedChanges<R> {
    /// Creates the pair. See the type docs for the ordering contract.
    pub fn new(current: Vec<Change<R>>, already_migrated: Vec<Change<R>>) -> Self {
        Self {
            current,
            already_migrated,
        }
    }

    /// The changes being written now, ancestor-first.
    pub fn current(&self) -> &[Change<R>] {
        &self.current
    }

    /// Changes already written earlier in this run, most-recent-first.
    pub fn already_migrated(&self) -> &[Change<R>] {
        &self.already_migrated
    }
}

/// Everything the destination needs to produce one commit or review.
#[derive(Debug)]
pub struct WriteRequest<'a, R: Revision> {
    /// The transformed working tree to commit.
    pub tree: &'a Path,
    /// The origin revision the tree was produced from.
    pub current_rev: &'a R,
    /// The label under which to record `current_rev` in the produced
    /// commit's message.
    pub origin_label: &'a str,
    /// Message and author to stamp.
    pub metadata: &'a Metadata,
    /// Change context for templating.
    pub changes: &'a ComputedChanges<R>,
    /// For review-style imports: the destination-side parent to diff
    /// against. `None` outside change-request mode.
    pub baseline: Option<&'a str>,
    /// Opaque per-run fingerprint used to correlate retries and multi-commit
    /// sequences.
    pub workflow_identity: &'a str,
}

/// The repository changes are written to.
pub trait Destination<R: Revision>: Send + Sync {
    /// Whether this destination can report previously imported revisions.
    /// Folder-style destinations cannot.
    fn supports_previous_ref(&self) -> bool;

    /// The label this destination stamps when it acts as the *origin* of
    /// another migration. Change-request baseline discovery searches origin
    /// history for this label.
    ///
    /// Fails with a validation error for destinations that cannot act as an
    /// origin.
    fn label_name_when_origin(&self) -> MigrateResult<String>;

    /// Opens the writer session for one workflow run.
    fn writer(&self) -> MigrateResult<Box<dyn DestinationWriter<R>>>;
}

/// A single run's writing session against a destination.
pub trait DestinationWriter<R: Revision> {
    /// The value of `label_name` on the newest relevant destination commit,
    /// or `None` when no commit carries the label.
    fn previous_ref(&self, label_name: &str) -> MigrateResult<Option<String>>;

    /// Writes one commit or review.
    ///
    /// Fails with `EmptyChange` when the tree introduces no difference
    /// against the destination parent.
    fn write(
        &mut self,
        request: WriteRequest<'_, R>,
        console: &dyn Console,
    ) -> MigrateResult<WriterResult>;

    /// Content digest of the destination's current tree, for last-revision
    /// state validation. `None` means the destination cannot report one and
    /// the validation is skipped.
    fn current_tree_digest(&self) -> MigrateResult<Option<String>> {
        Ok(None)
    }
}
