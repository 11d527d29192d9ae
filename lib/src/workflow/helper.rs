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

//! Per-invocation run state.
//!
//! A [`RunHelper`] is created once per workflow run and destroyed at run
//! end. It holds the resolved origin revision, the effective file glob, and
//! the exclusive destination-writer session. Sub-helpers created through
//! [`RunHelper::for_changes`] are cheap projections: a change-specific glob
//! plus shared references to everything else. Sub-helpers never mutate
//! parent state except through the destination writer.

use std::cell::RefCell;
use std::fs;

use sha2::Digest as _;
use sha2::Sha256;

use crate::change::Change;
use crate::change::Metadata;
use crate::change::Revision as _;
use crate::console::Console;
use crate::destination::ComputedChanges;
use crate::destination::Destination;
use crate::destination::DestinationWriter;
use crate::destination::WriteRequest;
use crate::destination::WriterResult;
use crate::error::MigrateError;
use crate::error::MigrateResult;
use crate::glob::FileGlob;
use crate::origin::ChangesResponse;
use crate::origin::Origin;
use crate::transform::TransformContext;
use crate::tree::tree_digest;
use crate::workflow::FORCE_FLAG;
use crate::workflow::Workflow;
use crate::workflow::WorkflowOptions;
use crate::workflow::maybe_get_last_rev;

/// The per-run context the workflow modes drive.
pub struct RunHelper<'run, O: Origin, D: Destination<O::Rev>> {
    workflow: &'run Workflow<O, D>,
    resolved_ref: &'run O::Rev,
    writer: &'run RefCell<Box<dyn DestinationWriter<O::Rev>>>,
    console: &'run dyn Console,
    origin_files: FileGlob,
}

impl<'run, O: Origin, D: Destination<O::Rev>> RunHelper<'run, O, D> {
    pub(crate) fn new(
        workflow: &'run Workflow<O, D>,
        resolved_ref: &'run O::Rev,
        writer: &'run RefCell<Box<dyn DestinationWriter<O::Rev>>>,
        console: &'run dyn Console,
        origin_files: FileGlob,
    ) -> Self {
        Self {
            workflow,
            resolved_ref,
            writer,
            console,
            origin_files,
        }
    }

    /// The revision this run is targeting.
    pub fn resolved_ref(&self) -> &O::Rev {
        self.resolved_ref
    }

    /// The run's user-facing console.
    pub fn console(&self) -> &'run dyn Console {
        self.console
    }

    /// The options snapshot.
    pub fn options(&self) -> &WorkflowOptions {
        self.workflow.options()
    }

    /// The origin endpoint.
    pub fn origin(&self) -> &'run O {
        self.workflow.origin()
    }

    /// The destination endpoint.
    pub fn destination(&self) -> &'run D {
        self.workflow.destination()
    }

    /// The authoring policy.
    pub fn authoring(&self) -> &crate::authoring::Authoring {
        self.workflow.authoring()
    }

    /// The effective file glob of this helper.
    pub fn origin_files(&self) -> &FileGlob {
        &self.origin_files
    }

    /// Whether safety validations are demoted to warnings.
    pub fn is_force(&self) -> bool {
        self.workflow.options().force
    }

    /// Whether squash hides individual commits from the writer.
    pub fn is_squash_without_history(&self) -> bool {
        self.workflow.options().squash_without_history
    }

    /// Whether the destination can report previously imported revisions.
    pub fn destination_supports_previous_ref(&self) -> bool {
        self.workflow.destination().supports_previous_ref()
    }

    /// Whether both ends support history-based change detection.
    pub fn is_history_supported(&self) -> bool {
        self.destination_supports_previous_ref() && self.origin().supports_history()
    }

    /// The last imported origin revision recorded in the destination,
    /// recovered from the origin label on its newest relevant commit.
    ///
    /// Fails with `CannotResolveRevision` when the destination carries no
    /// such label.
    pub fn last_rev(&self) -> MigrateResult<O::Rev> {
        let label = self.origin().label_name();
        match self.writer.borrow().previous_ref(&label)? {
            Some(value) => self.origin().resolve(Some(&value)),
            None => Err(MigrateError::cannot_resolve(format!(
                "previous revision label {label} not found in the destination"
            ))),
        }
    }

    /// Linearized changes in the half-open range `(from, to]`, oldest first.
    /// Empty when the origin reports no changes.
    pub fn changes_between(
        &self,
        from: Option<&O::Rev>,
        to: &O::Rev,
    ) -> MigrateResult<Vec<Change<O::Rev>>> {
        self.workflow.cancel().check()?;
        match self.origin().changes(from, to)? {
            ChangesResponse::Changes(graph) => Ok(graph.linearize()),
            ChangesResponse::NoChanges(reason) => {
                tracing::debug!(?reason, "origin reported no changes");
                Ok(Vec::new())
            }
        }
    }

    /// Changes since the last imported revision, oldest first. With
    /// `--force`, an unknown last revision falls back to the full history of
    /// the resolved reference.
    pub fn changes_since_last_import(&self) -> MigrateResult<Vec<Change<O::Rev>>> {
        let last_rev = maybe_get_last_rev(self)?;
        self.changes_between(last_rev.as_ref(), self.resolved_ref)
    }

    /// Whether the whole list can be dropped without writing a destination
    /// commit: true iff the list is empty or no listed change touches a file
    /// inside the effective glob.
    pub fn skip_changes(&self, changes: &[Change<O::Rev>]) -> bool {
        let skip = changes.iter().all(|change| {
            !self
                .origin_files
                .matches_any(change.files().iter().map(String::as_str))
        });
        if skip && !changes.is_empty() {
            tracing::debug!(
                glob = %self.origin_files,
                "changes touch no files inside the glob, skipping"
            );
        }
        skip
    }

    /// A sub-helper for a specific changeset, with the file glob possibly
    /// overridden by configuration associated with those changes. All other
    /// state is inherited.
    pub fn for_changes(&self, changes: &[Change<O::Rev>]) -> RunHelper<'run, O, D> {
        let origin_files = self
            .workflow
            .origin_files_for(changes)
            .unwrap_or_else(|| self.origin_files.clone());
        RunHelper {
            workflow: self.workflow,
            resolved_ref: self.resolved_ref,
            writer: self.writer,
            console: self.console,
            origin_files,
        }
    }

    /// The opaque fingerprint correlating this run's destination commits:
    /// a digest over the workflow name, the origin label, and `revision`.
    pub fn workflow_identity(&self, revision: &O::Rev) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.workflow.name().as_bytes());
        hasher.update([0u8]);
        hasher.update(self.origin().label_name().as_bytes());
        hasher.update([0u8]);
        hasher.update(revision.as_string().as_bytes());
        let digest = hex::encode(hasher.finalize());
        format!("ferry-{}", &digest[..20])
    }

    /// Checks out `current`, runs the transformation, and hands the tree to
    /// the destination writer.
    pub fn migrate(
        &self,
        current: &O::Rev,
        console: &dyn Console,
        mut metadata: Metadata,
        changes: &ComputedChanges<O::Rev>,
        destination_baseline: Option<&str>,
        workflow_identity: &str,
    ) -> MigrateResult<WriterResult> {
        self.workflow.cancel().check()?;
        let scratch = scratch_dir()?;
        let checkout_dir = scratch.path().join("checkout");
        fs::create_dir(&checkout_dir)
            .map_err(|e| MigrateError::repo_with("cannot create checkout directory", e))?;

        self.origin().checkout(current, &checkout_dir)?;
        let mut ctx = TransformContext::new(&checkout_dir, &mut metadata, changes);
        self.workflow.transformation().transform(&mut ctx, console)?;

        let origin_label = self.origin().label_name();
        let request = WriteRequest {
            tree: &checkout_dir,
            current_rev: current,
            origin_label: &origin_label,
            metadata: &metadata,
            changes,
            baseline: destination_baseline,
            workflow_identity,
        };
        self.workflow.cancel().check()?;
        self.writer.borrow_mut().write(request, console)
    }

    /// When `check_last_rev_state` is on, verifies the destination tree
    /// matches the transformed tree at the last imported revision.
    ///
    /// A mismatch is fatal without `--force`. The check is skipped when
    /// history is unsupported, the last revision is unknown, or the
    /// destination cannot report a tree digest.
    pub fn maybe_validate_repo_in_last_rev_state(
        &self,
        metadata: Option<&Metadata>,
    ) -> MigrateResult<()> {
        if !self.options().check_last_rev_state || !self.is_history_supported() {
            return Ok(());
        }
        let Some(last_rev) = maybe_get_last_rev(self)? else {
            return Ok(());
        };
        let Some(destination_digest) = self.writer.borrow().current_tree_digest()? else {
            self.console.warn(
                "Destination does not expose its tree state; skipping last-revision validation",
            );
            return Ok(());
        };

        let scratch = scratch_dir()?;
        let checkout_dir = scratch.path().join("checkout");
        fs::create_dir(&checkout_dir)
            .map_err(|e| MigrateError::repo_with("cannot create checkout directory", e))?;
        self.origin().checkout(&last_rev, &checkout_dir)?;

        let mut metadata = metadata.cloned().unwrap_or_else(|| {
            Metadata::new(String::new(), self.authoring().default_author().clone())
        });
        let changes = ComputedChanges::default();
        let mut ctx = TransformContext::new(&checkout_dir, &mut metadata, &changes);
        self.workflow.transformation().transform(&mut ctx, self.console)?;

        let local_digest = tree_digest(&checkout_dir)?;
        if local_digest != destination_digest {
            let message = format!(
                "Destination tree state does not match the transformed tree at last imported \
                 revision '{}'",
                last_rev.as_string()
            );
            if self.is_force() {
                self.console
                    .warn(&format!("{message}. Proceeding because of {FORCE_FLAG}"));
            } else {
                return Err(MigrateError::validation(format!(
                    "{message}. Use {FORCE_FLAG} to migrate anyway"
                )));
            }
        }
        Ok(())
    }
}

fn scratch_dir() -> MigrateResult<tempfile::TempDir> {
    tempfile::tempdir()
        .map_err(|e| MigrateError::repo_with("cannot create scratch directory", e))
}
