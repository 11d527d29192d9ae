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

//! The workflow execution engine.
//!
//! A [`Workflow`] connects one origin to one destination and runs one of
//! three strategies:
//!
//! - [`WorkflowMode::Squash`] - one destination commit whose tree equals the
//!   transformed tree of the resolved origin revision;
//! - [`WorkflowMode::Iterative`] - one destination commit per origin change;
//! - [`WorkflowMode::ChangeRequest`] - one origin tree diffed against a
//!   baseline commit already in the destination, as a review.
//!
//! Each strategy is a plain function over the [`RunHelper`] interface;
//! [`Workflow::run`] dispatches on the mode tag.

mod change_request;
mod helper;
mod iterative;
mod squash;

use std::cell::RefCell;
use std::fmt;

pub use self::helper::RunHelper;

use crate::authoring::Authoring;
use crate::cancel::CancellationSignal;
use crate::change::Change;
use crate::change::Revision as _;
use crate::console::Console;
use crate::destination::Destination;
use crate::error::MigrateError;
use crate::error::MigrateResult;
use crate::glob::FileGlob;
use crate::origin::Origin;
use crate::transform::Identity;
use crate::transform::Transformation;

/// User-visible name of the force flag; error messages reference it
/// verbatim.
pub const FORCE_FLAG: &str = "--force";

/// User-visible name of the change-request baseline flag; error messages
/// reference it verbatim.
pub const CHANGE_REQUEST_PARENT_FLAG: &str = "--change-request-parent";

/// The migration strategy to run between origin and destination.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WorkflowMode {
    /// Create a single commit in the destination with the new tree state.
    Squash,
    /// Import each origin change individually.
    Iterative,
    /// Import an origin tree state diffed by a common parent in the
    /// destination, as a review.
    ChangeRequest,
}

impl fmt::Display for WorkflowMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WorkflowMode::Squash => "squash",
            WorkflowMode::Iterative => "iterative",
            WorkflowMode::ChangeRequest => "change-request",
        };
        write!(f, "{name}")
    }
}

/// Per-run settings recognised by the engine.
#[derive(Clone, Debug)]
pub struct WorkflowOptions {
    /// Cap on changes migrated per iterative run.
    pub iterative_limit_changes: usize,
    /// Pre-selected change-request baseline; empty means discover one.
    pub change_baseline: Option<String>,
    /// Demote history-discovery safety errors to warnings.
    pub force: bool,
    /// Squash discards the detected change list before handing it to the
    /// writer. Detection (and its no-changes errors) still runs.
    pub squash_without_history: bool,
    /// Verify the destination tree matches the transformed tree at the last
    /// imported revision before migrating.
    pub check_last_rev_state: bool,
}

impl Default for WorkflowOptions {
    fn default() -> Self {
        Self {
            iterative_limit_changes: usize::MAX,
            change_baseline: None,
            force: false,
            squash_without_history: false,
            check_last_rev_state: false,
        }
    }
}

/// Hook resolving a change-specific file glob, for configurations that
/// narrow or widen `origin_files` per changeset. `None` keeps the parent
/// glob.
pub type OriginFilesResolver<R> =
    Box<dyn Fn(&[Change<R>]) -> Option<FileGlob> + Send + Sync>;

/// A configured migration between one origin and one destination.
pub struct Workflow<O: Origin, D: Destination<O::Rev>> {
    name: String,
    origin: O,
    destination: D,
    mode: WorkflowMode,
    authoring: Authoring,
    origin_files: FileGlob,
    options: WorkflowOptions,
    transformation: Box<dyn Transformation<O::Rev>>,
    origin_files_for_changes: Option<OriginFilesResolver<O::Rev>>,
    cancel: CancellationSignal,
}

impl<O: Origin, D: Destination<O::Rev>> Workflow<O, D> {
    /// Creates a workflow with default options, an all-files glob, and the
    /// identity transformation.
    pub fn new(
        name: impl Into<String>,
        origin: O,
        destination: D,
        authoring: Authoring,
        mode: WorkflowMode,
    ) -> Self {
        Self {
            name: name.into(),
            origin,
            destination,
            mode,
            authoring,
            origin_files: FileGlob::all_files(),
            options: WorkflowOptions::default(),
            transformation: Box::new(Identity),
            origin_files_for_changes: None,
            cancel: CancellationSignal::new(),
        }
    }

    /// Restricts the migration to files matching `origin_files`.
    pub fn with_origin_files(mut self, origin_files: FileGlob) -> Self {
        self.origin_files = origin_files;
        self
    }

    /// Replaces the options snapshot.
    pub fn with_options(mut self, options: WorkflowOptions) -> Self {
        self.options = options;
        self
    }

    /// Installs the transformation run between checkout and write.
    pub fn with_transformation(
        mut self,
        transformation: Box<dyn Transformation<O::Rev>>,
    ) -> Self {
        self.transformation = transformation;
        self
    }

    /// Installs a per-changeset glob override hook.
    pub fn with_origin_files_for_changes(
        mut self,
        resolver: OriginFilesResolver<O::Rev>,
    ) -> Self {
        self.origin_files_for_changes = Some(resolver);
        self
    }

    /// Shares a cancellation signal with the caller; suspension points check
    /// it and fail with `Cancelled`.
    pub fn with_cancellation(mut self, cancel: CancellationSignal) -> Self {
        self.cancel = cancel;
        self
    }

    /// The workflow's configured name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The origin endpoint.
    pub fn origin(&self) -> &O {
        &self.origin
    }

    /// The destination endpoint.
    pub fn destination(&self) -> &D {
        &self.destination
    }

    /// The authoring policy.
    pub fn authoring(&self) -> &Authoring {
        &self.authoring
    }

    /// The options snapshot.
    pub fn options(&self) -> &WorkflowOptions {
        &self.options
    }

    /// The configured migration strategy.
    pub fn mode(&self) -> WorkflowMode {
        self.mode
    }

    pub(crate) fn transformation(&self) -> &dyn Transformation<O::Rev> {
        self.transformation.as_ref()
    }

    pub(crate) fn cancel(&self) -> &CancellationSignal {
        &self.cancel
    }

    pub(crate) fn origin_files_for(&self, changes: &[Change<O::Rev>]) -> Option<FileGlob> {
        self.origin_files_for_changes
            .as_ref()
            .and_then(|resolver| resolver(changes))
    }

    /// Runs the workflow against `reference` (or the origin's default
    /// reference), reporting through `console`.
    pub fn run(&self, reference: Option<&str>, console: &dyn Console) -> MigrateResult<()> {
        self.cancel.check()?;
        let resolved_ref = self.origin.resolve(reference)?;
        tracing::info!(
            workflow = %self.name,
            mode = %self.mode,
            resolved_ref = %resolved_ref.as_string(),
            "running migration"
        );
        let writer = RefCell::new(self.destination.writer()?);
        let helper = RunHelper::new(self, &resolved_ref, &writer, console, self.origin_files.clone());
        match self.mode {
            WorkflowMode::Squash => squash::run(&helper),
            WorkflowMode::Iterative => iterative::run(&helper),
            WorkflowMode::ChangeRequest => change_request::run(&helper),
        }
    }
}

/// Returns the last imported revision if possible: `None` with a warning
/// under `--force`, a validation error otherwise.
pub(crate) fn maybe_get_last_rev<O: Origin, D: Destination<O::Rev>>(
    helper: &RunHelper<'_, O, D>,
) -> MigrateResult<Option<O::Rev>> {
    match helper.last_rev() {
        Ok(last_rev) => Ok(Some(last_rev)),
        Err(MigrateError::CannotResolveRevision { .. }) => {
            if helper.is_force() {
                helper.console().warn(&format!(
                    "Cannot find last imported revision, but proceeding because of {FORCE_FLAG} flag"
                ));
                Ok(None)
            } else {
                Err(MigrateError::validation(format!(
                    "Cannot find last imported revision. Use {FORCE_FLAG} if you really want to \
                     proceed with the migration"
                )))
            }
        }
        Err(other) => Err(other),
    }
}
