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

//! The squash strategy: one destination commit carrying the transformed
//! tree of the resolved origin revision.
//!
//! Squash is the catch-up mode: it detects the changes since the last
//! import so templating and error reporting can see them, but always writes
//! a single commit attributed to the default author.

use crate::change::Change;
use crate::change::Metadata;
use crate::change::Revision as _;
use crate::destination::ComputedChanges;
use crate::destination::Destination;
use crate::error::MigrateError;
use crate::error::MigrateResult;
use crate::error::check_condition;
use crate::origin::Origin;
use crate::workflow::FORCE_FLAG;
use crate::workflow::RunHelper;

pub(super) fn run<O: Origin, D: Destination<O::Rev>>(
    helper: &RunHelper<'_, O, D>,
) -> MigrateResult<()> {
    let mut detected_changes: Vec<Change<O::Rev>> = Vec::new();
    let mut current = helper.resolved_ref().clone();

    if helper.is_history_supported() {
        let last_rev = last_rev_or_none(helper)?;
        // Without a known last revision there is nothing to enumerate
        // against; the no-changes policy below decides what that means.
        detected_changes = match &last_rev {
            Some(last_rev) => helper.changes_between(Some(last_rev), &current)?,
            None => Vec::new(),
        };
        if detected_changes.is_empty() {
            manage_no_changes_detected(helper, &current, last_rev.as_ref())?;
        }
    }

    // Squash always attributes the import to the default author.
    let metadata = Metadata::new(
        "Project import generated by Ferry.\n",
        helper.authoring().default_author().clone(),
    );

    helper.maybe_validate_repo_in_last_rev_state(Some(&metadata))?;

    let helper_for_changes = helper.for_changes(&detected_changes);
    // Drop changes that don't affect origin_files. The sub-helper is the one
    // filtering: its glob may differ from the run's for this changeset.
    let detected_changes: Vec<Change<O::Rev>> = detected_changes
        .into_iter()
        .filter(|change| !helper_for_changes.skip_changes(std::slice::from_ref(change)))
        .collect();

    // Prefer the newest change that affected origin_files over the raw
    // resolved ref, which could be an unrelated trailing commit.
    if let Some(last) = detected_changes.last() {
        current = last.revision().clone();
    }

    let detected_changes = if helper.is_squash_without_history() {
        Vec::new()
    } else {
        detected_changes
    };

    // Templating expects the newest change first.
    let mut reversed = detected_changes;
    reversed.reverse();

    helper_for_changes.migrate(
        &current,
        helper.console(),
        metadata,
        &ComputedChanges::new(reversed, Vec::new()),
        None,
        &helper.workflow_identity(helper.resolved_ref()),
    )?;
    Ok(())
}

/// The last imported revision, or `None` when the destination does not
/// record one.
///
/// Unlike iterative discovery, squash treats an unknown last revision as a
/// policy question, not an immediate failure: the no-changes-detected policy
/// owns the error (and its `--force` escape hatch).
fn last_rev_or_none<O: Origin, D: Destination<O::Rev>>(
    helper: &RunHelper<'_, O, D>,
) -> MigrateResult<Option<O::Rev>> {
    match helper.last_rev() {
        Ok(last_rev) => Ok(Some(last_rev)),
        Err(MigrateError::CannotResolveRevision { .. }) => {
            if helper.is_force() {
                helper.console().warn(&format!(
                    "Cannot find last imported revision, but proceeding because of {FORCE_FLAG} \
                     flag"
                ));
            }
            Ok(None)
        }
        Err(other) => Err(other),
    }
}

/// The no-changes-detected policy.
///
/// Squash re-runs must be rejected rather than silently writing an empty
/// import, but every rejection here has a `--force` escape hatch that
/// demotes it to a warning.
fn manage_no_changes_detected<O: Origin, D: Destination<O::Rev>>(
    helper: &RunHelper<'_, O, D>,
    current: &O::Rev,
    last_rev: Option<&O::Rev>,
) -> MigrateResult<()> {
    let Some(last_rev) = last_rev else {
        check_condition(
            helper.is_force(),
            format!(
                "Cannot find any change in history up to '{}'. Use {} if you really want to \
                 migrate to the revision.",
                current.as_string(),
                FORCE_FLAG
            ),
        )?;
        helper.console().warn(&format!(
            "Cannot find any change in history up to '{}'. Trying the migration anyway",
            current.as_string()
        ));
        return Ok(());
    };

    // Check the reverse range: if (current, last_rev] is also empty, the
    // last imported revision is not an ancestor of the current one.
    if last_rev.as_string() != current.as_string()
        && helper.changes_between(Some(current), last_rev)?.is_empty()
    {
        check_condition(
            helper.is_force(),
            format!(
                "Last imported revision '{}' is not an ancestor of the revision currently being \
                 migrated ('{}'). Use {} if you really want to migrate the reference.",
                last_rev.as_string(),
                current.as_string(),
                FORCE_FLAG
            ),
        )?;
        helper.console().warn(&format!(
            "Last imported revision '{}' is not an ancestor of the revision currently being \
             migrated ('{}')",
            last_rev.as_string(),
            current.as_string()
        ));
        return Ok(());
    }

    if !helper.is_force() {
        return Err(MigrateError::empty_change(format!(
            "'{}' has been already migrated. Use {} if you really want to run the migration \
             again.",
            current.as_string(),
            FORCE_FLAG
        )));
    }
    helper.console().warn(&format!(
        "'{}' has been already migrated. Migrating anyway because of {}",
        last_rev.as_string(),
        FORCE_FLAG
    ));
    Ok(())
}
