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

//! The iterative strategy: one destination commit per origin change.
//!
//! Changes are migrated strictly in ancestor order; change N is not started
//! until change N-1 has been written or explicitly skipped. A change that
//! transforms to nothing is warned about and skipped without aborting the
//! run. The display counter tracks origin-change position, so skipped
//! changes leave gaps in the "Change N of M" numbers.

use std::collections::VecDeque;

use crate::change::Change;
use crate::change::Metadata;
use crate::change::Revision as _;
use crate::console::PrefixConsole;
use crate::destination::ComputedChanges;
use crate::destination::Destination;
use crate::destination::WriterResult;
use crate::error::MigrateError;
use crate::error::MigrateResult;
use crate::origin::Origin;
use crate::workflow::RunHelper;

pub(super) fn run<O: Origin, D: Destination<O::Rev>>(
    helper: &RunHelper<'_, O, D>,
) -> MigrateResult<()> {
    let changes = helper.changes_since_last_import()?;
    if changes.is_empty() {
        return Err(MigrateError::empty_change(format!(
            "No new changes to import for resolved ref: {}",
            helper.resolved_ref().as_string()
        )));
    }

    let mut limit = changes.len();
    if helper.options().iterative_limit_changes < changes.len() {
        limit = helper.options().iterative_limit_changes;
        helper.console().info(&format!(
            "Importing first {} change(s) out of {}",
            limit,
            changes.len()
        ));
    }

    helper.maybe_validate_repo_in_last_rev_state(None)?;

    let mut migrated: VecDeque<Change<O::Rev>> = VecDeque::new();
    let mut migrated_changes = 0;
    let mut change_number = 1;

    for (idx, change) in changes.iter().enumerate() {
        if migrated_changes >= limit {
            break;
        }
        let prefix = format!(
            "Change {} of {} ({}): ",
            change_number,
            changes.len().min(limit),
            change.revision().as_string()
        );

        let current = vec![change.clone()];
        let current_helper = helper.for_changes(&current);
        if current_helper.skip_changes(&current) {
            continue;
        }

        let prefix_console = PrefixConsole::new(prefix.clone(), helper.console());
        let computed = ComputedChanges::new(current, migrated.iter().cloned().collect());
        // Identity is derived from the current change: each change may open
        // its own review in the destination.
        let identity = helper.workflow_identity(change.revision());
        let metadata = Metadata::new(
            change.message(),
            helper.authoring().resolve(change.author()),
        );

        let result = match current_helper.migrate(
            change.revision(),
            &prefix_console,
            metadata,
            &computed,
            None,
            &identity,
        ) {
            Ok(result) => {
                migrated_changes += 1;
                result
            }
            Err(MigrateError::EmptyChange { message }) => {
                helper.console().warn(&format!(
                    "Migration of origin revision '{}' resulted in an empty change in the \
                     destination: {}",
                    change.revision().as_string(),
                    message
                ));
                WriterResult::Ok
            }
            Err(error) => {
                helper.console().error(&format!(
                    "Migration of origin revision '{}' failed with error: {}",
                    change.revision().as_string(),
                    error
                ));
                return Err(error);
            }
        };
        migrated.push_front(change.clone());

        if result == WriterResult::PromptToContinue && idx + 1 < changes.len() {
            if !helper
                .console()
                .prompt_confirmation("Continue importing next change?")?
            {
                let message = format!("Iterative workflow aborted by user after: {prefix}");
                helper.console().warn(&message);
                return Err(MigrateError::rejected(message));
            }
        }
        change_number += 1;
    }

    if migrated_changes == 0 {
        return Err(MigrateError::empty_change(format!(
            "Iterative workflow produced no changes in the destination for resolved ref: {}",
            helper.resolved_ref().as_string()
        )));
    }
    tracing::info!(
        "Imported {} change(s) out of {}",
        migrated_changes,
        changes.len()
    );
    Ok(())
}
