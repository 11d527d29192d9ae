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

//! The change-request strategy: import one origin tree diffed against a
//! baseline commit already present in the destination, as a review.
//!
//! The baseline is either given explicitly or discovered by walking origin
//! history backwards from the resolved reference, looking for the label the
//! destination stamps on its own imports.

use crate::change::Metadata;
use crate::change::Revision as _;
use crate::destination::ComputedChanges;
use crate::destination::Destination;
use crate::error::MigrateError;
use crate::error::MigrateResult;
use crate::error::check_condition;
use crate::origin::Origin;
use crate::origin::VisitResult;
use crate::workflow::CHANGE_REQUEST_PARENT_FLAG;
use crate::workflow::RunHelper;
use crate::workflow::WorkflowMode;

pub(super) fn run<O: Origin, D: Destination<O::Rev>>(
    helper: &RunHelper<'_, O, D>,
) -> MigrateResult<()> {
    check_condition(
        helper.destination_supports_previous_ref(),
        format!(
            "'{}' is incompatible with destinations that don't support history (for example \
             folder.destination)",
            WorkflowMode::ChangeRequest
        ),
    )?;
    let origin_label_name = helper.destination().label_name_when_origin()?;

    let mut request_parent = helper
        .options()
        .change_baseline
        .clone()
        .filter(|baseline| !baseline.is_empty());

    if request_parent.is_none() {
        let resolved_ref = helper.resolved_ref();
        let resolved_str = resolved_ref.as_string();
        // The discovery walk assigns into a slot that outlives the visitor.
        let mut discovered: Option<String> = None;
        helper.origin().visit_changes(resolved_ref, &mut |change| {
            if change.revision().as_string() != resolved_str
                && change.labels().contains_key(&origin_label_name)
            {
                discovered = change
                    .labels()
                    .get(&origin_label_name)
                    .map(str::to_string);
                return VisitResult::Terminate;
            }
            VisitResult::Continue
        })?;
        request_parent = discovered;
    }

    let Some(baseline) = request_parent else {
        return Err(MigrateError::validation(format!(
            "Cannot find matching parent commit in the destination. Use '{}' flag to force a \
             parent commit to use as baseline in the destination.",
            CHANGE_REQUEST_PARENT_FLAG
        )));
    };
    tracing::debug!(baseline = %baseline, "using change-request baseline");

    let change = helper.origin().change(helper.resolved_ref())?;
    let metadata = Metadata::new(
        change.message(),
        helper.authoring().resolve(change.author()),
    );
    let computed = ComputedChanges::new(vec![change], Vec::new());
    helper.for_changes(computed.current()).migrate(
        helper.resolved_ref(),
        helper.console(),
        metadata,
        &computed,
        Some(&baseline),
        &helper.workflow_identity(helper.resolved_ref()),
    )?;
    Ok(())
}
