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

//! Tests for the workflow engine against scripted endpoints.

use ferry_lib::authoring::Authoring;
use ferry_lib::cancel::CancellationSignal;
use ferry_lib::change::Change;
use ferry_lib::destination::WriterResult;
use ferry_lib::error::MigrateError;
use ferry_lib::glob::FileGlob;
use ferry_lib::workflow::Workflow;
use ferry_lib::workflow::WorkflowMode;
use ferry_lib::workflow::WorkflowOptions;
use testutils::DummyOrigin;
use testutils::RecordingDestination;
use testutils::TestConsole;
use testutils::TestRevision;
use testutils::default_author;
use testutils::upstream_author;

fn authoring() -> Authoring {
    Authoring::pass_thru(default_author())
}

/// A linear origin where each change touches `src/<rev>.rs`.
fn linear_origin(revs: &[&str]) -> DummyOrigin {
    let mut origin = DummyOrigin::new();
    for rev in revs {
        let file = format!("src/{rev}.rs");
        origin.add_change(rev, &format!("change {rev}\n"), &[file.as_str()]);
    }
    origin
}

fn workflow(
    origin: DummyOrigin,
    destination: RecordingDestination,
    mode: WorkflowMode,
    options: WorkflowOptions,
) -> Workflow<DummyOrigin, RecordingDestination> {
    Workflow::new("default", origin, destination, authoring(), mode).with_options(options)
}

fn force_options() -> WorkflowOptions {
    WorkflowOptions {
        force: true,
        ..WorkflowOptions::default()
    }
}

// =============================================================================
// Squash
// =============================================================================

#[test]
fn test_squash_first_import_requires_force() {
    let destination = RecordingDestination::new();
    let console = TestConsole::new();
    let workflow = workflow(
        linear_origin(&["a", "b", "c"]),
        destination.clone(),
        WorkflowMode::Squash,
        WorkflowOptions::default(),
    );

    let err = workflow.run(Some("c"), &console).unwrap_err();
    assert!(matches!(err, MigrateError::Validation { .. }));
    assert!(
        err.to_string()
            .contains("Cannot find any change in history up to 'c'")
    );
    assert!(err.to_string().contains("--force"));
    assert!(destination.writes().is_empty());
}

#[test]
fn test_squash_first_import_with_force() {
    let destination = RecordingDestination::new();
    let console = TestConsole::new();
    let workflow = workflow(
        linear_origin(&["a", "b", "c"]),
        destination.clone(),
        WorkflowMode::Squash,
        force_options(),
    );

    workflow.run(Some("c"), &console).unwrap();

    let writes = destination.writes();
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0].current_rev, "c");
    // Without a last revision there is nothing to detect.
    assert!(writes[0].current.is_empty());
    assert!(writes[0].already_migrated.is_empty());
    assert_eq!(writes[0].author, default_author());
    assert_eq!(writes[0].message, "Project import generated by Ferry.\n");
    assert!(console.has_warning_containing("Trying the migration anyway"));
}

#[test]
fn test_squash_steady_state() {
    let destination = RecordingDestination::new();
    destination.set_previous_ref("a");
    let console = TestConsole::new();
    let workflow = workflow(
        linear_origin(&["a", "b", "c"]),
        destination.clone(),
        WorkflowMode::Squash,
        WorkflowOptions::default(),
    );

    workflow.run(Some("c"), &console).unwrap();

    let writes = destination.writes();
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0].current_rev, "c");
    // Templating sees the newest change first.
    assert_eq!(writes[0].current, ["c", "b"]);
    assert_eq!(writes[0].author, default_author());
    // The squash tree is the full tree at c.
    assert_eq!(writes[0].tree_files, ["src/a.rs", "src/b.rs", "src/c.rs"]);
}

#[test]
fn test_squash_skips_trailing_irrelevant_change() {
    let mut origin = DummyOrigin::new();
    origin.add_change("a", "base\n", &["src/a.rs"]);
    origin.add_change("b", "feature\n", &["src/b.rs"]);
    origin.add_change("c", "fix\n", &["src/c.rs"]);
    origin.add_change("d", "docs only\n", &["docs/readme.md"]);
    let destination = RecordingDestination::new();
    destination.set_previous_ref("a");
    let console = TestConsole::new();
    let glob = FileGlob::new(&["src/**".to_string()], &[]).unwrap();
    let workflow = Workflow::new(
        "default",
        origin,
        destination.clone(),
        authoring(),
        WorkflowMode::Squash,
    )
    .with_origin_files(glob);

    workflow.run(Some("d"), &console).unwrap();

    let writes = destination.writes();
    assert_eq!(writes.len(), 1);
    // The migration target advances to the newest change that touches the
    // glob, not the raw resolved ref.
    assert_eq!(writes[0].current_rev, "c");
    assert_eq!(writes[0].current, ["c", "b"]);
}

#[test]
fn test_squash_without_history_still_detects_then_discards() {
    let destination = RecordingDestination::new();
    destination.set_previous_ref("a");
    let console = TestConsole::new();
    let options = WorkflowOptions {
        squash_without_history: true,
        ..WorkflowOptions::default()
    };
    let workflow = workflow(
        linear_origin(&["a", "b", "c"]),
        destination.clone(),
        WorkflowMode::Squash,
        options,
    );

    workflow.run(Some("c"), &console).unwrap();

    let writes = destination.writes();
    assert_eq!(writes.len(), 1);
    // Detection ran (current advanced to c), but the change list is hidden
    // from the writer.
    assert_eq!(writes[0].current_rev, "c");
    assert!(writes[0].current.is_empty());
}

#[test]
fn test_squash_rerun_without_new_changes_is_rejected() {
    let destination = RecordingDestination::new();
    let console = TestConsole::new();
    let workflow = workflow(
        linear_origin(&["a", "b", "c"]),
        destination.clone(),
        WorkflowMode::Squash,
        force_options(),
    );
    workflow.run(Some("c"), &console).unwrap();
    assert_eq!(destination.writes().len(), 1);

    // Second run: the destination now records c as imported, force is off.
    let workflow = workflow_with_same_ends(&destination);
    let err = workflow.run(Some("c"), &TestConsole::new()).unwrap_err();
    assert!(matches!(err, MigrateError::EmptyChange { .. }));
    assert!(err.to_string().contains("has been already migrated"));
    assert!(err.to_string().contains("--force"));
    assert_eq!(destination.writes().len(), 1);
}

fn workflow_with_same_ends(
    destination: &RecordingDestination,
) -> Workflow<DummyOrigin, RecordingDestination> {
    workflow(
        linear_origin(&["a", "b", "c"]),
        destination.clone(),
        WorkflowMode::Squash,
        WorkflowOptions::default(),
    )
}

#[test]
fn test_squash_already_migrated_with_force_proceeds() {
    let destination = RecordingDestination::new();
    destination.set_previous_ref("c");
    let console = TestConsole::new();
    let workflow = workflow(
        linear_origin(&["a", "b", "c"]),
        destination.clone(),
        WorkflowMode::Squash,
        force_options(),
    );

    workflow.run(Some("c"), &console).unwrap();
    assert_eq!(destination.writes().len(), 1);
    assert!(console.has_warning_containing("Migrating anyway"));
}

#[test]
fn test_squash_last_rev_not_an_ancestor() {
    let mut origin = linear_origin(&["a", "b", "c"]);
    origin.add_orphan_change("x", "unrelated branch\n", &["src/x.rs"]);
    let destination = RecordingDestination::new();
    destination.set_previous_ref("x");
    let console = TestConsole::new();
    let workflow = Workflow::new(
        "default",
        origin,
        destination.clone(),
        authoring(),
        WorkflowMode::Squash,
    );

    let err = workflow.run(Some("c"), &console).unwrap_err();
    assert!(matches!(err, MigrateError::Validation { .. }));
    assert!(err.to_string().contains("is not an ancestor"));
    assert!(destination.writes().is_empty());
}

#[test]
fn test_squash_last_rev_not_an_ancestor_with_force() {
    let mut origin = linear_origin(&["a", "b", "c"]);
    origin.add_orphan_change("x", "unrelated branch\n", &["src/x.rs"]);
    let destination = RecordingDestination::new();
    destination.set_previous_ref("x");
    let console = TestConsole::new();
    let workflow = Workflow::new(
        "default",
        origin,
        destination.clone(),
        authoring(),
        WorkflowMode::Squash,
    )
    .with_options(force_options());

    workflow.run(Some("c"), &console).unwrap();
    assert_eq!(destination.writes().len(), 1);
    assert_eq!(destination.writes()[0].current_rev, "c");
    assert!(console.has_warning_containing("is not an ancestor"));
}

#[test]
fn test_squash_with_history_less_origin_skips_detection() {
    let mut origin = DummyOrigin::new().without_history();
    origin.add_change("snap", "snapshot\n", &["src/a.rs"]);
    let destination = RecordingDestination::new();
    let console = TestConsole::new();
    let workflow = Workflow::new(
        "default",
        origin,
        destination.clone(),
        authoring(),
        WorkflowMode::Squash,
    );

    workflow.run(Some("snap"), &console).unwrap();

    let writes = destination.writes();
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0].current_rev, "snap");
    assert!(writes[0].current.is_empty());
}

#[test]
fn test_squash_per_changeset_glob_override() {
    let destination = RecordingDestination::new();
    destination.set_previous_ref("a");
    let console = TestConsole::new();
    let workflow = Workflow::new(
        "default",
        linear_origin(&["a", "b", "c"]),
        destination.clone(),
        authoring(),
        WorkflowMode::Squash,
    )
    .with_origin_files_for_changes(Box::new(
        |changes: &[Change<TestRevision>]| {
            // Configuration narrows the glob for the changeset containing b:
            // its file no longer counts as relevant.
            if changes.iter().any(|c| c.ref_as_string() == "b") {
                Some(FileGlob::new(&["src/c.rs".to_string()], &[]).unwrap())
            } else {
                None
            }
        },
    ));

    workflow.run(Some("c"), &console).unwrap();

    let writes = destination.writes();
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0].current, ["c"]);
    assert_eq!(writes[0].current_rev, "c");
}

// =============================================================================
// Last-revision state validation
// =============================================================================

#[test]
fn test_check_last_rev_state_mismatch_fails() {
    let destination = RecordingDestination::new();
    destination.set_previous_ref("a");
    destination.set_tree_digest("not-the-real-digest");
    let console = TestConsole::new();
    let options = WorkflowOptions {
        check_last_rev_state: true,
        ..WorkflowOptions::default()
    };
    let workflow = workflow(
        linear_origin(&["a", "b", "c"]),
        destination.clone(),
        WorkflowMode::Squash,
        options,
    );

    let err = workflow.run(Some("c"), &console).unwrap_err();
    assert!(matches!(err, MigrateError::Validation { .. }));
    assert!(err.to_string().contains("does not match"));
    assert!(destination.writes().is_empty());
}

#[test]
fn test_check_last_rev_state_matching_digest_passes() {
    use ferry_lib::origin::Origin as _;

    // Compute the digest the destination should report by checking out the
    // last imported revision the same way the engine does.
    let origin = linear_origin(&["a", "b", "c"]);
    let scratch = tempfile::tempdir().unwrap();
    let last_rev = origin.resolve(Some("a")).unwrap();
    origin.checkout(&last_rev, scratch.path()).unwrap();
    let digest = ferry_lib::tree::tree_digest(scratch.path()).unwrap();

    let destination = RecordingDestination::new();
    destination.set_previous_ref("a");
    destination.set_tree_digest(&digest);
    let console = TestConsole::new();
    let options = WorkflowOptions {
        check_last_rev_state: true,
        ..WorkflowOptions::default()
    };
    let workflow = workflow(origin, destination.clone(), WorkflowMode::Squash, options);

    workflow.run(Some("c"), &console).unwrap();
    assert_eq!(destination.writes().len(), 1);
}

#[test]
fn test_check_last_rev_state_mismatch_with_force_warns() {
    let destination = RecordingDestination::new();
    destination.set_previous_ref("a");
    destination.set_tree_digest("not-the-real-digest");
    let console = TestConsole::new();
    let options = WorkflowOptions {
        check_last_rev_state: true,
        force: true,
        ..WorkflowOptions::default()
    };
    let workflow = workflow(
        linear_origin(&["a", "b", "c"]),
        destination.clone(),
        WorkflowMode::Squash,
        options,
    );

    workflow.run(Some("c"), &console).unwrap();
    assert_eq!(destination.writes().len(), 1);
    assert!(console.has_warning_containing("does not match"));
}

// =============================================================================
// Iterative
// =============================================================================

#[test]
fn test_iterative_imports_each_change() {
    let destination = RecordingDestination::new();
    destination.set_previous_ref("a");
    let console = TestConsole::new();
    let workflow = workflow(
        linear_origin(&["a", "b", "c", "d"]),
        destination.clone(),
        WorkflowMode::Iterative,
        WorkflowOptions::default(),
    );

    workflow.run(Some("d"), &console).unwrap();

    let writes = destination.writes();
    assert_eq!(writes.len(), 3);
    let revs: Vec<_> = writes.iter().map(|w| w.current_rev.as_str()).collect();
    assert_eq!(revs, ["b", "c", "d"]);
    // Each commit carries the origin change's message and author.
    assert_eq!(writes[0].message, "change b\n");
    assert_eq!(writes[0].author, upstream_author());
    // Already-migrated context grows most-recent-first.
    assert!(writes[0].already_migrated.is_empty());
    assert_eq!(writes[1].already_migrated, ["b"]);
    assert_eq!(writes[2].already_migrated, ["c", "b"]);
    // Every change gets its own workflow identity.
    assert_ne!(writes[0].workflow_identity, writes[1].workflow_identity);
    assert_ne!(writes[1].workflow_identity, writes[2].workflow_identity);
}

#[test]
fn test_iterative_limit_truncates_run() {
    let destination = RecordingDestination::new();
    destination.set_previous_ref("a");
    let console = TestConsole::new();
    let options = WorkflowOptions {
        iterative_limit_changes: 3,
        ..WorkflowOptions::default()
    };
    let workflow = workflow(
        linear_origin(&["a", "b", "c", "d", "e", "f"]),
        destination.clone(),
        WorkflowMode::Iterative,
        options,
    );

    workflow.run(Some("f"), &console).unwrap();

    let writes = destination.writes();
    assert_eq!(writes.len(), 3);
    let revs: Vec<_> = writes.iter().map(|w| w.current_rev.as_str()).collect();
    assert_eq!(revs, ["b", "c", "d"]);
    assert!(
        console
            .infos()
            .iter()
            .any(|m| m.contains("Importing first 3 change(s) out of 5"))
    );
    // The destination's last imported revision is the third change.
    assert_eq!(destination.previous_ref().as_deref(), Some("d"));
}

#[test]
fn test_iterative_empty_change_mid_run_continues() {
    let destination = RecordingDestination::new();
    destination.set_previous_ref("a");
    destination.fail_with_empty_change("c");
    let console = TestConsole::new();
    let workflow = workflow(
        linear_origin(&["a", "b", "c", "d", "e"]),
        destination.clone(),
        WorkflowMode::Iterative,
        WorkflowOptions::default(),
    );

    workflow.run(Some("e"), &console).unwrap();

    let writes = destination.writes();
    let revs: Vec<_> = writes.iter().map(|w| w.current_rev.as_str()).collect();
    assert_eq!(revs, ["b", "d", "e"]);
    assert!(console.has_warning_containing("resulted in an empty change"));
    // The empty change still enters the already-migrated context.
    assert_eq!(writes[1].already_migrated, ["c", "b"]);
    assert_eq!(writes[2].already_migrated, ["d", "c", "b"]);
}

#[test]
fn test_iterative_without_new_changes_fails() {
    let destination = RecordingDestination::new();
    destination.set_previous_ref("c");
    let console = TestConsole::new();
    let workflow = workflow(
        linear_origin(&["a", "b", "c"]),
        destination.clone(),
        WorkflowMode::Iterative,
        WorkflowOptions::default(),
    );

    let err = workflow.run(Some("c"), &console).unwrap_err();
    assert!(matches!(err, MigrateError::EmptyChange { .. }));
    assert!(err.to_string().contains("No new changes to import"));
}

#[test]
fn test_iterative_all_changes_outside_glob_fails() {
    let mut origin = DummyOrigin::new();
    origin.add_change("a", "base\n", &["src/a.rs"]);
    origin.add_change("b", "docs\n", &["docs/b.md"]);
    origin.add_change("c", "more docs\n", &["docs/c.md"]);
    let destination = RecordingDestination::new();
    destination.set_previous_ref("a");
    let console = TestConsole::new();
    let glob = FileGlob::new(&["src/**".to_string()], &[]).unwrap();
    let workflow = Workflow::new(
        "default",
        origin,
        destination.clone(),
        authoring(),
        WorkflowMode::Iterative,
    )
    .with_origin_files(glob);

    let err = workflow.run(Some("c"), &console).unwrap_err();
    assert!(matches!(err, MigrateError::EmptyChange { .. }));
    assert!(err.to_string().contains("produced no changes"));
    assert!(destination.writes().is_empty());
}

#[test]
fn test_iterative_prompt_declined_rejects_run() {
    let destination = RecordingDestination::new();
    destination.set_previous_ref("a");
    destination.enqueue_result(WriterResult::PromptToContinue);
    let console = TestConsole::new();
    console.answer_prompt(false);
    let workflow = workflow(
        linear_origin(&["a", "b", "c", "d"]),
        destination.clone(),
        WorkflowMode::Iterative,
        WorkflowOptions::default(),
    );

    let err = workflow.run(Some("d"), &console).unwrap_err();
    assert!(matches!(err, MigrateError::ChangeRejected { .. }));
    assert_eq!(destination.writes().len(), 1);
    assert!(console.has_warning_containing("aborted by user after: Change 1 of 3 (b)"));
}

#[test]
fn test_iterative_prompt_accepted_continues() {
    let destination = RecordingDestination::new();
    destination.set_previous_ref("a");
    destination.enqueue_result(WriterResult::PromptToContinue);
    let console = TestConsole::new();
    console.answer_prompt(true);
    let workflow = workflow(
        linear_origin(&["a", "b", "c"]),
        destination.clone(),
        WorkflowMode::Iterative,
        WorkflowOptions::default(),
    );

    workflow.run(Some("c"), &console).unwrap();
    assert_eq!(destination.writes().len(), 2);
}

#[test]
fn test_iterative_skipped_change_leaves_display_gap() {
    // b touches nothing inside the glob, so it is skipped without advancing
    // the display counter: c is announced as change 1.
    let mut origin = DummyOrigin::new();
    origin.add_change("a", "base\n", &["src/a.rs"]);
    origin.add_change("b", "docs\n", &["docs/b.md"]);
    origin.add_change("c", "code\n", &["src/c.rs"]);
    origin.add_change("d", "more code\n", &["src/d.rs"]);
    let destination = RecordingDestination::new();
    destination.set_previous_ref("a");
    destination.enqueue_result(WriterResult::PromptToContinue);
    let console = TestConsole::new();
    console.answer_prompt(false);
    let glob = FileGlob::new(&["src/**".to_string()], &[]).unwrap();
    let workflow = Workflow::new(
        "default",
        origin,
        destination.clone(),
        authoring(),
        WorkflowMode::Iterative,
    )
    .with_origin_files(glob);

    let err = workflow.run(Some("d"), &console).unwrap_err();
    assert!(matches!(err, MigrateError::ChangeRejected { .. }));
    assert!(console.has_warning_containing("after: Change 1 of 3 (c)"));
}

#[test]
fn test_iterative_unknown_last_rev_with_force_imports_all() {
    let destination = RecordingDestination::new();
    let console = TestConsole::new();
    let workflow = workflow(
        linear_origin(&["a", "b", "c"]),
        destination.clone(),
        WorkflowMode::Iterative,
        force_options(),
    );

    workflow.run(Some("c"), &console).unwrap();

    let revs: Vec<_> = destination
        .writes()
        .iter()
        .map(|w| w.current_rev.clone())
        .collect();
    assert_eq!(revs, ["a", "b", "c"]);
    assert!(console.has_warning_containing("Cannot find last imported revision"));
}

#[test]
fn test_iterative_unknown_last_rev_without_force_fails() {
    let destination = RecordingDestination::new();
    let console = TestConsole::new();
    let workflow = workflow(
        linear_origin(&["a", "b", "c"]),
        destination.clone(),
        WorkflowMode::Iterative,
        WorkflowOptions::default(),
    );

    let err = workflow.run(Some("c"), &console).unwrap_err();
    assert!(matches!(err, MigrateError::Validation { .. }));
    assert!(err.to_string().contains("Cannot find last imported revision"));
}

// =============================================================================
// Change request
// =============================================================================

#[test]
fn test_change_request_with_explicit_baseline() {
    let destination = RecordingDestination::new();
    let console = TestConsole::new();
    let options = WorkflowOptions {
        change_baseline: Some("custom-parent".to_string()),
        ..WorkflowOptions::default()
    };
    let workflow = workflow(
        linear_origin(&["a", "b", "c"]),
        destination.clone(),
        WorkflowMode::ChangeRequest,
        options,
    );

    workflow.run(Some("c"), &console).unwrap();

    let writes = destination.writes();
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0].baseline.as_deref(), Some("custom-parent"));
    assert_eq!(writes[0].current_rev, "c");
    assert_eq!(writes[0].current, ["c"]);
    assert_eq!(writes[0].message, "change c\n");
    assert_eq!(writes[0].author, upstream_author());
}

#[test]
fn test_change_request_discovers_baseline_from_labels() {
    let mut origin = DummyOrigin::new();
    origin.add_change_with(
        "a",
        "imported\n\nTest-RevId: d1\n",
        &["src/a.rs"],
        &[("Test-RevId", "d1")],
        upstream_author(),
    );
    origin.add_change("b", "local work\n", &["src/b.rs"]);
    origin.add_change("c", "the request\n", &["src/c.rs"]);
    let destination = RecordingDestination::new();
    let console = TestConsole::new();
    let workflow = Workflow::new(
        "default",
        origin,
        destination.clone(),
        authoring(),
        WorkflowMode::ChangeRequest,
    );

    workflow.run(Some("c"), &console).unwrap();

    let writes = destination.writes();
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0].baseline.as_deref(), Some("d1"));
    assert_eq!(writes[0].message, "the request\n");
}

#[test]
fn test_change_request_uses_nearest_labelled_ancestor() {
    let mut origin = DummyOrigin::new();
    origin.add_change_with(
        "a",
        "old import\n",
        &["src/a.rs"],
        &[("Test-RevId", "d1")],
        upstream_author(),
    );
    origin.add_change_with(
        "b",
        "newer import\n",
        &["src/b.rs"],
        &[("Test-RevId", "d2")],
        upstream_author(),
    );
    origin.add_change("c", "the request\n", &["src/c.rs"]);
    let destination = RecordingDestination::new();
    let console = TestConsole::new();
    let workflow = Workflow::new(
        "default",
        origin,
        destination.clone(),
        authoring(),
        WorkflowMode::ChangeRequest,
    );

    workflow.run(Some("c"), &console).unwrap();
    assert_eq!(destination.writes()[0].baseline.as_deref(), Some("d2"));
}

#[test]
fn test_change_request_ignores_label_on_resolved_ref() {
    let mut origin = DummyOrigin::new();
    origin.add_change_with(
        "a",
        "import\n",
        &["src/a.rs"],
        &[("Test-RevId", "d1")],
        upstream_author(),
    );
    origin.add_change_with(
        "c",
        "the request itself carries a label\n",
        &["src/c.rs"],
        &[("Test-RevId", "d9")],
        upstream_author(),
    );
    let destination = RecordingDestination::new();
    let console = TestConsole::new();
    let workflow = Workflow::new(
        "default",
        origin,
        destination.clone(),
        authoring(),
        WorkflowMode::ChangeRequest,
    );

    workflow.run(Some("c"), &console).unwrap();
    assert_eq!(destination.writes()[0].baseline.as_deref(), Some("d1"));
}

#[test]
fn test_change_request_without_baseline_names_the_flag() {
    let destination = RecordingDestination::new();
    let console = TestConsole::new();
    let workflow = workflow(
        linear_origin(&["a", "b", "c"]),
        destination.clone(),
        WorkflowMode::ChangeRequest,
        WorkflowOptions::default(),
    );

    let err = workflow.run(Some("c"), &console).unwrap_err();
    assert!(matches!(err, MigrateError::Validation { .. }));
    assert!(err.to_string().contains("--change-request-parent"));
    assert!(destination.writes().is_empty());
}

#[test]
fn test_change_request_requires_history_destination() {
    let destination = RecordingDestination::without_previous_ref();
    let console = TestConsole::new();
    let workflow = workflow(
        linear_origin(&["a", "b", "c"]),
        destination.clone(),
        WorkflowMode::ChangeRequest,
        WorkflowOptions::default(),
    );

    let err = workflow.run(Some("c"), &console).unwrap_err();
    assert!(matches!(err, MigrateError::Validation { .. }));
    assert!(
        err.to_string()
            .contains("incompatible with destinations that don't support history")
    );
}

// =============================================================================
// Cross-cutting
// =============================================================================

#[test]
fn test_cancelled_signal_stops_the_run() {
    let destination = RecordingDestination::new();
    destination.set_previous_ref("a");
    let console = TestConsole::new();
    let cancel = CancellationSignal::new();
    cancel.cancel();
    let workflow = workflow(
        linear_origin(&["a", "b", "c"]),
        destination.clone(),
        WorkflowMode::Iterative,
        WorkflowOptions::default(),
    )
    .with_cancellation(cancel);

    let err = workflow.run(Some("c"), &console).unwrap_err();
    assert!(matches!(err, MigrateError::Cancelled));
    assert!(destination.writes().is_empty());
}

#[test]
fn test_workflow_identity_is_stable_across_runs() {
    let destination = RecordingDestination::new();
    let console = TestConsole::new();
    let first = workflow(
        linear_origin(&["a", "b", "c"]),
        destination.clone(),
        WorkflowMode::Squash,
        force_options(),
    );
    first.run(Some("c"), &console).unwrap();

    let second = workflow(
        linear_origin(&["a", "b", "c"]),
        destination.clone(),
        WorkflowMode::Squash,
        force_options(),
    );
    second.run(Some("c"), &TestConsole::new()).unwrap();

    let writes = destination.writes();
    assert_eq!(writes.len(), 2);
    assert_eq!(writes[0].workflow_identity, writes[1].workflow_identity);
}
