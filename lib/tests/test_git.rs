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

//! Tests for the git endpoints against real scratch repositories.

use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::process::Command;

use ferry_lib::authoring::Author;
use ferry_lib::authoring::Authoring;
use ferry_lib::change::Revision as _;
use ferry_lib::error::MigrateError;
use ferry_lib::git::GitDestination;
use ferry_lib::git::GitOrigin;
use ferry_lib::origin::ChangesResponse;
use ferry_lib::origin::EmptyReason;
use ferry_lib::origin::Origin as _;
use ferry_lib::origin::VisitResult;
use ferry_lib::workflow::Workflow;
use ferry_lib::workflow::WorkflowMode;
use ferry_lib::workflow::WorkflowOptions;
use testutils::TestConsole;
use testutils::default_author;

/// Runs git in `dir`, panicking on failure (test scaffolding only).
fn git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .arg("-C")
        .arg(dir)
        .args([
            "-c",
            "user.name=Test User",
            "-c",
            "user.email=test@example.com",
        ])
        .args(args)
        .output()
        .expect("git must be runnable in tests");
    assert!(
        output.status.success(),
        "git {args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn init_repo(dir: &Path) {
    git(dir, &["init", "--quiet"]);
    git(dir, &["symbolic-ref", "HEAD", "refs/heads/main"]);
}

fn commit_file(dir: &Path, name: &str, contents: &str, message: &str) -> String {
    let path = dir.join(name);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
    git(dir, &["add", "-A"]);
    git(dir, &["commit", "--quiet", "-m", message]);
    git(dir, &["rev-parse", "HEAD"]).trim().to_string()
}

struct TestSetup {
    temp: tempfile::TempDir,
    origin_dir: PathBuf,
    cache_root: PathBuf,
}

impl TestSetup {
    fn new() -> Self {
        let temp = tempfile::tempdir().unwrap();
        let origin_dir = temp.path().join("origin");
        let cache_root = temp.path().join("cache");
        fs::create_dir_all(&origin_dir).unwrap();
        fs::create_dir_all(&cache_root).unwrap();
        init_repo(&origin_dir);
        Self {
            temp,
            origin_dir,
            cache_root,
        }
    }

    fn origin(&self) -> GitOrigin {
        GitOrigin::new(
            self.origin_dir.display().to_string(),
            "main",
            &self.cache_root,
        )
    }
}

#[test]
fn test_resolve_default_ref() {
    let setup = TestSetup::new();
    commit_file(&setup.origin_dir, "a.txt", "one", "first");
    let head = commit_file(&setup.origin_dir, "b.txt", "two", "second");

    let origin = setup.origin();
    let revision = origin.resolve(None).unwrap();
    assert_eq!(revision.as_string(), head);
}

#[test]
fn test_resolve_unknown_ref_fails() {
    let setup = TestSetup::new();
    commit_file(&setup.origin_dir, "a.txt", "one", "first");

    let origin = setup.origin();
    let err = origin.resolve(Some("no-such-branch")).unwrap_err();
    assert!(matches!(err, MigrateError::CannotResolveRevision { .. }));
}

#[test]
fn test_changes_enumerates_range_oldest_first() {
    let setup = TestSetup::new();
    let first = commit_file(&setup.origin_dir, "a.txt", "one", "first");
    commit_file(&setup.origin_dir, "b.txt", "two", "second");
    commit_file(&setup.origin_dir, "c.txt", "three", "third");

    let origin = setup.origin();
    let head = origin.resolve(None).unwrap();
    let from = origin.resolve(Some(first.as_str())).unwrap();

    let response = origin.changes(Some(&from), &head).unwrap();
    let ChangesResponse::Changes(graph) = response else {
        panic!("expected changes");
    };
    let changes = graph.linearize();
    assert_eq!(changes.len(), 2);
    assert_eq!(changes[0].first_line(), "second");
    assert_eq!(changes[1].first_line(), "third");
    assert_eq!(changes[0].files(), ["b.txt"]);
}

#[test]
fn test_changes_full_history_when_from_is_unknown() {
    let setup = TestSetup::new();
    commit_file(&setup.origin_dir, "a.txt", "one", "first");
    commit_file(&setup.origin_dir, "b.txt", "two", "second");

    let origin = setup.origin();
    let head = origin.resolve(None).unwrap();
    let response = origin.changes(None, &head).unwrap();
    let ChangesResponse::Changes(graph) = response else {
        panic!("expected changes");
    };
    assert_eq!(graph.len(), 2);
}

#[test]
fn test_changes_unrelated_revisions() {
    let setup = TestSetup::new();
    commit_file(&setup.origin_dir, "a.txt", "one", "first");
    // A second root with no shared history.
    git(&setup.origin_dir, &["checkout", "--quiet", "--orphan", "other"]);
    commit_file(&setup.origin_dir, "o.txt", "orphan", "orphan root");
    git(&setup.origin_dir, &["checkout", "--quiet", "main"]);

    let origin = setup.origin();
    let head = origin.resolve(None).unwrap();
    let from = origin.resolve(Some("other")).unwrap();

    let response = origin.changes(Some(&from), &head).unwrap();
    assert!(matches!(
        response,
        ChangesResponse::NoChanges(EmptyReason::UnrelatedRevisions)
    ));
}

#[test]
fn test_changes_outside_path_roots() {
    let setup = TestSetup::new();
    let first = commit_file(&setup.origin_dir, "src/a.rs", "one", "code");
    commit_file(&setup.origin_dir, "docs/b.md", "two", "docs only");

    let origin = setup.origin().with_path_roots(vec!["src".to_string()]);
    let head = origin.resolve(None).unwrap();
    let from = origin.resolve(Some(first.as_str())).unwrap();

    let response = origin.changes(Some(&from), &head).unwrap();
    assert!(matches!(
        response,
        ChangesResponse::NoChanges(EmptyReason::ToFilesExcluded)
    ));
}

#[test]
fn test_checkout_materialises_tree() {
    let setup = TestSetup::new();
    commit_file(&setup.origin_dir, "a.txt", "one", "first");
    commit_file(&setup.origin_dir, "sub/b.txt", "two", "second");

    let origin = setup.origin();
    let head = origin.resolve(None).unwrap();
    let work_dir = tempfile::tempdir().unwrap();
    origin.checkout(&head, work_dir.path()).unwrap();

    assert_eq!(
        fs::read_to_string(work_dir.path().join("a.txt")).unwrap(),
        "one"
    );
    assert_eq!(
        fs::read_to_string(work_dir.path().join("sub/b.txt")).unwrap(),
        "two"
    );
}

#[test]
fn test_change_reads_labels_from_trailers() {
    let setup = TestSetup::new();
    commit_file(
        &setup.origin_dir,
        "a.txt",
        "one",
        "import something\n\nGitOrigin-RevId: deadbeef1234\n",
    );

    let origin = setup.origin();
    let head = origin.resolve(None).unwrap();
    let change = origin.change(&head).unwrap();
    assert_eq!(change.labels().get("GitOrigin-RevId"), Some("deadbeef1234"));
    assert_eq!(change.author().email(), "test@example.com");
}

#[test]
fn test_visit_changes_walks_newest_first_and_terminates() {
    let setup = TestSetup::new();
    commit_file(&setup.origin_dir, "a.txt", "one", "first");
    commit_file(&setup.origin_dir, "b.txt", "two", "second");
    commit_file(&setup.origin_dir, "c.txt", "three", "third");

    let origin = setup.origin();
    let head = origin.resolve(None).unwrap();
    let mut visited = Vec::new();
    origin
        .visit_changes(&head, &mut |change| {
            visited.push(change.first_line().to_string());
            if visited.len() == 2 {
                VisitResult::Terminate
            } else {
                VisitResult::Continue
            }
        })
        .unwrap();
    assert_eq!(visited, ["third", "second"]);
}

// =============================================================================
// End to end against a bare destination
// =============================================================================

#[test]
fn test_squash_migration_end_to_end() {
    let setup = TestSetup::new();
    commit_file(&setup.origin_dir, "src/a.rs", "fn a() {}", "add a");
    let head = commit_file(&setup.origin_dir, "src/b.rs", "fn b() {}", "add b");

    let dest_dir = setup.temp.path().join("destination.git");
    git(setup.temp.path(), &["init", "--quiet", "--bare", "destination.git"]);

    let destination = GitDestination::new(
        dest_dir.display().to_string(),
        "main",
        setup.cache_root.join("dest-cache"),
    );
    let workflow = Workflow::new(
        "e2e",
        setup.origin(),
        destination,
        Authoring::new(
            default_author(),
            ferry_lib::authoring::AuthoringMode::PassThru,
        ),
        WorkflowMode::Squash,
    )
    .with_options(WorkflowOptions {
        force: true,
        ..WorkflowOptions::default()
    });

    let console = TestConsole::new();
    workflow.run(None, &console).unwrap();

    // The destination branch exists and records the origin revision.
    let message = git(&dest_dir, &["log", "-1", "--format=%B", "main"]);
    assert!(message.contains("Project import generated by Ferry."));
    assert!(message.contains(&format!("GitOrigin-RevId: {head}")));
    let count = git(&dest_dir, &["rev-list", "--count", "main"]);
    assert_eq!(count.trim(), "1");

    // Re-running without force detects the import and refuses.
    let destination = GitDestination::new(
        dest_dir.display().to_string(),
        "main",
        setup.cache_root.join("dest-cache"),
    );
    let second = Workflow::new(
        "e2e",
        setup.origin(),
        destination,
        Authoring::new(
            default_author(),
            ferry_lib::authoring::AuthoringMode::PassThru,
        ),
        WorkflowMode::Squash,
    );
    let err = second.run(None, &TestConsole::new()).unwrap_err();
    assert!(matches!(err, MigrateError::EmptyChange { .. }));
    assert!(err.to_string().contains("has been already migrated"));
}

#[test]
fn test_iterative_migration_end_to_end() {
    let setup = TestSetup::new();
    commit_file(&setup.origin_dir, "a.txt", "one", "first change");
    commit_file(&setup.origin_dir, "b.txt", "two", "second change");
    commit_file(&setup.origin_dir, "c.txt", "three", "third change");

    let dest_dir = setup.temp.path().join("destination.git");
    git(setup.temp.path(), &["init", "--quiet", "--bare", "destination.git"]);

    let make_workflow = |force: bool| {
        Workflow::new(
            "e2e-iterative",
            setup.origin(),
            GitDestination::new(
                dest_dir.display().to_string(),
                "main",
                setup.cache_root.join("dest-cache"),
            ),
            Authoring::pass_thru(default_author()),
            WorkflowMode::Iterative,
        )
        .with_options(WorkflowOptions {
            force,
            ..WorkflowOptions::default()
        })
    };

    make_workflow(true).run(None, &TestConsole::new()).unwrap();

    let count = git(&dest_dir, &["rev-list", "--count", "main"]);
    assert_eq!(count.trim(), "3");
    let subjects = git(&dest_dir, &["log", "--format=%s", "main"]);
    let subjects: Vec<&str> = subjects.lines().collect();
    assert_eq!(subjects, ["third change", "second change", "first change"]);
    let author = git(&dest_dir, &["log", "-1", "--format=%an <%ae>", "main"]);
    assert_eq!(author.trim(), "Test User <test@example.com>");

    // Steady state: no new origin changes, so the next run is a no-op error.
    let err = make_workflow(false)
        .run(None, &TestConsole::new())
        .unwrap_err();
    assert!(matches!(err, MigrateError::EmptyChange { .. }));
    assert!(err.to_string().contains("No new changes to import"));
}

#[test]
fn test_iterative_picks_up_where_it_left_off() {
    let setup = TestSetup::new();
    commit_file(&setup.origin_dir, "a.txt", "one", "first change");

    let dest_dir = setup.temp.path().join("destination.git");
    git(setup.temp.path(), &["init", "--quiet", "--bare", "destination.git"]);

    let make_workflow = |force: bool| {
        Workflow::new(
            "e2e-resume",
            setup.origin(),
            GitDestination::new(
                dest_dir.display().to_string(),
                "main",
                setup.cache_root.join("dest-cache"),
            ),
            Authoring::pass_thru(Author::new("Bot", "bot@example.com")),
            WorkflowMode::Iterative,
        )
        .with_options(WorkflowOptions {
            force,
            ..WorkflowOptions::default()
        })
    };

    make_workflow(true).run(None, &TestConsole::new()).unwrap();
    assert_eq!(git(&dest_dir, &["rev-list", "--count", "main"]).trim(), "1");

    // New origin work lands; the next run imports only the delta, found via
    // the trailer on the destination's head commit.
    commit_file(&setup.origin_dir, "b.txt", "two", "second change");
    make_workflow(false).run(None, &TestConsole::new()).unwrap();

    assert_eq!(git(&dest_dir, &["rev-list", "--count", "main"]).trim(), "2");
    let subject = git(&dest_dir, &["log", "-1", "--format=%s", "main"]);
    assert_eq!(subject.trim(), "second change");
}
