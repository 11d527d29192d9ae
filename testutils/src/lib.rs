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

//! Test doubles for the Ferry engine.
//!
//! - [`DummyOrigin`] - a scripted linear history with labels and file lists;
//! - [`RecordingDestination`] - captures every write, with scripted results
//!   and failures;
//! - [`TestConsole`] - captures messages and answers prompts from a script.

use std::collections::HashSet;
use std::collections::VecDeque;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex;

use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;

use ferry_lib::authoring::Author;
use ferry_lib::change::Change;
use ferry_lib::change::LabelSet;
use ferry_lib::change::Revision;
use ferry_lib::console::Console;
use ferry_lib::destination::Destination;
use ferry_lib::destination::DestinationWriter;
use ferry_lib::destination::WriteRequest;
use ferry_lib::destination::WriterResult;
use ferry_lib::error::MigrateError;
use ferry_lib::error::MigrateResult;
use ferry_lib::graph::ChangeGraphBuilder;
use ferry_lib::origin::ChangesResponse;
use ferry_lib::origin::ChangesVisitor;
use ferry_lib::origin::EmptyReason;
use ferry_lib::origin::Origin;
use ferry_lib::origin::VisitResult;

/// A revision identified by its scripted name.
#[derive(Clone, Debug)]
pub struct TestRevision(pub String);

impl Revision for TestRevision {
    fn as_string(&self) -> String {
        self.0.clone()
    }
}

/// The default upstream author of scripted changes.
pub fn upstream_author() -> Author {
    Author::new("Up Stream", "upstream@example.com")
}

/// The default author used by test authoring policies.
pub fn default_author() -> Author {
    Author::new("Migration Bot", "bot@example.com")
}

/// An in-memory origin with a scripted linear history, oldest first.
pub struct DummyOrigin {
    changes: Vec<Change<TestRevision>>,
    orphans: Vec<Change<TestRevision>>,
    supports_history: bool,
}

impl DummyOrigin {
    /// Creates an origin with no changes yet.
    pub fn new() -> Self {
        Self {
            changes: Vec::new(),
            orphans: Vec::new(),
            supports_history: true,
        }
    }

    /// Marks the origin history-less (folder-snapshot style).
    pub fn without_history(mut self) -> Self {
        self.supports_history = false;
        self
    }

    /// Appends a change to the history. Later calls are newer.
    pub fn add_change(&mut self, rev: &str, message: &str, files: &[&str]) -> &mut Self {
        self.add_change_with(rev, message, files, &[], upstream_author())
    }

    /// Appends a change with explicit labels and author.
    pub fn add_change_with(
        &mut self,
        rev: &str,
        message: &str,
        files: &[&str],
        labels: &[(&str, &str)],
        author: Author,
    ) -> &mut Self {
        let mut label_set = LabelSet::new();
        for (key, value) in labels {
            label_set.add(*key, *value);
        }
        let timestamp = base_timestamp() + Duration::hours(self.changes.len() as i64);
        self.changes.push(Change::new(
            TestRevision(rev.to_string()),
            author,
            message,
            timestamp,
            label_set,
            files.iter().map(|f| f.to_string()).collect(),
        ));
        self
    }

    /// Appends a change on an unrelated branch: resolvable, but sharing no
    /// history with the main line.
    pub fn add_orphan_change(&mut self, rev: &str, message: &str, files: &[&str]) -> &mut Self {
        self.orphans.push(Change::new(
            TestRevision(rev.to_string()),
            upstream_author(),
            message,
            base_timestamp(),
            LabelSet::new(),
            files.iter().map(|f| f.to_string()).collect(),
        ));
        self
    }

    fn position(&self, rev: &str) -> Option<usize> {
        self.changes.iter().position(|c| c.ref_as_string() == rev)
    }

    fn orphan(&self, rev: &str) -> Option<&Change<TestRevision>> {
        self.orphans.iter().find(|c| c.ref_as_string() == rev)
    }

    fn linear_graph(&self, changes: &[Change<TestRevision>]) -> ChangesResponse<TestRevision> {
        let mut builder = ChangeGraphBuilder::new();
        for change in changes {
            builder.add_change(change.clone());
        }
        for pair in changes.windows(2) {
            builder.add_parent(pair[1].revision(), pair[0].revision());
        }
        ChangesResponse::for_changes(builder.build())
    }
}

impl Default for DummyOrigin {
    fn default() -> Self {
        Self::new()
    }
}

impl Origin for DummyOrigin {
    type Rev = TestRevision;

    fn resolve(&self, reference: Option<&str>) -> MigrateResult<TestRevision> {
        match reference.filter(|r| !r.is_empty()) {
            None => self
                .changes
                .last()
                .map(|c| c.revision().clone())
                .ok_or_else(|| MigrateError::cannot_resolve("origin has no changes")),
            Some(reference) => match self.position(reference) {
                Some(idx) => Ok(self.changes[idx].revision().clone()),
                None => match self.orphan(reference) {
                    Some(change) => Ok(change.revision().clone()),
                    None => Err(MigrateError::cannot_resolve(format!(
                        "'{reference}' not found in the dummy origin"
                    ))),
                },
            },
        }
    }

    fn checkout(&self, revision: &TestRevision, work_dir: &Path) -> MigrateResult<()> {
        if let Some(change) = self.orphan(&revision.as_string()) {
            for file in change.files() {
                let path = work_dir.join(file);
                if let Some(parent) = path.parent() {
                    fs::create_dir_all(parent)
                        .map_err(|e| MigrateError::repo_with("cannot create tree", e))?;
                }
                fs::write(&path, change.ref_as_string())
                    .map_err(|e| MigrateError::repo_with("cannot write tree", e))?;
            }
            return Ok(());
        }
        let Some(idx) = self.position(&revision.as_string()) else {
            return Err(MigrateError::cannot_resolve(format!(
                "'{}' not found in the dummy origin",
                revision.as_string()
            )));
        };
        // The tree at a revision: every file any ancestor touched, with the
        // content naming the last change that touched it.
        for change in &self.changes[..=idx] {
            for file in change.files() {
                let path = work_dir.join(file);
                if let Some(parent) = path.parent() {
                    fs::create_dir_all(parent)
                        .map_err(|e| MigrateError::repo_with("cannot create tree", e))?;
                }
                fs::write(&path, change.ref_as_string())
                    .map_err(|e| MigrateError::repo_with("cannot write tree", e))?;
            }
        }
        Ok(())
    }

    fn changes(
        &self,
        from: Option<&TestRevision>,
        to: &TestRevision,
    ) -> MigrateResult<ChangesResponse<TestRevision>> {
        if self.orphan(&to.as_string()).is_some()
            || from.is_some_and(|f| self.orphan(&f.as_string()).is_some())
        {
            return Ok(ChangesResponse::no_changes(EmptyReason::UnrelatedRevisions));
        }
        let Some(to_idx) = self.position(&to.as_string()) else {
            return Ok(ChangesResponse::no_changes(EmptyReason::NoChanges));
        };
        let start = match from {
            None => 0,
            Some(from) => match self.position(&from.as_string()) {
                // Half-open range: the from revision itself is excluded.
                Some(from_idx) if from_idx <= to_idx => from_idx + 1,
                // from is newer than to: nothing in between.
                Some(_) => return Ok(ChangesResponse::no_changes(EmptyReason::NoChanges)),
                None => {
                    return Ok(ChangesResponse::no_changes(EmptyReason::UnrelatedRevisions));
                }
            },
        };
        Ok(self.linear_graph(&self.changes[start..=to_idx]))
    }

    fn change(&self, revision: &TestRevision) -> MigrateResult<Change<TestRevision>> {
        match self.position(&revision.as_string()) {
            Some(idx) => Ok(self.changes[idx].clone()),
            None => match self.orphan(&revision.as_string()) {
                Some(change) => Ok(change.clone()),
                None => Err(MigrateError::empty_change(format!(
                    "{} reference cannot be found",
                    revision.as_string()
                ))),
            },
        }
    }

    fn visit_changes(
        &self,
        start: &TestRevision,
        visitor: &mut ChangesVisitor<'_, TestRevision>,
    ) -> MigrateResult<()> {
        if let Some(change) = self.orphan(&start.as_string()) {
            visitor(change);
            return Ok(());
        }
        let Some(start_idx) = self.position(&start.as_string()) else {
            return Err(MigrateError::cannot_resolve(format!(
                "'{}' not found in the dummy origin",
                start.as_string()
            )));
        };
        for change in self.changes[..=start_idx].iter().rev() {
            if visitor(change) == VisitResult::Terminate {
                break;
            }
        }
        Ok(())
    }

    fn supports_history(&self) -> bool {
        self.supports_history
    }

    fn label_name(&self) -> String {
        "DummyOrigin-RevId".to_string()
    }
}

/// One write captured by [`RecordingDestination`].
#[derive(Clone, Debug)]
pub struct RecordedWrite {
    /// Canonical form of the revision being migrated.
    pub current_rev: String,
    /// Message stamped on the commit.
    pub message: String,
    /// Author stamped on the commit.
    pub author: Author,
    /// Revisions of `ComputedChanges::current`, in order.
    pub current: Vec<String>,
    /// Revisions of `ComputedChanges::already_migrated`, in order.
    pub already_migrated: Vec<String>,
    /// The destination baseline, for change-request writes.
    pub baseline: Option<String>,
    /// The workflow identity fingerprint.
    pub workflow_identity: String,
    /// Sorted relative paths of the written tree.
    pub tree_files: Vec<String>,
}

#[derive(Default)]
struct RecordingState {
    writes: Vec<RecordedWrite>,
    previous_ref: Option<String>,
    results: VecDeque<WriterResult>,
    empty_change_revs: HashSet<String>,
    tree_digest: Option<String>,
}

/// A destination that records every write. Cloning shares the recording, so
/// tests keep a handle while the workflow owns the other.
#[derive(Clone)]
pub struct RecordingDestination {
    state: Arc<Mutex<RecordingState>>,
    supports_previous_ref: bool,
}

impl RecordingDestination {
    /// A recording destination that supports previous-ref discovery.
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(RecordingState::default())),
            supports_previous_ref: true,
        }
    }

    /// A folder-style destination without previous-ref support.
    pub fn without_previous_ref() -> Self {
        Self {
            supports_previous_ref: false,
            ..Self::new()
        }
    }

    fn state(&self) -> std::sync::MutexGuard<'_, RecordingState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Scripts the last imported revision the destination reports.
    pub fn set_previous_ref(&self, rev: &str) {
        self.state().previous_ref = Some(rev.to_string());
    }

    /// The current last-imported revision (scripted or from writes).
    pub fn previous_ref(&self) -> Option<String> {
        self.state().previous_ref.clone()
    }

    /// Queues a result for the next write; defaults to [`WriterResult::Ok`].
    pub fn enqueue_result(&self, result: WriterResult) {
        self.state().results.push_back(result);
    }

    /// Makes writes of `rev` fail with `EmptyChange`, simulating a change
    /// that transforms to nothing.
    pub fn fail_with_empty_change(&self, rev: &str) {
        self.state().empty_change_revs.insert(rev.to_string());
    }

    /// Scripts the tree digest reported for last-rev state validation.
    pub fn set_tree_digest(&self, digest: &str) {
        self.state().tree_digest = Some(digest.to_string());
    }

    /// Everything written so far.
    pub fn writes(&self) -> Vec<RecordedWrite> {
        self.state().writes.clone()
    }
}

impl Default for RecordingDestination {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Revision> Destination<R> for RecordingDestination {
    fn supports_previous_ref(&self) -> bool {
        self.supports_previous_ref
    }

    fn label_name_when_origin(&self) -> MigrateResult<String> {
        if self.supports_previous_ref {
            Ok("Test-RevId".to_string())
        } else {
            Err(MigrateError::validation(
                "this destination cannot act as the origin of another migration",
            ))
        }
    }

    fn writer(&self) -> MigrateResult<Box<dyn DestinationWriter<R>>> {
        Ok(Box::new(self.clone()))
    }
}

impl<R: Revision> DestinationWriter<R> for RecordingDestination {
    fn previous_ref(&self, _label_name: &str) -> MigrateResult<Option<String>> {
        Ok(self.state().previous_ref.clone())
    }

    fn write(
        &mut self,
        request: WriteRequest<'_, R>,
        _console: &dyn Console,
    ) -> MigrateResult<WriterResult> {
        let current_rev = request.current_rev.as_string();
        let mut state = self.state();
        if state.empty_change_revs.contains(&current_rev) {
            return Err(MigrateError::empty_change(format!(
                "migration of '{current_rev}' did not change the destination tree"
            )));
        }
        let mut tree_files = Vec::new();
        list_files(request.tree, request.tree, &mut tree_files);
        tree_files.sort();
        state.writes.push(RecordedWrite {
            current_rev: current_rev.clone(),
            message: request.metadata.message().to_string(),
            author: request.metadata.author().clone(),
            current: request
                .changes
                .current()
                .iter()
                .map(|c| c.ref_as_string())
                .collect(),
            already_migrated: request
                .changes
                .already_migrated()
                .iter()
                .map(|c| c.ref_as_string())
                .collect(),
            baseline: request.baseline.map(str::to_string),
            workflow_identity: request.workflow_identity.to_string(),
            tree_files,
        });
        state.previous_ref = Some(current_rev);
        Ok(state.results.pop_front().unwrap_or(WriterResult::Ok))
    }

    fn current_tree_digest(&self) -> MigrateResult<Option<String>> {
        Ok(self.state().tree_digest.clone())
    }
}

fn list_files(root: &Path, dir: &Path, out: &mut Vec<String>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            list_files(root, &path, out);
        } else if let Ok(relative) = path.strip_prefix(root) {
            out.push(relative.to_string_lossy().replace('\\', "/"));
        }
    }
}

/// A recorded console message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Message {
    /// An `info` message.
    Info(String),
    /// A `warn` message.
    Warn(String),
    /// An `error` message.
    Error(String),
    /// A confirmation prompt, with the answer given.
    Prompt(String, bool),
}

#[derive(Default)]
struct ConsoleState {
    messages: Vec<Message>,
    prompt_answers: VecDeque<bool>,
}

/// A console capturing all output; prompts answer from a script and default
/// to yes.
#[derive(Clone, Default)]
pub struct TestConsole {
    state: Arc<Mutex<ConsoleState>>,
}

impl TestConsole {
    /// Creates a console with no scripted prompt answers.
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> std::sync::MutexGuard<'_, ConsoleState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Queues an answer for the next confirmation prompt.
    pub fn answer_prompt(&self, answer: bool) {
        self.state().prompt_answers.push_back(answer);
    }

    /// Every recorded message, in order.
    pub fn messages(&self) -> Vec<Message> {
        self.state().messages.clone()
    }

    /// All warning texts, in order.
    pub fn warnings(&self) -> Vec<String> {
        self.messages()
            .into_iter()
            .filter_map(|m| match m {
                Message::Warn(text) => Some(text),
                _ => None,
            })
            .collect()
    }

    /// All info texts, in order.
    pub fn infos(&self) -> Vec<String> {
        self.messages()
            .into_iter()
            .filter_map(|m| match m {
                Message::Info(text) => Some(text),
                _ => None,
            })
            .collect()
    }

    /// Whether any warning contains `needle`.
    pub fn has_warning_containing(&self, needle: &str) -> bool {
        self.warnings().iter().any(|w| w.contains(needle))
    }
}

impl Console for TestConsole {
    fn info(&self, message: &str) {
        self.state().messages.push(Message::Info(message.to_string()));
    }

    fn warn(&self, message: &str) {
        self.state().messages.push(Message::Warn(message.to_string()));
    }

    fn error(&self, message: &str) {
        self.state().messages.push(Message::Error(message.to_string()));
    }

    fn prompt_confirmation(&self, question: &str) -> MigrateResult<bool> {
        let mut state = self.state();
        let answer = state.prompt_answers.pop_front().unwrap_or(true);
        state
            .messages
            .push(Message::Prompt(question.to_string(), answer));
        Ok(answer)
    }
}

fn base_timestamp() -> DateTime<Utc> {
    DateTime::from_timestamp(1_700_000_000, 0).unwrap_or(DateTime::UNIX_EPOCH)
}
