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

//! A git repository as migration destination.
//!
//! Each write stages the transformed tree with a scratch index, commits it
//! on top of the branch head (or the change-request baseline), stamps the
//! origin revision as a message trailer, and pushes. The trailer is what
//! later runs read back to find the last imported revision.

use std::fs;
use std::path::PathBuf;

use chrono::Utc;

use crate::change::Revision;
use crate::console::Console;
use crate::destination::Destination;
use crate::destination::DestinationWriter;
use crate::destination::WriteRequest;
use crate::destination::WriterResult;
use crate::error::MigrateError;
use crate::error::MigrateResult;
use crate::git::GIT_ORIGIN_REV_ID;
use crate::trailer::append_trailer;
use crate::trailer::parse_message_trailers;
use crate::tree::tree_digest;

use super::repository::GitRepository;
use super::repository::cached_bare_repo;
use super::repository::url_lock;

/// A destination pushing commits to a branch of a git remote.
pub struct GitDestination {
    url: String,
    branch: String,
    cache_root: PathBuf,
}

impl GitDestination {
    /// Creates a destination pushing to `branch` on `url`. Cache
    /// repositories live under `cache_root`.
    pub fn new(
        url: impl Into<String>,
        branch: impl Into<String>,
        cache_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            url: url.into().trim_end_matches('/').to_string(),
            branch: branch.into(),
            cache_root: cache_root.into(),
        }
    }

    /// The remote URL this destination writes to.
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl<R: Revision> Destination<R> for GitDestination {
    fn supports_previous_ref(&self) -> bool {
        true
    }

    fn label_name_when_origin(&self) -> MigrateResult<String> {
        Ok(GIT_ORIGIN_REV_ID.to_string())
    }

    /// Opens a writer, fetching the current branch head into the cache. A
    /// branch that does not exist yet starts the history from scratch.
    fn writer(&self) -> MigrateResult<Box<dyn DestinationWriter<R>>> {
        let lock = url_lock(&self.url);
        let _guard = lock.lock().unwrap_or_else(|e| e.into_inner());
        let repo = cached_bare_repo(&self.cache_root, &self.url)?;
        let head = match repo.fetch_ref(&self.url, &self.branch) {
            Ok(()) => repo.rev_parse("FETCH_HEAD")?,
            Err(MigrateError::CannotResolveRevision { .. }) => None,
            Err(other) => return Err(other),
        };
        Ok(Box::new(GitDestinationWriter {
            url: self.url.clone(),
            branch: self.branch.clone(),
            repo,
            head,
        }))
    }
}

struct GitDestinationWriter {
    url: String,
    branch: String,
    repo: GitRepository,
    head: Option<String>,
}

impl GitDestinationWriter {
    fn resolve_baseline(&self, baseline: &str) -> MigrateResult<String> {
        self.repo.rev_parse(baseline)?.ok_or_else(|| {
            MigrateError::validation(format!(
                "Baseline '{baseline}' not found in the destination"
            ))
        })
    }
}

impl<R: Revision> DestinationWriter<R> for GitDestinationWriter {
    /// Walks the branch newest-first for the first commit carrying
    /// `label_name` and returns its value.
    fn previous_ref(&self, label_name: &str) -> MigrateResult<Option<String>> {
        let Some(head) = &self.head else {
            return Ok(None);
        };
        let lock = url_lock(&self.url);
        let _guard = lock.lock().unwrap_or_else(|e| e.into_inner());
        let entries = self.repo.log(head, &[], None)?;
        for entry in &entries {
            for trailer in parse_message_trailers(&entry.message) {
                if trailer.key == label_name && !trailer.value.is_empty() {
                    return Ok(Some(trailer.value));
                }
            }
        }
        Ok(None)
    }

    fn write(
        &mut self,
        request: WriteRequest<'_, R>,
        console: &dyn Console,
    ) -> MigrateResult<WriterResult> {
        let lock = url_lock(&self.url);
        let _guard = lock.lock().unwrap_or_else(|e| e.into_inner());

        let tree = self.repo.write_tree_from(request.tree)?;
        let parent = match request.baseline {
            Some(baseline) => Some(self.resolve_baseline(baseline)?),
            None => self.head.clone(),
        };

        if let Some(parent) = &parent
            && self.repo.tree_of(parent)? == tree
        {
            return Err(MigrateError::empty_change(format!(
                "migration of '{}' did not change the destination tree",
                request.current_rev.as_string()
            )));
        }

        let message = append_trailer(
            request.metadata.message(),
            request.origin_label,
            &request.current_rev.as_string(),
        );
        let parents: Vec<String> = parent.into_iter().collect();
        let sha = self.repo.commit_tree(
            &tree,
            &parents,
            request.metadata.author(),
            Utc::now().timestamp(),
            &message,
        )?;
        self.repo
            .push(&self.url, &sha, &format!("refs/heads/{}", self.branch))?;
        self.head = Some(sha.clone());
        tracing::info!(
            identity = request.workflow_identity,
            commit = %sha,
            "pushed destination commit"
        );
        console.info(&format!(
            "Created revision {sha} on {} ({})",
            self.url, self.branch
        ));
        Ok(WriterResult::Ok)
    }

    /// Digest of the branch head's tree, via a scratch checkout.
    fn current_tree_digest(&self) -> MigrateResult<Option<String>> {
        let Some(head) = &self.head else {
            return Ok(None);
        };
        let lock = url_lock(&self.url);
        let _guard = lock.lock().unwrap_or_else(|e| e.into_inner());
        let scratch = tempfile::tempdir()
            .map_err(|e| MigrateError::repo_with("cannot create scratch directory", e))?;
        let checkout = scratch.path().join("tree");
        fs::create_dir(&checkout)
            .map_err(|e| MigrateError::repo_with("cannot create scratch directory", e))?;
        self.repo.checkout_tree(head, &checkout)?;
        Ok(Some(tree_digest(&checkout)?))
    }
}
