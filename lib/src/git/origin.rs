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

//! A git repository as migration origin.

use std::path::Path;
use std::path::PathBuf;

use chrono::DateTime;

use crate::authoring::Author;
use crate::change::Change;
use crate::change::LabelSet;
use crate::change::Revision;
use crate::error::MigrateError;
use crate::error::MigrateResult;
use crate::git::GIT_ORIGIN_REV_ID;
use crate::graph::ChangeGraphBuilder;
use crate::origin::ChangesResponse;
use crate::origin::ChangesVisitor;
use crate::origin::EmptyReason;
use crate::origin::Origin;
use crate::origin::VisitResult;
use crate::tree::clear_dir;

use super::repository::GitRepository;
use super::repository::LogEntry;
use super::repository::cached_bare_repo;
use super::repository::url_lock;

/// A resolved git commit: the full hash plus the reference it came from.
#[derive(Clone, Debug)]
pub struct GitRevision {
    sha: String,
    reference: Option<String>,
}

impl GitRevision {
    pub(crate) fn new(sha: impl Into<String>, reference: Option<String>) -> Self {
        Self {
            sha: sha.into(),
            reference,
        }
    }

    /// The full commit hash.
    pub fn sha(&self) -> &str {
        &self.sha
    }

    /// The reference that resolved to this revision, when known.
    pub fn context_reference(&self) -> Option<&str> {
        self.reference.as_deref()
    }
}

impl Revision for GitRevision {
    fn as_string(&self) -> String {
        self.sha.clone()
    }
}

/// An origin reading from a git remote through a shared bare cache.
pub struct GitOrigin {
    url: String,
    default_ref: String,
    cache_root: PathBuf,
    path_roots: Vec<String>,
}

impl GitOrigin {
    /// Creates an origin for `url`, resolving empty references to
    /// `default_ref`. Cache repositories live under `cache_root`.
    pub fn new(
        url: impl Into<String>,
        default_ref: impl Into<String>,
        cache_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            url: url.into().trim_end_matches('/').to_string(),
            default_ref: default_ref.into(),
            cache_root: cache_root.into(),
            path_roots: Vec::new(),
        }
    }

    /// Limits history enumeration to commits touching these directory
    /// roots. Typically derived from the workflow glob's fixed prefixes; an
    /// empty list means no path limiting.
    pub fn with_path_roots(mut self, path_roots: Vec<String>) -> Self {
        self.path_roots = path_roots;
        self
    }

    /// The remote URL this origin reads from.
    pub fn url(&self) -> &str {
        &self.url
    }

    fn repo(&self) -> MigrateResult<GitRepository> {
        cached_bare_repo(&self.cache_root, &self.url)
    }

    fn entry_to_change(entry: &LogEntry) -> Change<GitRevision> {
        Change::new(
            GitRevision::new(entry.sha.clone(), None),
            Author::new(entry.author_name.clone(), entry.author_email.clone()),
            entry.message.clone(),
            DateTime::from_timestamp(entry.timestamp, 0).unwrap_or(DateTime::UNIX_EPOCH),
            LabelSet::from_message(&entry.message),
            entry.files.clone(),
        )
    }
}

impl Origin for GitOrigin {
    type Rev = GitRevision;

    /// Resolves a reference, fetching it into the cache first. A full hash
    /// already present in the cache resolves without a fetch.
    fn resolve(&self, reference: Option<&str>) -> MigrateResult<GitRevision> {
        let reference = match reference.filter(|r| !r.is_empty()) {
            Some(reference) => reference.to_string(),
            None => self.default_ref.clone(),
        };
        let lock = url_lock(&self.url);
        let _guard = lock.lock().unwrap_or_else(|e| e.into_inner());
        let repo = self.repo()?;

        // Hashes are usually not advertised by remotes; prefer objects the
        // cache already holds.
        if looks_like_sha(&reference)
            && let Some(sha) = repo.rev_parse(&reference)?
        {
            return Ok(GitRevision::new(sha, Some(reference)));
        }

        match repo.fetch_ref(&self.url, &reference) {
            Ok(()) => {
                let sha = repo.rev_parse("FETCH_HEAD")?.ok_or_else(|| {
                    MigrateError::cannot_resolve(format!(
                        "'{reference}' did not resolve to a commit in {}",
                        self.url
                    ))
                })?;
                Ok(GitRevision::new(sha, Some(reference)))
            }
            Err(fetch_error @ MigrateError::CannotResolveRevision { .. }) => {
                // Servers don't advertise raw hashes; fall back to objects
                // already in the cache.
                match repo.rev_parse(&reference)? {
                    Some(sha) => Ok(GitRevision::new(sha, Some(reference))),
                    None => Err(fetch_error),
                }
            }
            Err(other) => Err(other),
        }
    }

    fn checkout(&self, revision: &GitRevision, work_dir: &Path) -> MigrateResult<()> {
        let lock = url_lock(&self.url);
        let _guard = lock.lock().unwrap_or_else(|e| e.into_inner());
        let repo = self.repo()?;
        if repo.is_tree_empty(revision.sha())? {
            return Err(MigrateError::validation("The origin repository is empty"));
        }
        clear_dir(work_dir)?;
        repo.checkout_tree(revision.sha(), work_dir)
    }

    fn changes(
        &self,
        from: Option<&GitRevision>,
        to: &GitRevision,
    ) -> MigrateResult<ChangesResponse<GitRevision>> {
        let lock = url_lock(&self.url);
        let _guard = lock.lock().unwrap_or_else(|e| e.into_inner());
        let repo = self.repo()?;

        let range = match from {
            Some(from) => {
                if !repo.merge_base_exists(from.sha(), to.sha())? {
                    return Ok(ChangesResponse::no_changes(EmptyReason::UnrelatedRevisions));
                }
                format!("{}..{}", from.sha(), to.sha())
            }
            None => to.sha().to_string(),
        };

        let entries = repo.log(&range, &self.path_roots, None)?;
        if entries.is_empty() {
            if !self.path_roots.is_empty() && !repo.log(&range, &[], Some(1))?.is_empty() {
                return Ok(ChangesResponse::no_changes(EmptyReason::ToFilesExcluded));
            }
            return Ok(ChangesResponse::no_changes(EmptyReason::NoChanges));
        }

        let mut builder = ChangeGraphBuilder::new();
        for entry in &entries {
            builder.add_change(Self::entry_to_change(entry));
        }
        // Parents outside the log range fail the lookup and drop out,
        // keeping the graph closed under the returned node set.
        for entry in &entries {
            let child = GitRevision::new(entry.sha.clone(), None);
            for parent in &entry.parents {
                builder.add_parent(&child, &GitRevision::new(parent.clone(), None));
            }
        }
        Ok(ChangesResponse::for_changes(builder.build()))
    }

    fn change(&self, revision: &GitRevision) -> MigrateResult<Change<GitRevision>> {
        let lock = url_lock(&self.url);
        let _guard = lock.lock().unwrap_or_else(|e| e.into_inner());
        let repo = self.repo()?;
        let entries = repo.log(revision.sha(), &[], Some(1))?;
        match entries.first() {
            Some(entry) => Ok(Self::entry_to_change(entry)),
            None => Err(MigrateError::empty_change(format!(
                "{} reference cannot be found",
                revision.as_string()
            ))),
        }
    }

    fn visit_changes(
        &self,
        start: &GitRevision,
        visitor: &mut ChangesVisitor<'_, GitRevision>,
    ) -> MigrateResult<()> {
        let lock = url_lock(&self.url);
        let _guard = lock.lock().unwrap_or_else(|e| e.into_inner());
        let repo = self.repo()?;
        // --topo-order lists children before parents, which is the
        // reverse-chronological walk the visitor contract asks for, and
        // never repeats a commit.
        let entries = repo.log(start.sha(), &[], None)?;
        for entry in &entries {
            let change = Self::entry_to_change(entry);
            if visitor(&change) == VisitResult::Terminate {
                break;
            }
        }
        Ok(())
    }

    fn label_name(&self) -> String {
        GIT_ORIGIN_REV_ID.to_string()
    }
}

fn looks_like_sha(reference: &str) -> bool {
    reference.len() >= 6
        && reference.len() <= 40
        && reference.chars().all(|c| c.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_looks_like_sha() {
        assert!(looks_like_sha("abc123def456"));
        assert!(looks_like_sha(&"a".repeat(40)));
        assert!(!looks_like_sha("main"));
        assert!(!looks_like_sha("abc12"));
        assert!(!looks_like_sha("refs/heads/abcdef"));
    }
}
