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

//! Folder-based endpoints.
//!
//! A folder origin is a plain directory snapshot: it has no history, so only
//! `resolve` and `checkout` work and `supports_history()` is false. A folder
//! destination replaces a directory's contents and cannot report previously
//! imported revisions. Both exist for one-shot imports and for exercising
//! migrations locally without a second VCS repository.

use std::path::Path;
use std::path::PathBuf;

use crate::change::Change;
use crate::change::Revision;
use crate::console::Console;
use crate::destination::Destination;
use crate::destination::DestinationWriter;
use crate::destination::WriteRequest;
use crate::destination::WriterResult;
use crate::error::MigrateError;
use crate::error::MigrateResult;
use crate::origin::ChangesResponse;
use crate::origin::ChangesVisitor;
use crate::origin::Origin;
use crate::tree::clear_dir;
use crate::tree::copy_dir_contents;
use crate::tree::tree_digest;

/// A revision of a folder origin: the canonicalized snapshot path.
#[derive(Clone, Debug)]
pub struct FolderRevision {
    path: PathBuf,
}

impl FolderRevision {
    /// The snapshot directory.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Revision for FolderRevision {
    fn as_string(&self) -> String {
        self.path.display().to_string()
    }
}

/// An origin reading a directory snapshot.
pub struct FolderOrigin {
    root: PathBuf,
}

impl FolderOrigin {
    /// Creates an origin with `root` as the default snapshot.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn no_history(&self, operation: &str) -> MigrateError {
        MigrateError::validation(format!(
            "folder.origin does not support history: cannot {operation}"
        ))
    }
}

impl Origin for FolderOrigin {
    type Rev = FolderRevision;

    fn resolve(&self, reference: Option<&str>) -> MigrateResult<FolderRevision> {
        let path = match reference.filter(|r| !r.is_empty()) {
            Some(reference) => PathBuf::from(reference),
            None => self.root.clone(),
        };
        let path = path.canonicalize().map_err(|e| {
            MigrateError::cannot_resolve(format!("folder '{}' ({e})", path.display()))
        })?;
        if !path.is_dir() {
            return Err(MigrateError::cannot_resolve(format!(
                "'{}' is not a directory",
                path.display()
            )));
        }
        Ok(FolderRevision { path })
    }

    fn checkout(&self, revision: &FolderRevision, work_dir: &Path) -> MigrateResult<()> {
        clear_dir(work_dir)?;
        let copied = copy_dir_contents(&revision.path, work_dir)?;
        if copied == 0 {
            return Err(MigrateError::validation("The origin repository is empty"));
        }
        Ok(())
    }

    fn changes(
        &self,
        _from: Option<&FolderRevision>,
        _to: &FolderRevision,
    ) -> MigrateResult<ChangesResponse<FolderRevision>> {
        Err(self.no_history("enumerate changes"))
    }

    fn change(&self, _revision: &FolderRevision) -> MigrateResult<Change<FolderRevision>> {
        Err(self.no_history("read a change"))
    }

    fn visit_changes(
        &self,
        _start: &FolderRevision,
        _visitor: &mut ChangesVisitor<'_, FolderRevision>,
    ) -> MigrateResult<()> {
        Err(self.no_history("visit changes"))
    }

    fn supports_history(&self) -> bool {
        false
    }

    fn label_name(&self) -> String {
        "FolderOrigin-RevId".to_string()
    }
}

/// A destination writing trees into a directory.
pub struct FolderDestination {
    root: PathBuf,
}

impl FolderDestination {
    /// Creates a destination replacing the contents of `root` on each write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl<R: Revision> Destination<R> for FolderDestination {
    fn supports_previous_ref(&self) -> bool {
        false
    }

    fn label_name_when_origin(&self) -> MigrateResult<String> {
        Err(MigrateError::validation(
            "folder.destination cannot act as the origin of another migration",
        ))
    }

    fn writer(&self) -> MigrateResult<Box<dyn DestinationWriter<R>>> {
        Ok(Box::new(FolderDestinationWriter {
            root: self.root.clone(),
        }))
    }
}

struct FolderDestinationWriter {
    root: PathBuf,
}

impl<R: Revision> DestinationWriter<R> for FolderDestinationWriter {
    fn previous_ref(&self, _label_name: &str) -> MigrateResult<Option<String>> {
        Ok(None)
    }

    fn write(
        &mut self,
        request: WriteRequest<'_, R>,
        console: &dyn Console,
    ) -> MigrateResult<WriterResult> {
        std::fs::create_dir_all(&self.root).map_err(|e| {
            MigrateError::repo_with(format!("cannot create {}", self.root.display()), e)
        })?;
        clear_dir(&self.root)?;
        copy_dir_contents(request.tree, &self.root)?;
        console.info(&format!(
            "Tree for {} written to {}",
            request.current_rev.as_string(),
            self.root.display()
        ));
        Ok(WriterResult::Ok)
    }

    fn current_tree_digest(&self) -> MigrateResult<Option<String>> {
        if self.root.is_dir() {
            Ok(Some(tree_digest(&self.root)?))
        } else {
            Ok(None)
        }
    }
}
