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

//! Include/exclude file filters.
//!
//! A [`FileGlob`] decides which repository-relative paths a migration cares
//! about. Workflows use it to drop changes that only touch irrelevant files;
//! origins can use [`FileGlob::roots`] to limit history enumeration on the
//! VCS side.

use std::fmt;

use globset::Glob;
use globset::GlobSet;
use globset::GlobSetBuilder;
use itertools::Itertools as _;

use crate::error::MigrateError;
use crate::error::MigrateResult;

/// An include/exclude filter over repository-relative file paths.
///
/// A path matches when it matches at least one include pattern and no
/// exclude pattern. Patterns use gitignore-style globs (`**` spans
/// directories).
#[derive(Clone, Debug)]
pub struct FileGlob {
    include: GlobSet,
    exclude: GlobSet,
    include_patterns: Vec<String>,
    exclude_patterns: Vec<String>,
}

impl FileGlob {
    /// Builds a filter from include and exclude patterns.
    ///
    /// An empty include list means "everything". Invalid patterns fail with
    /// a validation error naming the pattern.
    pub fn new(include: &[String], exclude: &[String]) -> MigrateResult<Self> {
        let include_patterns = if include.is_empty() {
            vec!["**".to_string()]
        } else {
            include.to_vec()
        };
        let exclude_patterns = exclude.to_vec();
        Ok(Self {
            include: build_glob_set(&include_patterns)?,
            exclude: build_glob_set(&exclude_patterns)?,
            include_patterns,
            exclude_patterns,
        })
    }

    /// A filter matching every path.
    pub fn all_files() -> Self {
        Self::new(&[], &[]).expect("the catch-all pattern is valid")
    }

    /// Whether `path` is inside the filter.
    pub fn matches(&self, path: &str) -> bool {
        self.include.is_match(path) && !self.exclude.is_match(path)
    }

    /// Whether any of `files` is inside the filter.
    pub fn matches_any<'a>(&self, files: impl IntoIterator<Item = &'a str>) -> bool {
        files.into_iter().any(|file| self.matches(file))
    }

    /// The longest wildcard-free directory prefixes of the include patterns.
    ///
    /// An empty result means the filter may match anywhere, so callers must
    /// not path-limit on the VCS side. Exclude patterns never contribute:
    /// narrowing by roots stays a conservative over-approximation.
    pub fn roots(&self) -> Vec<String> {
        let mut roots = Vec::new();
        for pattern in &self.include_patterns {
            let mut fixed = Vec::new();
            for component in pattern.split('/') {
                if component.contains(['*', '?', '[', '{']) {
                    break;
                }
                fixed.push(component);
            }
            if fixed.is_empty() {
                // This pattern can match at the repository root.
                return Vec::new();
            }
            let root = fixed.join("/");
            if !roots.contains(&root) {
                roots.push(root);
            }
        }
        // Drop roots already covered by a shorter one.
        let mut kept: Vec<String> = Vec::new();
        for root in roots {
            if !kept
                .iter()
                .any(|prefix| root == *prefix || root.starts_with(&format!("{prefix}/")))
            {
                kept.push(root);
            }
        }
        kept
    }
}

impl fmt::Display for FileGlob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "glob([{}]", self.include_patterns.iter().join(", "))?;
        if !self.exclude_patterns.is_empty() {
            write!(f, ", exclude = [{}]", self.exclude_patterns.iter().join(", "))?;
        }
        write!(f, ")")
    }
}

fn build_glob_set(patterns: &[String]) -> MigrateResult<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|e| {
            MigrateError::validation(format!("Invalid file glob '{pattern}': {e}"))
        })?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|e| MigrateError::validation(format!("Invalid file glob set: {e}")))
}
