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

//! Working-tree helpers shared by endpoints and validation.

use std::fs;
use std::path::Path;
use std::path::PathBuf;

use sha2::Digest as _;
use sha2::Sha256;

use crate::error::MigrateError;
use crate::error::MigrateResult;

/// Removes every entry inside `dir`, keeping `dir` itself.
pub fn clear_dir(dir: &Path) -> MigrateResult<()> {
    let entries = fs::read_dir(dir)
        .map_err(|e| MigrateError::repo_with(format!("cannot read {}", dir.display()), e))?;
    for entry in entries {
        let entry =
            entry.map_err(|e| MigrateError::repo_with("cannot enumerate directory", e))?;
        let path = entry.path();
        let result = if path.is_dir() {
            fs::remove_dir_all(&path)
        } else {
            fs::remove_file(&path)
        };
        result
            .map_err(|e| MigrateError::repo_with(format!("cannot remove {}", path.display()), e))?;
    }
    Ok(())
}

/// Recursively copies the contents of `src` into `dst`, creating `dst` if
/// needed. Returns the number of files copied.
pub fn copy_dir_contents(src: &Path, dst: &Path) -> MigrateResult<usize> {
    fs::create_dir_all(dst)
        .map_err(|e| MigrateError::repo_with(format!("cannot create {}", dst.display()), e))?;
    let mut copied = 0;
    let entries = fs::read_dir(src)
        .map_err(|e| MigrateError::repo_with(format!("cannot read {}", src.display()), e))?;
    for entry in entries {
        let entry =
            entry.map_err(|e| MigrateError::repo_with("cannot enumerate directory", e))?;
        let from = entry.path();
        let to = dst.join(entry.file_name());
        if from.is_dir() {
            copied += copy_dir_contents(&from, &to)?;
        } else {
            fs::copy(&from, &to).map_err(|e| {
                MigrateError::repo_with(format!("cannot copy {}", from.display()), e)
            })?;
            copied += 1;
        }
    }
    Ok(copied)
}

/// Content digest of a file tree.
///
/// Hashes the sorted relative paths and file contents, so two trees digest
/// equal iff they contain the same files with the same bytes. Used to compare
/// a freshly transformed tree against the destination's current state.
pub fn tree_digest(dir: &Path) -> MigrateResult<String> {
    let mut files = Vec::new();
    collect_files(dir, &mut PathBuf::new(), dir, &mut files)?;
    files.sort();

    let mut hasher = Sha256::new();
    for relative in &files {
        let contents = fs::read(dir.join(relative)).map_err(|e| {
            MigrateError::repo_with(format!("cannot read {}", relative.display()), e)
        })?;
        hasher.update(relative.to_string_lossy().as_bytes());
        hasher.update([0u8]);
        hasher.update(&contents);
        hasher.update([0u8]);
    }
    Ok(hex::encode(hasher.finalize()))
}

fn collect_files(
    root: &Path,
    relative: &mut PathBuf,
    dir: &Path,
    out: &mut Vec<PathBuf>,
) -> MigrateResult<()> {
    let entries = fs::read_dir(dir)
        .map_err(|e| MigrateError::repo_with(format!("cannot read {}", dir.display()), e))?;
    for entry in entries {
        let entry =
            entry.map_err(|e| MigrateError::repo_with("cannot enumerate directory", e))?;
        relative.push(entry.file_name());
        let path = entry.path();
        if path.is_dir() {
            collect_files(root, relative, &path, out)?;
        } else {
            out.push(relative.clone());
        }
        relative.pop();
    }
    Ok(())
}
