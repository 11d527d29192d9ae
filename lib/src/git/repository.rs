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

//! A `git` subprocess driver over a bare repository.
//!
//! All tree materialisation goes through plumbing (`read-tree`,
//! `checkout-index`, `write-tree`, `commit-tree`) with a scratch index, so
//! the bare cache never needs a working copy of its own.

use std::collections::HashMap;
use std::io::Write as _;
use std::path::Path;
use std::path::PathBuf;
use std::process::Command;
use std::process::Output;
use std::process::Stdio;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::OnceLock;

use sha2::Digest as _;
use sha2::Sha256;

use crate::authoring::Author;
use crate::error::MigrateError;
use crate::error::MigrateResult;

/// One commit from `git log`.
#[derive(Clone, Debug)]
pub struct LogEntry {
    /// Full commit hash.
    pub sha: String,
    /// Parent hashes in git parent order.
    pub parents: Vec<String>,
    /// Author name.
    pub author_name: String,
    /// Author email.
    pub author_email: String,
    /// Author time as a unix timestamp.
    pub timestamp: i64,
    /// Raw commit message.
    pub message: String,
    /// Files touched, as reported by `--name-only`. Empty for merge
    /// commits, whose combined diff git suppresses.
    pub files: Vec<String>,
}

/// Handle to a bare git repository driven through subprocesses.
#[derive(Clone, Debug)]
pub struct GitRepository {
    git_dir: PathBuf,
}

const LOG_FIELD_SEP: char = '\u{1}';
const LOG_RECORD_SEP: char = '\u{0}';

impl GitRepository {
    /// Opens `path` as a bare repository, initializing it first when it does
    /// not exist yet.
    pub fn init_bare(path: &Path) -> MigrateResult<Self> {
        if !path.join("HEAD").exists() {
            std::fs::create_dir_all(path).map_err(|e| {
                MigrateError::repo_with(format!("cannot create {}", path.display()), e)
            })?;
            let mut cmd = Command::new("git");
            cmd.args(["init", "--bare", "--quiet"]).arg(path);
            run_expecting_success(cmd, "git init --bare")?;
        }
        // Some commands below change the working directory, so the git dir
        // must not be relative.
        let git_dir = path.canonicalize().map_err(|e| {
            MigrateError::repo_with(format!("cannot canonicalize {}", path.display()), e)
        })?;
        Ok(Self { git_dir })
    }

    /// The bare repository directory.
    pub fn git_dir(&self) -> &Path {
        &self.git_dir
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new("git");
        cmd.arg("--git-dir").arg(&self.git_dir);
        cmd
    }

    fn run(&self, args: &[&str]) -> MigrateResult<String> {
        let mut cmd = self.command();
        cmd.args(args);
        let context = format!("git {}", args.join(" "));
        let output = run_expecting_success(cmd, &context)?;
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Fetches `reference` from `url` into `FETCH_HEAD`.
    ///
    /// A reference the remote does not advertise fails with
    /// `CannotResolveRevision`; transport failures are repo errors.
    pub fn fetch_ref(&self, url: &str, reference: &str) -> MigrateResult<()> {
        let mut cmd = self.command();
        cmd.args(["fetch", "--force", "--quiet", url, reference]);
        let output = exec(cmd, "git fetch")?;
        if output.status.success() {
            return Ok(());
        }
        let stderr = String::from_utf8_lossy(&output.stderr);
        if stderr.contains("couldn't find remote ref")
            || stderr.contains("not our ref")
            || stderr.contains("unadvertised object")
        {
            return Err(MigrateError::cannot_resolve(format!(
                "'{reference}' not found in {url}"
            )));
        }
        Err(MigrateError::repo(format!(
            "git fetch from {url} failed: {}",
            stderr.trim()
        )))
    }

    /// Resolves `rev` to a full commit hash, or `None` when it does not name
    /// a commit in this repository.
    pub fn rev_parse(&self, rev: &str) -> MigrateResult<Option<String>> {
        let mut cmd = self.command();
        cmd.args(["rev-parse", "--verify", "--quiet", &format!("{rev}^{{commit}}")]);
        let output = exec(cmd, "git rev-parse")?;
        if output.status.success() {
            Ok(Some(
                String::from_utf8_lossy(&output.stdout).trim().to_string(),
            ))
        } else {
            Ok(None)
        }
    }

    /// Whether two commits share any history.
    pub fn merge_base_exists(&self, a: &str, b: &str) -> MigrateResult<bool> {
        let mut cmd = self.command();
        cmd.args(["merge-base", a, b]);
        cmd.stdout(Stdio::null());
        let output = exec(cmd, "git merge-base")?;
        Ok(output.status.success())
    }

    /// Enumerates commits for `range` in `--topo-order` (children before
    /// parents), optionally limited to `paths` and capped at `limit`.
    pub fn log(
        &self,
        range: &str,
        paths: &[String],
        limit: Option<usize>,
    ) -> MigrateResult<Vec<LogEntry>> {
        // %x01/%x00 expand to control characters in the output; argv itself
        // must stay free of NUL bytes.
        let format = "--format=%H%x01%P%x01%an%x01%ae%x01%at%x01%B%x00".to_string();
        let mut args = vec!["log".to_string(), "--topo-order".to_string(), format];
        if let Some(limit) = limit {
            args.push(format!("-n{limit}"));
        }
        args.push(range.to_string());
        if !paths.is_empty() {
            args.push("--".to_string());
            args.extend(paths.iter().cloned());
        }
        let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
        let stdout = self.run(&arg_refs)?;

        let mut entries = Vec::new();
        for record in stdout.split(LOG_RECORD_SEP) {
            let record = record.trim_start_matches('\n');
            if record.is_empty() {
                continue;
            }
            let fields: Vec<&str> = record.splitn(6, LOG_FIELD_SEP).collect();
            if fields.len() != 6 {
                return Err(MigrateError::repo(format!(
                    "unexpected git log record: {record:?}"
                )));
            }
            entries.push(LogEntry {
                sha: fields[0].to_string(),
                parents: fields[1].split_whitespace().map(str::to_string).collect(),
                author_name: fields[2].to_string(),
                author_email: fields[3].to_string(),
                timestamp: fields[4].trim().parse().map_err(|e| {
                    MigrateError::repo(format!("bad author timestamp '{}': {e}", fields[4]))
                })?,
                message: fields[5].to_string(),
                files: Vec::new(),
            });
        }
        if entries.is_empty() {
            return Ok(entries);
        }

        // Second pass for the per-commit file lists; --name-only interleaves
        // badly with a custom body format, so it gets its own invocation.
        let format = "--format=%x00%H".to_string();
        let mut args = vec![
            "log".to_string(),
            "--topo-order".to_string(),
            "--name-only".to_string(),
            format,
        ];
        if let Some(limit) = limit {
            args.push(format!("-n{limit}"));
        }
        args.push(range.to_string());
        if !paths.is_empty() {
            args.push("--".to_string());
            args.extend(paths.iter().cloned());
        }
        let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
        let stdout = self.run(&arg_refs)?;

        let mut files_by_sha: HashMap<String, Vec<String>> = HashMap::new();
        for chunk in stdout.split(LOG_RECORD_SEP) {
            let mut lines = chunk.lines().filter(|line| !line.trim().is_empty());
            let Some(sha) = lines.next() else {
                continue;
            };
            let files: Vec<String> = lines.map(str::to_string).collect();
            files_by_sha.insert(sha.trim().to_string(), files);
        }
        for entry in &mut entries {
            if let Some(files) = files_by_sha.remove(&entry.sha) {
                entry.files = files;
            }
        }
        Ok(entries)
    }

    /// Whether the tree of `rev` contains no files.
    pub fn is_tree_empty(&self, rev: &str) -> MigrateResult<bool> {
        let stdout = self.run(&["ls-tree", "-r", "--name-only", rev])?;
        Ok(stdout.trim().is_empty())
    }

    /// Materialises the tree of `rev` into `work_dir` using a scratch index.
    pub fn checkout_tree(&self, rev: &str, work_dir: &Path) -> MigrateResult<()> {
        let scratch = scratch_index()?;
        let index = scratch.path().join("index");

        let mut cmd = self.command();
        cmd.env("GIT_INDEX_FILE", &index);
        cmd.args(["read-tree", rev]);
        run_expecting_success(cmd, "git read-tree")?;

        let mut cmd = self.command();
        cmd.env("GIT_INDEX_FILE", &index);
        cmd.arg("--work-tree").arg(work_dir);
        cmd.current_dir(work_dir);
        cmd.args(["checkout-index", "-a", "-f"]);
        run_expecting_success(cmd, "git checkout-index")?;
        Ok(())
    }

    /// Stages every file under `work_dir` into a scratch index and writes
    /// the resulting tree object, returning its hash.
    pub fn write_tree_from(&self, work_dir: &Path) -> MigrateResult<String> {
        let scratch = scratch_index()?;
        let index = scratch.path().join("index");

        let mut cmd = self.command();
        cmd.env("GIT_INDEX_FILE", &index);
        cmd.arg("--work-tree").arg(work_dir);
        cmd.current_dir(work_dir);
        cmd.args(["add", "-A", "."]);
        run_expecting_success(cmd, "git add")?;

        let mut cmd = self.command();
        cmd.env("GIT_INDEX_FILE", &index);
        cmd.arg("write-tree");
        let output = run_expecting_success(cmd, "git write-tree")?;
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    /// The tree hash of a commit.
    pub fn tree_of(&self, commit: &str) -> MigrateResult<String> {
        let stdout = self.run(&["rev-parse", &format!("{commit}^{{tree}}")])?;
        Ok(stdout.trim().to_string())
    }

    /// Creates a commit object for `tree` with the given parents, author,
    /// and message, returning its hash.
    pub fn commit_tree(
        &self,
        tree: &str,
        parents: &[String],
        author: &Author,
        timestamp: i64,
        message: &str,
    ) -> MigrateResult<String> {
        let mut cmd = self.command();
        let date = format!("{timestamp} +0000");
        cmd.env("GIT_AUTHOR_NAME", author.name());
        cmd.env("GIT_AUTHOR_EMAIL", author.email());
        cmd.env("GIT_AUTHOR_DATE", &date);
        cmd.env("GIT_COMMITTER_NAME", author.name());
        cmd.env("GIT_COMMITTER_EMAIL", author.email());
        cmd.env("GIT_COMMITTER_DATE", &date);
        cmd.arg("commit-tree").arg(tree);
        for parent in parents {
            cmd.arg("-p").arg(parent);
        }
        cmd.stdin(Stdio::piped());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        let mut child = cmd
            .spawn()
            .map_err(|e| MigrateError::repo_with("cannot run git commit-tree", e))?;
        child
            .stdin
            .take()
            .ok_or_else(|| MigrateError::repo("git commit-tree stdin unavailable"))?
            .write_all(message.as_bytes())
            .map_err(|e| MigrateError::repo_with("cannot write commit message", e))?;
        let output = child
            .wait_with_output()
            .map_err(|e| MigrateError::repo_with("git commit-tree failed", e))?;
        if !output.status.success() {
            return Err(MigrateError::repo(format!(
                "git commit-tree failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    /// Pushes `local_commit` to `remote_ref` on `url`.
    pub fn push(&self, url: &str, local_commit: &str, remote_ref: &str) -> MigrateResult<()> {
        self.run(&[
            "push",
            "--quiet",
            url,
            &format!("{local_commit}:{remote_ref}"),
        ])?;
        Ok(())
    }
}

/// Opens (initializing if needed) the shared bare cache repository for a
/// remote URL. Callers must hold [`url_lock`] around any operation on the
/// returned repository.
pub fn cached_bare_repo(cache_root: &Path, url: &str) -> MigrateResult<GitRepository> {
    let key = hex::encode(Sha256::digest(url.as_bytes()));
    let path = cache_root.join(format!("repo-{}", &key[..16]));
    GitRepository::init_bare(&path)
}

/// The process-wide critical section guarding the cache repository of `url`.
/// Two concurrent workflows on the same URL serialize here instead of racing
/// on the same directory.
pub fn url_lock(url: &str) -> Arc<Mutex<()>> {
    static REPO_LOCKS: OnceLock<Mutex<HashMap<String, Arc<Mutex<()>>>>> = OnceLock::new();
    let locks = REPO_LOCKS.get_or_init(|| Mutex::new(HashMap::new()));
    let mut map = locks.lock().unwrap_or_else(|e| e.into_inner());
    map.entry(url.to_string()).or_default().clone()
}

fn scratch_index() -> MigrateResult<tempfile::TempDir> {
    tempfile::tempdir()
        .map_err(|e| MigrateError::repo_with("cannot create scratch index directory", e))
}

fn exec(mut cmd: Command, context: &str) -> MigrateResult<Output> {
    tracing::trace!(?cmd, "running git");
    cmd.output()
        .map_err(|e| MigrateError::repo_with(format!("cannot run {context}"), e))
}

fn run_expecting_success(cmd: Command, context: &str) -> MigrateResult<Output> {
    let output = exec(cmd, context)?;
    if !output.status.success() {
        return Err(MigrateError::repo(format!(
            "{context} failed: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }
    Ok(output)
}
