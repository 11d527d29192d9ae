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

use std::path::PathBuf;

use clap::Args;
use clap::ValueEnum;

use ferry_lib::authoring::Author;
use ferry_lib::authoring::Authoring;
use ferry_lib::destination::Destination;
use ferry_lib::folder::FolderDestination;
use ferry_lib::folder::FolderOrigin;
use ferry_lib::git::GitDestination;
use ferry_lib::git::GitOrigin;
use ferry_lib::glob::FileGlob;
use ferry_lib::origin::Origin;
use ferry_lib::workflow::Workflow;
use ferry_lib::workflow::WorkflowMode;
use ferry_lib::workflow::WorkflowOptions;

use crate::command_error::CommandError;
use crate::ui::Ui;

/// Run a migration workflow from an origin to a destination
///
/// Both endpoints are git URLs by default; prefix a path with `folder://` to
/// read from or write to a plain directory instead.
#[derive(Args, Clone, Debug)]
pub struct MigrateArgs {
    /// Origin repository URL, or folder://<path>
    #[arg(value_name = "ORIGIN")]
    origin: String,

    /// Destination repository URL, or folder://<path>
    #[arg(value_name = "DESTINATION")]
    destination: String,

    /// Origin reference to migrate (defaults to --default-ref)
    #[arg(value_name = "REF")]
    reference: Option<String>,

    /// Migration strategy
    #[arg(long, value_enum, default_value_t = ModeArg::Squash)]
    mode: ModeArg,

    /// Workflow name, used in identity fingerprints
    #[arg(long, default_value = "default")]
    name: String,

    /// Demote history-discovery safety errors to warnings
    #[arg(long)]
    force: bool,

    /// Baseline commit in the destination for change-request imports
    #[arg(long, value_name = "REVISION")]
    change_request_parent: Option<String>,

    /// Maximum number of changes migrated per iterative run
    #[arg(long, value_name = "N")]
    iterative_limit_changes: Option<usize>,

    /// Hide individual origin commits from the squash commit
    #[arg(long)]
    squash_without_history: bool,

    /// Verify the destination matches the last imported revision first
    #[arg(long)]
    check_last_rev_state: bool,

    /// Include glob for origin files (repeatable; default: everything)
    #[arg(long = "origin-files", value_name = "GLOB")]
    origin_files: Vec<String>,

    /// Exclude glob for origin files (repeatable)
    #[arg(long = "origin-files-exclude", value_name = "GLOB")]
    origin_files_exclude: Vec<String>,

    /// Origin reference used when REF is omitted
    #[arg(long, default_value = "main", value_name = "REF")]
    default_ref: String,

    /// Destination branch to write to
    #[arg(long, default_value = "main", value_name = "BRANCH")]
    destination_branch: String,

    /// Default author for generated commits
    #[arg(long, default_value = "Ferry <ferry@localhost>", value_name = "AUTHOR")]
    default_author: String,

    /// Directory holding cached repositories
    #[arg(long, value_name = "DIR")]
    cache_dir: Option<PathBuf>,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ModeArg {
    /// One destination commit with the new tree state
    Squash,
    /// One destination commit per origin change
    Iterative,
    /// One review diffed against a destination baseline
    ChangeRequest,
}

impl From<ModeArg> for WorkflowMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Squash => WorkflowMode::Squash,
            ModeArg::Iterative => WorkflowMode::Iterative,
            ModeArg::ChangeRequest => WorkflowMode::ChangeRequest,
        }
    }
}

enum Endpoint<'a> {
    Git(&'a str),
    Folder(&'a str),
}

fn endpoint(url: &str) -> Endpoint<'_> {
    match url.strip_prefix("folder://") {
        Some(path) => Endpoint::Folder(path),
        None => Endpoint::Git(url),
    }
}

pub fn cmd_migrate(ui: &Ui, args: &MigrateArgs) -> Result<(), CommandError> {
    if args.change_request_parent.is_some() && !matches!(args.mode, ModeArg::ChangeRequest) {
        return Err(CommandError::user_error(
            "--change-request-parent is only meaningful for change-request imports",
        )
        .with_hint("Pass --mode change-request to run one."));
    }
    tracing::debug!(
        origin = %args.origin,
        destination = %args.destination,
        mode = ?args.mode,
        "starting migration"
    );
    let origin_files = FileGlob::new(&args.origin_files, &args.origin_files_exclude)?;
    let authoring = Authoring::pass_thru(Author::parse(&args.default_author)?);
    let options = WorkflowOptions {
        iterative_limit_changes: args.iterative_limit_changes.unwrap_or(usize::MAX),
        change_baseline: args.change_request_parent.clone(),
        force: args.force,
        squash_without_history: args.squash_without_history,
        check_last_rev_state: args.check_last_rev_state,
    };
    let cache_dir = args
        .cache_dir
        .clone()
        .unwrap_or_else(|| std::env::temp_dir().join("ferry-cache"));

    match (endpoint(&args.origin), endpoint(&args.destination)) {
        (Endpoint::Git(origin_url), Endpoint::Git(destination_url)) => {
            let origin = GitOrigin::new(origin_url, args.default_ref.as_str(), &cache_dir)
                .with_path_roots(origin_files.roots());
            let destination = GitDestination::new(
                destination_url,
                args.destination_branch.as_str(),
                &cache_dir,
            );
            run_workflow(ui, args, origin, destination, authoring, origin_files, options)
        }
        (Endpoint::Git(origin_url), Endpoint::Folder(destination_path)) => {
            let origin = GitOrigin::new(origin_url, args.default_ref.as_str(), &cache_dir)
                .with_path_roots(origin_files.roots());
            let destination = FolderDestination::new(destination_path);
            run_workflow(ui, args, origin, destination, authoring, origin_files, options)
        }
        (Endpoint::Folder(origin_path), Endpoint::Git(destination_url)) => {
            let origin = FolderOrigin::new(origin_path);
            let destination = GitDestination::new(
                destination_url,
                args.destination_branch.as_str(),
                &cache_dir,
            );
            run_workflow(ui, args, origin, destination, authoring, origin_files, options)
        }
        (Endpoint::Folder(origin_path), Endpoint::Folder(destination_path)) => {
            let origin = FolderOrigin::new(origin_path);
            let destination = FolderDestination::new(destination_path);
            run_workflow(ui, args, origin, destination, authoring, origin_files, options)
        }
    }
}

fn run_workflow<O, D>(
    ui: &Ui,
    args: &MigrateArgs,
    origin: O,
    destination: D,
    authoring: Authoring,
    origin_files: FileGlob,
    options: WorkflowOptions,
) -> Result<(), CommandError>
where
    O: Origin,
    D: Destination<O::Rev>,
{
    let workflow = Workflow::new(
        args.name.as_str(),
        origin,
        destination,
        authoring,
        args.mode.into(),
    )
    .with_origin_files(origin_files)
    .with_options(options);
    workflow.run(args.reference.as_deref(), ui)?;
    Ok(())
}
