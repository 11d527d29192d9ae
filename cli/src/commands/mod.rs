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

mod migrate;

use clap::Parser;
use clap::Subcommand;

use self::migrate::MigrateArgs;
use self::migrate::cmd_migrate;
use crate::command_error::CommandError;
use crate::ui::Ui;

/// Migrate changes between version-control repositories.
#[derive(Parser, Debug)]
#[command(name = "ferry", version)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Clone, Debug)]
enum Command {
    /// Run a migration workflow from an origin to a destination
    Migrate(MigrateArgs),
}

pub fn run(cli: &Cli, ui: &Ui) -> Result<(), CommandError> {
    match &cli.command {
        Command::Migrate(args) => cmd_migrate(ui, args),
    }
}
