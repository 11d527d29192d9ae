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

//! Terminal implementation of the engine console.
//!
//! Status output goes to stderr so stdout stays scriptable. Prompts read a
//! line from stdin and default to "no".

use std::io::BufRead as _;
use std::io::Write as _;

use ferry_lib::console::Console;
use ferry_lib::error::MigrateError;
use ferry_lib::error::MigrateResult;

/// The terminal UI.
#[derive(Default)]
pub struct Ui {}

impl Ui {
    /// Creates the terminal UI.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Console for Ui {
    fn info(&self, message: &str) {
        eprintln!("{message}");
    }

    fn warn(&self, message: &str) {
        eprintln!("Warning: {message}");
    }

    fn error(&self, message: &str) {
        eprintln!("Error: {message}");
    }

    fn prompt_confirmation(&self, question: &str) -> MigrateResult<bool> {
        let mut stderr = std::io::stderr();
        write!(stderr, "{question} [y/N]: ")
            .and_then(|()| stderr.flush())
            .map_err(|e| MigrateError::repo_with("cannot write prompt", e))?;

        let mut answer = String::new();
        std::io::stdin()
            .lock()
            .read_line(&mut answer)
            .map_err(|e| MigrateError::repo_with("cannot read prompt answer", e))?;
        let answer = answer.trim().to_ascii_lowercase();
        Ok(answer == "y" || answer == "yes")
    }
}
