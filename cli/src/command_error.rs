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

//! Command failures and their exit codes.

use ferry_lib::console::Console;
use ferry_lib::error::MigrateError;

use crate::ui::Ui;

/// Exit code for configuration and validation failures.
const EXIT_VALIDATION: u8 = 2;
/// Exit code for VCS and I/O failures.
const EXIT_REPO: u8 = 3;
/// Exit code for runs that had nothing to migrate.
const EXIT_NO_OP: u8 = 4;
/// Exit code after cooperative cancellation (128 + SIGINT).
const EXIT_CANCELLED: u8 = 130;

/// A failure to report to the user, with an optional hint and the process
/// exit code it maps to.
#[derive(Debug)]
pub struct CommandError {
    message: String,
    hint: Option<String>,
    exit_code: u8,
}

impl CommandError {
    /// A user-caused error (bad arguments, bad configuration).
    pub fn user_error(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            hint: None,
            exit_code: EXIT_VALIDATION,
        }
    }

    /// Attaches a hint shown under the error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    /// The process exit code for this failure.
    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }

    /// Prints the error (and hint) through the terminal UI.
    pub fn report(&self, ui: &Ui) {
        ui.error(&self.message);
        if let Some(hint) = &self.hint {
            ui.info(&format!("Hint: {hint}"));
        }
    }
}

impl From<MigrateError> for CommandError {
    fn from(error: MigrateError) -> Self {
        let exit_code = match &error {
            MigrateError::Validation { .. } | MigrateError::CannotResolveRevision { .. } => {
                EXIT_VALIDATION
            }
            MigrateError::Repo { .. } => EXIT_REPO,
            MigrateError::EmptyChange { .. } => EXIT_NO_OP,
            MigrateError::ChangeRejected { .. } => 1,
            MigrateError::Cancelled => EXIT_CANCELLED,
        };
        Self {
            message: error.to_string(),
            hint: None,
            exit_code,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_by_kind() {
        let validation: CommandError = MigrateError::validation("bad").into();
        assert_eq!(validation.exit_code(), 2);
        let repo: CommandError = MigrateError::repo("io").into();
        assert_eq!(repo.exit_code(), 3);
        let empty: CommandError = MigrateError::empty_change("nothing").into();
        assert_eq!(empty.exit_code(), 4);
        let cancelled: CommandError = MigrateError::Cancelled.into();
        assert_eq!(cancelled.exit_code(), 130);
    }
}
