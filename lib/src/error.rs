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

//! Failure taxonomy for migrations.
//!
//! Every fallible engine operation returns [`MigrateError`]. The variants are
//! failure *kinds*, not per-module types: callers dispatch on the kind to
//! decide whether a failure is terminal, retryable, or demotable to a warning
//! under `--force`.

use std::error::Error as StdError;

use thiserror::Error;

/// Result type for engine operations.
pub type MigrateResult<T> = Result<T, MigrateError>;

/// Errors produced by migration workflows and the endpoints they drive.
#[derive(Debug, Error)]
pub enum MigrateError {
    /// Configuration or repository state prohibits the operation.
    #[error("{message}")]
    Validation {
        /// Description of what prohibits the operation.
        message: String,
    },

    /// The computation produced no change to write to the destination.
    #[error("{message}")]
    EmptyChange {
        /// Description of why the migration is empty.
        message: String,
    },

    /// The user declined an interactive prompt.
    #[error("{message}")]
    ChangeRejected {
        /// Description of the rejected step.
        message: String,
    },

    /// A reference did not resolve in the version control system.
    #[error("cannot resolve revision: {message}")]
    CannotResolveRevision {
        /// The reference and the reason it did not resolve.
        message: String,
    },

    /// External VCS, network, or I/O failure.
    #[error("repository error: {message}")]
    Repo {
        /// Description of the failed operation.
        message: String,
        /// The underlying failure, when one exists.
        #[source]
        source: Option<Box<dyn StdError + Send + Sync + 'static>>,
    },

    /// Cooperative cancellation was observed at a suspension point.
    #[error("operation cancelled")]
    Cancelled,
}

impl MigrateError {
    /// A [`MigrateError::Validation`] with the given message.
    pub fn validation(message: impl Into<String>) -> Self {
        MigrateError::Validation {
            message: message.into(),
        }
    }

    /// A [`MigrateError::EmptyChange`] with the given message.
    pub fn empty_change(message: impl Into<String>) -> Self {
        MigrateError::EmptyChange {
            message: message.into(),
        }
    }

    /// A [`MigrateError::ChangeRejected`] with the given message.
    pub fn rejected(message: impl Into<String>) -> Self {
        MigrateError::ChangeRejected {
            message: message.into(),
        }
    }

    /// A [`MigrateError::CannotResolveRevision`] with the given message.
    pub fn cannot_resolve(message: impl Into<String>) -> Self {
        MigrateError::CannotResolveRevision {
            message: message.into(),
        }
    }

    /// A [`MigrateError::Repo`] with no underlying source.
    pub fn repo(message: impl Into<String>) -> Self {
        MigrateError::Repo {
            message: message.into(),
            source: None,
        }
    }

    /// A [`MigrateError::Repo`] wrapping an underlying failure.
    pub fn repo_with(
        message: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        MigrateError::Repo {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

/// Fails with a [`MigrateError::Validation`] unless `condition` holds.
pub fn check_condition(condition: bool, message: impl Into<String>) -> MigrateResult<()> {
    if condition {
        Ok(())
    } else {
        Err(MigrateError::validation(message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_condition_passes() {
        assert!(check_condition(true, "unused").is_ok());
    }

    #[test]
    fn test_check_condition_fails_with_message() {
        let err = check_condition(false, "ref must be set").unwrap_err();
        assert!(matches!(err, MigrateError::Validation { .. }));
        assert_eq!(err.to_string(), "ref must be set");
    }

    #[test]
    fn test_repo_error_keeps_source() {
        let io = std::io::Error::other("disk gone");
        let err = MigrateError::repo_with("fetch failed", io);
        assert!(err.source().is_some());
        assert_eq!(err.to_string(), "repository error: fetch failed");
    }
}
