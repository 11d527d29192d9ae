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

//! The user-facing diagnostic channel.
//!
//! The engine never writes to stdout/stderr directly; it reports through an
//! injected [`Console`]. Terminal and test implementations live outside the
//! engine. Non-interactive diagnostics go through `tracing` instead.

use crate::error::MigrateResult;

/// Sink for user-facing messages and confirmations during a run.
pub trait Console {
    /// Report a status message.
    fn info(&self, message: &str);

    /// Report a warning.
    fn warn(&self, message: &str);

    /// Report an error. The run usually terminates right after.
    fn error(&self, message: &str);

    /// Ask a yes/no question. `Ok(true)` means the user wants to proceed.
    fn prompt_confirmation(&self, question: &str) -> MigrateResult<bool>;
}

/// A console wrapper that prefixes every message with a fixed string.
///
/// The iterative workflow uses this to tag per-change output with
/// `"Change N of M (rev): "`. Prompts pass through unprefixed so the
/// question is easy to spot.
pub struct PrefixConsole<'a> {
    prefix: String,
    inner: &'a dyn Console,
}

impl<'a> PrefixConsole<'a> {
    /// Wraps `inner`, prepending `prefix` to each message.
    pub fn new(prefix: impl Into<String>, inner: &'a dyn Console) -> Self {
        Self {
            prefix: prefix.into(),
            inner,
        }
    }
}

impl Console for PrefixConsole<'_> {
    fn info(&self, message: &str) {
        self.inner.info(&format!("{}{}", self.prefix, message));
    }

    fn warn(&self, message: &str) {
        self.inner.warn(&format!("{}{}", self.prefix, message));
    }

    fn error(&self, message: &str) {
        self.inner.error(&format!("{}{}", self.prefix, message));
    }

    fn prompt_confirmation(&self, question: &str) -> MigrateResult<bool> {
        self.inner.prompt_confirmation(question)
    }
}
