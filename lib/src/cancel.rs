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

//! Cooperative cancellation.
//!
//! A workflow invocation is a single logical thread of control, but every
//! operation that touches an origin, a destination, or the console may block
//! on I/O. Those suspension points check a shared [`CancellationSignal`] and
//! surface [`MigrateError::Cancelled`] so the remainder of the workflow is
//! skipped cleanly.

use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use crate::error::MigrateError;
use crate::error::MigrateResult;

/// A cloneable process-wide cancellation flag.
///
/// Clones share the same underlying flag; tripping any clone trips them all.
#[derive(Clone, Debug, Default)]
pub struct CancellationSignal {
    cancelled: Arc<AtomicBool>,
}

impl CancellationSignal {
    /// Creates a signal in the not-cancelled state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation. Idempotent.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Fails with [`MigrateError::Cancelled`] if cancellation was requested.
    pub fn check(&self) -> MigrateResult<()> {
        if self.is_cancelled() {
            Err(MigrateError::Cancelled)
        } else {
            Ok(())
        }
    }
}
