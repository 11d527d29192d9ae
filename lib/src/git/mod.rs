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

//! Git endpoints.
//!
//! Both ends drive a `git` subprocess over a bare cache repository per
//! remote URL. The cache is shared across runs in the same process and
//! guarded by a per-URL critical section.
//!
//! - [`GitOrigin`] reads history and trees from a git remote;
//! - [`GitDestination`] writes commits and records the origin revision as a
//!   message trailer, which later runs (and other migrations) read back.

mod destination;
mod origin;
mod repository;

pub use self::destination::GitDestination;
pub use self::origin::GitOrigin;
pub use self::origin::GitRevision;
pub use self::repository::GitRepository;

/// The label under which git-based migrations record origin revisions.
pub const GIT_ORIGIN_REV_ID: &str = "GitOrigin-RevId";
