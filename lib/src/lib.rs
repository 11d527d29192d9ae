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

//! Ferry: migrate source-code changes from one version-control repository
//! (the *origin*) to another (the *destination*).
//!
//! The engine connects an [`origin::Origin`] to a [`destination::Destination`]
//! and runs one of three strategies over them (see [`workflow`]):
//!
//! - **squash** - one destination commit with the new tree state;
//! - **iterative** - one destination commit per origin change;
//! - **change-request** - one origin tree diffed against a baseline commit
//!   already in the destination, as a review.
//!
//! Data flows one way, from origin history to selected changes to a
//! transformed tree the destination commits. The engine persists nothing of
//! its own; the last imported revision is recovered from a label the
//! destination stamps on its commits.

pub mod authoring;
pub mod cancel;
pub mod change;
pub mod console;
pub mod destination;
pub mod error;
pub mod folder;
pub mod git;
pub mod glob;
pub mod graph;
pub mod origin;
pub mod trailer;
pub mod transform;
pub mod tree;
pub mod workflow;
