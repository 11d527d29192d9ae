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

//! The transformation seam.
//!
//! Between checking out an origin revision and writing to the destination,
//! the workflow hands the tree to a [`Transformation`]. The full rewrite
//! pipeline (renames, scrubbing, templating) lives outside the engine; the
//! engine only guarantees when the seam runs and what it may touch: the
//! checked-out tree and the destination metadata.

use std::path::Path;

use crate::change::Metadata;
use crate::change::Revision;
use crate::console::Console;
use crate::destination::ComputedChanges;
use crate::error::MigrateResult;

/// What a transformation sees: the checked-out tree, the metadata that will
/// be stamped on the destination commit, and the change context.
pub struct TransformContext<'a, R: Revision> {
    work_dir: &'a Path,
    metadata: &'a mut Metadata,
    changes: &'a ComputedChanges<R>,
}

impl<'a, R: Revision> TransformContext<'a, R> {
    /// Creates a context over a checked-out tree.
    pub fn new(
        work_dir: &'a Path,
        metadata: &'a mut Metadata,
        changes: &'a ComputedChanges<R>,
    ) -> Self {
        Self {
            work_dir,
            metadata,
            changes,
        }
    }

    /// The tree being transformed, free to mutate in place.
    pub fn work_dir(&self) -> &Path {
        self.work_dir
    }

    /// The metadata that will be stamped on the destination commit.
    pub fn metadata(&self) -> &Metadata {
        self.metadata
    }

    /// Mutable access for transformations that rewrite messages or authors.
    pub fn metadata_mut(&mut self) -> &mut Metadata {
        self.metadata
    }

    /// The changes being migrated and those already migrated in this run.
    pub fn changes(&self) -> &ComputedChanges<R> {
        self.changes
    }
}

/// A tree-to-tree rewrite applied before every destination write.
pub trait Transformation<R: Revision>: Send + Sync {
    /// Rewrites the tree and/or metadata in place.
    fn transform(
        &self,
        ctx: &mut TransformContext<'_, R>,
        console: &dyn Console,
    ) -> MigrateResult<()>;
}

/// The identity transformation: the destination receives the origin tree
/// unchanged.
#[derive(Clone, Copy, Debug, Default)]
pub struct Identity;

impl<R: Revision> Transformation<R> for Identity {
    fn transform(
        &self,
        _ctx: &mut TransformContext<'_, R>,
        _console: &dyn Console,
    ) -> MigrateResult<()> {
        Ok(())
    }
}
