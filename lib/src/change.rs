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

//! The revision and change model.
//!
//! A [`Revision`] is an opaque commit identifier; a [`Change`] is one
//! commit's worth of metadata plus its affected file list. Both are
//! immutable: origins construct them, everything downstream only reads.

use std::fmt;

use chrono::DateTime;
use chrono::Utc;

use crate::authoring::Author;
use crate::trailer::parse_message_trailers;

/// An immutable commit-like identifier in a version control system.
///
/// The canonical string form is the identity: two revisions denote the same
/// commit iff their `as_string` values are equal. Engine code only ever
/// compares canonical forms.
pub trait Revision: Clone + fmt::Debug + Send + Sync + 'static {
    /// The canonical string form of this revision.
    fn as_string(&self) -> String;
}

/// An insertion-ordered label multimap parsed from a commit message.
///
/// A label key may carry several values; both key order and per-key value
/// order follow the message.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LabelSet {
    entries: Vec<(String, String)>,
}

impl LabelSet {
    /// Creates an empty label set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses the trailer block of `message` into a label set.
    pub fn from_message(message: &str) -> Self {
        let mut labels = Self::new();
        for trailer in parse_message_trailers(message) {
            labels.add(trailer.key, trailer.value);
        }
        labels
    }

    /// Appends a label, preserving insertion order.
    pub fn add(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.push((key.into(), value.into()));
    }

    /// The first value recorded for `key`, if any.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// All values recorded for `key`, in insertion order.
    pub fn get_all<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> {
        self.entries
            .iter()
            .filter(move |(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Whether any value is recorded for `key`.
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// All entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// One origin commit: revision, authorship, message, timestamp, labels, and
/// the list of files it touches.
#[derive(Clone, Debug)]
pub struct Change<R> {
    revision: R,
    author: Author,
    message: String,
    timestamp: DateTime<Utc>,
    labels: LabelSet,
    files: Vec<String>,
}

impl<R: Revision> Change<R> {
    /// Creates an immutable change record.
    pub fn new(
        revision: R,
        author: Author,
        message: impl Into<String>,
        timestamp: DateTime<Utc>,
        labels: LabelSet,
        files: Vec<String>,
    ) -> Self {
        Self {
            revision,
            author,
            message: message.into(),
            timestamp,
            labels,
            files,
        }
    }

    /// The revision this change describes.
    pub fn revision(&self) -> &R {
        &self.revision
    }

    /// The upstream author.
    pub fn author(&self) -> &Author {
        &self.author
    }

    /// The full commit message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The first line of the commit message.
    pub fn first_line(&self) -> &str {
        self.message.lines().next().unwrap_or("")
    }

    /// When the change was authored.
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Labels parsed from the commit message.
    pub fn labels(&self) -> &LabelSet {
        &self.labels
    }

    /// Repository-relative paths this change touches.
    pub fn files(&self) -> &[String] {
        &self.files
    }

    /// The canonical form of the revision, for display.
    pub fn ref_as_string(&self) -> String {
        self.revision.as_string()
    }
}

/// The (message, author) pair the destination stamps on a produced commit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Metadata {
    message: String,
    author: Author,
}

impl Metadata {
    /// Creates metadata from a message and an author.
    pub fn new(message: impl Into<String>, author: Author) -> Self {
        Self {
            message: message.into(),
            author,
        }
    }

    /// The destination commit message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The destination commit author.
    pub fn author(&self) -> &Author {
        &self.author
    }

    /// Replaces the message. Used by transformations that rewrite
    /// descriptions on the way through.
    pub fn set_message(&mut self, message: impl Into<String>) {
        self.message = message.into();
    }

    /// Replaces the author.
    pub fn set_author(&mut self, author: Author) {
        self.author = author;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_preserve_insertion_order() {
        let mut labels = LabelSet::new();
        labels.add("A", "1");
        labels.add("B", "2");
        labels.add("A", "3");
        let entries: Vec<_> = labels.iter().collect();
        assert_eq!(entries, [("A", "1"), ("B", "2"), ("A", "3")]);
        assert_eq!(labels.get("A"), Some("1"));
        let all: Vec<_> = labels.get_all("A").collect();
        assert_eq!(all, ["1", "3"]);
    }

    #[test]
    fn test_labels_from_message() {
        let labels = LabelSet::from_message("Msg\n\nOrigin-RevId: abc\n");
        assert!(labels.contains_key("Origin-RevId"));
        assert_eq!(labels.get("Origin-RevId"), Some("abc"));
        assert!(!labels.contains_key("Other"));
    }
}
