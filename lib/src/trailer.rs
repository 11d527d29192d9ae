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

//! Commit-message trailers.
//!
//! Migrations track provenance with Git-compatible trailers in commit
//! messages:
//!
//! ```text
//! Commit message here
//!
//! GitOrigin-RevId: abc123...
//! ```
//!
//! A trailer block is the final paragraph of a message, and only counts as
//! one when every line in that paragraph has the `Key: value` shape. This
//! keeps ordinary prose paragraphs out of the label set.

/// One `Key: value` line from a trailer block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Trailer {
    /// The trailer key, e.g. `GitOrigin-RevId`.
    pub key: String,
    /// The trailer value with surrounding whitespace trimmed.
    pub value: String,
}

/// Parses the trailer block of a commit message.
///
/// Returns the trailers in message order, or an empty vector when the final
/// paragraph is not a trailer block.
pub fn parse_message_trailers(message: &str) -> Vec<Trailer> {
    let trimmed = message.trim_end();
    if trimmed.is_empty() {
        return Vec::new();
    }
    let last_paragraph = match trimmed.rsplit_once("\n\n") {
        Some((_, paragraph)) => paragraph,
        None => trimmed,
    };

    let mut trailers = Vec::new();
    for line in last_paragraph.lines() {
        match parse_trailer_line(line) {
            Some(trailer) => trailers.push(trailer),
            None => return Vec::new(),
        }
    }
    trailers
}

fn parse_trailer_line(line: &str) -> Option<Trailer> {
    let (key, value) = line.split_once(':')?;
    if key.is_empty()
        || !key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return None;
    }
    Some(Trailer {
        key: key.to_string(),
        value: value.trim().to_string(),
    })
}

/// Appends a trailer to a commit message.
///
/// Ensures a blank line separates the body from the trailer block. Appending
/// to a message that already ends in a trailer block extends the block
/// instead of opening a new paragraph.
pub fn append_trailer(message: &str, key: &str, value: &str) -> String {
    let line = format!("{key}: {value}");
    let body = message.trim_end();
    if body.is_empty() {
        return format!("{line}\n");
    }
    if parse_message_trailers(body).is_empty() {
        format!("{body}\n\n{line}\n")
    } else {
        format!("{body}\n{line}\n")
    }
}
