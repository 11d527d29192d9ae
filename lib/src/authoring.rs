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

//! Authorship policy.
//!
//! Destinations stamp each produced commit with an author. The policy decides
//! whether the upstream author of an origin change is carried over or
//! replaced with a configured default.

use std::collections::BTreeSet;
use std::fmt;

use crate::error::MigrateError;
use crate::error::MigrateResult;

/// A commit author as `Name <email>`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Author {
    name: String,
    email: String,
}

impl Author {
    /// Creates an author from its parts.
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }

    /// Parses the standard `Name <email>` form.
    pub fn parse(text: &str) -> MigrateResult<Self> {
        let text = text.trim();
        let open = text.find('<');
        let close = text.rfind('>');
        match (open, close) {
            (Some(open), Some(close)) if open < close && close == text.len() - 1 => {
                let name = text[..open].trim();
                let email = text[open + 1..close].trim();
                if name.is_empty() || email.is_empty() {
                    return Err(MigrateError::validation(format!(
                        "Invalid author '{text}': expected 'Name <email>'"
                    )));
                }
                Ok(Self::new(name, email))
            }
            _ => Err(MigrateError::validation(format!(
                "Invalid author '{text}': expected 'Name <email>'"
            ))),
        }
    }

    /// The author's display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The author's email address.
    pub fn email(&self) -> &str {
        &self.email
    }
}

impl fmt::Display for Author {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <{}>", self.name, self.email)
    }
}

/// How upstream authors map to destination authors.
#[derive(Clone, Debug)]
pub enum AuthoringMode {
    /// Carry the upstream author through unchanged.
    PassThru,
    /// Always stamp the default author.
    UseDefault,
    /// Carry upstream authors whose email is on the list; default otherwise.
    Allowed(BTreeSet<String>),
}

/// The authoring policy for a migration: a default author plus a mapping
/// mode for upstream authors.
#[derive(Clone, Debug)]
pub struct Authoring {
    default_author: Author,
    mode: AuthoringMode,
}

impl Authoring {
    /// Creates a policy with the given default author and mode.
    pub fn new(default_author: Author, mode: AuthoringMode) -> Self {
        Self {
            default_author,
            mode,
        }
    }

    /// Shorthand for a pass-through policy.
    pub fn pass_thru(default_author: Author) -> Self {
        Self::new(default_author, AuthoringMode::PassThru)
    }

    /// The author used when an upstream author is not allowed, and the only
    /// author squash imports ever use.
    pub fn default_author(&self) -> &Author {
        &self.default_author
    }

    /// Whether the policy lets this upstream author through.
    pub fn allows(&self, author: &Author) -> bool {
        match &self.mode {
            AuthoringMode::PassThru => true,
            AuthoringMode::UseDefault => false,
            AuthoringMode::Allowed(emails) => emails.contains(author.email()),
        }
    }

    /// The destination author for a change with the given upstream author.
    pub fn resolve(&self, author: &Author) -> Author {
        if self.allows(author) {
            author.clone()
        } else {
            self.default_author.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_author() -> Author {
        Author::new("Migration Bot", "bot@example.com")
    }

    #[test]
    fn test_parse_roundtrip() {
        let author = Author::parse("Foo Bar <foo@example.com>").unwrap();
        assert_eq!(author.name(), "Foo Bar");
        assert_eq!(author.email(), "foo@example.com");
        assert_eq!(author.to_string(), "Foo Bar <foo@example.com>");
    }

    #[test]
    fn test_parse_rejects_missing_email() {
        assert!(Author::parse("Foo Bar").is_err());
        assert!(Author::parse("<foo@example.com>").is_err());
        assert!(Author::parse("Foo Bar <>").is_err());
    }

    #[test]
    fn test_pass_thru_keeps_upstream() {
        let authoring = Authoring::pass_thru(default_author());
        let upstream = Author::new("Up Stream", "up@example.com");
        assert_eq!(authoring.resolve(&upstream), upstream);
    }

    #[test]
    fn test_use_default_replaces_upstream() {
        let authoring = Authoring::new(default_author(), AuthoringMode::UseDefault);
        let upstream = Author::new("Up Stream", "up@example.com");
        assert_eq!(authoring.resolve(&upstream), default_author());
    }

    #[test]
    fn test_allow_list_filters_by_email() {
        let emails = ["up@example.com".to_string()].into_iter().collect();
        let authoring = Authoring::new(default_author(), AuthoringMode::Allowed(emails));
        let allowed = Author::new("Up Stream", "up@example.com");
        let denied = Author::new("Other", "other@example.com");
        assert_eq!(authoring.resolve(&allowed), allowed);
        assert_eq!(authoring.resolve(&denied), default_author());
    }
}
