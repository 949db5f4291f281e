// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::Error;

/// A hierarchical cache key.
///
/// A key is an ordered sequence of path segments. Keys form a tree: `a/b` is an
/// ancestor of `a/b/c`, and clearing an ancestor invalidates all of its
/// descendants. The empty key ([`Key::root`]) is the ancestor of every key and
/// addresses the whole cache.
///
/// Keys order lexicographically by segment, so all descendants of a key sort
/// directly after it. Ordered backends use this to clear a subtree with a single
/// range scan.
///
/// # Examples
///
/// ```
/// use hoard_tier::Key;
///
/// let parent: Key = "users/42".parse().unwrap();
/// let child = parent.child("profile");
///
/// assert!(parent.is_ancestor_of(&child));
/// assert!(!child.is_ancestor_of(&parent));
/// assert_eq!(child.to_string(), "users/42/profile");
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Key(Vec<String>);

impl Key {
    /// Creates a key from its segments.
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    /// Returns the root key, which has no segments.
    #[must_use]
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Returns the segments of this key.
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Returns the number of segments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if this is the root key.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns `true` if `self` is a prefix of `other`.
    ///
    /// A key is its own ancestor, and the root is the ancestor of every key.
    #[must_use]
    pub fn is_ancestor_of(&self, other: &Self) -> bool {
        other.0.starts_with(&self.0)
    }

    /// Returns a new key with `segment` appended.
    #[must_use]
    pub fn child(&self, segment: impl Into<String>) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment.into());
        Self(segments)
    }

    /// Returns the parent key, or `None` for the root.
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        let (_, parent) = self.0.split_last()?;
        Some(Self(parent.to_vec()))
    }

    /// Checks that this key can address an individual entry.
    ///
    /// Entries cannot be stored at the root, which denotes the entire cache.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidKey`] for the root key.
    pub fn ensure_item(&self) -> Result<(), Error> {
        if self.is_root() {
            Err(Error::InvalidKey("the root key addresses the whole cache, not an entry".to_owned()))
        } else {
            Ok(())
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("/"))
    }
}

impl<S: Into<String>> FromIterator<S> for Key {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter)
    }
}

/// Error returned when parsing a [`Key`] from a path with an empty segment.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("key path {path:?} contains an empty segment")]
pub struct ParseKeyError {
    path: String,
}

impl FromStr for Key {
    type Err = ParseKeyError;

    /// Parses a `/`-separated path. Leading and trailing slashes are ignored and
    /// an empty path is the root.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim_matches('/');
        if trimmed.is_empty() {
            return Ok(Self::root());
        }

        trimmed
            .split('/')
            .map(|segment| {
                if segment.is_empty() {
                    Err(ParseKeyError { path: s.to_owned() })
                } else {
                    Ok(segment.to_owned())
                }
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }
}
