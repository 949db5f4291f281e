// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::Value;

/// A cached value with its expiration.
///
/// `Entry` is the unit of storage: the data plus an absolute expiration
/// timestamp. An entry without an expiration never expires.
///
/// Backends keep their own copy once `store` returns; callers should not rely
/// on anything but value equality surviving a round trip through a backend
/// that serializes.
///
/// # Examples
///
/// ```
/// use std::time::{Duration, SystemTime};
/// use hoard_tier::Entry;
///
/// // Entry that never expires
/// let entry = Entry::new(42);
/// assert!(entry.expiration().is_none());
///
/// // Entry with an absolute expiration
/// let expires = SystemTime::now() + Duration::from_secs(60);
/// let entry = Entry::with_expiration("data", expires);
/// assert_eq!(entry.expiration(), Some(expires));
/// assert!(!entry.is_expired_at(SystemTime::now()));
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    data: Value,
    expiration: Option<SystemTime>,
}

impl Entry {
    /// Creates an entry that never expires.
    pub fn new(data: impl Into<Value>) -> Self {
        Self {
            data: data.into(),
            expiration: None,
        }
    }

    /// Creates an entry that expires at `expiration`.
    pub fn with_expiration(data: impl Into<Value>, expiration: SystemTime) -> Self {
        Self {
            data: data.into(),
            expiration: Some(expiration),
        }
    }

    /// Creates an entry from its parts.
    ///
    /// This is typically used when recreating entries from persistent storage.
    #[must_use]
    pub fn from_parts(data: Value, expiration: Option<SystemTime>) -> Self {
        Self { data, expiration }
    }

    /// Returns a reference to the cached data.
    #[must_use]
    pub fn data(&self) -> &Value {
        &self.data
    }

    /// Consumes the entry and returns the inner data.
    #[must_use]
    pub fn into_data(self) -> Value {
        self.data
    }

    /// Returns the expiration timestamp, if any.
    #[must_use]
    pub fn expiration(&self) -> Option<SystemTime> {
        self.expiration
    }

    /// Returns `true` if the expiration has passed at `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: SystemTime) -> bool {
        self.expiration.is_some_and(|expiration| expiration <= now)
    }
}
