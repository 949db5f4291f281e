// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The core trait for cache storage backends.
//!
//! [`CacheBackend`] defines the interface that all storage engines must implement.
//! This trait is designed for composition: implement the storage operations,
//! then use `hoard` to combine backends into multi-tier caches.

use std::fmt::Debug;
use std::sync::Arc;

use crate::{Entry, Key, Result};

/// Trait for cache backend implementations.
///
/// A backend is long-lived: one instance serves many interleaved calls for
/// different keys, possibly from several threads, so implementations must not
/// keep per-call state between calls and must not share state through statics.
///
/// All four storage methods are required. Only [`is_available`](Self::is_available)
/// has a default implementation, which reports the backend as usable.
///
/// # Error policy
///
/// - `get` returns `Ok(None)` for an absent, expired-and-swept or unreadable entry;
///   it errors only when the storage itself fails.
/// - `store`, `clear` and `purge` report storage failures as errors so that
///   multi-tier strategies can carry on with the remaining tiers.
/// - `is_available` never errors or panics.
pub trait CacheBackend: Send + Sync + Debug {
    /// Returns the entry stored at exactly `key`, or `None` on a miss.
    fn get(&self, key: &Key) -> Result<Option<Entry>>;

    /// Stores `entry` at `key`, replacing any previous entry at that key.
    ///
    /// Storing at the root key is a contract violation and fails with
    /// [`Error::InvalidKey`](crate::Error::InvalidKey).
    fn store(&self, key: &Key, entry: &Entry) -> Result<()>;

    /// Removes the entry at `key` and every entry beneath it.
    ///
    /// `None` clears the whole backend, as does the root key. Succeeds even if
    /// nothing matched.
    fn clear(&self, key: Option<&Key>) -> Result<()>;

    /// Removes entries whose expiration has passed.
    ///
    /// This is a best-effort sweep. Backends whose storage expires entries on its
    /// own may implement it as a no-op.
    fn purge(&self) -> Result<()>;

    /// Returns `true` if the backend can currently be used.
    fn is_available(&self) -> bool {
        true
    }
}

impl<B: CacheBackend + ?Sized> CacheBackend for Arc<B> {
    fn get(&self, key: &Key) -> Result<Option<Entry>> {
        (**self).get(key)
    }

    fn store(&self, key: &Key, entry: &Entry) -> Result<()> {
        (**self).store(key, entry)
    }

    fn clear(&self, key: Option<&Key>) -> Result<()> {
        (**self).clear(key)
    }

    fn purge(&self) -> Result<()> {
        (**self).purge()
    }

    fn is_available(&self) -> bool {
        (**self).is_available()
    }
}

impl<B: CacheBackend + ?Sized> CacheBackend for Box<B> {
    fn get(&self, key: &Key) -> Result<Option<Entry>> {
        (**self).get(key)
    }

    fn store(&self, key: &Key, entry: &Entry) -> Result<()> {
        (**self).store(key, entry)
    }

    fn clear(&self, key: Option<&Key>) -> Result<()> {
        (**self).clear(key)
    }

    fn purge(&self) -> Result<()> {
        (**self).purge()
    }

    fn is_available(&self) -> bool {
        (**self).is_available()
    }
}
