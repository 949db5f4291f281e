// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! In-memory backend implementation.
//!
//! Entries live in a `BTreeMap` ordered by [`Key`]. Because descendants of a key
//! sort directly after it, clearing a subtree is a range scan rather than a walk
//! over the whole map.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::SystemTime;

use hoard_tier::{CacheBackend, Entry, Key, Result};
use parking_lot::RwLock;

/// An in-process cache backend.
///
/// The map is owned by the instance; clones share it, separately constructed
/// backends never do. Expired entries are returned by [`get`](CacheBackend::get)
/// until [`purge`](CacheBackend::purge) removes them, leaving TTL decisions to the
/// caller like every other backend.
///
/// # Examples
///
/// ```
/// use hoard_memory::EphemeralBackend;
/// use hoard_tier::{CacheBackend, Entry, Key};
///
/// let backend = EphemeralBackend::new();
/// backend.store(&Key::new(["key"]), &Entry::new(42)).unwrap();
/// assert_eq!(backend.len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct EphemeralBackend {
    entries: Arc<RwLock<BTreeMap<Key, Entry>>>,
}

impl EphemeralBackend {
    /// Creates a new empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored entries, including expired ones not yet purged.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns `true` if no entries are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl CacheBackend for EphemeralBackend {
    fn get(&self, key: &Key) -> Result<Option<Entry>> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn store(&self, key: &Key, entry: &Entry) -> Result<()> {
        key.ensure_item()?;
        self.entries.write().insert(key.clone(), entry.clone());
        Ok(())
    }

    fn clear(&self, key: Option<&Key>) -> Result<()> {
        let mut entries = self.entries.write();
        match key {
            Some(prefix) if !prefix.is_root() => {
                let doomed: Vec<Key> = entries
                    .range(prefix..)
                    .map(|(k, _)| k)
                    .take_while(|k| prefix.is_ancestor_of(k))
                    .cloned()
                    .collect();
                for k in &doomed {
                    entries.remove(k);
                }
                tracing::trace!(key = %prefix, removed = doomed.len(), "cleared ephemeral subtree");
            }
            _ => entries.clear(),
        }
        Ok(())
    }

    fn purge(&self) -> Result<()> {
        let now = SystemTime::now();
        self.entries.write().retain(|_, entry| !entry.is_expired_at(now));
        Ok(())
    }
}
