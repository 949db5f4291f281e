// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Mock backend implementation for testing.
//!
//! This module provides `MockBackend`, a configurable in-memory backend that
//! records all operations and supports failure injection for testing error paths.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::SystemTime;

use parking_lot::Mutex;

use crate::{CacheBackend, Entry, Error, Key, Result};

/// Recorded backend operation with full context.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendOp {
    /// A get operation was performed with the given key.
    Get(Key),
    /// A store operation was performed with the given key and entry.
    Store {
        /// The key that was stored.
        key: Key,
        /// The entry that was stored.
        entry: Entry,
    },
    /// A clear operation was performed, for a subtree or for everything.
    Clear(Option<Key>),
    /// A purge operation was performed.
    Purge,
}

type FailPredicate = Box<dyn Fn(&BackendOp) -> bool + Send + Sync>;

/// A configurable mock backend for testing.
///
/// This backend stores entries in memory, honors subtree clears like a real
/// backend, and can be configured to fail operations on demand. All operations
/// are recorded for later verification. Clones share the same state.
///
/// # Examples
///
/// ```
/// use hoard_tier::{testing::{MockBackend, BackendOp}, CacheBackend, Entry, Key};
///
/// let backend = MockBackend::new();
/// let key = Key::new(["key"]);
///
/// backend.store(&key, &Entry::new(42)).unwrap();
/// assert_eq!(backend.get(&key).unwrap(), Some(Entry::new(42)));
///
/// assert_eq!(backend.operations(), vec![
///     BackendOp::Store { key: key.clone(), entry: Entry::new(42) },
///     BackendOp::Get(key),
/// ]);
/// ```
///
/// # Failure Injection
///
/// ```
/// use hoard_tier::{testing::{MockBackend, BackendOp}, CacheBackend, Entry, Key};
///
/// let backend = MockBackend::new();
///
/// // Fail only stores below a specific key
/// let forbidden = Key::new(["forbidden"]);
/// backend.fail_when(move |op| matches!(op, BackendOp::Store { key, .. } if forbidden.is_ancestor_of(key)));
/// assert!(backend.store(&Key::new(["forbidden", "x"]), &Entry::new(1)).is_err());
/// assert!(backend.store(&Key::new(["allowed"]), &Entry::new(1)).is_ok());
/// ```
pub struct MockBackend {
    data: Arc<Mutex<BTreeMap<Key, Entry>>>,
    operations: Arc<Mutex<Vec<BackendOp>>>,
    fail_when: Arc<Mutex<Option<FailPredicate>>>,
    available: Arc<AtomicBool>,
}

impl std::fmt::Debug for MockBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockBackend")
            .field("data", &self.data)
            .field("operations", &self.operations)
            .field("fail_when", &self.fail_when.lock().is_some())
            .field("available", &self.available.load(Ordering::Relaxed))
            .finish()
    }
}

impl Clone for MockBackend {
    fn clone(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
            operations: Arc::clone(&self.operations),
            fail_when: Arc::clone(&self.fail_when),
            available: Arc::clone(&self.available),
        }
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBackend {
    /// Creates a new empty mock backend.
    #[must_use]
    pub fn new() -> Self {
        Self::with_data(BTreeMap::new())
    }

    /// Creates a mock backend with pre-populated data.
    #[must_use]
    pub fn with_data(data: BTreeMap<Key, Entry>) -> Self {
        Self {
            data: Arc::new(Mutex::new(data)),
            operations: Arc::new(Mutex::new(Vec::new())),
            fail_when: Arc::new(Mutex::new(None)),
            available: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Returns the number of stored entries.
    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.data.lock().len()
    }

    /// Returns true if an entry is stored at exactly `key`.
    ///
    /// This inspects the data directly and is not recorded as an operation.
    #[must_use]
    pub fn contains_key(&self, key: &Key) -> bool {
        self.data.lock().contains_key(key)
    }

    /// Sets a predicate that determines when operations should fail.
    ///
    /// The predicate receives the operation and returns `true` if it should fail.
    /// Failed operations are still recorded but leave the data untouched.
    pub fn fail_when<F>(&self, predicate: F)
    where
        F: Fn(&BackendOp) -> bool + Send + Sync + 'static,
    {
        *self.fail_when.lock() = Some(Box::new(predicate));
    }

    /// Clears the failure predicate, allowing all operations to succeed.
    pub fn clear_failures(&self) {
        *self.fail_when.lock() = None;
    }

    /// Sets the value reported by [`CacheBackend::is_available`].
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::Relaxed);
    }

    /// Returns a clone of all recorded operations.
    #[must_use]
    pub fn operations(&self) -> Vec<BackendOp> {
        self.operations.lock().clone()
    }

    /// Clears all recorded operations.
    pub fn clear_operations(&self) {
        self.operations.lock().clear();
    }

    fn check(&self, op: BackendOp, what: &'static str) -> Result<()> {
        let fail = self.fail_when.lock().as_ref().is_some_and(|predicate| predicate(&op));
        self.operations.lock().push(op);
        if fail {
            Err(Error::backend(format!("mock: {what} failed")))
        } else {
            Ok(())
        }
    }
}

impl CacheBackend for MockBackend {
    fn get(&self, key: &Key) -> Result<Option<Entry>> {
        self.check(BackendOp::Get(key.clone()), "get")?;
        Ok(self.data.lock().get(key).cloned())
    }

    fn store(&self, key: &Key, entry: &Entry) -> Result<()> {
        key.ensure_item()?;
        self.check(
            BackendOp::Store {
                key: key.clone(),
                entry: entry.clone(),
            },
            "store",
        )?;
        self.data.lock().insert(key.clone(), entry.clone());
        Ok(())
    }

    fn clear(&self, key: Option<&Key>) -> Result<()> {
        self.check(BackendOp::Clear(key.cloned()), "clear")?;
        let mut data = self.data.lock();
        match key {
            Some(prefix) if !prefix.is_root() => data.retain(|k, _| !prefix.is_ancestor_of(k)),
            _ => data.clear(),
        }
        Ok(())
    }

    fn purge(&self) -> Result<()> {
        self.check(BackendOp::Purge, "purge")?;
        let now = SystemTime::now();
        self.data.lock().retain(|_, entry| !entry.is_expired_at(now));
        Ok(())
    }

    fn is_available(&self) -> bool {
        self.available.load(Ordering::Relaxed)
    }
}
