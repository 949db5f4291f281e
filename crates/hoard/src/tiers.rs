// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt;
use std::sync::Arc;

use hoard_tier::{CacheBackend, Error, Result};

/// An ordered set of named backends.
///
/// Names are unique. Iteration follows insertion order. Strategies address
/// tiers by name and never modify the set.
///
/// # Examples
///
/// ```
/// use hoard::{EphemeralBackend, Tiers};
///
/// let mut tiers = Tiers::new();
/// tiers.insert("memory", EphemeralBackend::new()).unwrap();
/// assert!(tiers.insert("memory", EphemeralBackend::new()).is_err());
/// assert_eq!(tiers.names().collect::<Vec<_>>(), ["memory"]);
/// ```
#[derive(Clone, Default)]
pub struct Tiers {
    tiers: Vec<(String, Arc<dyn CacheBackend>)>,
}

impl Tiers {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a backend under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `name` is already taken.
    pub fn insert(&mut self, name: impl Into<String>, backend: impl CacheBackend + 'static) -> Result<()> {
        self.insert_shared(name.into(), Arc::new(backend))
    }

    pub(crate) fn insert_shared(&mut self, name: String, backend: Arc<dyn CacheBackend>) -> Result<()> {
        if self.contains(&name) {
            return Err(Error::config(format!("tier `{name}` is registered more than once")));
        }
        self.tiers.push((name, backend));
        Ok(())
    }

    /// Returns the backend registered under `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&dyn CacheBackend> {
        self.tiers
            .iter()
            .find(|(tier, _)| tier == name)
            .map(|(_, backend)| backend.as_ref())
    }

    /// Returns `true` if a backend is registered under `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Returns the tier names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tiers.iter().map(|(name, _)| name.as_str())
    }

    /// Returns the tiers in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &dyn CacheBackend)> {
        self.tiers.iter().map(|(name, backend)| (name.as_str(), backend.as_ref()))
    }

    /// Returns the number of tiers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tiers.len()
    }

    /// Returns `true` if no tier is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tiers.is_empty()
    }

    /// Checks that every name in `names` is registered.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] naming the first unknown tier.
    pub fn require<'a>(&self, names: impl IntoIterator<Item = &'a str>) -> Result<()> {
        match names.into_iter().find(|name| !self.contains(name)) {
            Some(unknown) => Err(Error::config(format!("strategy references unknown tier `{unknown}`"))),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for Tiers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.tiers.iter().map(|(name, backend)| (name, backend))).finish()
    }
}
