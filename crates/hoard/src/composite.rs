// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::sync::Arc;

use hoard_tier::{CacheBackend, Entry, Error, Key, Result};

use crate::{InvocationStrategy, Tiers};

/// A backend made of named tiers coordinated by an [`InvocationStrategy`].
///
/// The coordinator is itself a [`CacheBackend`], so it can be a tier of another
/// coordinator. Clearing a key always reaches every tier the strategy manages,
/// however deeply coordinators are nested.
///
/// # Examples
///
/// ```
/// use hoard::{CompositeBackend, EphemeralBackend, FallbackStrategy, FileSystemBackend};
/// use hoard_tier::{CacheBackend, Entry, Key};
///
/// let dir = tempfile::tempdir().unwrap();
/// let cache = CompositeBackend::builder()
///     .tier("memory", EphemeralBackend::new())
///     .tier("disk", FileSystemBackend::builder(dir.path()).build().unwrap())
///     .strategy(FallbackStrategy::new(["memory", "disk"]).unwrap())
///     .build()
///     .unwrap();
///
/// let key = Key::new(["sessions", "abc"]);
/// cache.store(&key, &Entry::new(true)).unwrap();
/// cache.clear(Some(&Key::new(["sessions"]))).unwrap();
/// assert_eq!(cache.get(&key).unwrap(), None);
/// ```
#[derive(Debug)]
pub struct CompositeBackend {
    tiers: Tiers,
    strategy: Box<dyn InvocationStrategy>,
}

impl CompositeBackend {
    /// Starts building a coordinator.
    #[must_use]
    pub fn builder() -> CompositeBackendBuilder {
        CompositeBackendBuilder::default()
    }

    /// Returns the tiers.
    #[must_use]
    pub fn tiers(&self) -> &Tiers {
        &self.tiers
    }
}

impl CacheBackend for CompositeBackend {
    fn get(&self, key: &Key) -> Result<Option<Entry>> {
        self.strategy.invoke_get(&self.tiers, key)
    }

    fn store(&self, key: &Key, entry: &Entry) -> Result<()> {
        key.ensure_item()?;
        self.strategy.invoke_store(&self.tiers, key, entry)
    }

    fn clear(&self, key: Option<&Key>) -> Result<()> {
        self.strategy.invoke_clear(&self.tiers, key)
    }

    fn purge(&self) -> Result<()> {
        self.strategy.invoke_purge(&self.tiers)
    }

    fn is_available(&self) -> bool {
        self.tiers.iter().all(|(_, backend)| backend.is_available())
    }
}

/// Builder for [`CompositeBackend`].
///
/// Tiers and the strategy are checked together in [`build`](Self::build).
#[derive(Debug, Default)]
pub struct CompositeBackendBuilder {
    tiers: Vec<(String, Arc<dyn CacheBackend>)>,
    strategy: Option<Box<dyn InvocationStrategy>>,
}

impl CompositeBackendBuilder {
    /// Adds a backend under `name`.
    ///
    /// Pass an `Arc` to keep a handle to a backend that has no cheap clone.
    #[must_use]
    pub fn tier(mut self, name: impl Into<String>, backend: impl CacheBackend + 'static) -> Self {
        self.tiers.push((name.into(), Arc::new(backend)));
        self
    }

    /// Sets the strategy, replacing any previous one.
    #[must_use]
    pub fn strategy(mut self, strategy: impl InvocationStrategy + 'static) -> Self {
        self.strategy = Some(Box::new(strategy));
        self
    }

    /// Builds the coordinator.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if no tier or no strategy was given, a tier
    /// name repeats, or the strategy names a tier that was not added.
    pub fn build(self) -> Result<CompositeBackend> {
        if self.tiers.is_empty() {
            return Err(Error::config("composite backend needs at least one tier"));
        }
        let strategy = self
            .strategy
            .ok_or_else(|| Error::config("composite backend needs a strategy"))?;

        let mut tiers = Tiers::new();
        for (name, backend) in self.tiers {
            tiers.insert_shared(name, backend)?;
        }
        strategy.validate(&tiers)?;

        tracing::debug!(tiers = ?tiers.names().collect::<Vec<_>>(), "built composite backend");
        Ok(CompositeBackend { tiers, strategy })
    }
}
