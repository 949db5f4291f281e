// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Fail-over across tiers ordered fastest first, with promotion on hit.

use hoard_tier::{Entry, Error, Key, Result};
use serde::{Deserialize, Serialize};

use super::{InvocationStrategy, TierResults, ensure_unique, probe};
use crate::Tiers;

/// Configuration for a [`FallbackStrategy`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FallbackOptions {
    /// Tier names, fastest first.
    pub tiers: Vec<String>,
}

/// Reads from the fastest tier that has an entry and copies it into the faster
/// tiers that missed.
///
/// - `get` probes tiers in order. A failing tier counts as a miss. On the first
///   hit, the entry is promoted into each tier that missed, starting with the
///   one nearest the hit. Promotion failures are logged and ignored.
/// - `store` writes every tier, slowest first.
/// - `clear` runs slowest first and `purge` fastest first, both on every tier.
///
/// # Examples
///
/// ```
/// use hoard::{CompositeBackend, EphemeralBackend, FallbackStrategy};
/// use hoard_tier::{CacheBackend, Entry, Key};
///
/// let memory = EphemeralBackend::new();
/// let disk = EphemeralBackend::new();
/// let cache = CompositeBackend::builder()
///     .tier("memory", memory.clone())
///     .tier("disk", disk.clone())
///     .strategy(FallbackStrategy::new(["memory", "disk"]).unwrap())
///     .build()
///     .unwrap();
///
/// let key = Key::new(["page", "home"]);
/// disk.store(&key, &Entry::new("<html>")).unwrap();
///
/// assert_eq!(cache.get(&key).unwrap(), Some(Entry::new("<html>")));
/// assert_eq!(memory.get(&key).unwrap(), Some(Entry::new("<html>")), "promoted");
/// ```
#[derive(Clone, Debug)]
pub struct FallbackStrategy {
    tiers: Vec<String>,
}

impl FallbackStrategy {
    /// Creates a strategy over the named tiers, fastest first.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if no tier is given or a name repeats.
    pub fn new<I, S>(tiers: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tiers: Vec<String> = tiers.into_iter().map(Into::into).collect();
        if tiers.is_empty() {
            return Err(Error::config("fallback strategy needs at least one tier"));
        }
        ensure_unique(tiers.iter().map(String::as_str), "fallback strategy")?;
        Ok(Self { tiers })
    }

    /// Creates a strategy from declarative options.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] under the same conditions as [`new`](Self::new).
    pub fn from_options(options: &FallbackOptions) -> Result<Self> {
        Self::new(options.tiers.iter().cloned())
    }

    /// Returns the tier names, fastest first.
    #[must_use]
    pub fn tiers(&self) -> &[String] {
        &self.tiers
    }

    fn promote(tiers: &Tiers, missed: &[String], key: &Key, entry: &Entry) {
        for name in missed.iter().rev() {
            let Some(backend) = tiers.get(name) else {
                continue;
            };
            if let Err(e) = backend.store(key, entry) {
                tracing::event!(
                    name: "hoard.promotion_failed",
                    tracing::Level::WARN,
                    tier.name = name.as_str(),
                    key = %key,
                    error = %e,
                );
            }
        }
    }
}

impl InvocationStrategy for FallbackStrategy {
    fn validate(&self, tiers: &Tiers) -> Result<()> {
        tiers.require(self.tiers.iter().map(String::as_str))
    }

    fn invoke_get(&self, tiers: &Tiers, key: &Key) -> Result<Option<Entry>> {
        for (index, name) in self.tiers.iter().enumerate() {
            if let Some(entry) = probe(tiers, name, key) {
                Self::promote(tiers, &self.tiers[..index], key, &entry);
                return Ok(Some(entry));
            }
        }
        Ok(None)
    }

    fn invoke_store(&self, tiers: &Tiers, key: &Key, entry: &Entry) -> Result<()> {
        let mut results = TierResults::new("store");
        for name in self.tiers.iter().rev() {
            results.run(tiers, name, |backend| backend.store(key, entry));
        }
        results.finish()
    }

    fn invoke_clear(&self, tiers: &Tiers, key: Option<&Key>) -> Result<()> {
        let mut results = TierResults::new("clear");
        for name in self.tiers.iter().rev() {
            results.run(tiers, name, |backend| backend.clear(key));
        }
        results.finish()
    }

    fn invoke_purge(&self, tiers: &Tiers) -> Result<()> {
        let mut results = TierResults::new("purge");
        for name in &self.tiers {
            results.run(tiers, name, |backend| backend.purge());
        }
        results.finish()
    }
}
