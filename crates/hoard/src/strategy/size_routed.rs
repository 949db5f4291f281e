// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Routing of each entry to exactly one tier, chosen by payload size.

use std::collections::BTreeSet;

use hoard_tier::{Entry, Error, Key, Result};
use serde::{Deserialize, Serialize};

use super::{InvocationStrategy, TierResults, ensure_unique, payload_size, probe};
use crate::Tiers;

/// A size limit for one tier.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeThreshold {
    /// Tier name.
    pub tier: String,
    /// Largest payload, in bytes, the tier accepts.
    pub max_bytes: u64,
}

/// Configuration for a [`SizeRoutedStrategy`].
///
/// # Examples
///
/// ```
/// use hoard::SizeRoutedOptions;
///
/// let options = SizeRoutedOptions::from_map([
///     ("memory", Some(1024)),
///     ("disk", None),
///     ("shared", Some(65_536)),
/// ])
/// .unwrap();
/// assert_eq!(options.catch_all, "disk");
/// assert_eq!(options.thresholds.len(), 2);
/// assert_eq!(options.catch_all_position, Some(1));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeRoutedOptions {
    /// Size-limited tiers, in declaration order.
    pub thresholds: Vec<SizeThreshold>,
    /// Tier receiving payloads no threshold accepts.
    pub catch_all: String,
    /// Index into `thresholds` before which lookups probe the catch-all.
    /// `None` probes it last.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catch_all_position: Option<usize>,
}

impl SizeRoutedOptions {
    /// Builds options from `(tier, threshold)` pairs where exactly one tier has no
    /// threshold. That tier becomes the catch-all.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] unless exactly one tier lacks a threshold.
    pub fn from_map<I, S>(tiers: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, Option<u64>)>,
        S: Into<String>,
    {
        let mut thresholds = Vec::new();
        let mut catch_all = None;
        for (tier, max_bytes) in tiers {
            let tier = tier.into();
            match max_bytes {
                Some(max_bytes) => thresholds.push(SizeThreshold { tier, max_bytes }),
                None if catch_all.is_some() => {
                    return Err(Error::config("size-routed strategy allows only one tier without a threshold"));
                }
                None => catch_all = Some((tier, thresholds.len())),
            }
        }
        let (catch_all, position) =
            catch_all.ok_or_else(|| Error::config("size-routed strategy needs one tier without a threshold"))?;
        Ok(Self {
            thresholds,
            catch_all,
            catch_all_position: Some(position),
        })
    }
}

/// Keeps every entry in exactly one tier, picked by the size of its payload.
///
/// Tiers are ranked by threshold, smallest first. A store goes to the first
/// tier whose threshold fits the payload, or to the catch-all tier when none
/// does, and clears the key from every other tier. Re-storing a key with a
/// different size therefore moves it.
///
/// Lookups probe the tiers in declaration order, with the catch-all at its
/// declared position or last. There is no promotion.
///
/// Thresholds must be distinct. A threshold equal to an earlier one is raised
/// by one byte until it is unique.
///
/// # Examples
///
/// ```
/// use hoard::{CompositeBackend, EphemeralBackend, SizeRoutedOptions, SizeRoutedStrategy};
/// use hoard_tier::{CacheBackend, Entry, Key};
///
/// let small = EphemeralBackend::new();
/// let large = EphemeralBackend::new();
/// let options = SizeRoutedOptions::from_map([("small", Some(8)), ("large", None)]).unwrap();
/// let cache = CompositeBackend::builder()
///     .tier("small", small.clone())
///     .tier("large", large.clone())
///     .strategy(SizeRoutedStrategy::from_options(&options).unwrap())
///     .build()
///     .unwrap();
///
/// let key = Key::new(["greeting"]);
/// cache.store(&key, &Entry::new("hi")).unwrap();
/// assert_eq!(small.len(), 1);
///
/// cache.store(&key, &Entry::new("a much longer greeting")).unwrap();
/// assert_eq!((small.len(), large.len()), (0, 1));
/// ```
#[derive(Clone, Debug)]
pub struct SizeRoutedStrategy {
    /// Thresholds after collision adjustment, in declaration order.
    declared: Vec<(String, u64)>,
    /// The same thresholds, ascending.
    ranked: Vec<(String, u64)>,
    catch_all: String,
    /// Every tier, catch-all included, in lookup order.
    probe_order: Vec<String>,
}

impl SizeRoutedStrategy {
    /// Creates a strategy from declarative options.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if there are no thresholds, a tier is named twice
    /// (including as both a threshold tier and the catch-all), a threshold
    /// cannot be made unique or the catch-all position is out of range.
    pub fn from_options(options: &SizeRoutedOptions) -> Result<Self> {
        if options.thresholds.is_empty() {
            return Err(Error::config("size-routed strategy needs at least one threshold"));
        }
        ensure_unique(
            options
                .thresholds
                .iter()
                .map(|t| t.tier.as_str())
                .chain([options.catch_all.as_str()]),
            "size-routed strategy",
        )?;

        let mut taken = BTreeSet::new();
        let mut declared = Vec::with_capacity(options.thresholds.len());
        for threshold in &options.thresholds {
            let mut max_bytes = threshold.max_bytes;
            while !taken.insert(max_bytes) {
                max_bytes = max_bytes
                    .checked_add(1)
                    .ok_or_else(|| Error::config(format!("threshold of tier `{}` overflows", threshold.tier)))?;
            }
            declared.push((threshold.tier.clone(), max_bytes));
        }

        let mut ranked = declared.clone();
        ranked.sort_by_key(|(_, max_bytes)| *max_bytes);

        let position = options.catch_all_position.unwrap_or(declared.len());
        if position > declared.len() {
            return Err(Error::config(format!(
                "catch-all position {position} is past the {} thresholds",
                declared.len()
            )));
        }
        let mut probe_order: Vec<String> = declared.iter().map(|(name, _)| name.clone()).collect();
        probe_order.insert(position, options.catch_all.clone());

        Ok(Self {
            declared,
            ranked,
            catch_all: options.catch_all.clone(),
            probe_order,
        })
    }

    /// Returns the effective thresholds, smallest first.
    #[must_use]
    pub fn thresholds(&self) -> &[(String, u64)] {
        &self.ranked
    }

    /// Returns the catch-all tier name.
    #[must_use]
    pub fn catch_all(&self) -> &str {
        &self.catch_all
    }

    fn all_tiers(&self) -> impl Iterator<Item = &str> {
        self.probe_order.iter().map(String::as_str)
    }
}

impl InvocationStrategy for SizeRoutedStrategy {
    fn validate(&self, tiers: &Tiers) -> Result<()> {
        tiers.require(self.all_tiers())
    }

    fn invoke_get(&self, tiers: &Tiers, key: &Key) -> Result<Option<Entry>> {
        Ok(self.all_tiers().find_map(|name| probe(tiers, name, key)))
    }

    fn invoke_store(&self, tiers: &Tiers, key: &Key, entry: &Entry) -> Result<()> {
        let size = payload_size(entry.data());
        let mut results = TierResults::new("store");
        let mut accepted = false;

        for (name, max_bytes) in &self.ranked {
            if accepted || size > *max_bytes {
                results.run(tiers, name, |backend| backend.clear(Some(key)));
            } else {
                results.run(tiers, name, |backend| backend.store(key, entry));
                accepted = true;
            }
        }

        if accepted {
            results.run(tiers, &self.catch_all, |backend| backend.clear(Some(key)));
        } else {
            results.run(tiers, &self.catch_all, |backend| backend.store(key, entry));
        }
        results.finish()
    }

    fn invoke_clear(&self, tiers: &Tiers, key: Option<&Key>) -> Result<()> {
        let mut results = TierResults::new("clear");
        for name in self.all_tiers() {
            results.run(tiers, name, |backend| backend.clear(key));
        }
        results.finish()
    }

    fn invoke_purge(&self, tiers: &Tiers) -> Result<()> {
        let mut results = TierResults::new("purge");
        for name in self.all_tiers() {
            results.run(tiers, name, |backend| backend.purge());
        }
        results.finish()
    }
}
