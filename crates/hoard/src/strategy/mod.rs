// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Strategies that combine several tiers into one logical cache.
//!
//! A strategy decides which tiers an operation touches and in which order. It
//! never fails fast: every tier an operation targets is attempted, and the
//! names of the tiers that failed are reported together as
//! [`Error::Tiers`](hoard_tier::Error::Tiers).

use std::fmt::Debug;

use hoard_tier::{CacheBackend, Entry, Error, Key, Result, Value, codec};
use serde::{Deserialize, Serialize};

use crate::Tiers;

mod fallback;
mod size_routed;

pub use fallback::{FallbackOptions, FallbackStrategy};
pub use size_routed::{SizeRoutedOptions, SizeRoutedStrategy, SizeThreshold};

/// Decides how cache operations are spread across tiers.
///
/// Strategies are immutable once built and are shared by every call of the
/// coordinator that owns them.
pub trait InvocationStrategy: Send + Sync + Debug {
    /// Checks that the strategy can run against `tiers`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the strategy names a tier missing from `tiers`.
    fn validate(&self, tiers: &Tiers) -> Result<()>;

    /// Looks up `key`, returning the first hit.
    ///
    /// # Errors
    ///
    /// Strategies treat tier failures as misses, so implementations rarely fail.
    fn invoke_get(&self, tiers: &Tiers, key: &Key) -> Result<Option<Entry>>;

    /// Stores `entry` at `key`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Tiers`] naming every tier that failed.
    fn invoke_store(&self, tiers: &Tiers, key: &Key, entry: &Entry) -> Result<()>;

    /// Clears `key` and its descendants, or everything for `None`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Tiers`] naming every tier that failed.
    fn invoke_clear(&self, tiers: &Tiers, key: Option<&Key>) -> Result<()>;

    /// Purges expired entries from every tier.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Tiers`] naming every tier that failed.
    fn invoke_purge(&self, tiers: &Tiers) -> Result<()>;
}

impl<S: InvocationStrategy + ?Sized> InvocationStrategy for Box<S> {
    fn validate(&self, tiers: &Tiers) -> Result<()> {
        (**self).validate(tiers)
    }

    fn invoke_get(&self, tiers: &Tiers, key: &Key) -> Result<Option<Entry>> {
        (**self).invoke_get(tiers, key)
    }

    fn invoke_store(&self, tiers: &Tiers, key: &Key, entry: &Entry) -> Result<()> {
        (**self).invoke_store(tiers, key, entry)
    }

    fn invoke_clear(&self, tiers: &Tiers, key: Option<&Key>) -> Result<()> {
        (**self).invoke_clear(tiers, key)
    }

    fn invoke_purge(&self, tiers: &Tiers) -> Result<()> {
        (**self).invoke_purge(tiers)
    }
}

/// Declarative strategy configuration.
///
/// # Examples
///
/// ```
/// use hoard::StrategyOptions;
///
/// let options: StrategyOptions = serde_json::from_str(
///     r#"{ "type": "fallback", "tiers": ["memory", "disk"] }"#,
/// )
/// .unwrap();
/// let strategy = options.build().unwrap();
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StrategyOptions {
    /// Builds a [`FallbackStrategy`].
    Fallback(FallbackOptions),
    /// Builds a [`SizeRoutedStrategy`].
    SizeRouted(SizeRoutedOptions),
}

impl StrategyOptions {
    /// Builds the configured strategy.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the options are invalid.
    pub fn build(&self) -> Result<Box<dyn InvocationStrategy>> {
        Ok(match self {
            Self::Fallback(options) => Box::new(FallbackStrategy::from_options(options)?),
            Self::SizeRouted(options) => Box::new(SizeRoutedStrategy::from_options(options)?),
        })
    }
}

/// Collects the outcome of one operation across tiers.
#[derive(Debug)]
struct TierResults {
    operation: &'static str,
    failed: Vec<String>,
}

impl TierResults {
    fn new(operation: &'static str) -> Self {
        Self {
            operation,
            failed: Vec::new(),
        }
    }

    /// Runs `op` against the named tier, recording a failure for a missing tier.
    fn run(&mut self, tiers: &Tiers, name: &str, op: impl FnOnce(&dyn CacheBackend) -> Result<()>) {
        let result = match tiers.get(name) {
            Some(backend) => op(backend),
            None => Err(Error::config(format!("unknown tier `{name}`"))),
        };
        if let Err(e) = result {
            log_tier_failure(name, self.operation, &e);
            self.failed.push(name.to_owned());
        }
    }

    fn finish(self) -> Result<()> {
        if self.failed.is_empty() {
            Ok(())
        } else {
            Err(Error::Tiers(self.failed))
        }
    }
}

fn log_tier_failure(tier: &str, operation: &'static str, error: &Error) {
    tracing::event!(
        name: "hoard.tier_failed",
        tracing::Level::WARN,
        tier.name = tier,
        operation,
        error = %error,
    );
}

/// Looks up `key` in one tier, treating a failure or a missing tier as a miss.
fn probe(tiers: &Tiers, name: &str, key: &Key) -> Option<Entry> {
    let backend = tiers.get(name)?;
    match backend.get(key) {
        Ok(entry) => entry,
        Err(e) => {
            log_tier_failure(name, "get", &e);
            None
        }
    }
}

/// Returns the size used to route `value`.
///
/// Strings and bytes count their length, integers the length of their decimal
/// form and floats the length of their shortest round-trip form. Booleans
/// count 1 or 0 and null 0. Containers count their generic encoding.
#[must_use]
pub fn payload_size(value: &Value) -> u64 {
    let len = match value {
        Value::Null | Value::Bool(false) => 0,
        Value::Bool(true) => 1,
        Value::Int(i) => i.to_string().len(),
        Value::Float(f) => format!("{f:?}").len(),
        Value::String(s) => s.len(),
        Value::Bytes(bytes) => bytes.len(),
        // Anything past the payload limit routes like an unbounded payload.
        Value::List(_) | Value::Map(_) => return codec::encoded_len(value).unwrap_or(u64::MAX),
    };
    u64::try_from(len).unwrap_or(u64::MAX)
}

/// Fails with [`Error::Config`] if `names` repeats a name.
fn ensure_unique<'a>(names: impl IntoIterator<Item = &'a str>, what: &str) -> Result<()> {
    let mut seen = std::collections::BTreeSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(Error::config(format!("{what} lists tier `{name}` more than once")));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case::null(Value::Null, 0)]
    #[case::truthy(Value::from(true), 1)]
    #[case::falsy(Value::from(false), 0)]
    #[case::negative(Value::from(-1234), 5)]
    #[case::float(Value::from(2.5), 3)]
    #[case::whole_float(Value::from(3.0), 3)]
    #[case::huge_float(Value::from(1e300), 5)]
    #[case::tiny_float(Value::from(1e-300), 6)]
    #[case::ascii(Value::from("hello"), 5)]
    #[case::multibyte(Value::from("é"), 2)]
    #[case::bytes(Value::from(vec![0_u8; 300]), 300)]
    fn scalar_payload_sizes(#[case] value: Value, #[case] expected: u64) {
        assert_eq!(payload_size(&value), expected);
    }

    #[test]
    fn container_size_follows_generic_encoding() {
        let map = Value::from(BTreeMap::from([("k".to_owned(), Value::from("v"))]));
        assert_eq!(payload_size(&map), codec::encoded_len(&map).expect("encodable"));
    }

    #[test]
    fn results_aggregate_failed_tiers() {
        let tiers = Tiers::new();
        let mut results = TierResults::new("store");
        results.run(&tiers, "gone", |_| Ok(()));
        results.run(&tiers, "also-gone", |_| Ok(()));

        let err = results.finish().expect_err("missing tiers fail");
        assert_eq!(err.failed_tiers(), ["gone", "also-gone"]);
    }

    #[test]
    fn options_are_tagged_by_type() {
        let options: StrategyOptions = serde_json::from_value(serde_json::json!({
            "type": "size_routed",
            "thresholds": [{ "tier": "small", "max_bytes": 64 }],
            "catch_all": "large",
        }))
        .expect("valid options");

        assert!(matches!(options, StrategyOptions::SizeRouted(_)));
        options.build().expect("valid strategy");
    }

    #[test]
    fn unknown_strategy_type_is_rejected() {
        let parsed = serde_json::from_str::<StrategyOptions>(r#"{ "type": "random", "tiers": [] }"#);
        assert!(parsed.is_err());
    }
}
