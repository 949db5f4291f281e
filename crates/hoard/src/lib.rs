// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Composable caching over interchangeable storage backends.
//!
//! Application code talks to one [`CacheBackend`]. Behind it, a
//! [`CompositeBackend`] spreads each operation across named tiers according to
//! an [`InvocationStrategy`]:
//!
//! - [`FallbackStrategy`] keeps every tier populated and serves reads from the
//!   fastest tier that has the entry, promoting it into the faster tiers that
//!   missed.
//! - [`SizeRoutedStrategy`] keeps each entry in exactly one tier, chosen by the
//!   size of its payload.
//!
//! Keys are hierarchical. Clearing a key removes it and everything beneath it,
//! in every backend, including backends nested inside other coordinators.
//!
//! Backends shipped with the workspace are re-exported here:
//! [`EphemeralBackend`] (in-process) and [`FileSystemBackend`] (one file per
//! entry). Any other type implementing [`CacheBackend`] can be registered as a
//! tier.
//!
//! # Examples
//!
//! ```
//! use hoard::{CompositeBackend, EphemeralBackend, StrategyOptions};
//! use hoard_tier::{CacheBackend, Entry, Key};
//!
//! let options: StrategyOptions = serde_json::from_str(
//!     r#"{ "type": "size_routed", "thresholds": [{ "tier": "small", "max_bytes": 16 }], "catch_all": "big" }"#,
//! )
//! .unwrap();
//!
//! let cache = CompositeBackend::builder()
//!     .tier("small", EphemeralBackend::new())
//!     .tier("big", EphemeralBackend::new())
//!     .strategy(options.build().unwrap())
//!     .build()
//!     .unwrap();
//!
//! let key: Key = "catalog/items/7".parse().unwrap();
//! cache.store(&key, &Entry::new("lamp")).unwrap();
//! assert_eq!(cache.get(&key).unwrap(), Some(Entry::new("lamp")));
//! ```

mod composite;
mod strategy;
mod tiers;

#[doc(inline)]
pub use composite::{CompositeBackend, CompositeBackendBuilder};
#[doc(inline)]
pub use hoard_fs::{EncoderKind, FileSystemBackend, FileSystemOptions};
#[doc(inline)]
pub use hoard_memory::EphemeralBackend;
#[doc(inline)]
pub use hoard_tier::{CacheBackend, Entry, Error, Key, Result, Value};
#[doc(inline)]
pub use strategy::{
    FallbackOptions, FallbackStrategy, InvocationStrategy, SizeRoutedOptions, SizeRoutedStrategy, SizeThreshold, StrategyOptions,
    payload_size,
};
#[doc(inline)]
pub use tiers::Tiers;

#[cfg(any(feature = "test-util", test))]
#[doc(inline)]
pub use hoard_tier::testing::{BackendOp, MockBackend};
