// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Core cache backend abstractions.
//!
//! This crate defines the [`CacheBackend`] trait that all storage engines must satisfy,
//! along with the hierarchical [`Key`], the [`Value`] data model, [`Entry`] for storing
//! values with an expiration, and the shared [`Error`] type.
//!
//! # Overview
//!
//! Keys are sequences of path segments. Clearing a key removes the entry stored at that
//! key *and* every entry stored beneath it, so `clear(a/b)` invalidates `a/b/c`. Every
//! backend must honor this identically, which is what lets the `hoard` crate combine
//! backends into multi-tier caches.
//!
//! # Implementing a Backend
//!
//! ```
//! use std::collections::BTreeMap;
//! use std::sync::RwLock;
//!
//! use hoard_tier::{CacheBackend, Entry, Key, Result};
//!
//! #[derive(Debug, Default)]
//! struct SimpleBackend(RwLock<BTreeMap<Key, Entry>>);
//!
//! impl CacheBackend for SimpleBackend {
//!     fn get(&self, key: &Key) -> Result<Option<Entry>> {
//!         Ok(self.0.read().unwrap().get(key).cloned())
//!     }
//!
//!     fn store(&self, key: &Key, entry: &Entry) -> Result<()> {
//!         key.ensure_item()?;
//!         self.0.write().unwrap().insert(key.clone(), entry.clone());
//!         Ok(())
//!     }
//!
//!     fn clear(&self, key: Option<&Key>) -> Result<()> {
//!         let mut map = self.0.write().unwrap();
//!         match key {
//!             Some(prefix) => map.retain(|k, _| !prefix.is_ancestor_of(k)),
//!             None => map.clear(),
//!         }
//!         Ok(())
//!     }
//!
//!     fn purge(&self) -> Result<()> {
//!         let now = std::time::SystemTime::now();
//!         self.0.write().unwrap().retain(|_, entry| !entry.is_expired_at(now));
//!         Ok(())
//!     }
//! }
//!
//! let backend = SimpleBackend::default();
//! let key: Key = "users/42/profile".parse().unwrap();
//! backend.store(&key, &Entry::new("alice")).unwrap();
//! backend.clear(Some(&"users".parse().unwrap())).unwrap();
//! assert!(backend.get(&key).unwrap().is_none());
//! ```

mod backend;
pub mod codec;
mod entry;
pub mod error;
mod key;
#[cfg(any(feature = "test-util", test))]
pub mod testing;
mod value;

#[doc(inline)]
pub use backend::CacheBackend;
#[doc(inline)]
pub use entry::Entry;
#[doc(inline)]
pub use error::{Error, Result};
#[doc(inline)]
pub use key::{Key, ParseKeyError};
#[doc(inline)]
pub use value::Value;
