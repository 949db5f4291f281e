// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! In-process cache backend.
//!
//! This crate provides [`EphemeralBackend`], a [`CacheBackend`](hoard_tier::CacheBackend)
//! that keeps entries in memory for the lifetime of the instance. It is the
//! natural fastest tier of a multi-tier cache.
//!
//! # Quick Start
//!
//! ```
//! use hoard_memory::EphemeralBackend;
//! use hoard_tier::{CacheBackend, Entry, Key};
//!
//! let backend = EphemeralBackend::new();
//! let key = Key::new(["sessions", "42"]);
//!
//! backend.store(&key, &Entry::new("token")).unwrap();
//! assert_eq!(backend.get(&key).unwrap(), Some(Entry::new("token")));
//!
//! backend.clear(Some(&Key::new(["sessions"]))).unwrap();
//! assert!(backend.get(&key).unwrap().is_none());
//! ```
//!
//! # Features
//!
//! - **Instance-owned state**: two backends never see each other's entries
//! - **Subtree clears**: descendants of a key are removed with one range scan
//! - **Thread-safe**: reads share a lock, writes take it exclusively

pub mod backend;

#[doc(inline)]
pub use backend::EphemeralBackend;
