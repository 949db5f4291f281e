// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Filesystem cache backend.
//!
//! [`FileSystemBackend`] stores every entry in its own file. Key segments map to
//! nested directories, so an entry at `a/b/c` lives in `<root>/a/b/c.<ext>` and
//! everything beneath it lives in `<root>/a/b/c/`. Clearing a key deletes that
//! file and that directory.
//!
//! How entries are turned into bytes is decided by an [`Encoder`], chosen when
//! the backend is built:
//!
//! - [`NativeEncoder`] writes a self-describing text format that decodes scalars
//!   without an intermediate parse tree. This is the default.
//! - [`SerdeEncoder`] writes the generic binary record.
//!
//! # Examples
//!
//! ```
//! use hoard_fs::{FileSystemBackend, SerdeEncoder};
//! use hoard_tier::{CacheBackend, Entry, Key};
//!
//! let dir = tempfile::tempdir().unwrap();
//! let backend = FileSystemBackend::builder(dir.path())
//!     .encoder(SerdeEncoder)
//!     .build()
//!     .unwrap();
//!
//! let key = Key::new(["reports", "2024"]);
//! backend.store(&key, &Entry::new("cached report")).unwrap();
//! assert_eq!(backend.get(&key).unwrap(), Some(Entry::new("cached report")));
//! ```

mod backend;
pub mod encoder;
mod path;

#[doc(inline)]
pub use backend::{EncoderKind, FileSystemBackend, FileSystemBackendBuilder, FileSystemOptions};
#[doc(inline)]
pub use encoder::{Encoder, NativeEncoder, Record, SerdeEncoder};
