// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Encoders turning entries into file contents and back.
//!
//! Each encoder owns a distinct file extension so a backend never tries to read
//! a file written by the other one. Decoding never fails loudly: anything that
//! is not a complete, well-formed record written by the same encoder is a miss.

use std::fmt::Debug;
use std::fs;
use std::io;
use std::path::Path;

use hoard_tier::{Entry, Key, Result};

mod native;
mod serialized;

pub use native::NativeEncoder;
pub use serialized::SerdeEncoder;

/// One decoded cache file: the key it was written for and its entry.
#[derive(Clone, Debug, PartialEq)]
pub struct Record {
    /// The key the entry was stored under.
    pub key: Key,
    /// The stored entry.
    pub entry: Entry,
}

/// A strategy for persisting entries as bytes.
pub trait Encoder: Send + Sync + Debug {
    /// Encodes the entry stored at `key`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Encode`](hoard_tier::Error::Encode) if the entry cannot be represented,
    /// for example an expiration before the Unix epoch.
    fn serialize(&self, key: &Key, entry: &Entry) -> Result<Vec<u8>>;

    /// Decodes bytes produced by [`serialize`](Self::serialize).
    ///
    /// Returns `None` for empty, truncated, corrupt or foreign input.
    fn decode(&self, bytes: &[u8]) -> Option<Record>;

    /// Returns the extension, without a dot, of files written by this encoder.
    fn file_extension(&self) -> &'static str;

    /// Reads and decodes the file at `path`.
    ///
    /// A missing or unreadable file is a miss, like a corrupt one.
    fn deserialize(&self, path: &Path) -> Option<Record> {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::event!(
                    name: "hoard.fs.unreadable_entry",
                    tracing::Level::DEBUG,
                    path = %path.display(),
                    error = %e,
                );
                return None;
            }
        };

        let record = self.decode(&bytes);
        if record.is_none() {
            tracing::event!(
                name: "hoard.fs.corrupt_entry",
                tracing::Level::DEBUG,
                path = %path.display(),
                len = bytes.len(),
            );
        }
        record
    }
}
