// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fs;
use std::io::{self, Write as _};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use hoard_tier::{CacheBackend, Entry, Error, Key, Result};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use walkdir::WalkDir;

use crate::encoder::{Encoder, NativeEncoder, SerdeEncoder};
use crate::path::{item_path, subtree_path};

/// Selects the encoder used by a [`FileSystemBackend`] built from options.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncoderKind {
    /// The self-describing text format of [`NativeEncoder`].
    #[default]
    Native,
    /// The generic binary record of [`SerdeEncoder`].
    Serde,
}

impl EncoderKind {
    fn into_encoder(self) -> Box<dyn Encoder> {
        match self {
            Self::Native => Box::new(NativeEncoder),
            Self::Serde => Box::new(SerdeEncoder),
        }
    }
}

/// Declarative configuration for a [`FileSystemBackend`].
///
/// # Examples
///
/// ```
/// use hoard_fs::{EncoderKind, FileSystemOptions};
///
/// let options: FileSystemOptions = serde_json::from_str(r#"{ "path": "/var/cache/app" }"#).unwrap();
/// assert_eq!(options.encoder, EncoderKind::Native);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSystemOptions {
    /// Root directory of the cache. Created if missing.
    pub path: PathBuf,
    /// Encoder for entry files.
    #[serde(default)]
    pub encoder: EncoderKind,
}

/// Cache backend persisting one file per entry beneath a root directory.
///
/// Entries are written to a temporary file in the target directory and then
/// renamed into place, so readers observe either the old or the new file and
/// never a partial one. A file that cannot be decoded, or that was written for a
/// different key, reads as a miss.
///
/// Clones are not provided; share the backend through an `Arc`.
#[derive(Debug)]
pub struct FileSystemBackend {
    root: PathBuf,
    encoder: Box<dyn Encoder>,
}

impl FileSystemBackend {
    /// Starts building a backend rooted at `path`.
    #[must_use]
    pub fn builder(path: impl Into<PathBuf>) -> FileSystemBackendBuilder {
        FileSystemBackendBuilder {
            root: path.into(),
            encoder: Box::new(NativeEncoder),
        }
    }

    /// Builds a backend from declarative options.
    ///
    /// # Errors
    ///
    /// Returns an error if the root directory cannot be created.
    pub fn from_options(options: &FileSystemOptions) -> Result<Self> {
        Self::builder(options.path.clone()).encoder_kind(options.encoder).build()
    }

    /// Reports whether a backend rooted at `path` could store entries.
    ///
    /// The directory must exist or be creatable, and be writable.
    #[must_use]
    pub fn can_enable(path: impl AsRef<Path>) -> bool {
        let path = path.as_ref();
        if path.as_os_str().is_empty() || fs::create_dir_all(path).is_err() {
            return false;
        }
        NamedTempFile::new_in(path).is_ok()
    }

    /// Returns the root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn item_path(&self, key: &Key) -> Option<PathBuf> {
        item_path(&self.root, key, self.encoder.file_extension())
    }

    fn is_entry_file(&self, path: &Path) -> bool {
        path.extension().is_some_and(|ext| ext == self.encoder.file_extension())
    }

    fn clear_all(&self) -> Result<()> {
        let children = match fs::read_dir(&self.root) {
            Ok(children) => children,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        };
        for child in children {
            let child = child?;
            if child.file_type()?.is_dir() {
                remove_dir_all(&child.path())?;
            } else {
                remove_file(&child.path())?;
            }
        }
        Ok(())
    }

    /// Removes one walked path if it is stale, returning whether it was removed.
    fn purge_path(&self, path: &Path, is_dir: bool, now: SystemTime) -> io::Result<bool> {
        if is_dir {
            return match fs::remove_dir(path) {
                Ok(()) => Ok(true),
                // Still holds live entries.
                Err(e) if e.kind() == io::ErrorKind::DirectoryNotEmpty => Ok(false),
                Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
                Err(e) => Err(e),
            };
        }
        if !self.is_entry_file(path) {
            return Ok(false);
        }
        let stale = self
            .encoder
            .deserialize(path)
            .is_none_or(|record| record.entry.is_expired_at(now));
        if stale {
            remove_file(path)?;
        }
        Ok(stale)
    }
}

impl CacheBackend for FileSystemBackend {
    fn get(&self, key: &Key) -> Result<Option<Entry>> {
        let Some(path) = self.item_path(key) else {
            return Ok(None);
        };
        Ok(self
            .encoder
            .deserialize(&path)
            .filter(|record| record.key == *key)
            .map(|record| record.entry))
    }

    fn store(&self, key: &Key, entry: &Entry) -> Result<()> {
        key.ensure_item()?;
        let path = self.item_path(key).ok_or_else(|| Error::InvalidKey(key.to_string()))?;
        let bytes = self.encoder.serialize(key, entry)?;

        let dir = path.parent().unwrap_or(&self.root);
        fs::create_dir_all(dir)?;
        let mut file = NamedTempFile::new_in(dir)?;
        file.write_all(&bytes)?;
        file.persist(&path).map_err(|e| e.error)?;
        Ok(())
    }

    fn clear(&self, key: Option<&Key>) -> Result<()> {
        let Some(key) = key.filter(|key| !key.is_root()) else {
            return self.clear_all();
        };
        if let Some(path) = self.item_path(key) {
            remove_file(&path)?;
        }
        remove_dir_all(&subtree_path(&self.root, key))?;
        Ok(())
    }

    fn purge(&self) -> Result<()> {
        let now = SystemTime::now();
        let mut first_error = None;
        let mut removed = 0_usize;

        for item in WalkDir::new(&self.root).min_depth(1).contents_first(true) {
            let outcome = item
                .map_err(io::Error::from)
                .and_then(|item| self.purge_path(item.path(), item.file_type().is_dir(), now));
            match outcome {
                Ok(true) => removed += 1,
                // A missing root or an entry removed mid-sweep leaves nothing to purge.
                Ok(false) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => {
                    tracing::event!(
                        name: "hoard.fs.purge_failed",
                        tracing::Level::WARN,
                        root = %self.root.display(),
                        error = %e,
                    );
                    first_error.get_or_insert(e);
                }
            }
        }

        tracing::debug!(root = %self.root.display(), removed, "purged filesystem cache");
        first_error.map_or(Ok(()), |e| Err(e.into()))
    }

    fn is_available(&self) -> bool {
        Self::can_enable(&self.root)
    }
}

/// Builder for [`FileSystemBackend`].
#[derive(Debug)]
pub struct FileSystemBackendBuilder {
    root: PathBuf,
    encoder: Box<dyn Encoder>,
}

impl FileSystemBackendBuilder {
    /// Sets the encoder. Defaults to [`NativeEncoder`].
    #[must_use]
    pub fn encoder(mut self, encoder: impl Encoder + 'static) -> Self {
        self.encoder = Box::new(encoder);
        self
    }

    /// Sets one of the built-in encoders.
    #[must_use]
    pub fn encoder_kind(mut self, kind: EncoderKind) -> Self {
        self.encoder = kind.into_encoder();
        self
    }

    /// Creates the root directory if needed and builds the backend.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for an empty path, or an I/O error if the root
    /// directory cannot be created.
    pub fn build(self) -> Result<FileSystemBackend> {
        if self.root.as_os_str().is_empty() {
            return Err(Error::config("filesystem backend path must not be empty"));
        }
        fs::create_dir_all(&self.root)?;
        Ok(FileSystemBackend {
            root: self.root,
            encoder: self.encoder,
        })
    }
}

fn remove_file(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}

fn remove_dir_all(path: &Path) -> io::Result<()> {
    match fs::remove_dir_all(path) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}
