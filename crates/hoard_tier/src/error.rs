// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Error types for cache operations.
//!
//! Absent keys and corrupt persisted data are not errors: backends report them as
//! misses. Errors are reserved for invalid configuration, contract violations by
//! the caller, and genuine storage failures.

/// An error from a cache operation or from building a cache component.
///
/// # Example
///
/// ```
/// use hoard_tier::Error;
///
/// let error = Error::backend("connection refused");
/// assert!(error.to_string().contains("connection refused"));
/// ```
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Missing or invalid options, detected at construction.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The caller passed a key that cannot be used for this operation.
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// A filesystem or other I/O operation failed.
    #[error("cache I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// An entry could not be encoded for storage.
    #[error("failed to encode cache entry: {0}")]
    Encode(String),

    /// One or more tiers of a multi-tier cache failed; every tier was still attempted.
    #[error("cache tiers failed: {}", .0.join(", "))]
    Tiers(Vec<String>),

    /// A backend-specific failure.
    #[error("cache backend failed: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates a backend error from any type that can be converted to an error.
    ///
    /// This is the public API for reporting failures from external backends.
    pub fn backend(cause: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Backend(cause.into())
    }

    /// Returns `true` if this is a configuration error.
    #[must_use]
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    /// Returns the names of the failed tiers for [`Error::Tiers`], otherwise an empty slice.
    #[must_use]
    pub fn failed_tiers(&self) -> &[String] {
        match self {
            Self::Tiers(names) => names,
            _ => &[],
        }
    }
}

/// A specialized [`Result`] type for cache operations.
pub type Result<T> = std::result::Result<T, Error>;
