// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Generic binary serialization shared by every hoard crate.
//!
//! The filesystem encoders persist records with it, the self-describing encoder
//! embeds it for nested values, and size-based routing measures payloads with it.
//! All of them go through the same options so the three agree on byte counts.

use bincode::Options;
use serde::{Serialize, de::DeserializeOwned};

use crate::{Error, Result};

/// Upper bound on a single encoded payload.
///
/// Decoding a corrupt length prefix stops here instead of attempting a huge allocation.
pub const PAYLOAD_LIMIT_BYTES: u64 = 256 * 1024 * 1024;

fn options() -> impl Options {
    bincode::DefaultOptions::new().with_limit(PAYLOAD_LIMIT_BYTES)
}

/// Serializes `value` to bytes.
///
/// # Errors
///
/// Returns [`Error::Encode`] if the value cannot be represented or exceeds
/// [`PAYLOAD_LIMIT_BYTES`].
pub fn encode<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
    options().serialize(value).map_err(|e| Error::Encode(e.to_string()))
}

/// Deserializes bytes produced by [`encode`].
///
/// Returns `None` for malformed, truncated or over-long input; trailing bytes
/// are rejected. A [`Value`](crate::Value) nested past
/// [`Value::MAX_DEPTH`](crate::Value::MAX_DEPTH) is malformed.
#[must_use]
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Option<T> {
    options().deserialize(bytes).ok()
}

/// Returns the number of bytes [`encode`] would produce for `value`.
///
/// # Errors
///
/// Returns [`Error::Encode`] under the same conditions as [`encode`].
pub fn encoded_len<T: Serialize + ?Sized>(value: &T) -> Result<u64> {
    options().serialized_size(value).map_err(|e| Error::Encode(e.to_string()))
}
