// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::time::SystemTime;

use hoard_tier::{Entry, Key, Result, Value, codec};
use serde::{Deserialize, Serialize};

use super::{Encoder, Record};

const MAGIC: &[u8; 8] = b"HOARDSE1";

#[derive(Serialize)]
struct RecordRef<'a> {
    key: &'a Key,
    data: &'a Value,
    expiration: Option<SystemTime>,
}

#[derive(Deserialize)]
struct StoredRecord {
    key: Key,
    data: Value,
    expiration: Option<SystemTime>,
}

/// Encoder writing the generic binary serialization of `{key, data, expiration}`.
///
/// Files start with an 8-byte magic followed by the record in the shared
/// [`codec`] format. Decoding type-checks the entire record and rejects
/// trailing bytes, so a truncated or corrupt file is a miss.
///
/// # Examples
///
/// ```
/// use hoard_fs::{Encoder, SerdeEncoder};
/// use hoard_tier::{Entry, Key};
///
/// let key = Key::new(["k"]);
/// let bytes = SerdeEncoder.serialize(&key, &Entry::new(vec![0_u8, 255])).unwrap();
/// let record = SerdeEncoder.decode(&bytes).unwrap();
/// assert_eq!(record.key, key);
/// assert_eq!(record.entry, Entry::new(vec![0_u8, 255]));
/// assert!(SerdeEncoder.decode(&bytes[..bytes.len() - 1]).is_none());
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct SerdeEncoder;

impl Encoder for SerdeEncoder {
    fn serialize(&self, key: &Key, entry: &Entry) -> Result<Vec<u8>> {
        let body = codec::encode(&RecordRef {
            key,
            data: entry.data(),
            expiration: entry.expiration(),
        })?;

        let mut bytes = Vec::with_capacity(MAGIC.len() + body.len());
        bytes.extend_from_slice(MAGIC);
        bytes.extend_from_slice(&body);
        Ok(bytes)
    }

    fn decode(&self, bytes: &[u8]) -> Option<Record> {
        let body = bytes.strip_prefix(MAGIC)?;
        let stored: StoredRecord = codec::decode(body)?;
        Some(Record {
            key: stored.key,
            entry: Entry::from_parts(stored.data, stored.expiration),
        })
    }

    fn file_extension(&self) -> &'static str {
        "bin"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn magic_is_required() {
        let bytes = SerdeEncoder.serialize(&Key::new(["k"]), &Entry::new(1)).expect("encodable");
        assert!(bytes.starts_with(MAGIC));

        let mut tampered = bytes;
        tampered[0] = b'X';
        assert!(SerdeEncoder.decode(&tampered).is_none());
    }

    #[test]
    fn empty_input_is_a_miss() {
        assert!(SerdeEncoder.decode(&[]).is_none());
        assert!(SerdeEncoder.decode(MAGIC).is_none());
    }
}
