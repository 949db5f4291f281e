// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Mapping from keys to paths below the backend root.
//!
//! Segment names keep `[a-z0-9_-]` and escape every other byte as `%XX` with
//! uppercase hex digits, so distinct segments never collide, even on
//! case-insensitive filesystems, and no segment can contain a path separator or
//! a `.` that would be confused with the entry file extension.

use std::path::{Path, PathBuf};

use hoard_tier::Key;
use xxhash_rust::xxh3::xxh3_64;

/// Escaped names longer than this are replaced by a hash to stay within filesystem limits.
const MAX_SEGMENT_LEN: usize = 128;

const HEX: &[u8; 16] = b"0123456789ABCDEF";

/// Returns the directory entry name for one key segment.
pub(crate) fn segment_name(segment: &str) -> String {
    if segment.is_empty() {
        return "%".to_owned();
    }

    let mut name = String::with_capacity(segment.len());
    for byte in segment.bytes() {
        if byte.is_ascii_lowercase() || byte.is_ascii_digit() || byte == b'_' || byte == b'-' {
            name.push(char::from(byte));
        } else {
            name.push('%');
            name.push(char::from(HEX[usize::from(byte >> 4)]));
            name.push(char::from(HEX[usize::from(byte & 0x0F)]));
        }
    }

    if name.len() > MAX_SEGMENT_LEN {
        format!("~{:016x}", xxh3_64(segment.as_bytes()))
    } else {
        name
    }
}

/// Returns the directory holding every entry beneath `key`.
pub(crate) fn subtree_path(root: &Path, key: &Key) -> PathBuf {
    let mut path = root.to_path_buf();
    for segment in key.segments() {
        path.push(segment_name(segment));
    }
    path
}

/// Returns the file holding the entry stored at exactly `key`, or `None` for the root.
pub(crate) fn item_path(root: &Path, key: &Key, extension: &str) -> Option<PathBuf> {
    let (last, parents) = key.segments().split_last()?;
    let mut path = root.to_path_buf();
    for segment in parents {
        path.push(segment_name(segment));
    }
    path.push(format!("{}.{extension}", segment_name(last)));
    Some(path)
}
