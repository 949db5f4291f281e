// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Integration tests for `EphemeralBackend`.

use std::time::{Duration, SystemTime};

use hoard_memory::EphemeralBackend;
use hoard_tier::{CacheBackend, Entry, Error, Key, Value};

#[test]
fn new_creates_empty_backend() {
    let backend = EphemeralBackend::new();
    assert!(backend.is_empty());
    assert_eq!(backend.len(), 0);
    assert!(backend.is_available());
}

#[test]
fn get_returns_none_for_missing_key() {
    let backend = EphemeralBackend::new();
    let result = backend.get(&Key::new(["missing"])).expect("get failed");
    assert!(result.is_none());
}

#[test]
fn store_overwrites_previous_entry() {
    let backend = EphemeralBackend::new();
    let key = Key::new(["key"]);

    backend.store(&key, &Entry::new(1)).expect("store failed");
    backend.store(&key, &Entry::new("two")).expect("store failed");

    let entry = backend.get(&key).expect("get failed").expect("entry present");
    assert_eq!(entry.data(), &Value::from("two"));
    assert_eq!(backend.len(), 1);
}

#[test]
fn store_at_root_is_a_contract_violation() {
    let backend = EphemeralBackend::new();
    let err = backend.store(&Key::root(), &Entry::new(1)).expect_err("root store must fail");
    assert!(matches!(err, Error::InvalidKey(_)));
}

#[test]
fn clear_key_invalidates_descendants() {
    let backend = EphemeralBackend::new();
    let parent = Key::new(["users", "42"]);
    let child = parent.child("profile");
    let sibling = Key::new(["users", "43"]);

    for key in [&parent, &child, &sibling] {
        backend.store(key, &Entry::new(true)).expect("store failed");
    }

    backend.clear(Some(&parent)).expect("clear failed");

    assert!(backend.get(&parent).expect("get failed").is_none());
    assert!(backend.get(&child).expect("get failed").is_none());
    assert!(backend.get(&sibling).expect("get failed").is_some());
}

#[test]
fn clear_none_removes_everything() {
    let backend = EphemeralBackend::new();
    backend.store(&Key::new(["a"]), &Entry::new(1)).expect("store failed");
    backend.store(&Key::new(["b", "c"]), &Entry::new(2)).expect("store failed");

    backend.clear(None).expect("clear failed");
    assert!(backend.is_empty());

    // Clearing an empty backend still succeeds.
    backend.clear(Some(&Key::new(["nothing"]))).expect("clear failed");
}

#[test]
fn purge_removes_only_expired_entries() {
    let backend = EphemeralBackend::new();
    let now = SystemTime::now();
    backend
        .store(&Key::new(["expired"]), &Entry::with_expiration(1, now - Duration::from_secs(1)))
        .expect("store failed");
    backend
        .store(&Key::new(["fresh"]), &Entry::with_expiration(2, now + Duration::from_secs(3600)))
        .expect("store failed");
    backend.store(&Key::new(["forever"]), &Entry::new(3)).expect("store failed");

    // Expired entries are still served until purged.
    assert!(backend.get(&Key::new(["expired"])).expect("get failed").is_some());

    backend.purge().expect("purge failed");

    assert!(backend.get(&Key::new(["expired"])).expect("get failed").is_none());
    assert!(backend.get(&Key::new(["fresh"])).expect("get failed").is_some());
    assert!(backend.get(&Key::new(["forever"])).expect("get failed").is_some());
}

#[test]
fn separate_instances_do_not_share_entries() {
    let first = EphemeralBackend::new();
    let second = EphemeralBackend::new();
    let key = Key::new(["key"]);

    first.store(&key, &Entry::new(1)).expect("store failed");

    assert!(second.get(&key).expect("get failed").is_none());
}

#[test]
fn clones_share_entries() {
    let backend = EphemeralBackend::new();
    let clone = backend.clone();
    let key = Key::new(["key"]);

    clone.store(&key, &Entry::new(1)).expect("store failed");

    assert!(backend.get(&key).expect("get failed").is_some());
}
