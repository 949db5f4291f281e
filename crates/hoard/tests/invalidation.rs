// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Clearing a key hides it and its descendants from every kind of backend.

use std::sync::Arc;

use hoard::{
    CacheBackend, CompositeBackend, EncoderKind, EphemeralBackend, Entry, FallbackStrategy, FileSystemBackend, Key, SizeRoutedOptions,
    SizeRoutedStrategy,
};
use rstest::rstest;
use tempfile::TempDir;

fn filesystem(dir: &TempDir, name: &str, kind: EncoderKind) -> FileSystemBackend {
    FileSystemBackend::builder(dir.path().join(name))
        .encoder_kind(kind)
        .build()
        .expect("build")
}

/// Builds a backend of the requested shape. The returned directory must outlive it.
fn backend(shape: &str) -> (TempDir, Arc<dyn CacheBackend>) {
    let dir = tempfile::tempdir().expect("tempdir");
    let backend: Arc<dyn CacheBackend> = match shape {
        "memory" => Arc::new(EphemeralBackend::new()),
        "fs-native" => Arc::new(filesystem(&dir, "native", EncoderKind::Native)),
        "fs-serde" => Arc::new(filesystem(&dir, "serde", EncoderKind::Serde)),
        "fallback" => Arc::new(
            CompositeBackend::builder()
                .tier("memory", EphemeralBackend::new())
                .tier("disk", filesystem(&dir, "disk", EncoderKind::Native))
                .strategy(FallbackStrategy::new(["memory", "disk"]).expect("valid"))
                .build()
                .expect("valid"),
        ),
        "nested" => {
            let inner = CompositeBackend::builder()
                .tier("small", EphemeralBackend::new())
                .tier("large", filesystem(&dir, "large", EncoderKind::Serde))
                .strategy(
                    SizeRoutedStrategy::from_options(
                        &SizeRoutedOptions::from_map([("small", Some(4)), ("large", None)]).expect("valid"),
                    )
                    .expect("valid"),
                )
                .build()
                .expect("valid");
            Arc::new(
                CompositeBackend::builder()
                    .tier("front", EphemeralBackend::new())
                    .tier("routed", inner)
                    .strategy(FallbackStrategy::new(["front", "routed"]).expect("valid"))
                    .build()
                    .expect("valid"),
            )
        }
        other => unreachable!("unknown shape {other}"),
    };
    (dir, backend)
}

#[rstest]
fn clear_hides_key_and_descendants(#[values("memory", "fs-native", "fs-serde", "fallback", "nested")] shape: &str) {
    let (_dir, cache) = backend(shape);
    let cleared = Key::new(["tenants", "acme"]);
    let inside = [
        cleared.clone(),
        cleared.child("users"),
        cleared.child("users").child("7"),
        cleared.child("report").child("2024").child("q1"),
    ];
    let outside = [
        Key::new(["tenants", "acme-corp"]),
        Key::new(["tenants"]),
        Key::new(["tenants", "other", "users"]),
    ];

    for (i, key) in inside.iter().chain(&outside).enumerate() {
        // Alternate small and large payloads so size routing spreads the keys.
        let data = if i % 2 == 0 { "s".to_owned() } else { "large ".repeat(10) };
        cache.store(key, &Entry::new(data)).expect("store failed");
    }

    cache.clear(Some(&cleared)).expect("clear failed");

    for key in &inside {
        assert_eq!(cache.get(key).expect("get failed"), None, "{shape}: {key} should be cleared");
    }
    for key in &outside {
        assert!(cache.get(key).expect("get failed").is_some(), "{shape}: {key} should survive");
    }
}

#[rstest]
fn clear_everything(#[values("memory", "fs-native", "fs-serde", "fallback", "nested")] shape: &str) {
    let (_dir, cache) = backend(shape);
    let keys = [Key::new(["a"]), Key::new(["b", "c"])];
    for key in &keys {
        cache.store(key, &Entry::new(1)).expect("store failed");
    }

    cache.clear(None).expect("clear failed");

    for key in &keys {
        assert_eq!(cache.get(key).expect("get failed"), None, "{shape}: {key}");
    }
}

#[test]
fn cleared_key_is_not_resurrected_by_promotion() {
    let dir = tempfile::tempdir().expect("tempdir");
    let memory = EphemeralBackend::new();
    let disk = filesystem(&dir, "disk", EncoderKind::Native);
    let cache = CompositeBackend::builder()
        .tier("memory", memory.clone())
        .tier("disk", disk)
        .strategy(FallbackStrategy::new(["memory", "disk"]).expect("valid"))
        .build()
        .expect("valid");
    let key = Key::new(["session", "1"]);

    cache.store(&key, &Entry::new("token")).expect("store failed");
    cache.clear(Some(&Key::new(["session"]))).expect("clear failed");

    assert_eq!(cache.get(&key).expect("get failed"), None);
    assert!(memory.is_empty());
}
