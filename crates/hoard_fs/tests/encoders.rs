// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Behavior shared by both entry encoders.

use std::collections::BTreeMap;
use std::time::{Duration, UNIX_EPOCH};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use hoard_fs::{Encoder, NativeEncoder, SerdeEncoder};
use hoard_tier::{Entry, Key, Value, codec};
use pretty_assertions::assert_eq;
use rstest::rstest;

/// A generically encoded value of a million nested single-element lists.
fn deeply_nested_value_bytes() -> Vec<u8> {
    // Tag 6 is `List`, followed by a length of one; a final 0 is `Null`.
    let mut bytes = [6_u8, 1].repeat(1_000_000);
    bytes.push(0);
    bytes
}

/// Builds a file for `encoder` whose payload is `value_bytes`.
fn file_with_raw_value(encoder: &dyn Encoder, value_bytes: &[u8]) -> Vec<u8> {
    let key = Key::new(["k"]);
    let template = encoder.serialize(&key, &Entry::new(Value::Null)).expect("encodable");
    if encoder.file_extension() == NativeEncoder.file_extension() {
        let text = String::from_utf8(template).expect("native output is UTF-8");
        let encoded = format!("data bincode(base64(\"{}\"))", STANDARD.encode(value_bytes));
        return text.replace("data null", &encoded).into_bytes();
    }
    // Magic, key, then the value: `Null` is the single byte after the key.
    let at = b"HOARDSE1".len() + codec::encode(&key).expect("encodable").len();
    assert_eq!(template[at], 0);
    [&template[..at], value_bytes, &template[at + 1..]].concat()
}

fn nested_map() -> Value {
    let inner = BTreeMap::from([
        ("depth".to_owned(), Value::from(2)),
        ("tags".to_owned(), Value::from(vec![Value::from("x"), Value::Null])),
    ]);
    Value::Map(BTreeMap::from([
        ("inner".to_owned(), Value::Map(inner)),
        ("name".to_owned(), Value::from("line one\nline two")),
        ("ratio".to_owned(), Value::from(0.25)),
    ]))
}

#[rstest]
#[case::boolean(Value::from(false))]
#[case::integer(Value::from(i64::MIN))]
#[case::float(Value::from(1.5e-300))]
#[case::whole_float(Value::from(3.0))]
#[case::infinity(Value::from(f64::INFINITY))]
#[case::null(Value::Null)]
#[case::awkward_string(Value::from("tab\t\"quoted\" back\\slash \u{1b}[0m nul\0 ünïcode"))]
#[case::empty_string(Value::from(""))]
#[case::binary(Value::from(vec![0_u8, 1, 2, 254, 255]))]
#[case::list(Value::from(vec![Value::from(1), Value::from("two"), Value::from(vec![3_u8])]))]
#[case::nested_map(nested_map())]
#[case::empty_map(Value::Map(BTreeMap::new()))]
fn entries_survive_encoding(
    #[values(&NativeEncoder as &dyn Encoder, &SerdeEncoder as &dyn Encoder)] encoder: &dyn Encoder,
    #[case] data: Value,
) {
    let key = Key::new(["scope", "item name"]);
    let entry = Entry::new(data);

    let bytes = encoder.serialize(&key, &entry).expect("encodable");
    let record = encoder.decode(&bytes).expect("decodable");

    assert_eq!(record.key, key);
    assert_eq!(record.entry, entry);
}

#[rstest]
fn expiration_survives_encoding(
    #[values(&NativeEncoder as &dyn Encoder, &SerdeEncoder as &dyn Encoder)] encoder: &dyn Encoder,
) {
    let entry = Entry::with_expiration("soon", UNIX_EPOCH + Duration::new(1_800_000_000, 123_456_789));

    let bytes = encoder.serialize(&Key::new(["k"]), &entry).expect("encodable");

    assert_eq!(encoder.decode(&bytes).expect("decodable").entry, entry);
}

#[rstest]
fn unusable_input_is_a_miss(
    #[values(&NativeEncoder as &dyn Encoder, &SerdeEncoder as &dyn Encoder)] encoder: &dyn Encoder,
) {
    let bytes = encoder
        .serialize(&Key::new(["k"]), &Entry::new(nested_map()))
        .expect("encodable");

    assert!(encoder.decode(&[]).is_none(), "empty input");
    assert!(encoder.decode(&bytes[..bytes.len() / 2]).is_none(), "truncated input");
    assert!(encoder.decode(b"\xff\xfe not a cache file").is_none(), "garbage input");

    let mut extended = bytes;
    extended.extend_from_slice(b"trailing");
    assert!(encoder.decode(&extended).is_none(), "trailing bytes");

    let deep = file_with_raw_value(encoder, &deeply_nested_value_bytes());
    assert!(encoder.decode(&deep).is_none(), "deeply nested input");
}

#[rstest]
fn raw_value_splicing_reads_back(
    #[values(&NativeEncoder as &dyn Encoder, &SerdeEncoder as &dyn Encoder)] encoder: &dyn Encoder,
) {
    let value = Value::from(vec![Value::from(1), Value::from("two")]);
    let file = file_with_raw_value(encoder, &codec::encode(&value).expect("encodable"));

    assert_eq!(encoder.decode(&file).expect("decodable").entry, Entry::new(value));
}

#[rstest]
fn values_nested_past_the_limit_are_not_written(
    #[values(&NativeEncoder as &dyn Encoder, &SerdeEncoder as &dyn Encoder)] encoder: &dyn Encoder,
) {
    let too_deep = (0..=Value::MAX_DEPTH).fold(Value::Null, |inner, _| Value::from(vec![inner]));

    assert!(encoder.serialize(&Key::new(["k"]), &Entry::new(too_deep)).is_err());
}

#[test]
fn encoders_do_not_read_each_other() {
    let key = Key::new(["k"]);
    let entry = Entry::new("shared");

    let native = NativeEncoder.serialize(&key, &entry).expect("encodable");
    let serde = SerdeEncoder.serialize(&key, &entry).expect("encodable");

    assert!(SerdeEncoder.decode(&native).is_none());
    assert!(NativeEncoder.decode(&serde).is_none());
    assert_ne!(NativeEncoder.file_extension(), SerdeEncoder.file_extension());
}

#[test]
fn native_files_are_readable_text() {
    let key = Key::new(["users", "42"]);
    let entry = Entry::new(Value::Map(BTreeMap::from([("name".to_owned(), Value::from("alice"))])));

    let text = String::from_utf8(NativeEncoder.serialize(&key, &entry).expect("encodable")).expect("utf-8");

    assert_eq!(
        text,
        "hoard-native 1\nkey \"users\" \"42\"\nexpires never\nmap 1\nset \"name\" \"alice\"\nloaded\n"
    );
}

#[test]
fn native_decodes_hand_written_files() {
    let text = "hoard-native 1\nkey \"a\"\nexpires never\nlist 3\npush 7\npush 2.5\npush \"x\\u{7f}\"\nloaded";

    let record = NativeEncoder.decode(text.as_bytes()).expect("decodable");

    assert_eq!(
        record.entry.into_data(),
        Value::from(vec![Value::from(7), Value::from(2.5), Value::from("x\u{7f}")])
    );
}
