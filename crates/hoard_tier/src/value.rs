// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::{self, DeserializeSeed, EnumAccess, MapAccess, SeqAccess, VariantAccess, Visitor};
use serde::ser::{self, Serializer};
use serde::{Deserialize, Deserializer, Serialize};

/// A cacheable value.
///
/// `Value` is the data model shared by every backend. Scalars keep their exact
/// type across a round trip through any backend, so an `Int(1)` never comes back
/// as `Float(1.0)` and `Bytes` never comes back as `String`.
///
/// Lists and maps nest at most [`Value::MAX_DEPTH`] levels deep. Serializing a
/// deeper value fails, and so does deserializing one, before the input can
/// exhaust the stack.
///
/// # Examples
///
/// ```
/// use std::collections::BTreeMap;
/// use hoard_tier::Value;
///
/// let profile = Value::from(BTreeMap::from([
///     ("name".to_owned(), Value::from("alice")),
///     ("age".to_owned(), Value::from(42)),
/// ]));
/// assert!(profile.is_container());
/// assert!(!Value::from(true).is_container());
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Value {
    /// The absence of a value.
    #[default]
    Null,
    /// A boolean.
    Bool(bool),
    /// A signed 64-bit integer.
    Int(i64),
    /// A 64-bit float.
    Float(f64),
    /// A UTF-8 string.
    String(String),
    /// Opaque binary data.
    Bytes(Vec<u8>),
    /// An ordered list of values.
    List(Vec<Value>),
    /// A string-keyed map, ordered by key.
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// Deepest nesting of lists and maps a value may have.
    pub const MAX_DEPTH: usize = 128;

    /// Returns how many lists and maps enclose the deepest element, counting
    /// this value. Scalars have depth 0.
    ///
    /// # Examples
    ///
    /// ```
    /// use hoard_tier::Value;
    ///
    /// assert_eq!(Value::from(1).depth(), 0);
    /// assert_eq!(Value::from(Vec::<Value>::new()).depth(), 1);
    /// assert_eq!(Value::from(vec![Value::from(vec![Value::Null])]).depth(), 2);
    /// ```
    #[must_use]
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut pending = vec![(self, 0_usize)];
        while let Some((value, level)) = pending.pop() {
            match value {
                Self::List(items) => {
                    deepest = deepest.max(level + 1);
                    pending.extend(items.iter().map(|item| (item, level + 1)));
                }
                Self::Map(map) => {
                    deepest = deepest.max(level + 1);
                    pending.extend(map.values().map(|item| (item, level + 1)));
                }
                _ => {}
            }
        }
        deepest
    }

    /// Returns `true` for lists and maps.
    #[must_use]
    pub fn is_container(&self) -> bool {
        matches!(self, Self::List(_) | Self::Map(_))
    }

    /// Returns the string slice if this is a [`Value::String`].
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the bytes if this is a [`Value::Bytes`].
    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(b) => Some(b),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(value)
    }
}

impl From<Vec<Self>> for Value {
    fn from(value: Vec<Self>) -> Self {
        Self::List(value)
    }
}

impl From<BTreeMap<String, Self>> for Value {
    fn from(value: BTreeMap<String, Self>) -> Self {
        Self::Map(value)
    }
}

const NAME: &str = "Value";
const VARIANTS: &[&str] = &["Null", "Bool", "Int", "Float", "String", "Bytes", "List", "Map"];

fn too_deep() -> String {
    format!("value nests deeper than {} lists or maps", Value::MAX_DEPTH)
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        Nested { value: self, level: 0 }.serialize(serializer)
    }
}

/// A value with the number of containers around it.
struct Nested<'a> {
    value: &'a Value,
    level: usize,
}

impl Nested<'_> {
    fn inner_level<E: ser::Error>(&self) -> Result<usize, E> {
        if self.level >= Value::MAX_DEPTH {
            return Err(E::custom(too_deep()));
        }
        Ok(self.level + 1)
    }
}

impl Serialize for Nested<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.value {
            Value::Null => serializer.serialize_unit_variant(NAME, 0, "Null"),
            Value::Bool(b) => serializer.serialize_newtype_variant(NAME, 1, "Bool", b),
            Value::Int(i) => serializer.serialize_newtype_variant(NAME, 2, "Int", i),
            Value::Float(f) => serializer.serialize_newtype_variant(NAME, 3, "Float", f),
            Value::String(s) => serializer.serialize_newtype_variant(NAME, 4, "String", s),
            Value::Bytes(bytes) => serializer.serialize_newtype_variant(NAME, 5, "Bytes", bytes),
            Value::List(items) => {
                let level = self.inner_level::<S::Error>()?;
                serializer.serialize_newtype_variant(NAME, 6, "List", &NestedList { items, level })
            }
            Value::Map(map) => {
                let level = self.inner_level::<S::Error>()?;
                serializer.serialize_newtype_variant(NAME, 7, "Map", &NestedMap { map, level })
            }
        }
    }
}

struct NestedList<'a> {
    items: &'a [Value],
    level: usize,
}

impl Serialize for NestedList<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let level = self.level;
        serializer.collect_seq(self.items.iter().map(|value| Nested { value, level }))
    }
}

struct NestedMap<'a> {
    map: &'a BTreeMap<String, Value>,
    level: usize,
}

impl Serialize for NestedMap<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let level = self.level;
        serializer.collect_map(self.map.iter().map(|(name, value)| (name, Nested { value, level })))
    }
}

#[derive(Deserialize)]
#[serde(variant_identifier)]
enum Tag {
    Null,
    Bool,
    Int,
    Float,
    String,
    Bytes,
    List,
    Map,
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        ValueSeed { level: 0 }.deserialize(deserializer)
    }
}

/// Deserializes a value found inside `level` containers.
#[derive(Clone, Copy)]
struct ValueSeed {
    level: usize,
}

impl ValueSeed {
    fn inner<E: de::Error>(self) -> Result<Self, E> {
        if self.level >= Value::MAX_DEPTH {
            return Err(E::custom(too_deep()));
        }
        Ok(Self { level: self.level + 1 })
    }
}

impl<'de> DeserializeSeed<'de> for ValueSeed {
    type Value = Value;

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<Value, D::Error> {
        deserializer.deserialize_enum(NAME, VARIANTS, self)
    }
}

impl<'de> Visitor<'de> for ValueSeed {
    type Value = Value;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a cache value")
    }

    fn visit_enum<A: EnumAccess<'de>>(self, data: A) -> Result<Value, A::Error> {
        let (tag, variant) = data.variant::<Tag>()?;
        Ok(match tag {
            Tag::Null => {
                variant.unit_variant()?;
                Value::Null
            }
            Tag::Bool => Value::Bool(variant.newtype_variant()?),
            Tag::Int => Value::Int(variant.newtype_variant()?),
            Tag::Float => Value::Float(variant.newtype_variant()?),
            Tag::String => Value::String(variant.newtype_variant()?),
            Tag::Bytes => Value::Bytes(variant.newtype_variant()?),
            Tag::List => Value::List(variant.newtype_variant_seed(ListSeed(self.inner::<A::Error>()?))?),
            Tag::Map => Value::Map(variant.newtype_variant_seed(MapSeed(self.inner::<A::Error>()?))?),
        })
    }
}

/// Upper bound on capacity reserved from an untrusted length prefix.
const MAX_PREALLOCATED: usize = 4096;

struct ListSeed(ValueSeed);

impl<'de> DeserializeSeed<'de> for ListSeed {
    type Value = Vec<Value>;

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<Vec<Value>, D::Error> {
        deserializer.deserialize_seq(self)
    }
}

impl<'de> Visitor<'de> for ListSeed {
    type Value = Vec<Value>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a list of cache values")
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Vec<Value>, A::Error> {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0).min(MAX_PREALLOCATED));
        while let Some(item) = seq.next_element_seed(self.0)? {
            items.push(item);
        }
        Ok(items)
    }
}

struct MapSeed(ValueSeed);

impl<'de> DeserializeSeed<'de> for MapSeed {
    type Value = BTreeMap<String, Value>;

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
        deserializer.deserialize_map(self)
    }
}

impl<'de> Visitor<'de> for MapSeed {
    type Value = BTreeMap<String, Value>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map of cache values")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut map = BTreeMap::new();
        while let Some(name) = access.next_key::<String>()? {
            let value = access.next_value_seed(self.0)?;
            map.insert(name, value);
        }
        Ok(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec;

    fn nested(depth: usize) -> Value {
        (0..depth).fold(Value::Null, |inner, _| Value::from(vec![inner]))
    }

    #[test]
    fn depth_counts_containers() {
        assert_eq!(Value::from("x").depth(), 0);
        assert_eq!(nested(3).depth(), 3);
        let map = Value::from(BTreeMap::from([
            ("flat".to_owned(), Value::from(1)),
            ("deep".to_owned(), nested(2)),
        ]));
        assert_eq!(map.depth(), 3);
    }

    #[test]
    fn serialization_matches_external_tagging() {
        let value = Value::from(BTreeMap::from([
            ("n".to_owned(), Value::Null),
            ("list".to_owned(), Value::from(vec![Value::from(1), Value::from(2.5)])),
        ]));
        let json = serde_json::to_value(&value).expect("serializable");
        assert_eq!(
            json,
            serde_json::json!({ "Map": { "list": { "List": [{ "Int": 1 }, { "Float": 2.5 }] }, "n": "Null" } })
        );
        assert_eq!(serde_json::from_value::<Value>(json).expect("deserializable"), value);
    }

    #[test]
    fn nesting_limit_applies_both_ways() {
        let deepest = nested(Value::MAX_DEPTH);
        let bytes = codec::encode(&deepest).expect("at the limit");
        assert_eq!(codec::decode::<Value>(&bytes), Some(deepest));

        let err = codec::encode(&nested(Value::MAX_DEPTH + 1)).expect_err("past the limit");
        assert!(err.to_string().contains("nests deeper"), "{err}");
        assert!(codec::encoded_len(&nested(Value::MAX_DEPTH + 1)).is_err());
    }

    #[test]
    fn crafted_deep_input_is_rejected_without_recursing() {
        // Tag 6 is `List`, followed by a length of one.
        let mut bytes = [6_u8, 1].repeat(1_000_000);
        bytes.push(0);
        assert_eq!(codec::decode::<Value>(&bytes), None);
    }

    #[test]
    fn unknown_variant_is_rejected() {
        assert!(serde_json::from_str::<Value>(r#"{ "Set": [] }"#).is_err());
    }
}
