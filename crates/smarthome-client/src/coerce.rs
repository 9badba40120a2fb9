//! Tolerant decoding of loosely-typed device registry fields
//!
//! The registry has emitted identifiers both as JSON numbers and as JSON
//! strings over its lifetime. Instead of rejecting a payload on such a
//! mismatch, fields are decoded into an explicit tagged union first and then
//! coerced to the gateway's types with a fixed fallback:
//!
//! | JSON shape          | `id` (u64)                  | `room_id` (String)   |
//! |---------------------|-----------------------------|----------------------|
//! | integer             | value, 0 if negative        | decimal form         |
//! | float               | truncated, 0 if negative    | truncated, decimal   |
//! | string              | parsed if numeric, else 0   | verbatim             |
//! | null/bool/array/obj | 0                           | `""`                 |
//!
//! A coerced id of 0 cannot be told apart from a real id of 0.

use std::fmt;

use serde::de::{self, Deserializer, IgnoredAny, MapAccess, SeqAccess, Visitor};
use serde::Deserialize;

use crate::types::JsonObject;

/// A JSON scalar as it arrived in an identifier field
#[derive(Debug, Clone, PartialEq, Default)]
pub enum RawIdentifier {
    Integer(i64),
    Unsigned(u64),
    Float(f64),
    Text(String),
    /// null, boolean, array, object, or a missing field
    #[default]
    Unsupported,
}

impl<'de> Deserialize<'de> for RawIdentifier {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(RawIdentifierVisitor)
    }
}

struct RawIdentifierVisitor;

impl<'de> Visitor<'de> for RawIdentifierVisitor {
    type Value = RawIdentifier;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("any JSON value")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        Ok(RawIdentifier::Integer(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        Ok(RawIdentifier::Unsigned(v))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
        Ok(RawIdentifier::Float(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        Ok(RawIdentifier::Text(v.to_owned()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Self::Value, E> {
        Ok(RawIdentifier::Text(v))
    }

    fn visit_bool<E: de::Error>(self, _v: bool) -> Result<Self::Value, E> {
        Ok(RawIdentifier::Unsupported)
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(RawIdentifier::Unsupported)
    }

    fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(RawIdentifier::Unsupported)
    }

    fn visit_some<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(self)
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
    where
        A: SeqAccess<'de>,
    {
        while seq.next_element::<IgnoredAny>()?.is_some() {}
        Ok(RawIdentifier::Unsupported)
    }

    fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        while map.next_entry::<IgnoredAny, IgnoredAny>()?.is_some() {}
        Ok(RawIdentifier::Unsupported)
    }
}

/// Coerce a raw device identifier to a non-negative integer
pub fn coerce_device_id(raw: &RawIdentifier) -> u64 {
    match raw {
        RawIdentifier::Integer(v) => u64::try_from(*v).unwrap_or(0),
        RawIdentifier::Unsigned(v) => *v,
        RawIdentifier::Float(v) if v.is_finite() && *v >= 0.0 => v.trunc() as u64,
        RawIdentifier::Float(_) => 0,
        RawIdentifier::Text(s) => s.trim().parse().unwrap_or(0),
        RawIdentifier::Unsupported => 0,
    }
}

/// Coerce a raw room identifier to its string form
pub fn coerce_room_id(raw: &RawIdentifier) -> String {
    match raw {
        RawIdentifier::Integer(v) => v.to_string(),
        RawIdentifier::Unsigned(v) => v.to_string(),
        RawIdentifier::Float(v) if v.is_finite() => (v.trunc() as i64).to_string(),
        RawIdentifier::Float(_) => String::new(),
        RawIdentifier::Text(s) => s.clone(),
        RawIdentifier::Unsupported => String::new(),
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LooseText {
    Text(String),
    Other(IgnoredAny),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LooseObject {
    Object(JsonObject),
    Other(IgnoredAny),
}

/// `deserialize_with` helper: a string, or `""` for any other shape
pub(crate) fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match LooseText::deserialize(deserializer)? {
        LooseText::Text(s) => s,
        LooseText::Other(_) => String::new(),
    })
}

/// `deserialize_with` helper: a JSON object, or `{}` for any other shape
pub(crate) fn lenient_object<'de, D>(deserializer: D) -> Result<JsonObject, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match LooseObject::deserialize(deserializer)? {
        LooseObject::Object(map) => map,
        LooseObject::Other(_) => JsonObject::new(),
    })
}

/// `deserialize_with` helper: `null` reads as `T::default()`; any other
/// shape must still match `T`
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
