//! Typed values and their storage encoding.
//!
//! Every stored entry carries its own type tag, so a read that asks for the
//! wrong kind yields an absent value instead of a decode error.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

pub mod codec;
mod object;

pub use codec::{decode, decode_as, decode_lenient, encode};

/// A value that can be stored under a key.
///
/// Lists and maps nest arbitrarily. Maps are ordered by key, which keeps the
/// stored encoding deterministic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum TypedValue {
    /// UTF-8 text.
    String(String),
    /// 64-bit signed integer.
    Int(i64),
    /// IEEE-754 double. Must be finite to be stored.
    Double(f64),
    /// Boolean flag.
    Bool(bool),
    /// Opaque byte sequence.
    Bytes(#[serde(with = "base64_bytes")] Vec<u8>),
    /// Ordered sequence of values.
    List(Vec<TypedValue>),
    /// String-keyed mapping of values.
    Map(BTreeMap<String, TypedValue>),
}

/// The type tag of a [`TypedValue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum ValueKind {
    /// See [`TypedValue::String`].
    String,
    /// See [`TypedValue::Int`].
    Int,
    /// See [`TypedValue::Double`].
    Double,
    /// See [`TypedValue::Bool`].
    Bool,
    /// See [`TypedValue::Bytes`].
    Bytes,
    /// See [`TypedValue::List`].
    List,
    /// See [`TypedValue::Map`].
    Map,
}

impl TypedValue {
    /// Returns the type tag of this value.
    #[must_use]
    pub const fn kind(&self) -> ValueKind {
        match self {
            Self::String(_) => ValueKind::String,
            Self::Int(_) => ValueKind::Int,
            Self::Double(_) => ValueKind::Double,
            Self::Bool(_) => ValueKind::Bool,
            Self::Bytes(_) => ValueKind::Bytes,
            Self::List(_) => ValueKind::List,
            Self::Map(_) => ValueKind::Map,
        }
    }

    /// Returns the string payload, if this is a string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }
}

/// Rust types that map onto exactly one [`ValueKind`].
///
/// Used by typed reads: a stored value of any other kind reads as absent.
pub trait StoredValue: Sized + Into<TypedValue> {
    /// The kind this type is stored as.
    const KIND: ValueKind;

    /// Extracts `Self` from a value of kind [`Self::KIND`].
    fn from_typed(value: TypedValue) -> Option<Self>;
}

macro_rules! stored_value {
    ($ty:ty, $variant:ident) => {
        impl From<$ty> for TypedValue {
            fn from(value: $ty) -> Self {
                Self::$variant(value)
            }
        }

        impl StoredValue for $ty {
            const KIND: ValueKind = ValueKind::$variant;

            fn from_typed(value: TypedValue) -> Option<Self> {
                match value {
                    TypedValue::$variant(inner) => Some(inner),
                    _ => None,
                }
            }
        }
    };
}

stored_value!(String, String);
stored_value!(i64, Int);
stored_value!(f64, Double);
stored_value!(bool, Bool);
stored_value!(Vec<u8>, Bytes);
stored_value!(Vec<TypedValue>, List);
stored_value!(BTreeMap<String, TypedValue>, Map);

impl From<&str> for TypedValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<i32> for TypedValue {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

/// Base64 (standard alphabet) representation for byte payloads.
mod base64_bytes {
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use serde::{de::Error as _, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map_err(|e| D::Error::custom(format!("invalid base64 payload: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test_case(TypedValue::from("hi"), ValueKind::String)]
    #[test_case(TypedValue::from(7_i32), ValueKind::Int)]
    #[test_case(TypedValue::from(0.5_f64), ValueKind::Double)]
    #[test_case(TypedValue::from(true), ValueKind::Bool)]
    #[test_case(TypedValue::from(vec![1_u8, 2]), ValueKind::Bytes)]
    #[test_case(TypedValue::List(vec![]), ValueKind::List)]
    #[test_case(TypedValue::Map(BTreeMap::new()), ValueKind::Map)]
    fn test_kind(value: TypedValue, expected: ValueKind) {
        assert_eq!(value.kind(), expected);
    }

    #[test]
    fn test_from_typed_rejects_other_kinds() {
        assert_eq!(i64::from_typed(TypedValue::Int(42)), Some(42));
        assert_eq!(i64::from_typed(TypedValue::Double(42.0)), None);
        assert_eq!(f64::from_typed(TypedValue::Int(42)), None);
        assert_eq!(String::from_typed(TypedValue::Bytes(b"hi".to_vec())), None);
        assert_eq!(
            String::from_typed(TypedValue::from("hi")),
            Some("hi".to_string())
        );
    }

    #[test]
    fn test_value_kind_names() {
        assert_eq!(ValueKind::Bytes.to_string(), "bytes");
        assert_eq!("map".parse::<ValueKind>().unwrap(), ValueKind::Map);
    }
}
