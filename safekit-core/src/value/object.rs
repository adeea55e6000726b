//! Conversion between arbitrary serde objects and [`TypedValue`] trees.

use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Number, Value};

use crate::error::{DecodeError, StoreError, StoreResult};

use super::TypedValue;

impl TypedValue {
    /// Converts any serializable object into a value tree.
    ///
    /// JSON objects become maps, arrays become lists, numbers become
    /// [`TypedValue::Int`] when they fit in an `i64` and [`TypedValue::Double`]
    /// otherwise. Map entries whose value is `null` (typically `None` fields)
    /// are omitted.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Serialization`] if the object fails to serialize
    /// or contains a `null` outside of a map entry.
    pub fn from_serialize<T: Serialize + ?Sized>(object: &T) -> StoreResult<Self> {
        let json =
            serde_json::to_value(object).map_err(|e| StoreError::serialization(e.to_string()))?;
        Self::try_from(json)
    }

    /// Rebuilds a typed object from a value tree.
    ///
    /// Byte payloads are presented to the deserializer as arrays of numbers,
    /// which is how serde represents `Vec<u8>` fields.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::ObjectMismatch`] if the tree does not match the
    /// shape of `T`.
    pub fn deserialize_into<T: DeserializeOwned>(self) -> Result<T, DecodeError> {
        serde_json::from_value(Value::from(self))
            .map_err(|e| DecodeError::ObjectMismatch(e.to_string()))
    }
}

impl TryFrom<Value> for TypedValue {
    type Error = StoreError;

    fn try_from(value: Value) -> StoreResult<Self> {
        match value {
            Value::Null => Err(StoreError::serialization("null values cannot be stored")),
            Value::Bool(b) => Ok(Self::Bool(b)),
            Value::Number(n) => number_to_typed(&n),
            Value::String(s) => Ok(Self::String(s)),
            Value::Array(items) => items
                .into_iter()
                .map(Self::try_from)
                .collect::<StoreResult<Vec<_>>>()
                .map(Self::List),
            Value::Object(entries) => entries
                .into_iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| Self::try_from(v).map(|v| (k, v)))
                .collect::<StoreResult<_>>()
                .map(Self::Map),
        }
    }
}

fn number_to_typed(n: &Number) -> StoreResult<TypedValue> {
    if let Some(i) = n.as_i64() {
        return Ok(TypedValue::Int(i));
    }
    n.as_f64()
        .map(TypedValue::Double)
        .ok_or_else(|| StoreError::serialization(format!("unrepresentable number {n}")))
}

impl From<TypedValue> for Value {
    fn from(value: TypedValue) -> Self {
        match value {
            TypedValue::String(s) => Self::String(s),
            TypedValue::Int(i) => Self::Number(i.into()),
            TypedValue::Double(d) => Number::from_f64(d).map_or(Self::Null, Self::Number),
            TypedValue::Bool(b) => Self::Bool(b),
            TypedValue::Bytes(bytes) => {
                Self::Array(bytes.into_iter().map(|b| Self::Number(b.into())).collect())
            }
            TypedValue::List(items) => Self::Array(items.into_iter().map(Self::from).collect()),
            TypedValue::Map(entries) => Self::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, Self::from(v)))
                    .collect::<Map<_, _>>(),
            ),
        }
    }
}
