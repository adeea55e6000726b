//! Storage encoding for [`TypedValue`].
//!
//! A stored value is a JSON document that names its own kind:
//!
//! ```text
//! {"type":"int","value":42}
//! {"type":"list","value":[{"type":"string","value":"a"},{"type":"bool","value":true}]}
//! {"type":"bytes","value":"AAEC"}
//! ```
//!
//! Map keys are emitted in sorted order, so equal values always encode to the
//! same bytes. Doubles are written in shortest round-trip form and parsed
//! exactly; integers and doubles never coerce into each other.

use crate::error::{DecodeError, StoreError, StoreResult};

use super::{TypedValue, ValueKind};

/// Encodes a value into its storage representation.
///
/// # Errors
///
/// Returns [`StoreError::Serialization`] if the value contains a non-finite
/// double, which JSON cannot represent.
pub fn encode(value: &TypedValue) -> StoreResult<Vec<u8>> {
    ensure_finite(value)?;
    serde_json::to_vec(value).map_err(|e| StoreError::serialization(e.to_string()))
}

/// Decodes a storage representation back into a value.
///
/// # Errors
///
/// Returns [`DecodeError::Malformed`] if the bytes are not a value document.
pub fn decode(bytes: &[u8]) -> Result<TypedValue, DecodeError> {
    serde_json::from_slice(bytes).map_err(|e| DecodeError::Malformed(e.to_string()))
}

/// Decodes a storage representation, treating malformed data as absent.
///
/// Failures are reported as warnings through the `log` facade.
#[must_use]
pub fn decode_lenient(bytes: &[u8]) -> Option<TypedValue> {
    match decode(bytes) {
        Ok(value) => Some(value),
        Err(err) => {
            log::warn!("discarding undecodable stored value ({} bytes): {err}", bytes.len());
            None
        }
    }
}

/// Decodes a storage representation and keeps it only if it has the
/// expected kind.
#[must_use]
pub fn decode_as(bytes: &[u8], expected: ValueKind) -> Option<TypedValue> {
    let value = decode_lenient(bytes)?;
    if value.kind() == expected {
        Some(value)
    } else {
        log::debug!("stored value is {}, requested {expected}", value.kind());
        None
    }
}

fn ensure_finite(value: &TypedValue) -> StoreResult<()> {
    match value {
        TypedValue::Double(d) if !d.is_finite() => Err(StoreError::serialization(format!(
            "non-finite double {d} cannot be stored"
        ))),
        TypedValue::List(items) => items.iter().try_for_each(ensure_finite),
        TypedValue::Map(entries) => entries.values().try_for_each(ensure_finite),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use test_case::test_case;

    use super::*;

    fn nested() -> TypedValue {
        let mut inner = BTreeMap::new();
        inner.insert("z".to_string(), TypedValue::Bool(false));
        inner.insert("a".to_string(), TypedValue::Bytes(vec![0, 255, 7]));
        inner.insert(
            "list".to_string(),
            TypedValue::List(vec![TypedValue::Int(-1), TypedValue::Double(1e-300)]),
        );

        let mut outer = BTreeMap::new();
        outer.insert("inner".to_string(), TypedValue::Map(inner));
        outer.insert("name".to_string(), TypedValue::from("ünïcödé ✓"));
        outer.insert("empty".to_string(), TypedValue::List(vec![]));
        TypedValue::Map(outer)
    }

    #[test_case(TypedValue::from("hello"); "string")]
    #[test_case(TypedValue::from(""); "empty string")]
    #[test_case(TypedValue::Int(i64::MIN); "min int")]
    #[test_case(TypedValue::Int(i64::MAX); "max int")]
    #[test_case(TypedValue::Double(0.1 + 0.2); "inexact double")]
    #[test_case(TypedValue::Double(-0.0); "negative zero")]
    #[test_case(TypedValue::Double(f64::MAX); "max double")]
    #[test_case(TypedValue::Bool(true); "bool")]
    #[test_case(TypedValue::Bytes(vec![]); "empty bytes")]
    #[test_case(TypedValue::Bytes((0..=255).collect()); "all bytes")]
    #[test_case(nested(); "nested containers")]
    fn test_round_trip(value: TypedValue) {
        let encoded = encode(&value).unwrap();
        assert_eq!(decode(&encoded).unwrap(), value);
    }

    #[test]
    fn test_negative_zero_keeps_sign() {
        let decoded = decode(&encode(&TypedValue::Double(-0.0)).unwrap()).unwrap();
        let TypedValue::Double(d) = decoded else {
            panic!("expected a double");
        };
        assert!(d.is_sign_negative());
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let mut forward = BTreeMap::new();
        let mut backward = BTreeMap::new();
        for key in ["a", "b", "c"] {
            forward.insert(key.to_string(), TypedValue::from(key));
        }
        for key in ["c", "b", "a"] {
            backward.insert(key.to_string(), TypedValue::from(key));
        }
        assert_eq!(
            encode(&TypedValue::Map(forward)).unwrap(),
            encode(&TypedValue::Map(backward)).unwrap()
        );
    }

    #[test]
    fn test_wire_shape() {
        let encoded = encode(&TypedValue::Int(42)).unwrap();
        assert_eq!(encoded, br#"{"type":"int","value":42}"#);

        let encoded = encode(&TypedValue::Bytes(vec![0, 1, 2])).unwrap();
        assert_eq!(encoded, br#"{"type":"bytes","value":"AAEC"}"#);
    }

    #[test]
    fn test_no_numeric_coercion() {
        let int = encode(&TypedValue::Int(3)).unwrap();
        assert!(decode_as(&int, ValueKind::Double).is_none());
        assert_eq!(decode_as(&int, ValueKind::Int), Some(TypedValue::Int(3)));

        let double = encode(&TypedValue::Double(3.0)).unwrap();
        assert!(decode_as(&double, ValueKind::Int).is_none());
    }

    #[test_case(f64::NAN; "nan")]
    #[test_case(f64::INFINITY; "infinity")]
    #[test_case(f64::NEG_INFINITY; "negative infinity")]
    fn test_non_finite_rejected(d: f64) {
        let err = encode(&TypedValue::Double(d)).unwrap_err();
        assert!(matches!(err, StoreError::Serialization(_)));

        let nested = TypedValue::List(vec![TypedValue::Int(1), TypedValue::Double(d)]);
        assert!(encode(&nested).is_err());
    }

    #[test_case(b"" as &[u8]; "empty")]
    #[test_case(b"hello"; "plain text")]
    #[test_case(br#"{"type":"int","value":"42"}"#; "wrong payload type")]
    #[test_case(br#"{"type":"uuid","value":"x"}"#; "unknown kind")]
    #[test_case(br#"{"type":"bytes","value":"***"}"#; "bad base64")]
    #[test_case(br#"{"type":"int","value":42.5}"#; "fractional int")]
    fn test_malformed_is_absent(bytes: &[u8]) {
        assert!(decode(bytes).is_err());
        assert!(decode_lenient(bytes).is_none());
        assert!(decode_as(bytes, ValueKind::Int).is_none());
    }
}
