//! # Canonical Serialization — JCS Byte Production
//!
//! This module defines `CanonicalBytes`, the sole construction path for bytes
//! that are digested or signed anywhere in the issuance stack.
//!
//! ## Security Invariant
//!
//! The `CanonicalBytes` newtype has a private inner field. The only way to
//! construct it is through [`CanonicalBytes::new()`] or
//! [`CanonicalBytes::from_value()`], which apply the coercion pipeline
//! below before JCS serialization. Any function that signs or digests a
//! credential must accept `&CanonicalBytes`, so a credential can never be
//! signed over a non-canonical byte sequence.
//!
//! ## Coercion Rules
//!
//! 1. **Reject floats.** Non-integer numbers have no stable canonical
//!    rendering across verifiers; claims must carry them as strings.
//! 2. **Timestamps** are rendered by [`Timestamp`](crate::Timestamp) as
//!    `YYYY-MM-DDTHH:MM:SSZ` before they reach this layer.
//! 3. **Object keys** are already strings in `serde_json::Value`.
//!
//! After coercion, serialization uses `serde_jcs` for RFC 8785 output:
//! sorted keys, compact separators, deterministic byte sequence regardless
//! of in-memory field order.

use serde::Serialize;
use serde_json::Value;

use crate::error::CanonicalizationError;

/// Bytes produced exclusively by JCS canonicalization with float rejection.
///
/// # Invariants
///
/// - Constructed only via [`CanonicalBytes::new()`] or [`CanonicalBytes::from_value()`].
/// - Numbers are integers; floats are rejected.
/// - Object keys are sorted, separators compact (RFC 8785).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalBytes(Vec<u8>);

impl CanonicalBytes {
    /// Construct canonical bytes from any serializable value.
    ///
    /// # Errors
    ///
    /// Returns `CanonicalizationError::FloatRejected` if the value contains a
    /// non-integer number, `CanonicalizationError::SerializationFailed` if
    /// the value cannot be represented as JSON.
    pub fn new(obj: &impl Serialize) -> Result<Self, CanonicalizationError> {
        let value = serde_json::to_value(obj)?;
        Self::from_value(value)
    }

    /// Construct canonical bytes from an already-built JSON value.
    pub fn from_value(value: Value) -> Result<Self, CanonicalizationError> {
        let coerced = coerce_json_value(value)?;
        let bytes = serialize_canonical(&coerced)?;
        Ok(Self(bytes))
    }

    /// Access the canonical bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Returns the length of the canonical byte sequence.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the canonical byte sequence is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<[u8]> for CanonicalBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Recursively validate a JSON value against the canonicalization rules.
///
/// `null`, `bool`, `string` and integers pass through; non-integer numbers
/// are rejected; arrays and objects are recursed.
fn coerce_json_value(value: Value) -> Result<Value, CanonicalizationError> {
    match value {
        Value::Null | Value::Bool(_) | Value::String(_) => Ok(value),
        Value::Number(ref n) => {
            if n.is_f64() && !n.is_i64() && !n.is_u64() {
                if let Some(f) = n.as_f64() {
                    return Err(CanonicalizationError::FloatRejected(f));
                }
            }
            Ok(value)
        }
        Value::Object(map) => {
            let mut coerced = serde_json::Map::new();
            for (k, v) in map {
                coerced.insert(k, coerce_json_value(v)?);
            }
            Ok(Value::Object(coerced))
        }
        Value::Array(arr) => {
            let coerced: Result<Vec<_>, _> = arr.into_iter().map(coerce_json_value).collect();
            Ok(Value::Array(coerced?))
        }
    }
}

/// Serialize a JSON value in JCS-canonical form (RFC 8785).
fn serialize_canonical(value: &Value) -> Result<Vec<u8>, CanonicalizationError> {
    let s = serde_jcs::to_string(value)?;
    Ok(s.into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sorts_keys_with_compact_separators() {
        let data = serde_json::json!({"b": 2, "a": 1, "c": "hello"});
        let cb = CanonicalBytes::new(&data).expect("should canonicalize");
        let s = std::str::from_utf8(cb.as_bytes()).unwrap();
        assert_eq!(s, r#"{"a":1,"b":2,"c":"hello"}"#);
    }

    #[test]
    fn nested_objects_are_sorted() {
        let data = serde_json::json!({
            "outer": {"b": 2, "a": 1},
            "list": [3, 2, 1]
        });
        let cb = CanonicalBytes::new(&data).expect("should canonicalize");
        let s = std::str::from_utf8(cb.as_bytes()).unwrap();
        assert_eq!(s, r#"{"list":[3,2,1],"outer":{"a":1,"b":2}}"#);
    }

    #[test]
    fn float_is_rejected() {
        let data = serde_json::json!({"amount": 1.5});
        match CanonicalBytes::new(&data).unwrap_err() {
            CanonicalizationError::FloatRejected(f) => assert_eq!(f, 1.5),
            other => panic!("expected FloatRejected, got: {other}"),
        }
    }

    #[test]
    fn deeply_nested_float_is_rejected() {
        let data = serde_json::json!({"a": {"b": [{"c": 3.25}]}});
        assert!(CanonicalBytes::new(&data).is_err());
    }

    #[test]
    fn integers_and_literals_pass_through() {
        let data = serde_json::json!({"n": -42, "big": 9999999999i64, "flag": true, "none": null});
        let cb = CanonicalBytes::new(&data).unwrap();
        let s = std::str::from_utf8(cb.as_bytes()).unwrap();
        assert_eq!(s, r#"{"big":9999999999,"flag":true,"n":-42,"none":null}"#);
    }

    #[test]
    fn empty_containers() {
        assert_eq!(CanonicalBytes::new(&serde_json::json!({})).unwrap().as_bytes(), b"{}");
        assert_eq!(CanonicalBytes::new(&serde_json::json!([])).unwrap().as_bytes(), b"[]");
    }

    #[test]
    fn from_value_matches_new() {
        let data = serde_json::json!({"z": [1, 2], "a": "x"});
        let a = CanonicalBytes::new(&data).unwrap();
        let b = CanonicalBytes::from_value(data).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn unicode_is_emitted_as_utf8() {
        let data = serde_json::json!({"name": "\u{00e9}t\u{00e9}"});
        let cb = CanonicalBytes::new(&data).unwrap();
        let s = std::str::from_utf8(cb.as_bytes()).unwrap();
        assert!(s.contains('\u{00e9}'));
        assert!(!cb.is_empty());
    }
}
