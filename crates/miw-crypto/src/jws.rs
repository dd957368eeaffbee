//! # Detached JWS (RFC 7515 / RFC 7797)
//!
//! Compact JWS with a detached, unencoded payload: `<header>..<signature>`.
//! The protected header is fixed to
//! `{"alg":"EdDSA","b64":false,"crit":["b64"]}`.
//!
//! ## Signing Input
//!
//! The payload is built from one or more [`CanonicalBytes`] documents: the
//! SHA-256 digest of each document, concatenated in order. The Ed25519
//! signature covers `ASCII(base64url(header)) ‖ '.' ‖ payload`.
//!
//! Linked-data proofs pass the canonical proof options first and the
//! canonical credential second, so both are bound by one signature.

use std::fmt;
use std::str::FromStr;

use base64ct::{Base64UrlUnpadded, Encoding};
use miw_core::{sha256_digest, CanonicalBytes};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::ed25519::{Ed25519Signature, SigningKey, VerifyingKey};
use crate::error::CryptoError;

/// JWS algorithm identifier for Ed25519.
pub const JWS_ALGORITHM: &str = "EdDSA";

#[derive(Debug, Serialize, Deserialize)]
struct ProtectedHeader {
    alg: String,
    b64: bool,
    crit: Vec<String>,
}

impl ProtectedHeader {
    fn eddsa_detached() -> Self {
        Self {
            alg: JWS_ALGORITHM.to_string(),
            b64: false,
            crit: vec!["b64".to_string()],
        }
    }

    fn encode(&self) -> Result<String, CryptoError> {
        let canonical = CanonicalBytes::new(self)
            .map_err(|e| CryptoError::MalformedJws(format!("header: {e}")))?;
        Ok(Base64UrlUnpadded::encode_string(canonical.as_bytes()))
    }

    fn decode(encoded: &str) -> Result<Self, CryptoError> {
        let raw = Base64UrlUnpadded::decode_vec(encoded)
            .map_err(|_| CryptoError::MalformedJws("header is not base64url".to_string()))?;
        serde_json::from_slice(&raw)
            .map_err(|e| CryptoError::MalformedJws(format!("header is not JSON: {e}")))
    }

    fn check_supported(&self) -> Result<(), CryptoError> {
        if self.alg != JWS_ALGORITHM {
            return Err(CryptoError::UnsupportedJwsHeader(format!("alg {}", self.alg)));
        }
        if self.b64 || !self.crit.iter().any(|c| c == "b64") {
            return Err(CryptoError::UnsupportedJwsHeader(
                "payload must be detached and unencoded (b64=false, crit=[b64])".to_string(),
            ));
        }
        Ok(())
    }
}

/// A compact JWS with detached payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetachedJws {
    header: String,
    signature: Ed25519Signature,
}

impl DetachedJws {
    /// The base64url protected header segment.
    pub fn header(&self) -> &str {
        &self.header
    }

    /// The signature carried in the third segment.
    pub fn signature(&self) -> &Ed25519Signature {
        &self.signature
    }
}

impl fmt::Display for DetachedJws {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}..{}",
            self.header,
            Base64UrlUnpadded::encode_string(self.signature.as_bytes())
        )
    }
}

impl FromStr for DetachedJws {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split('.');
        let (header, payload, signature) = match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(h), Some(p), Some(sig), None) => (h, p, sig),
            _ => {
                return Err(CryptoError::MalformedJws(
                    "expected three dot-separated segments".to_string(),
                ))
            }
        };
        if !payload.is_empty() {
            return Err(CryptoError::MalformedJws("payload segment must be empty".to_string()));
        }
        ProtectedHeader::decode(header)?.check_supported()?;
        let sig_bytes = Base64UrlUnpadded::decode_vec(signature)
            .map_err(|_| CryptoError::MalformedJws("signature is not base64url".to_string()))?;
        Ok(Self {
            header: header.to_string(),
            signature: Ed25519Signature::from_slice(&sig_bytes)?,
        })
    }
}

impl Serialize for DetachedJws {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DetachedJws {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

fn signing_input(header: &str, documents: &[&CanonicalBytes]) -> Vec<u8> {
    let mut input = Vec::with_capacity(header.len() + 1 + 32 * documents.len());
    input.extend_from_slice(header.as_bytes());
    input.push(b'.');
    for doc in documents {
        input.extend_from_slice(sha256_digest(doc).as_bytes());
    }
    input
}

/// Sign `documents` as a detached JWS.
pub fn sign_detached(
    key: &SigningKey,
    documents: &[&CanonicalBytes],
) -> Result<DetachedJws, CryptoError> {
    let header = ProtectedHeader::eddsa_detached().encode()?;
    let signature = key.sign_raw(&signing_input(&header, documents));
    Ok(DetachedJws { header, signature })
}

/// Verify a detached JWS over `documents`.
pub fn verify_detached(
    jws: &DetachedJws,
    documents: &[&CanonicalBytes],
    key: &VerifyingKey,
) -> Result<(), CryptoError> {
    ProtectedHeader::decode(&jws.header)?.check_supported()?;
    key.verify_raw(&signing_input(&jws.header, documents), &jws.signature)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(v: serde_json::Value) -> CanonicalBytes {
        CanonicalBytes::new(&v).unwrap()
    }

    #[test]
    fn header_is_canonical_eddsa() {
        let header = ProtectedHeader::eddsa_detached().encode().unwrap();
        let raw = Base64UrlUnpadded::decode_vec(&header).unwrap();
        assert_eq!(raw, br#"{"alg":"EdDSA","b64":false,"crit":["b64"]}"#);
    }

    #[test]
    fn sign_verify_round_trip() {
        let key = SigningKey::from_bytes(&[3u8; 32]);
        let options = doc(serde_json::json!({"type": "JsonWebSignature2020"}));
        let credential = doc(serde_json::json!({"id": "urn:uuid:1"}));
        let jws = sign_detached(&key, &[&options, &credential]).unwrap();

        let text = jws.to_string();
        assert!(text.contains(".."));
        let parsed: DetachedJws = text.parse().unwrap();
        assert_eq!(parsed, jws);
        verify_detached(&parsed, &[&options, &credential], &key.verifying_key()).unwrap();
    }

    #[test]
    fn document_order_matters() {
        let key = SigningKey::from_bytes(&[4u8; 32]);
        let a = doc(serde_json::json!({"a": 1}));
        let b = doc(serde_json::json!({"b": 2}));
        let jws = sign_detached(&key, &[&a, &b]).unwrap();
        assert!(verify_detached(&jws, &[&b, &a], &key.verifying_key()).is_err());
    }

    #[test]
    fn signing_is_deterministic() {
        let key = SigningKey::from_bytes(&[5u8; 32]);
        let d = doc(serde_json::json!({"x": "y"}));
        assert_eq!(
            sign_detached(&key, &[&d]).unwrap(),
            sign_detached(&key, &[&d]).unwrap()
        );
    }

    #[test]
    fn rejects_attached_payload_and_bad_shapes() {
        let key = SigningKey::from_bytes(&[6u8; 32]);
        let d = doc(serde_json::json!({}));
        let text = sign_detached(&key, &[&d]).unwrap().to_string();
        let (header, sig) = text.split_once("..").unwrap();

        assert!(format!("{header}.e30.{sig}").parse::<DetachedJws>().is_err());
        assert!(format!("{header}..").parse::<DetachedJws>().is_err());
        assert!(header.parse::<DetachedJws>().is_err());
        assert!(format!("{header}..{sig}.x").parse::<DetachedJws>().is_err());
    }

    #[test]
    fn rejects_other_algorithms() {
        let header = Base64UrlUnpadded::encode_string(br#"{"alg":"ES256","b64":false,"crit":["b64"]}"#);
        let sig = Base64UrlUnpadded::encode_string(&[0u8; 64]);
        let err = format!("{header}..{sig}").parse::<DetachedJws>().unwrap_err();
        assert!(matches!(err, CryptoError::UnsupportedJwsHeader(_)));
    }

    #[test]
    fn serde_as_string() {
        let key = SigningKey::from_bytes(&[8u8; 32]);
        let jws = sign_detached(&key, &[&doc(serde_json::json!([1, 2]))]).unwrap();
        let json = serde_json::to_value(&jws).unwrap();
        assert_eq!(json.as_str().unwrap(), jws.to_string());
        let back: DetachedJws = serde_json::from_value(json).unwrap();
        assert_eq!(back, jws);
    }
}
