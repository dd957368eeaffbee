//! # DID Documents
//!
//! The issuer's already-resolved DID document, as consumed by credential
//! assembly and proof verification. Resolution and publishing happen
//! elsewhere; this module only reads the document.
//!
//! Keys are published as `JsonWebKey2020` verification methods carrying an
//! OKP/Ed25519 JWK (`x` is the base64url public key).

use base64ct::{Base64UrlUnpadded, Encoding};
use miw_core::Did;
use miw_crypto::VerifyingKey;
use serde::{Deserialize, Serialize};

use crate::error::VcError;

/// DID core context.
pub const DID_CONTEXT: &str = "https://www.w3.org/ns/did/v1";
/// Verification method type for JWK-published keys.
pub const JSON_WEB_KEY_2020: &str = "JsonWebKey2020";

/// A public key in JWK form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicKeyJwk {
    /// Key type (`OKP`).
    pub kty: String,
    /// Curve (`Ed25519`).
    pub crv: String,
    /// Base64url public key bytes.
    pub x: String,
}

impl PublicKeyJwk {
    /// JWK for an Ed25519 public key.
    pub fn ed25519(key: &VerifyingKey) -> Self {
        Self {
            kty: "OKP".to_string(),
            crv: "Ed25519".to_string(),
            x: Base64UrlUnpadded::encode_string(&key.to_bytes()),
        }
    }

    /// Decode into a verifying key.
    pub fn verifying_key(&self) -> Result<VerifyingKey, VcError> {
        if self.kty != "OKP" || self.crv != "Ed25519" {
            return Err(VcError::UnsupportedKey(format!("{}/{}", self.kty, self.crv)));
        }
        let bytes = Base64UrlUnpadded::decode_vec(&self.x)
            .map_err(|_| VcError::UnsupportedKey("x is not base64url".to_string()))?;
        Ok(VerifyingKey::from_slice(&bytes)?)
    }
}

/// One verification method entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationMethod {
    /// Method URI, absolute (`did:web:x#key-1`) or relative (`#key-1`).
    pub id: String,
    /// Method type.
    #[serde(rename = "type")]
    pub method_type: String,
    /// Controlling DID.
    pub controller: String,
    /// Published public key.
    #[serde(rename = "publicKeyJwk")]
    pub public_key_jwk: PublicKeyJwk,
}

impl VerificationMethod {
    /// The method's public key.
    pub fn verifying_key(&self) -> Result<VerifyingKey, VcError> {
        self.public_key_jwk.verifying_key()
    }
}

/// A resolved DID document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DidDocument {
    /// JSON-LD contexts.
    #[serde(rename = "@context", default, skip_serializing_if = "Vec::is_empty")]
    pub context: Vec<String>,
    /// Subject DID.
    pub id: Did,
    /// Ordered verification methods.
    #[serde(rename = "verificationMethod", default)]
    pub verification_method: Vec<VerificationMethod>,
}

impl DidDocument {
    /// A single-key document for `did`, method id `<did>#key-1`.
    pub fn for_key(did: Did, key: &VerifyingKey) -> Self {
        let method = VerificationMethod {
            id: format!("{did}#key-1"),
            method_type: JSON_WEB_KEY_2020.to_string(),
            controller: did.to_string(),
            public_key_jwk: PublicKeyJwk::ed25519(key),
        };
        Self {
            context: vec![DID_CONTEXT.to_string()],
            id: did,
            verification_method: vec![method],
        }
    }

    /// The method used for signing: always the first entry.
    pub fn first_verification_method(&self) -> Result<&VerificationMethod, VcError> {
        self.verification_method
            .first()
            .ok_or_else(|| VcError::NoVerificationMethod(self.id.to_string()))
    }

    /// Absolute form of a method id (relative `#frag` ids are joined to the
    /// document id).
    pub fn absolute_method_id(&self, method_id: &str) -> String {
        if method_id.starts_with('#') {
            format!("{}{method_id}", self.id)
        } else {
            method_id.to_string()
        }
    }

    /// Find a verification method by id, relative or absolute.
    pub fn resolve(&self, method_id: &str) -> Option<&VerificationMethod> {
        let wanted = self.absolute_method_id(method_id);
        self.verification_method
            .iter()
            .find(|m| self.absolute_method_id(&m.id) == wanted)
    }
}
