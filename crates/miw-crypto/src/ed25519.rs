//! # Ed25519 Signing and Verification
//!
//! Key and signature newtypes used for credential proofs.
//!
//! ## Security Invariant
//!
//! - Public signing input is `&CanonicalBytes`; raw byte signing is only
//!   reachable from inside this crate (the JWS module builds its own
//!   RFC 7797 signing input from canonical parts).
//! - [`SigningKey`] does not implement `Serialize`, its `Debug` output is
//!   redacted, and the wrapped dalek key is zeroized on drop.
//!
//! ## Serde
//!
//! Public keys and signatures serialize as lowercase hex strings.

use ed25519_dalek::{Signer, Verifier};
use miw_core::CanonicalBytes;
use rand_core::{CryptoRng, RngCore};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use zeroize::Zeroizing;

use crate::error::CryptoError;
use crate::hex;

/// Length of an Ed25519 private key seed.
pub const SEED_LENGTH: usize = 32;

/// An Ed25519 private key.
pub struct SigningKey(ed25519_dalek::SigningKey);

/// An Ed25519 public key (32 bytes).
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct VerifyingKey(ed25519_dalek::VerifyingKey);

/// An Ed25519 signature (64 bytes).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ed25519Signature([u8; 64]);

// ---------------------------------------------------------------------------
// SigningKey
// ---------------------------------------------------------------------------

impl SigningKey {
    /// Generate a new key from a cryptographically secure RNG.
    pub fn generate<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        Self(ed25519_dalek::SigningKey::generate(rng))
    }

    /// Create from a raw 32-byte seed.
    pub fn from_bytes(seed: &[u8; SEED_LENGTH]) -> Self {
        Self(ed25519_dalek::SigningKey::from_bytes(seed))
    }

    /// Create from a seed slice, checking its length.
    pub fn from_slice(seed: &[u8]) -> Result<Self, CryptoError> {
        let seed: &[u8; SEED_LENGTH] =
            seed.try_into().map_err(|_| CryptoError::InvalidKeyLength {
                expected: SEED_LENGTH,
                actual: seed.len(),
            })?;
        Ok(Self::from_bytes(seed))
    }

    /// Export the seed. The returned buffer is wiped on drop.
    pub fn to_seed(&self) -> Zeroizing<[u8; SEED_LENGTH]> {
        Zeroizing::new(self.0.to_bytes())
    }

    /// The matching public key.
    pub fn verifying_key(&self) -> VerifyingKey {
        VerifyingKey(self.0.verifying_key())
    }

    /// Sign canonical bytes.
    pub fn sign(&self, data: &CanonicalBytes) -> Ed25519Signature {
        self.sign_raw(data.as_bytes())
    }

    pub(crate) fn sign_raw(&self, message: &[u8]) -> Ed25519Signature {
        Ed25519Signature(self.0.sign(message).to_bytes())
    }
}

impl std::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SigningKey(<private>)")
    }
}

// ---------------------------------------------------------------------------
// VerifyingKey
// ---------------------------------------------------------------------------

impl VerifyingKey {
    /// Create from raw 32 bytes, rejecting points that are not valid keys.
    pub fn from_bytes(bytes: &[u8; 32]) -> Result<Self, CryptoError> {
        ed25519_dalek::VerifyingKey::from_bytes(bytes)
            .map(Self)
            .map_err(|e| CryptoError::InvalidPublicKey(e.to_string()))
    }

    /// Create from a byte slice, checking its length.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        let arr: &[u8; 32] = bytes.try_into().map_err(|_| {
            CryptoError::InvalidPublicKey(format!("expected 32 bytes, got {}", bytes.len()))
        })?;
        Self::from_bytes(arr)
    }

    /// Parse from a 64-character hex string.
    pub fn from_hex(hex: &str) -> Result<Self, CryptoError> {
        Self::from_bytes(&hex::decode_array::<32>(hex)?)
    }

    /// Raw 32-byte public key.
    pub fn to_bytes(&self) -> [u8; 32] {
        self.0.to_bytes()
    }

    /// Lowercase hex rendering.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0.as_bytes())
    }

    /// Verify a signature over canonical bytes.
    pub fn verify(
        &self,
        data: &CanonicalBytes,
        signature: &Ed25519Signature,
    ) -> Result<(), CryptoError> {
        self.verify_raw(data.as_bytes(), signature)
    }

    pub(crate) fn verify_raw(
        &self,
        message: &[u8],
        signature: &Ed25519Signature,
    ) -> Result<(), CryptoError> {
        let sig = ed25519_dalek::Signature::from_bytes(&signature.0);
        self.0
            .verify(message, &sig)
            .map_err(|e| CryptoError::VerificationFailed(e.to_string()))
    }
}

impl Serialize for VerifyingKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for VerifyingKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let hex = String::deserialize(deserializer)?;
        Self::from_hex(&hex).map_err(serde::de::Error::custom)
    }
}

impl std::fmt::Debug for VerifyingKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "VerifyingKey({}...)", hex::prefix(self.0.as_bytes()))
    }
}

impl std::fmt::Display for VerifyingKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

// ---------------------------------------------------------------------------
// Ed25519Signature
// ---------------------------------------------------------------------------

impl Ed25519Signature {
    /// Create from raw 64 bytes.
    pub fn from_bytes(bytes: [u8; 64]) -> Self {
        Self(bytes)
    }

    /// Create from a byte slice, checking its length.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        let arr: [u8; 64] = bytes
            .try_into()
            .map_err(|_| CryptoError::InvalidSignatureLength(bytes.len()))?;
        Ok(Self(arr))
    }

    /// Parse from a 128-character hex string.
    pub fn from_hex(hex: &str) -> Result<Self, CryptoError> {
        Ok(Self(hex::decode_array::<64>(hex)?))
    }

    /// Raw signature bytes.
    pub fn as_bytes(&self) -> &[u8; 64] {
        &self.0
    }

    /// Lowercase hex rendering.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }
}

impl Serialize for Ed25519Signature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Ed25519Signature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let hex = String::deserialize(deserializer)?;
        Self::from_hex(&hex).map_err(serde::de::Error::custom)
    }
}

impl std::fmt::Debug for Ed25519Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Ed25519Signature({}...)", hex::prefix(&self.0))
    }
}
