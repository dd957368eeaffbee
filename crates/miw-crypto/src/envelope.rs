//! # Key Envelope — AES-256-GCM Encryption at Rest
//!
//! Private signing keys are stored only as sealed blobs. A blob is
//! `nonce (12 bytes) ‖ ciphertext ‖ tag (16 bytes)`, carried as standard
//! base64 text. Every seal draws a fresh random nonce, so sealing the same
//! key twice yields different blobs.
//!
//! ## Security Invariants
//!
//! - [`EncryptionKey`] is zeroized on drop and never printed.
//! - [`open`] returns plaintext wrapped in [`Zeroizing`].
//! - Every decryption failure maps to [`CryptoError::OpenFailed`] with no
//!   further detail.

use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Nonce};
use base64ct::{Base64, Encoding};
use rand_core::RngCore;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::error::CryptoError;
use crate::hex;

const NONCE_LENGTH: usize = 12;
const TAG_LENGTH: usize = 16;

/// Process-wide symmetric secret protecting key blobs.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct EncryptionKey([u8; 32]);

impl EncryptionKey {
    /// Wrap raw key bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Parse a 64-character hex string.
    pub fn from_hex(hex: &str) -> Result<Self, CryptoError> {
        hex::decode_array::<32>(hex).map(Self)
    }

    /// Fresh random key from the OS CSPRNG.
    pub fn generate() -> Self {
        let mut bytes = [0u8; 32];
        rand_core::OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Hex rendering, for provisioning tools that must hand the secret to
    /// an operator. The returned string is wiped on drop.
    pub fn to_hex(&self) -> Zeroizing<String> {
        Zeroizing::new(hex::encode(&self.0))
    }

    fn cipher(&self) -> Result<Aes256Gcm, CryptoError> {
        Aes256Gcm::new_from_slice(&self.0).map_err(|_| CryptoError::SealFailed)
    }
}

impl std::fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("EncryptionKey(<redacted>)")
    }
}

/// An encrypted key blob as stored at rest.
#[derive(Clone, PartialEq, Eq)]
pub struct SealedBlob(Vec<u8>);

impl SealedBlob {
    /// Wrap raw blob bytes, checking the minimum length.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, CryptoError> {
        if bytes.len() < NONCE_LENGTH + TAG_LENGTH {
            return Err(CryptoError::OpenFailed);
        }
        Ok(Self(bytes))
    }

    /// Decode from standard base64.
    pub fn from_base64(encoded: &str) -> Result<Self, CryptoError> {
        let bytes = Base64::decode_vec(encoded.trim()).map_err(|_| CryptoError::Base64Decode)?;
        Self::from_bytes(bytes)
    }

    /// Standard base64 rendering.
    pub fn to_base64(&self) -> String {
        Base64::encode_string(&self.0)
    }

    /// Raw blob bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl std::fmt::Debug for SealedBlob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SealedBlob({} bytes)", self.0.len())
    }
}

/// Encrypt `plaintext` under `key`.
pub fn seal(key: &EncryptionKey, plaintext: &[u8]) -> Result<SealedBlob, CryptoError> {
    let cipher = key.cipher()?;
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
    let ciphertext = cipher
        .encrypt(&nonce, plaintext)
        .map_err(|_| CryptoError::SealFailed)?;
    let mut blob = Vec::with_capacity(NONCE_LENGTH + ciphertext.len());
    blob.extend_from_slice(&nonce);
    blob.extend_from_slice(&ciphertext);
    Ok(SealedBlob(blob))
}

/// Decrypt a sealed blob.
///
/// # Errors
///
/// [`CryptoError::OpenFailed`] for a wrong key, a truncated blob, or any
/// modification of nonce, ciphertext or tag.
pub fn open(key: &EncryptionKey, blob: &SealedBlob) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
    if blob.0.len() < NONCE_LENGTH + TAG_LENGTH {
        return Err(CryptoError::OpenFailed);
    }
    let cipher = key.cipher().map_err(|_| CryptoError::OpenFailed)?;
    let (nonce, ciphertext) = blob.0.split_at(NONCE_LENGTH);
    cipher
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map(Zeroizing::new)
        .map_err(|_| CryptoError::OpenFailed)
}
