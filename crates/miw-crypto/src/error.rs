//! # Cryptographic Error Types
//!
//! Structured errors for all operations in `miw-crypto`.
//!
//! Messages never carry key bytes or decrypted plaintext. Envelope failures
//! in particular collapse to a single opaque variant so a caller cannot
//! distinguish a wrong secret from a tampered blob.

use thiserror::Error;

/// Errors from cryptographic operations.
#[derive(Error, Debug)]
pub enum CryptoError {
    /// Ed25519 signature verification failed.
    #[error("Ed25519 verification failed: {0}")]
    VerificationFailed(String),

    /// Invalid Ed25519 signature length.
    #[error("invalid Ed25519 signature length: expected 64 bytes, got {0}")]
    InvalidSignatureLength(usize),

    /// Invalid Ed25519 public key.
    #[error("invalid Ed25519 public key: {0}")]
    InvalidPublicKey(String),

    /// Private key material has the wrong shape.
    #[error("invalid private key material: expected {expected} bytes, got {actual}")]
    InvalidKeyLength {
        /// Required length.
        expected: usize,
        /// Supplied length.
        actual: usize,
    },

    /// Hex decoding error.
    #[error("hex decode error: {0}")]
    HexDecode(String),

    /// Base64 decoding error.
    #[error("base64 decode error")]
    Base64Decode,

    /// Sealing a key blob failed.
    #[error("envelope encryption failed")]
    SealFailed,

    /// Opening a key blob failed: wrong secret, truncated or tampered blob.
    #[error("envelope decryption failed")]
    OpenFailed,

    /// A compact detached JWS could not be parsed.
    #[error("malformed JWS: {0}")]
    MalformedJws(String),

    /// The JWS header names an algorithm or option this system does not use.
    #[error("unsupported JWS header: {0}")]
    UnsupportedJwsHeader(String),
}
