//! # miw-crypto — Cryptographic Primitives for Credential Issuance
//!
//! - **Ed25519** (`ed25519`): signing keys, verifying keys, signatures.
//!   Public signing input is `&CanonicalBytes` from `miw-core`.
//! - **Key envelope** (`envelope`): AES-256-GCM sealing of private key
//!   material at rest, keyed by a process-wide [`EncryptionKey`].
//! - **Detached JWS** (`jws`): the compact `header..signature` form used by
//!   `JsonWebSignature2020` proofs.
//!
//! ## Crate Policy
//!
//! - Private key types never implement `Serialize` and print redacted.
//! - Decryption errors carry no detail about the key or plaintext.
//! - No `unsafe` code.

pub mod ed25519;
pub mod envelope;
pub mod error;
mod hex;
pub mod jws;

pub use ed25519::{Ed25519Signature, SigningKey, VerifyingKey, SEED_LENGTH};
pub use envelope::{open, seal, EncryptionKey, SealedBlob};
pub use error::CryptoError;
pub use jws::{sign_detached, verify_detached, DetachedJws, JWS_ALGORITHM};
