//! # miw-core — Foundational Types for Credential Issuance
//!
//! Leaf crate of the workspace. Everything that gets signed, digested or
//! compared across crates is defined here.
//!
//! ## Key Design Principles
//!
//! 1. **`CanonicalBytes` newtype.** All bytes that are signed or digested
//!    flow through `CanonicalBytes::new()` (RFC 8785 JCS, floats rejected).
//!
//! 2. **`sha256_digest()` accepts only `&CanonicalBytes`.** Compile-time
//!    enforcement that every digest path goes through canonicalization.
//!
//! 3. **UTC-only timestamps.** `Timestamp` enforces UTC with `Z` suffix and
//!    seconds precision. Time is read through the injectable `Clock` trait.
//!
//! 4. **Validated identifiers.** `Did` and `WalletId` reject malformed input
//!    at construction and deserialization.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `miw-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod canonical;
pub mod digest;
pub mod error;
pub mod identity;
pub mod temporal;

pub use canonical::CanonicalBytes;
pub use digest::{sha256_digest, sha256_hex, ContentDigest};
pub use error::{CanonicalizationError, ValidationError};
pub use identity::{Did, IdentifierKind, WalletId};
pub use temporal::{Clock, FixedClock, SystemClock, Timestamp};
