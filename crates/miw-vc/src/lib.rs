//! # miw-vc — Verifiable Credentials
//!
//! W3C VC data model and the two pure stages of issuance:
//!
//! - [`CredentialBuilder`] assembles an [`UnsignedCredential`] from claims,
//!   types, the issuer's [`DidDocument`], contexts and an expiry.
//! - [`ProofSigner`] produces a `JsonWebSignature2020` [`Proof`] over the
//!   canonical credential.
//!
//! [`VerifiableCredential::verify`] checks a signed credential against the
//! issuer's DID document.
//!
//! ## Crate Policy
//!
//! - Everything signed goes through `CanonicalBytes`.
//! - Time and ids are injected (`Clock`, [`IdSource`]).

pub mod builder;
pub mod credential;
pub mod did;
pub mod error;
pub mod proof;

pub use builder::{CredentialBuilder, IdSource, SequentialIdSource, UuidIdSource};
pub use credential::{
    index_type, UnsignedCredential, VerifiableCredential, VERIFIABLE_CREDENTIAL_TYPE,
    W3C_CREDENTIALS_CONTEXT,
};
pub use did::{DidDocument, PublicKeyJwk, VerificationMethod};
pub use error::VcError;
pub use proof::{verify_proof, Proof, ProofPurpose, ProofSigner, ProofType};
