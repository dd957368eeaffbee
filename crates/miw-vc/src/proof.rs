//! # Linked-data proofs (JsonWebSignature2020)
//!
//! The only proof scheme in the system: an EdDSA detached JWS over two
//! canonical documents, the proof options (every proof field except `jws`)
//! followed by the unsigned credential.
//!
//! [`ProofSigner`] produces proofs; [`verify_proof`] checks them.

use std::sync::Arc;

use miw_core::{CanonicalBytes, Clock, SystemClock, Timestamp};
use miw_crypto::{sign_detached, verify_detached, DetachedJws, SigningKey, VerifyingKey};
use serde::{Deserialize, Serialize};

use crate::credential::UnsignedCredential;
use crate::did::VerificationMethod;
use crate::error::VcError;

/// Proof type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProofType {
    /// Detached JWS linked-data proof.
    JsonWebSignature2020,
}

impl std::fmt::Display for ProofType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProofType::JsonWebSignature2020 => f.write_str("JsonWebSignature2020"),
        }
    }
}

/// The purpose of a proof.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ProofPurpose {
    /// The issuer asserts the credential claims.
    AssertionMethod,
    /// Authentication of a holder. Not valid on credentials.
    Authentication,
}

impl std::fmt::Display for ProofPurpose {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProofPurpose::AssertionMethod => f.write_str("assertionMethod"),
            ProofPurpose::Authentication => f.write_str("authentication"),
        }
    }
}

/// A proof attached to a credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proof {
    /// Proof type.
    #[serde(rename = "type")]
    pub proof_type: ProofType,

    /// Creation instant.
    pub created: Timestamp,

    /// Proof purpose.
    #[serde(rename = "proofPurpose")]
    pub proof_purpose: ProofPurpose,

    /// URI of the issuer key, resolvable in the issuer's DID document.
    #[serde(rename = "verificationMethod")]
    pub verification_method: String,

    /// Detached JWS (`header..signature`).
    pub jws: DetachedJws,
}

/// Proof fields covered by the signature.
#[derive(Serialize)]
struct ProofOptions<'a> {
    #[serde(rename = "type")]
    proof_type: ProofType,
    created: Timestamp,
    #[serde(rename = "proofPurpose")]
    proof_purpose: ProofPurpose,
    #[serde(rename = "verificationMethod")]
    verification_method: &'a str,
}

impl ProofOptions<'_> {
    fn canonical(&self) -> Result<CanonicalBytes, VcError> {
        Ok(CanonicalBytes::new(self)?)
    }
}

/// Produces `JsonWebSignature2020` proofs.
#[derive(Clone)]
pub struct ProofSigner {
    clock: Arc<dyn Clock>,
}

impl Default for ProofSigner {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

impl ProofSigner {
    /// Signer reading `created` from `clock`.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    /// Sign `credential` with `key`, referencing `method`.
    ///
    /// # Errors
    ///
    /// - [`VcError::KeyMismatch`] if `key` is not the private half of the
    ///   key `method` publishes.
    /// - [`VcError::Canonicalization`] if the claims contain a value with no
    ///   canonical form (floats).
    pub fn sign(
        &self,
        credential: &UnsignedCredential,
        method: &VerificationMethod,
        key: &SigningKey,
    ) -> Result<Proof, VcError> {
        if method.verifying_key()? != key.verifying_key() {
            return Err(VcError::KeyMismatch(method.id.clone()));
        }

        let options = ProofOptions {
            proof_type: ProofType::JsonWebSignature2020,
            created: self.clock.now(),
            proof_purpose: ProofPurpose::AssertionMethod,
            verification_method: &method.id,
        };
        let options_bytes = options.canonical()?;
        let credential_bytes = credential.canonical()?;
        let jws = sign_detached(key, &[&options_bytes, &credential_bytes])?;

        Ok(Proof {
            proof_type: options.proof_type,
            created: options.created,
            proof_purpose: options.proof_purpose,
            verification_method: method.id.clone(),
            jws,
        })
    }
}

impl std::fmt::Debug for ProofSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProofSigner").finish_non_exhaustive()
    }
}

/// Verify `proof` over `credential` with the issuer's public key.
pub fn verify_proof(
    credential: &UnsignedCredential,
    proof: &Proof,
    key: &VerifyingKey,
) -> Result<(), VcError> {
    if proof.proof_purpose != ProofPurpose::AssertionMethod {
        return Err(VcError::UnsupportedProofPurpose(proof.proof_purpose.to_string()));
    }
    let options = ProofOptions {
        proof_type: proof.proof_type,
        created: proof.created,
        proof_purpose: proof.proof_purpose,
        verification_method: &proof.verification_method,
    };
    let options_bytes = options.canonical()?;
    let credential_bytes = credential.canonical()?;
    verify_detached(&proof.jws, &[&options_bytes, &credential_bytes], key)?;
    Ok(())
}
