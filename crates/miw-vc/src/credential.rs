//! # Verifiable Credential structure and verification
//!
//! [`UnsignedCredential`] is the assembled credential before proof;
//! [`VerifiableCredential`] is that credential plus its [`Proof`].
//!
//! ## Security Invariants
//!
//! - The bytes a proof covers are [`UnsignedCredential::canonical`], i.e.
//!   the JCS form of every credential field except `proof`.
//! - A [`VerifiableCredential`] has no mutators. Changing any field means
//!   going through JSON, and the resulting document no longer verifies.
//!
//! ## Wire Shape
//!
//! ```json
//! {
//!   "@context": ["https://www.w3.org/2018/credentials/v1"],
//!   "id": "urn:uuid:…",
//!   "type": ["VerifiableCredential", "DismantlerCredential"],
//!   "issuer": "did:web:…",
//!   "issuanceDate": "2026-01-15T12:00:00Z",
//!   "expirationDate": "2027-01-15T12:00:00Z",
//!   "credentialSubject": { … },
//!   "proof": { "type": "JsonWebSignature2020", "created": "…",
//!              "proofPurpose": "assertionMethod",
//!              "verificationMethod": "did:web:…#key-1", "jws": "…..…" }
//! }
//! ```

use miw_core::{CanonicalBytes, Did, Timestamp};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::did::DidDocument;
use crate::error::VcError;
use crate::proof::{verify_proof, Proof};

/// Base type marker carried by every credential.
pub const VERIFIABLE_CREDENTIAL_TYPE: &str = "VerifiableCredential";

/// W3C credentials v1 context, always first in `@context`.
pub const W3C_CREDENTIALS_CONTEXT: &str = "https://www.w3.org/2018/credentials/v1";

/// A credential assembled but not yet signed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnsignedCredential {
    /// JSON-LD contexts, W3C credentials context first.
    #[serde(rename = "@context")]
    pub context: Vec<String>,

    /// Credential identifier, fresh per issuance.
    pub id: String,

    /// Credential types. Always includes [`VERIFIABLE_CREDENTIAL_TYPE`].
    #[serde(rename = "type")]
    pub types: Vec<String>,

    /// Issuer DID, as it appears in the issuer's DID document.
    pub issuer: Did,

    /// Issuance instant.
    #[serde(rename = "issuanceDate")]
    pub issuance_date: Timestamp,

    /// Expiration instant, strictly after issuance.
    #[serde(rename = "expirationDate")]
    pub expiration_date: Timestamp,

    /// Subject claims.
    #[serde(rename = "credentialSubject")]
    pub credential_subject: Map<String, Value>,
}

impl UnsignedCredential {
    /// JCS canonical form, the bytes a proof covers.
    pub fn canonical(&self) -> Result<CanonicalBytes, VcError> {
        Ok(CanonicalBytes::new(self)?)
    }

    /// Comma-joined type tags without the base marker, used to index
    /// persisted credentials.
    pub fn index_type(&self) -> String {
        index_type(&self.types)
    }

    /// Attach a proof.
    pub fn into_verifiable(self, proof: Proof) -> VerifiableCredential {
        VerifiableCredential {
            credential: self,
            proof,
        }
    }
}

/// Comma-joined type tags with every [`VERIFIABLE_CREDENTIAL_TYPE`] removed.
pub fn index_type<S: AsRef<str>>(types: &[S]) -> String {
    types
        .iter()
        .map(AsRef::as_ref)
        .filter(|t| *t != VERIFIABLE_CREDENTIAL_TYPE)
        .collect::<Vec<_>>()
        .join(",")
}

/// A signed credential. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerifiableCredential {
    #[serde(flatten)]
    credential: UnsignedCredential,
    proof: Proof,
}

impl VerifiableCredential {
    /// The credential body.
    pub fn credential(&self) -> &UnsignedCredential {
        &self.credential
    }

    /// The attached proof.
    pub fn proof(&self) -> &Proof {
        &self.proof
    }

    /// Credential identifier.
    pub fn id(&self) -> &str {
        &self.credential.id
    }

    /// Credential types, base marker included.
    pub fn types(&self) -> &[String] {
        &self.credential.types
    }

    /// Issuer DID.
    pub fn issuer(&self) -> &Did {
        &self.credential.issuer
    }

    /// Subject claims.
    pub fn subject(&self) -> &Map<String, Value> {
        &self.credential.credential_subject
    }

    /// Verify against the issuer's DID document at the current time.
    pub fn verify(&self, issuer: &DidDocument) -> Result<(), VcError> {
        self.verify_at(issuer, Timestamp::now())
    }

    /// Verify against the issuer's DID document, treating `at` as now.
    ///
    /// Checks, in order: issuer matches the document id, the proof's
    /// verification method resolves in the document, the JWS covers this
    /// exact credential and proof options, and the credential has not
    /// expired at `at`. A tampered expired credential therefore reports the
    /// signature failure, not the expiry.
    pub fn verify_at(&self, issuer: &DidDocument, at: Timestamp) -> Result<(), VcError> {
        self.verify_signature(issuer)?;
        if self.credential.expiration_date <= at {
            return Err(VcError::Expired(self.credential.expiration_date));
        }
        Ok(())
    }

    /// Verify issuer binding and signature only, ignoring expiry.
    pub fn verify_signature(&self, issuer: &DidDocument) -> Result<(), VcError> {
        if self.credential.issuer != issuer.id {
            return Err(VcError::IssuerMismatch {
                credential: self.credential.issuer.to_string(),
                document: issuer.id.to_string(),
            });
        }
        let method = issuer
            .resolve(&self.proof.verification_method)
            .ok_or_else(|| {
                VcError::UnresolvedVerificationMethod(self.proof.verification_method.clone())
            })?;
        verify_proof(&self.credential, &self.proof, &method.verifying_key()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_type_drops_every_base_marker() {
        assert_eq!(index_type(&["VerifiableCredential", "BpnCredential"]), "BpnCredential");
        assert_eq!(index_type(&["A", "VerifiableCredential", "B"]), "A,B");
        assert_eq!(index_type(&["DismantlerCredential"]), "DismantlerCredential");
        assert_eq!(index_type::<&str>(&[]), "");
    }

    #[test]
    fn unsigned_credential_uses_w3c_field_names() {
        let vc = UnsignedCredential {
            context: vec![W3C_CREDENTIALS_CONTEXT.to_string()],
            id: "urn:uuid:00000000-0000-4000-8000-000000000001".to_string(),
            types: vec![VERIFIABLE_CREDENTIAL_TYPE.to_string(), "BpnCredential".to_string()],
            issuer: Did::new("did:web:issuer.example").unwrap(),
            issuance_date: Timestamp::from_epoch_secs(0).unwrap(),
            expiration_date: Timestamp::from_epoch_secs(60).unwrap(),
            credential_subject: serde_json::json!({"bpn": "B1"})
                .as_object()
                .cloned()
                .unwrap(),
        };
        let json = serde_json::to_value(&vc).unwrap();
        for field in [
            "@context",
            "id",
            "type",
            "issuer",
            "issuanceDate",
            "expirationDate",
            "credentialSubject",
        ] {
            assert!(json.get(field).is_some(), "missing {field}");
        }
        assert_eq!(json["issuanceDate"], "1970-01-01T00:00:00Z");
        assert_eq!(vc.index_type(), "BpnCredential");

        let canonical = vc.canonical().unwrap();
        let text = std::str::from_utf8(canonical.as_bytes()).unwrap();
        assert!(text.starts_with(r#"{"@context":"#));
    }
}
