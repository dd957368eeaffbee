//! # VC Error Types

use miw_core::Timestamp;
use thiserror::Error;

/// Errors from credential assembly, signing and verification.
#[derive(Error, Debug)]
pub enum VcError {
    /// No credential type besides `VerifiableCredential` was requested.
    #[error("credential must name at least one type besides VerifiableCredential")]
    EmptyTypes,

    /// A type tag is blank or contains a comma.
    #[error("invalid credential type tag: {0:?}")]
    InvalidType(String),

    /// The subject claims map is empty.
    #[error("credential subject claims must not be empty")]
    EmptyClaims,

    /// Expiry is not strictly after the issuance instant.
    #[error("expiry {expiry} must be after issuance {issued}")]
    InvalidExpiry {
        /// Requested expiration.
        expiry: Timestamp,
        /// Issuance instant read from the clock.
        issued: Timestamp,
    },

    /// The issuer DID document has no verification methods.
    #[error("DID document {0} has no verification method")]
    NoVerificationMethod(String),

    /// The verification method is not part of the issuer's DID document.
    #[error("verification method {0} does not resolve in the issuer DID document")]
    UnresolvedVerificationMethod(String),

    /// The credential issuer differs from the DID document id.
    #[error("credential issuer {credential} does not match DID document {document}")]
    IssuerMismatch {
        /// Issuer named in the credential.
        credential: String,
        /// Id of the supplied document.
        document: String,
    },

    /// The verification method key is not an Ed25519 JWK.
    #[error("unsupported verification key: {0}")]
    UnsupportedKey(String),

    /// The signing key does not match the verification method's public key.
    #[error("signing key does not match verification method {0}")]
    KeyMismatch(String),

    /// Proof purpose is not `assertionMethod`.
    #[error("unsupported proof purpose: {0}")]
    UnsupportedProofPurpose(String),

    /// The credential expired before the verification instant.
    #[error("credential expired at {0}")]
    Expired(Timestamp),

    /// Canonicalization of the credential or proof options failed.
    #[error("canonicalization failed: {0}")]
    Canonicalization(#[from] miw_core::CanonicalizationError),

    /// Signature creation or verification failed.
    #[error("proof signature error: {0}")]
    Crypto(#[from] miw_crypto::CryptoError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl VcError {
    /// Whether this error stems from caller-supplied input rather than a
    /// key or data fault.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::EmptyTypes | Self::InvalidType(_) | Self::EmptyClaims | Self::InvalidExpiry { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_expiry_display_names_both_instants() {
        let err = VcError::InvalidExpiry {
            expiry: Timestamp::from_epoch_secs(0).unwrap(),
            issued: Timestamp::from_epoch_secs(60).unwrap(),
        };
        let msg = err.to_string();
        assert!(msg.contains("1970-01-01T00:00:00Z"));
        assert!(msg.contains("1970-01-01T00:01:00Z"));
        assert!(err.is_input_error());
    }

    #[test]
    fn key_errors_are_not_input_errors() {
        assert!(!VcError::KeyMismatch("did:web:x#key-1".into()).is_input_error());
    }
}
