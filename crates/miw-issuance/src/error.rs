//! # Issuance Errors
//!
//! [`IssuanceError`] is the single error type returned by the coordinator.
//! Each variant maps to one [`ErrorKind`], so embedders can translate
//! failures into their own signals (conflict vs. caller input vs. server
//! fault) without matching on inner error types.

use miw_core::{Timestamp, WalletId};
use miw_vc::VcError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::store::StoreError;
use crate::vault::VaultError;

/// Coarse classification of issuance failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// `(holder, type)` already issued.
    Conflict,
    /// Issuer has no stored key.
    KeyNotFound,
    /// Issuer key blob could not be decrypted.
    DecryptionFailure,
    /// Expiry not after issuance.
    InvalidExpiry,
    /// Malformed request (claims, types).
    InvalidRequest,
    /// Proof could not be produced.
    SigningError,
    /// Storage failed.
    PersistenceError,
}

/// Stage an issuance request is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssuanceStage {
    /// Existence pre-check.
    Checking,
    /// Retrieving the issuer key.
    KeyLoading,
    /// Assembling the unsigned credential.
    Building,
    /// Producing the proof.
    Signing,
    /// Saving the record.
    Persisting,
    /// Finished.
    Done,
}

impl std::fmt::Display for IssuanceStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            IssuanceStage::Checking => "checking",
            IssuanceStage::KeyLoading => "key_loading",
            IssuanceStage::Building => "building",
            IssuanceStage::Signing => "signing",
            IssuanceStage::Persisting => "persisting",
            IssuanceStage::Done => "done",
        };
        f.write_str(s)
    }
}

/// Errors from [`IssuanceCoordinator::issue`](crate::IssuanceCoordinator::issue).
#[derive(Error, Debug)]
pub enum IssuanceError {
    /// A credential of this type was already issued to the holder.
    #[error("credential {credential_type} already issued to {holder}")]
    Conflict {
        /// Holder wallet.
        holder: WalletId,
        /// Index type string.
        credential_type: String,
    },

    /// The issuer wallet has no stored signing key.
    #[error("no signing key for issuer wallet {0}")]
    KeyNotFound(WalletId),

    /// The issuer key blob could not be decrypted.
    #[error("signing key for issuer wallet {0} could not be decrypted")]
    DecryptionFailure(WalletId),

    /// Expiry not strictly after the issuance instant.
    #[error("expiry {expiry} must be after issuance {issued}")]
    InvalidExpiry {
        /// Requested expiry.
        expiry: Timestamp,
        /// Issuance instant.
        issued: Timestamp,
    },

    /// Request input rejected before signing.
    #[error("invalid issuance request: {0}")]
    InvalidRequest(String),

    /// The proof could not be produced.
    #[error("signing failed: {0}")]
    SigningError(#[source] VcError),

    /// The storage collaborator failed.
    #[error("persisting credential failed: {0}")]
    PersistenceError(#[source] StoreError),
}

impl IssuanceError {
    /// Classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Conflict { .. } => ErrorKind::Conflict,
            Self::KeyNotFound(_) => ErrorKind::KeyNotFound,
            Self::DecryptionFailure(_) => ErrorKind::DecryptionFailure,
            Self::InvalidExpiry { .. } => ErrorKind::InvalidExpiry,
            Self::InvalidRequest(_) => ErrorKind::InvalidRequest,
            Self::SigningError(_) => ErrorKind::SigningError,
            Self::PersistenceError(_) => ErrorKind::PersistenceError,
        }
    }

    /// Whether the caller can fix this by changing the request.
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::Conflict | ErrorKind::InvalidExpiry | ErrorKind::InvalidRequest
        )
    }

    /// Whether resubmitting the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::PersistenceError
    }

    /// Map a vault failure for the issuer wallet.
    pub(crate) fn from_vault(err: VaultError, issuer: &WalletId) -> Self {
        match err {
            VaultError::KeyNotFound(w) => Self::KeyNotFound(w),
            VaultError::DecryptionFailure(w) => Self::DecryptionFailure(w),
            other => {
                tracing::error!(wallet = %issuer, error = %other, "key vault failure");
                Self::DecryptionFailure(issuer.clone())
            }
        }
    }

    /// Map a credential assembly failure.
    pub(crate) fn from_build(err: VcError) -> Self {
        match err {
            VcError::InvalidExpiry { expiry, issued } => Self::InvalidExpiry { expiry, issued },
            e if e.is_input_error() => Self::InvalidRequest(e.to_string()),
            e => Self::SigningError(e),
        }
    }

    /// Map a storage failure. Uniqueness violations become `Conflict`.
    pub(crate) fn from_store(err: StoreError) -> Self {
        match err {
            StoreError::Conflict {
                holder,
                credential_type,
            } => Self::Conflict {
                holder,
                credential_type,
            },
            other => Self::PersistenceError(other),
        }
    }
}
