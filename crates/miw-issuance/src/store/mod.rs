//! # Credential Stores
//!
//! [`CredentialStore`] is the storage collaborator of issuance. Every
//! implementation enforces uniqueness of `(holder, type)` inside
//! [`CredentialStore::save`] itself: of two racing saves for the same pair,
//! exactly one succeeds and the other returns [`StoreError::Conflict`]. The
//! coordinator's existence pre-check only short-circuits the common case.
//!
//! Credential ids are unique across the store as well.

mod fs;
mod memory;

pub use fs::FsCredentialStore;
pub use memory::MemoryCredentialStore;

use miw_core::WalletId;
use thiserror::Error;

use crate::record::CredentialRecord;

/// Errors from credential storage.
#[derive(Error, Debug)]
pub enum StoreError {
    /// A record for `(holder, type)` already exists.
    #[error("credential of type {credential_type} already stored for holder {holder}")]
    Conflict {
        /// Holder wallet.
        holder: WalletId,
        /// Index type string.
        credential_type: String,
    },

    /// A record with this credential id already exists.
    #[error("credential id {0} already stored")]
    DuplicateId(String),

    /// Filesystem failure.
    #[error("credential store I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A stored record could not be (de)serialized.
    #[error("credential store encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}

/// Lookup, existence and save operations keyed by holder and type.
pub trait CredentialStore: Send + Sync {
    /// Whether a record exists for `(holder, credential_type)`.
    fn exists_by_holder_and_type(
        &self,
        holder: &WalletId,
        credential_type: &str,
    ) -> Result<bool, StoreError>;

    /// The record for `(holder, credential_type)`, if any.
    fn get_by_holder_and_type(
        &self,
        holder: &WalletId,
        credential_type: &str,
    ) -> Result<Option<CredentialRecord>, StoreError>;

    /// All records of `holder`, ordered by type.
    fn list_by_holder(&self, holder: &WalletId) -> Result<Vec<CredentialRecord>, StoreError>;

    /// Persist `record`.
    ///
    /// # Errors
    ///
    /// [`StoreError::Conflict`] if `(holder, type)` is taken, even when the
    /// competing record was saved after this caller's existence check.
    fn save(&self, record: CredentialRecord) -> Result<CredentialRecord, StoreError>;
}

#[cfg(test)]
pub(crate) mod fixtures {
    use std::sync::Arc;

    use miw_core::{Did, FixedClock, Timestamp, WalletId};
    use miw_crypto::SigningKey;
    use miw_vc::{CredentialBuilder, DidDocument, IdSource, ProofSigner};
    use serde_json::Map;

    use crate::record::{decode_did, CredentialRecord};

    struct Fixed(String);

    impl IdSource for Fixed {
        fn next_id(&self) -> String {
            self.0.clone()
        }
    }

    /// A signed record for `(holder, credential_type)` with credential id `id`.
    pub(crate) fn record(holder: &str, credential_type: &str, id: &str) -> CredentialRecord {
        let at = Timestamp::from_epoch_secs(1_800_000_000).unwrap();
        let key = SigningKey::from_bytes(&[1u8; 32]);
        let issuer = DidDocument::for_key(Did::new("did:web:issuer.example").unwrap(), &key.verifying_key());
        let clock = Arc::new(FixedClock::new(at));
        let mut claims = Map::new();
        claims.insert("holderIdentifier".into(), holder.into());
        let unsigned = CredentialBuilder::new(clock.clone(), Arc::new(Fixed(id.to_string())))
            .build(claims, &[credential_type], &issuer, &[], at.offset(chrono::Duration::days(1)))
            .unwrap();
        let proof = ProofSigner::new(clock)
            .sign(&unsigned, issuer.first_verification_method().unwrap(), &key)
            .unwrap();
        let vc = unsigned.into_verifiable(proof);
        CredentialRecord {
            holder: WalletId::new(holder).unwrap(),
            holder_did: Did::new(format!("did:web:holder.example:{holder}")).unwrap(),
            issuer_did: decode_did(vc.issuer()),
            credential_type: vc.credential().index_type(),
            credential_id: vc.id().to_string(),
            data: vc,
            self_issued: false,
            created_at: at,
        }
    }
}
