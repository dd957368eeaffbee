//! # Issuance Coordinator
//!
//! Drives one issuance request through its stages:
//!
//! ```text
//! Checking → KeyLoading → Building → Signing → Persisting → Done
//! ```
//!
//! Any failure stops the request at its stage with an [`IssuanceError`].
//! Nothing is retried and nothing partial is persisted or returned. The
//! existence check only avoids needless key decryption; uniqueness is
//! decided by [`CredentialStore::save`].
//!
//! Every call is synchronous and CPU-bound (AES-GCM open, Ed25519 sign).
//! The coordinator is `Send + Sync`; embedders share it behind an `Arc` and
//! run each issuance on a worker thread.

use std::sync::Arc;

use miw_core::{Clock, Did, SystemClock, Timestamp, WalletId};
use miw_vc::{
    index_type, CredentialBuilder, DidDocument, IdSource, ProofSigner, UuidIdSource, VcError,
};
use serde_json::{Map, Value};

use crate::error::{IssuanceError, IssuanceStage};
use crate::record::{decode_did, CredentialRecord};
use crate::store::CredentialStore;
use crate::vault::KeyVault;

/// Everything needed to issue one credential.
#[derive(Debug, Clone, PartialEq)]
pub struct IssuanceRequest {
    /// Holder wallet.
    pub holder: WalletId,
    /// Holder DID, used as subject id when the claims name none.
    pub holder_did: Did,
    /// Subject claims.
    pub claims: Map<String, Value>,
    /// Type tags. `VerifiableCredential` is added when missing.
    pub types: Vec<String>,
    /// Issuer DID document; its first verification method signs.
    pub issuer_document: DidDocument,
    /// Wallet holding the issuer's key.
    pub issuer_wallet: WalletId,
    /// Extra JSON-LD contexts.
    pub contexts: Vec<String>,
    /// Expiry, strictly after issuance.
    pub expiry: Timestamp,
    /// Whether the issuer issues to itself.
    pub self_issued: bool,
}

impl IssuanceRequest {
    /// The `(holder, type)` index string: type tags in request order,
    /// duplicates and `VerifiableCredential` removed.
    pub fn index_type(&self) -> String {
        index_type_of(&self.types)
    }
}

/// Orchestrates key retrieval, credential assembly, signing and storage.
pub struct IssuanceCoordinator {
    vault: Arc<dyn KeyVault>,
    store: Arc<dyn CredentialStore>,
    builder: CredentialBuilder,
    signer: ProofSigner,
    clock: Arc<dyn Clock>,
}

impl IssuanceCoordinator {
    /// Coordinator using the system clock and random `urn:uuid` ids.
    pub fn new(vault: Arc<dyn KeyVault>, store: Arc<dyn CredentialStore>) -> Self {
        Self::with_sources(vault, store, Arc::new(SystemClock), Arc::new(UuidIdSource))
    }

    /// Coordinator with explicit time and id sources.
    pub fn with_sources(
        vault: Arc<dyn KeyVault>,
        store: Arc<dyn CredentialStore>,
        clock: Arc<dyn Clock>,
        ids: Arc<dyn IdSource>,
    ) -> Self {
        Self {
            vault,
            store,
            builder: CredentialBuilder::new(clock.clone(), ids),
            signer: ProofSigner::new(clock.clone()),
            clock,
        }
    }

    /// Issue a credential and persist its record.
    ///
    /// # Errors
    ///
    /// - [`IssuanceError::Conflict`] if the holder already has this type,
    ///   whether found by the pre-check or by the store on save.
    /// - [`IssuanceError::KeyNotFound`] / [`IssuanceError::DecryptionFailure`]
    ///   for issuer key problems.
    /// - [`IssuanceError::InvalidExpiry`] / [`IssuanceError::InvalidRequest`]
    ///   for unusable input. No store or key is touched for empty type
    ///   lists or empty claims; expiry is checked before signing.
    /// - [`IssuanceError::SigningError`] if the proof cannot be produced.
    /// - [`IssuanceError::PersistenceError`] for other storage failures.
    pub fn issue(&self, request: IssuanceRequest) -> Result<CredentialRecord, IssuanceError> {
        let IssuanceRequest {
            holder,
            holder_did,
            mut claims,
            types,
            issuer_document,
            issuer_wallet,
            contexts,
            expiry,
            self_issued,
        } = request;

        let credential_type = index_type_of(&types);
        stage(IssuanceStage::Checking, &holder, &credential_type);
        if credential_type.is_empty() {
            return Err(IssuanceError::InvalidRequest(VcError::EmptyTypes.to_string()));
        }
        if claims.is_empty() {
            return Err(IssuanceError::InvalidRequest(VcError::EmptyClaims.to_string()));
        }
        if self
            .store
            .exists_by_holder_and_type(&holder, &credential_type)
            .map_err(IssuanceError::from_store)?
        {
            tracing::warn!(
                holder = %holder,
                credential_type = %credential_type,
                "credential already issued"
            );
            return Err(IssuanceError::Conflict {
                holder,
                credential_type,
            });
        }

        stage(IssuanceStage::KeyLoading, &holder, &credential_type);
        let key = self
            .vault
            .get_private_key(&issuer_wallet)
            .map_err(|e| IssuanceError::from_vault(e, &issuer_wallet))?;

        stage(IssuanceStage::Building, &holder, &credential_type);
        if !claims.contains_key("id") {
            claims.insert("id".into(), Value::String(holder_did.to_string()));
        }
        let unsigned = self
            .builder
            .build(claims, &types, &issuer_document, &contexts, expiry)
            .map_err(IssuanceError::from_build)?;

        stage(IssuanceStage::Signing, &holder, &credential_type);
        let method = issuer_document
            .first_verification_method()
            .map_err(IssuanceError::SigningError)?;
        let proof = self
            .signer
            .sign(&unsigned, method, key.signing_key())
            .map_err(IssuanceError::SigningError)?;
        drop(key);
        let credential = unsigned.into_verifiable(proof);

        stage(IssuanceStage::Persisting, &holder, &credential_type);
        let record = CredentialRecord {
            holder: holder.clone(),
            holder_did,
            issuer_did: decode_did(credential.issuer()),
            credential_type: credential_type.clone(),
            credential_id: credential.id().to_string(),
            data: credential,
            self_issued,
            created_at: self.clock.now(),
        };
        let saved = self.store.save(record).map_err(|e| {
            let err = IssuanceError::from_store(e);
            match &err {
                IssuanceError::Conflict { .. } => tracing::warn!(
                    holder = %holder,
                    credential_type = %credential_type,
                    "credential issued concurrently; discarding signed copy"
                ),
                other => tracing::error!(
                    holder = %holder,
                    credential_type = %credential_type,
                    error = %other,
                    "persisting credential failed"
                ),
            }
            err
        })?;

        stage(IssuanceStage::Done, &holder, &credential_type);
        tracing::info!(
            holder = %saved.holder,
            credential_type = %saved.credential_type,
            credential_id = %saved.credential_id,
            issuer = %saved.issuer_did,
            self_issued = saved.self_issued,
            "credential issued"
        );
        Ok(saved)
    }

    /// The record for `(holder, credential_type)`, if issued.
    pub fn find(
        &self,
        holder: &WalletId,
        credential_type: &str,
    ) -> Result<Option<CredentialRecord>, IssuanceError> {
        self.store
            .get_by_holder_and_type(holder, credential_type)
            .map_err(IssuanceError::PersistenceError)
    }

    /// All records of `holder`, ordered by type.
    pub fn holder_credentials(
        &self,
        holder: &WalletId,
    ) -> Result<Vec<CredentialRecord>, IssuanceError> {
        self.store
            .list_by_holder(holder)
            .map_err(IssuanceError::PersistenceError)
    }
}

impl std::fmt::Debug for IssuanceCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IssuanceCoordinator").finish_non_exhaustive()
    }
}

fn index_type_of(types: &[String]) -> String {
    let mut unique: Vec<&str> = Vec::with_capacity(types.len());
    for tag in types {
        if !unique.contains(&tag.as_str()) {
            unique.push(tag);
        }
    }
    index_type(&unique)
}

fn stage(stage: IssuanceStage, holder: &WalletId, credential_type: &str) {
    tracing::debug!(%stage, holder = %holder, credential_type, "issuance stage");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryCredentialStore;
    use crate::vault::{EncryptedKeyVault, MemoryKeyBlobStore};
    use miw_core::FixedClock;
    use miw_crypto::{EncryptionKey, SigningKey};
    use miw_vc::SequentialIdSource;

    const NOW: i64 = 1_800_000_000;

    fn setup() -> (IssuanceCoordinator, DidDocument) {
        let vault = EncryptedKeyVault::new(
            Arc::new(MemoryKeyBlobStore::new()),
            EncryptionKey::from_bytes([7u8; 32]),
        );
        let key = SigningKey::from_bytes(&[8u8; 32]);
        vault.import(&WalletId::new("ISSUER").unwrap(), &key).unwrap();
        let doc = DidDocument::for_key(
            Did::new("did:web:localhost%3A8080:ISSUER").unwrap(),
            &key.verifying_key(),
        );
        let coordinator = IssuanceCoordinator::with_sources(
            Arc::new(vault),
            Arc::new(MemoryCredentialStore::new()),
            Arc::new(FixedClock::new(Timestamp::from_epoch_secs(NOW).unwrap())),
            Arc::new(SequentialIdSource::default()),
        );
        (coordinator, doc)
    }

    fn request(doc: &DidDocument, types: &[&str]) -> IssuanceRequest {
        let mut claims = Map::new();
        claims.insert("bpn".into(), "B1".into());
        IssuanceRequest {
            holder: WalletId::new("B1").unwrap(),
            holder_did: Did::new("did:web:localhost%3A8080:B1").unwrap(),
            claims,
            types: types.iter().map(|t| t.to_string()).collect(),
            issuer_document: doc.clone(),
            issuer_wallet: WalletId::new("ISSUER").unwrap(),
            contexts: vec![],
            expiry: Timestamp::from_epoch_secs(NOW + 3600).unwrap(),
            self_issued: false,
        }
    }

    #[test]
    fn index_type_dedupes_and_drops_base_marker() {
        let (_, doc) = setup();
        let req = request(&doc, &["VerifiableCredential", "A", "B", "A"]);
        assert_eq!(req.index_type(), "A,B");
    }

    #[test]
    fn issue_fills_record_fields() {
        let (coordinator, doc) = setup();
        let record = coordinator.issue(request(&doc, &["BpnCredential"])).unwrap();
        assert_eq!(record.credential_type, "BpnCredential");
        assert_eq!(record.issuer_did, "did:web:localhost:8080:ISSUER");
        assert_eq!(record.created_at.epoch_secs(), NOW);
        assert_eq!(record.credential_id, record.data.id());
        assert_eq!(record.data.subject()["id"], "did:web:localhost%3A8080:B1");
        record.data.verify_at(&doc, Timestamp::from_epoch_secs(NOW).unwrap()).unwrap();
    }

    #[test]
    fn explicit_subject_id_is_kept() {
        let (coordinator, doc) = setup();
        let mut req = request(&doc, &["BpnCredential"]);
        req.claims.insert("id".into(), "did:web:other".into());
        let record = coordinator.issue(req).unwrap();
        assert_eq!(record.data.subject()["id"], "did:web:other");
    }

    #[test]
    fn empty_types_are_rejected_before_any_work() {
        let (coordinator, doc) = setup();
        let err = coordinator
            .issue(request(&doc, &["VerifiableCredential"]))
            .unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::InvalidRequest);
    }

    #[test]
    fn document_without_methods_is_signing_error() {
        let (coordinator, mut doc) = setup();
        doc.verification_method.clear();
        let err = coordinator.issue(request(&doc, &["BpnCredential"])).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::SigningError);
        assert!(coordinator
            .find(&WalletId::new("B1").unwrap(), "BpnCredential")
            .unwrap()
            .is_none());
    }

    #[test]
    fn holder_credentials_lists_issued() {
        let (coordinator, doc) = setup();
        coordinator.issue(request(&doc, &["MembershipCredential"])).unwrap();
        coordinator.issue(request(&doc, &["BpnCredential"])).unwrap();
        let listed = coordinator
            .holder_credentials(&WalletId::new("B1").unwrap())
            .unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].credential_type, "BpnCredential");
    }
}
