//! # miw-issuance
//!
//! Credential issuance for the managed identity wallet.
//!
//! - [`vault`]: issuer signing keys sealed at rest with AES-256-GCM and
//!   opened per request ([`EncryptedKeyVault`]).
//! - [`store`]: credential records keyed by `(holder, type)`, with the
//!   uniqueness constraint enforced on save ([`MemoryCredentialStore`],
//!   [`FsCredentialStore`]).
//! - [`coordinator`]: [`IssuanceCoordinator`] runs check, key load, build,
//!   sign and persist for one request.
//! - [`catalog`]: claim templates for membership, BPN and dismantler
//!   credentials.
//! - [`config`]: YAML settings and the vault secret from the environment.
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use miw_core::{Did, Timestamp, WalletId};
//! use miw_crypto::EncryptionKey;
//! use miw_issuance::{
//!     EncryptedKeyVault, IssuanceCoordinator, IssuanceRequest, MemoryCredentialStore,
//!     MemoryKeyBlobStore,
//! };
//! use miw_vc::DidDocument;
//!
//! let issuer = WalletId::new("BPNL000000000000").unwrap();
//! let vault = EncryptedKeyVault::new(Arc::new(MemoryKeyBlobStore::new()), EncryptionKey::generate());
//! let public = vault.provision(&issuer).unwrap();
//! let document = DidDocument::for_key(Did::new("did:web:issuer.example").unwrap(), &public);
//!
//! let coordinator = IssuanceCoordinator::new(Arc::new(vault), Arc::new(MemoryCredentialStore::new()));
//! let mut claims = serde_json::Map::new();
//! claims.insert("bpn".into(), "BPNL000000000001".into());
//! let record = coordinator
//!     .issue(IssuanceRequest {
//!         holder: WalletId::new("BPNL000000000001").unwrap(),
//!         holder_did: Did::new("did:web:holder.example").unwrap(),
//!         claims,
//!         types: vec!["BpnCredential".into()],
//!         issuer_document: document.clone(),
//!         issuer_wallet: issuer,
//!         contexts: vec![],
//!         expiry: Timestamp::now().offset(chrono::Duration::days(365)),
//!         self_issued: false,
//!     })
//!     .unwrap();
//! assert_eq!(record.credential_type, "BpnCredential");
//! record.data.verify(&document).unwrap();
//! ```

pub mod catalog;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod record;
pub mod store;
pub mod vault;

pub use catalog::{CredentialTemplate, IssuerProfile};
pub use config::{encryption_key_from_env, ConfigError, IssuanceSettings, ENCRYPTION_KEY_ENV};
pub use coordinator::{IssuanceCoordinator, IssuanceRequest};
pub use error::{ErrorKind, IssuanceError, IssuanceStage};
pub use record::CredentialRecord;
pub use store::{CredentialStore, FsCredentialStore, MemoryCredentialStore, StoreError};
pub use vault::{
    EncryptedKeyVault, FsKeyBlobStore, KeyAlgorithm, KeyBlobStore, KeyVault, MemoryKeyBlobStore,
    PrivateKeyMaterial, VaultError,
};
