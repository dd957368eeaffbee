//! # Key Vault
//!
//! Private signing keys live only as AES-256-GCM sealed blobs in a
//! [`KeyBlobStore`]. [`EncryptedKeyVault`] opens a blob on demand with the
//! process-wide [`EncryptionKey`] injected at construction and hands back
//! [`PrivateKeyMaterial`] owned by the caller. Nothing decrypted is cached:
//! the key is wiped when the caller drops it at the end of signing.
//!
//! Backends:
//!
//! - [`MemoryKeyBlobStore`]: `DashMap`, for tests and embedded use.
//! - [`FsKeyBlobStore`]: one base64 file per wallet (`<dir>/<wallet>.key`).

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use miw_core::WalletId;
use miw_crypto::{open, seal, EncryptionKey, SealedBlob, SigningKey, VerifyingKey};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Signature algorithm of stored keys. The system uses Ed25519 only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyAlgorithm {
    /// Ed25519 (EdDSA over Curve25519).
    Ed25519,
}

impl std::fmt::Display for KeyAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KeyAlgorithm::Ed25519 => f.write_str("Ed25519"),
        }
    }
}

/// A decrypted private key, tagged with its algorithm.
///
/// Not `Clone`; the inner key is zeroized on drop and prints redacted.
#[derive(Debug)]
pub struct PrivateKeyMaterial {
    algorithm: KeyAlgorithm,
    key: SigningKey,
}

impl PrivateKeyMaterial {
    /// Wrap an Ed25519 key.
    pub fn ed25519(key: SigningKey) -> Self {
        Self {
            algorithm: KeyAlgorithm::Ed25519,
            key,
        }
    }

    /// Algorithm tag.
    pub fn algorithm(&self) -> KeyAlgorithm {
        self.algorithm
    }

    /// The signing key.
    pub fn signing_key(&self) -> &SigningKey {
        &self.key
    }
}

/// Errors from key storage and retrieval.
///
/// No variant carries key bytes, plaintext or blob contents.
#[derive(Error, Debug)]
pub enum VaultError {
    /// No blob is stored for the wallet.
    #[error("no signing key stored for wallet {0}")]
    KeyNotFound(WalletId),

    /// The blob could not be opened or did not hold a valid key.
    #[error("signing key for wallet {0} could not be decrypted")]
    DecryptionFailure(WalletId),

    /// A key is already stored for the wallet.
    #[error("wallet {0} already has a signing key")]
    AlreadyProvisioned(WalletId),

    /// Sealing a new key failed.
    #[error("sealing signing key for wallet {0} failed")]
    SealFailure(WalletId),

    /// Blob storage failed.
    #[error("key storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Storage of sealed key blobs, keyed by wallet.
pub trait KeyBlobStore: Send + Sync {
    /// The sealed blob for `wallet`, if any.
    fn get_encrypted_key(&self, wallet: &WalletId) -> Result<Option<SealedBlob>, VaultError>;

    /// Store a blob for `wallet`. Fails with
    /// [`VaultError::AlreadyProvisioned`] if one exists.
    fn insert_encrypted_key(&self, wallet: &WalletId, blob: SealedBlob) -> Result<(), VaultError>;
}

/// Retrieval of decrypted private keys.
pub trait KeyVault: Send + Sync {
    /// Look up and decrypt the private key of `wallet`.
    ///
    /// # Errors
    ///
    /// [`VaultError::KeyNotFound`] or [`VaultError::DecryptionFailure`].
    fn get_private_key(&self, wallet: &WalletId) -> Result<PrivateKeyMaterial, VaultError>;
}

// ---------------------------------------------------------------------------
// EncryptedKeyVault
// ---------------------------------------------------------------------------

/// Vault opening sealed blobs with a process-wide secret.
pub struct EncryptedKeyVault {
    blobs: Arc<dyn KeyBlobStore>,
    secret: EncryptionKey,
}

impl EncryptedKeyVault {
    /// Vault over `blobs`, decrypting with `secret`.
    pub fn new(blobs: Arc<dyn KeyBlobStore>, secret: EncryptionKey) -> Self {
        Self { blobs, secret }
    }

    /// Generate a fresh Ed25519 key for `wallet`, seal and store it.
    ///
    /// Returns only the public key.
    pub fn provision(&self, wallet: &WalletId) -> Result<VerifyingKey, VaultError> {
        let key = SigningKey::generate(&mut rand_core::OsRng);
        self.import(wallet, &key)?;
        Ok(key.verifying_key())
    }

    /// Seal and store an existing key for `wallet`.
    pub fn import(&self, wallet: &WalletId, key: &SigningKey) -> Result<(), VaultError> {
        let seed = key.to_seed();
        let blob = seal(&self.secret, seed.as_slice())
            .map_err(|_| VaultError::SealFailure(wallet.clone()))?;
        self.blobs.insert_encrypted_key(wallet, blob)?;
        tracing::info!(wallet = %wallet, "signing key provisioned");
        Ok(())
    }
}

impl KeyVault for EncryptedKeyVault {
    fn get_private_key(&self, wallet: &WalletId) -> Result<PrivateKeyMaterial, VaultError> {
        let blob = self
            .blobs
            .get_encrypted_key(wallet)?
            .ok_or_else(|| VaultError::KeyNotFound(wallet.clone()))?;

        let plaintext = open(&self.secret, &blob).map_err(|_| {
            tracing::error!(wallet = %wallet, "signing key blob failed to decrypt");
            VaultError::DecryptionFailure(wallet.clone())
        })?;
        let key = SigningKey::from_slice(&plaintext).map_err(|_| {
            tracing::error!(wallet = %wallet, "decrypted signing key has wrong length");
            VaultError::DecryptionFailure(wallet.clone())
        })?;
        Ok(PrivateKeyMaterial::ed25519(key))
    }
}

impl std::fmt::Debug for EncryptedKeyVault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptedKeyVault")
            .field("secret", &self.secret)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// MemoryKeyBlobStore
// ---------------------------------------------------------------------------

/// In-memory blob store.
#[derive(Debug, Default)]
pub struct MemoryKeyBlobStore {
    blobs: DashMap<WalletId, SealedBlob>,
}

impl MemoryKeyBlobStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the blob for `wallet` (key rotation, corruption tests).
    pub fn replace(&self, wallet: &WalletId, blob: SealedBlob) {
        self.blobs.insert(wallet.clone(), blob);
    }
}

impl KeyBlobStore for MemoryKeyBlobStore {
    fn get_encrypted_key(&self, wallet: &WalletId) -> Result<Option<SealedBlob>, VaultError> {
        Ok(self.blobs.get(wallet).map(|b| b.value().clone()))
    }

    fn insert_encrypted_key(&self, wallet: &WalletId, blob: SealedBlob) -> Result<(), VaultError> {
        match self.blobs.entry(wallet.clone()) {
            Entry::Occupied(_) => Err(VaultError::AlreadyProvisioned(wallet.clone())),
            Entry::Vacant(slot) => {
                slot.insert(blob);
                Ok(())
            }
        }
    }
}

// ---------------------------------------------------------------------------
// FsKeyBlobStore
// ---------------------------------------------------------------------------

/// Blob store keeping `<dir>/<wallet>.key` files of base64 text.
#[derive(Debug, Clone)]
pub struct FsKeyBlobStore {
    dir: PathBuf,
}

impl FsKeyBlobStore {
    /// Store rooted at `dir` (created on first write).
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path of the blob file for `wallet`.
    pub fn path_for(&self, wallet: &WalletId) -> PathBuf {
        key_path(&self.dir, wallet)
    }
}

fn key_path(dir: &Path, wallet: &WalletId) -> PathBuf {
    dir.join(format!("{}.key", urlencoding::encode(wallet.as_str())))
}

impl KeyBlobStore for FsKeyBlobStore {
    fn get_encrypted_key(&self, wallet: &WalletId) -> Result<Option<SealedBlob>, VaultError> {
        let text = match fs::read_to_string(self.path_for(wallet)) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        SealedBlob::from_base64(&text)
            .map(Some)
            .map_err(|_| VaultError::DecryptionFailure(wallet.clone()))
    }

    fn insert_encrypted_key(&self, wallet: &WalletId, blob: SealedBlob) -> Result<(), VaultError> {
        fs::create_dir_all(&self.dir)?;
        let mut file = match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(self.path_for(wallet))
        {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                return Err(VaultError::AlreadyProvisioned(wallet.clone()))
            }
            Err(e) => return Err(e.into()),
        };
        file.write_all(blob.to_base64().as_bytes())?;
        file.sync_all()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wallet(id: &str) -> WalletId {
        WalletId::new(id).unwrap()
    }

    fn vault() -> (EncryptedKeyVault, Arc<MemoryKeyBlobStore>) {
        let blobs = Arc::new(MemoryKeyBlobStore::new());
        let vault = EncryptedKeyVault::new(blobs.clone(), EncryptionKey::from_bytes([5u8; 32]));
        (vault, blobs)
    }

    #[test]
    fn provisioned_key_round_trips() {
        let (vault, _) = vault();
        let w = wallet("BPNL000000000000");
        let public = vault.provision(&w).unwrap();
        let material = vault.get_private_key(&w).unwrap();
        assert_eq!(material.algorithm(), KeyAlgorithm::Ed25519);
        assert_eq!(material.signing_key().verifying_key(), public);
    }

    #[test]
    fn imported_key_is_returned_unchanged() {
        let (vault, blobs) = vault();
        let w = wallet("B1");
        let key = SigningKey::from_bytes(&[42u8; 32]);
        vault.import(&w, &key).unwrap();

        let stored = blobs.get_encrypted_key(&w).unwrap().unwrap();
        assert!(!stored.as_bytes().windows(32).any(|win| win == [42u8; 32]));

        let material = vault.get_private_key(&w).unwrap();
        assert_eq!(*material.signing_key().to_seed(), [42u8; 32]);
    }

    #[test]
    fn unknown_wallet_is_key_not_found() {
        let (vault, _) = vault();
        assert!(matches!(
            vault.get_private_key(&wallet("nobody")),
            Err(VaultError::KeyNotFound(_))
        ));
    }

    #[test]
    fn wrong_secret_is_decryption_failure() {
        let blobs = Arc::new(MemoryKeyBlobStore::new());
        let w = wallet("B1");
        EncryptedKeyVault::new(blobs.clone(), EncryptionKey::from_bytes([1u8; 32]))
            .provision(&w)
            .unwrap();
        let other = EncryptedKeyVault::new(blobs, EncryptionKey::from_bytes([2u8; 32]));
        let err = other.get_private_key(&w).unwrap_err();
        assert!(matches!(err, VaultError::DecryptionFailure(_)));
        assert_eq!(err.to_string(), "signing key for wallet B1 could not be decrypted");
    }

    #[test]
    fn sealed_non_key_payload_is_decryption_failure() {
        let (vault, blobs) = vault();
        let w = wallet("B1");
        let secret = EncryptionKey::from_bytes([5u8; 32]);
        blobs.replace(&w, seal(&secret, b"short").unwrap());
        assert!(matches!(
            vault.get_private_key(&w),
            Err(VaultError::DecryptionFailure(_))
        ));
    }

    #[test]
    fn provisioning_twice_is_rejected() {
        let (vault, _) = vault();
        let w = wallet("B1");
        vault.provision(&w).unwrap();
        assert!(matches!(
            vault.provision(&w),
            Err(VaultError::AlreadyProvisioned(_))
        ));
    }

    #[test]
    fn debug_does_not_print_secret() {
        let (vault, _) = vault();
        let shown = format!("{vault:?}");
        assert!(shown.contains("<redacted>"));
        assert!(!shown.contains("05050505"));
    }
}
