//! # Keygen Subcommand
//!
//! Provisions a fresh Ed25519 issuer key. The private key is sealed with
//! the vault secret before it touches disk; only the public key leaves the
//! vault, published as a single-method DID document.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;

use miw_core::{Did, WalletId};
use miw_crypto::EncryptionKey;
use miw_issuance::{encryption_key_from_env, EncryptedKeyVault, FsKeyBlobStore};
use miw_vc::DidDocument;

/// Arguments for `miw keygen`.
#[derive(Args, Debug)]
pub struct KeygenArgs {
    /// Wallet the key belongs to.
    #[arg(long)]
    pub wallet: String,
    /// DID under which the public key is published.
    #[arg(long)]
    pub did: String,
    /// Output directory for `<wallet>.key` and `<wallet>.did.json`.
    #[arg(long, default_value = ".")]
    pub out: PathBuf,
}

/// Execute `miw keygen`.
pub fn run_keygen(args: &KeygenArgs) -> Result<u8> {
    let secret = encryption_key_from_env()?;
    cmd_keygen(&args.wallet, &args.did, &args.out, secret)
}

/// Provision a key for `wallet` under `out`, sealed with `secret`.
pub fn cmd_keygen(wallet: &str, did: &str, out: &Path, secret: EncryptionKey) -> Result<u8> {
    let wallet = WalletId::new(wallet).context("invalid wallet id")?;
    let did = Did::new(did).context("invalid DID")?;

    let blobs = FsKeyBlobStore::new(out);
    let key_path = blobs.path_for(&wallet);
    let vault = EncryptedKeyVault::new(Arc::new(blobs), secret);
    let public = vault
        .provision(&wallet)
        .with_context(|| format!("failed to provision key for {wallet}"))?;

    let document = DidDocument::for_key(did, &public);
    let doc_path = did_document_path(out, &wallet);
    crate::write_json(&doc_path, &document)?;

    println!("OK: provisioned Ed25519 key for {wallet}");
    println!("  Sealed key:   {}", key_path.display());
    println!("  DID document: {}", doc_path.display());
    println!("  Public key (hex): {}", public.to_hex());
    Ok(0)
}

/// Path of the DID document `keygen` writes for `wallet`.
pub fn did_document_path(out: &Path, wallet: &WalletId) -> PathBuf {
    out.join(format!("{wallet}.did.json"))
}
