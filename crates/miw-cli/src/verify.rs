//! # Verify and Lookup Subcommands
//!
//! `verify` checks a signed credential against the issuer's DID document.
//! `lookup` reads records from a filesystem credential store.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;

use miw_core::WalletId;
use miw_issuance::{CredentialStore, FsCredentialStore};
use miw_vc::{DidDocument, VerifiableCredential};

/// Arguments for `miw verify`.
#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// Signed credential (JSON).
    #[arg(long)]
    pub credential: PathBuf,
    /// Issuer DID document (JSON).
    #[arg(long)]
    pub did_document: PathBuf,
    /// Check only the signature, not the expiry.
    #[arg(long)]
    pub ignore_expiry: bool,
}

/// Execute `miw verify`.
pub fn run_verify(args: &VerifyArgs) -> Result<u8> {
    cmd_verify(&args.credential, &args.did_document, args.ignore_expiry)
}

/// Verify the credential at `credential` against `did_document`.
pub fn cmd_verify(credential: &Path, did_document: &Path, ignore_expiry: bool) -> Result<u8> {
    let vc: VerifiableCredential = crate::read_json(credential)?;
    let document: DidDocument = crate::read_json(did_document)?;

    let result = if ignore_expiry {
        vc.verify_signature(&document)
    } else {
        vc.verify(&document)
    };
    match result {
        Ok(()) => {
            println!("OK: credential {} verified against {}", vc.id(), document.id);
            Ok(0)
        }
        Err(e) => {
            tracing::debug!(credential = %vc.id(), error = %e, "verification failed");
            println!("FAIL: {e}");
            Ok(1)
        }
    }
}

/// Arguments for `miw lookup`.
#[derive(Args, Debug)]
pub struct LookupArgs {
    /// Credential store directory.
    #[arg(long)]
    pub store: PathBuf,
    /// Holder wallet.
    #[arg(long)]
    pub holder: String,
    /// Index type (comma-joined tags). All of the holder's records when
    /// omitted.
    #[arg(long = "type")]
    pub credential_type: Option<String>,
}

/// Execute `miw lookup`.
pub fn run_lookup(args: &LookupArgs) -> Result<u8> {
    cmd_lookup(&args.store, &args.holder, args.credential_type.as_deref())
}

/// Print the holder's record of `credential_type`, or all its records.
pub fn cmd_lookup(store: &Path, holder: &str, credential_type: Option<&str>) -> Result<u8> {
    let store = FsCredentialStore::new(store);
    let holder = WalletId::new(holder).context("invalid holder wallet id")?;
    match credential_type {
        Some(t) => match store.get_by_holder_and_type(&holder, t)? {
            Some(record) => {
                crate::print_json(&record)?;
                Ok(0)
            }
            None => {
                println!("NOT FOUND: no {t} credential for {holder}");
                Ok(1)
            }
        },
        None => {
            crate::print_json(&store.list_by_holder(&holder)?)?;
            Ok(0)
        }
    }
}
