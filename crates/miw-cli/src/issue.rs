//! # Issue Subcommand
//!
//! Issues one credential from a settings file, a claims file and the
//! holder's identifiers into a filesystem credential store. Prints the
//! signed credential on success.
//!
//! Exit codes: `0` issued, `2` the holder already has a credential of this
//! type. Every other failure is an error (`1`).

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use serde_json::{Map, Value};

use miw_core::{Did, IdentifierKind, Timestamp, WalletId};
use miw_crypto::EncryptionKey;
use miw_issuance::{
    encryption_key_from_env, EncryptedKeyVault, ErrorKind, FsCredentialStore, FsKeyBlobStore,
    IssuanceCoordinator, IssuanceSettings, IssuerProfile,
};

/// Exit code for an issuance refused because the credential exists.
pub const EXIT_CONFLICT: u8 = 2;

/// Arguments for `miw issue`.
#[derive(Args, Debug)]
pub struct IssueArgs {
    /// Issuance settings (YAML).
    #[arg(long)]
    pub config: PathBuf,
    /// Holder wallet (BPN or `did:web` identifier).
    #[arg(long)]
    pub holder: String,
    /// Holder DID. Defaults to `--holder` when that is a DID.
    #[arg(long)]
    pub holder_did: Option<String>,
    /// Credential type tag. Repeat for multiple tags.
    #[arg(long = "type", required = true)]
    pub types: Vec<String>,
    /// JSON file with the subject claims object.
    #[arg(long)]
    pub claims: PathBuf,
    /// Credential store directory.
    #[arg(long)]
    pub store: PathBuf,
    /// Directory of sealed issuer keys. Defaults to the directory of the
    /// issuer DID document.
    #[arg(long)]
    pub keys: Option<PathBuf>,
    /// Mark the credential as self-issued.
    #[arg(long)]
    pub self_issued: bool,
}

/// Execute `miw issue`.
pub fn run_issue(args: &IssueArgs) -> Result<u8> {
    let secret = encryption_key_from_env()?;
    cmd_issue(args, secret)
}

/// Issue a credential, decrypting the issuer key with `secret`.
pub fn cmd_issue(args: &IssueArgs, secret: EncryptionKey) -> Result<u8> {
    let settings = IssuanceSettings::load(&args.config)?;
    let document = settings.load_issuer_document()?;
    let key_dir = args
        .keys
        .clone()
        .unwrap_or_else(|| key_dir_for(&settings.issuer_did_document));

    let holder = WalletId::new(args.holder.as_str()).context("invalid holder wallet id")?;
    let holder_did = resolve_holder_did(&args.holder, args.holder_did.as_deref())?;
    let claims: Map<String, Value> = crate::read_json(&args.claims)?;

    let profile = IssuerProfile::new(settings, document);
    let mut request = profile.custom_request(
        holder,
        holder_did,
        args.types.clone(),
        claims,
        Timestamp::now(),
    );
    request.self_issued |= args.self_issued;

    let vault = EncryptedKeyVault::new(Arc::new(FsKeyBlobStore::new(key_dir)), secret);
    let coordinator = IssuanceCoordinator::new(
        Arc::new(vault),
        Arc::new(FsCredentialStore::new(&args.store)),
    );

    match coordinator.issue(request) {
        Ok(record) => {
            crate::print_json(&record.data)?;
            Ok(0)
        }
        Err(e) if e.kind() == ErrorKind::Conflict => {
            eprintln!("CONFLICT: {e}");
            Ok(EXIT_CONFLICT)
        }
        Err(e) => Err(e).context("issuance failed"),
    }
}

fn key_dir_for(did_document: &Path) -> PathBuf {
    match did_document.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// The holder DID: explicit, or the holder identifier itself when it is
/// a `did:web` identifier.
fn resolve_holder_did(holder: &str, explicit: Option<&str>) -> Result<Did> {
    match explicit {
        Some(did) => Did::new(did).context("invalid holder DID"),
        None if IdentifierKind::classify(holder) == IdentifierKind::Did => {
            Did::new(holder).context("invalid holder DID")
        }
        None => anyhow::bail!("--holder-did is required when --holder is a BPN"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn holder_did_defaults_to_did_holder() {
        let did = resolve_holder_did("did:web:holder.example", None).unwrap();
        assert_eq!(did.as_str(), "did:web:holder.example");
        assert!(resolve_holder_did("BPNL000000000001", None).is_err());
        let explicit = resolve_holder_did("BPNL000000000001", Some("did:web:h")).unwrap();
        assert_eq!(explicit.as_str(), "did:web:h");
    }

    #[test]
    fn key_dir_defaults_to_document_directory() {
        assert_eq!(key_dir_for(Path::new("keys/issuer.did.json")), PathBuf::from("keys"));
        assert_eq!(key_dir_for(Path::new("issuer.did.json")), PathBuf::from("."));
    }
}
