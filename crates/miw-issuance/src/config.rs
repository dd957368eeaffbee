//! # Issuance Configuration
//!
//! [`IssuanceSettings`] is loaded from YAML:
//!
//! ```yaml
//! issuer_wallet: BPNL000000000000
//! issuer_did_document: keys/BPNL000000000000.did.json
//! contexts:
//!   - https://example.org/credentials/v1
//! validity_days: 365
//! ```
//!
//! The vault secret never appears in the settings file. It is read once
//! from [`ENCRYPTION_KEY_ENV`] (64 hex characters) and injected into the
//! vault by the embedder.

use std::path::{Path, PathBuf};

use miw_core::{Timestamp, WalletId};
use miw_crypto::EncryptionKey;
use miw_vc::DidDocument;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable holding the hex-encoded vault secret.
pub const ENCRYPTION_KEY_ENV: &str = "MIW_ENCRYPTION_KEY";

/// Default credential validity.
pub const DEFAULT_VALIDITY_DAYS: u32 = 365;

/// Longest accepted credential validity (100 years).
pub const MAX_VALIDITY_DAYS: u32 = 36_500;

/// Errors from loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Reading a file failed.
    #[error("cannot read {path}: {source}")]
    Read {
        /// File that failed.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// YAML did not match the settings schema.
    #[error("invalid settings: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// The issuer DID document is not valid JSON for the document model.
    #[error("invalid DID document {path}: {source}")]
    DidDocument {
        /// File that failed.
        path: PathBuf,
        /// Underlying error.
        source: serde_json::Error,
    },

    /// A setting has an unusable value.
    #[error("invalid setting {field}: {reason}")]
    InvalidValue {
        /// Setting name.
        field: &'static str,
        /// What is wrong.
        reason: String,
    },

    /// The secret variable is unset.
    #[error("environment variable {0} is not set")]
    MissingSecret(&'static str),

    /// The secret variable is not 64 hex characters.
    #[error("environment variable {0} must hold 64 hex characters")]
    MalformedSecret(&'static str),
}

/// Settings of an issuing deployment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IssuanceSettings {
    /// Wallet whose key signs issued credentials.
    pub issuer_wallet: WalletId,
    /// Path to the issuer's DID document (JSON). Relative paths resolve
    /// against the settings file's directory.
    pub issuer_did_document: PathBuf,
    /// Contexts added to every credential after the W3C base context.
    #[serde(default)]
    pub contexts: Vec<String>,
    /// Credential lifetime in days.
    #[serde(default = "default_validity_days")]
    pub validity_days: u32,
}

fn default_validity_days() -> u32 {
    DEFAULT_VALIDITY_DAYS
}

impl IssuanceSettings {
    /// Parse settings from YAML text.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let settings: Self = serde_yaml::from_str(yaml)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a YAML file, resolving the DID document path
    /// relative to it.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut settings = Self::from_yaml_str(&text)?;
        if settings.issuer_did_document.is_relative() {
            if let Some(base) = path.parent() {
                settings.issuer_did_document = base.join(&settings.issuer_did_document);
            }
        }
        tracing::debug!(
            path = %path.display(),
            issuer = %settings.issuer_wallet,
            "issuance settings loaded"
        );
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_VALIDITY_DAYS).contains(&self.validity_days) {
            return Err(ConfigError::InvalidValue {
                field: "validity_days",
                reason: format!("must be between 1 and {MAX_VALIDITY_DAYS}"),
            });
        }
        if let Some(blank) = self.contexts.iter().find(|c| c.trim().is_empty()) {
            return Err(ConfigError::InvalidValue {
                field: "contexts",
                reason: format!("blank context entry {blank:?}"),
            });
        }
        Ok(())
    }

    /// Expiry of a credential issued at `issued`.
    pub fn expiry_from(&self, issued: Timestamp) -> Timestamp {
        issued.offset(chrono::Duration::days(i64::from(self.validity_days)))
    }

    /// Read and parse the issuer DID document.
    pub fn load_issuer_document(&self) -> Result<DidDocument, ConfigError> {
        let path = &self.issuer_did_document;
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::DidDocument {
            path: path.clone(),
            source,
        })
    }
}

/// Read the vault secret from [`ENCRYPTION_KEY_ENV`].
pub fn encryption_key_from_env() -> Result<EncryptionKey, ConfigError> {
    encryption_key_from(std::env::var(ENCRYPTION_KEY_ENV).ok())
}

/// Parse a vault secret from an optional hex value.
pub fn encryption_key_from(value: Option<String>) -> Result<EncryptionKey, ConfigError> {
    let hex = zeroize::Zeroizing::new(value.ok_or(ConfigError::MissingSecret(ENCRYPTION_KEY_ENV))?);
    EncryptionKey::from_hex(hex.trim()).map_err(|_| ConfigError::MalformedSecret(ENCRYPTION_KEY_ENV))
}
