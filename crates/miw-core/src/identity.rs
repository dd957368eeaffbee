//! # Identity Newtypes
//!
//! Validated identifiers used throughout issuance. A [`WalletId`] names a
//! wallet inside the system (a business partner number or a DID string);
//! a [`Did`] is a W3C decentralized identifier as it appears on the wire.
//!
//! Both validate at construction and at deserialization, so an invalid
//! identifier never reaches the vault or the credential store.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Implements `Deserialize` for string newtypes by routing through `new()`.
macro_rules! impl_validating_deserialize {
    ($ty:ident) => {
        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let raw = String::deserialize(deserializer)?;
                Self::new(raw).map_err(serde::de::Error::custom)
            }
        }
    };
}

/// W3C Decentralized Identifier.
///
/// Format: `did:<method>:<method-specific-id>`, method lowercase
/// alphanumeric, identifier non-empty. Percent-encoded characters in the
/// method-specific id (e.g. `did:web:localhost%3A8080:BPNL01`) are kept
/// verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Did(String);

impl_validating_deserialize!(Did);

impl Did {
    /// Create a DID from a string, validating format.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidDid`] if the string does not match
    /// `did:<method>:<identifier>`.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let s = value.into();
        if split_did(&s).is_none() {
            return Err(ValidationError::InvalidDid(s));
        }
        Ok(Self(s))
    }

    /// Access the DID string value.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The DID method (`web` in `did:web:example.com`).
    pub fn method(&self) -> &str {
        split_did(&self.0).map(|(m, _)| m).unwrap_or_default()
    }

    /// Everything after `did:<method>:`.
    pub fn method_specific_id(&self) -> &str {
        split_did(&self.0).map(|(_, id)| id).unwrap_or_default()
    }
}

fn split_did(s: &str) -> Option<(&str, &str)> {
    let rest = s.strip_prefix("did:")?;
    let (method, identifier) = rest.split_once(':')?;
    let method_ok = !method.is_empty()
        && method
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit());
    let id_ok = !identifier.is_empty() && !identifier.chars().any(char::is_whitespace);
    (method_ok && id_ok).then_some((method, identifier))
}

impl std::fmt::Display for Did {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Did {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// Identifier of a wallet: the key under which its encrypted signing key
/// and its credentials are stored.
///
/// Non-empty, no whitespace, no path separators, not `.` or `..`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct WalletId(String);

impl_validating_deserialize!(WalletId);

impl WalletId {
    /// Create a wallet identifier, validating format.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidWalletId`] for empty strings or
    /// strings containing whitespace, `/` or `\`, and for the relative path
    /// names `.` and `..`.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let s = value.into();
        let bad = s.is_empty()
            || s == "."
            || s == ".."
            || s.chars()
                .any(|c| c.is_whitespace() || c == '/' || c == '\\');
        if bad {
            return Err(ValidationError::InvalidWalletId(s));
        }
        Ok(Self(s))
    }

    /// Access the identifier string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this wallet is addressed by DID or by business partner number.
    pub fn kind(&self) -> IdentifierKind {
        IdentifierKind::classify(&self.0)
    }
}

impl std::fmt::Display for WalletId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for WalletId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// How a holder or issuer is identified in a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IdentifierKind {
    /// A `did:web` identifier.
    Did,
    /// A business partner number.
    Bpn,
}

impl IdentifierKind {
    /// Classify an identifier string. Anything not starting with `did:web`
    /// is treated as a business partner number.
    pub fn classify(identifier: &str) -> Self {
        if identifier.starts_with("did:web") {
            Self::Did
        } else {
            Self::Bpn
        }
    }
}
