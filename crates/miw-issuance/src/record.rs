//! # Persisted credential records

use miw_core::{Did, Timestamp, WalletId};
use miw_vc::VerifiableCredential;
use serde::{Deserialize, Serialize};

/// A credential as persisted after issuance. Never updated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialRecord {
    /// Holder wallet.
    pub holder: WalletId,
    /// Holder DID.
    pub holder_did: Did,
    /// Issuer DID, percent-decoded.
    pub issuer_did: String,
    /// Comma-joined type tags without `VerifiableCredential`.
    #[serde(rename = "type")]
    pub credential_type: String,
    /// Credential id.
    pub credential_id: String,
    /// The full signed credential.
    pub data: VerifiableCredential,
    /// Whether the issuer issued the credential to itself.
    pub self_issued: bool,
    /// When the record was assembled.
    pub created_at: Timestamp,
}

/// Percent-decode a DID for the persisted issuer field. Input that does not
/// decode to UTF-8 is kept as is.
pub fn decode_did(did: &Did) -> String {
    urlencoding::decode(did.as_str())
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| did.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_percent_escapes() {
        let did = Did::new("did:web:localhost%3A8080:BPNL000000000000").unwrap();
        assert_eq!(decode_did(&did), "did:web:localhost:8080:BPNL000000000000");
    }

    #[test]
    fn plain_did_is_unchanged() {
        let did = Did::new("did:web:example.com").unwrap();
        assert_eq!(decode_did(&did), "did:web:example.com");
    }
}
