//! # Credential Catalog
//!
//! Claim templates for the credential types an operator wallet issues.
//! Each [`CredentialTemplate`] knows its type tag and how to lay out its
//! subject; [`IssuerProfile::request`] combines a template with the issuer's
//! settings into an [`IssuanceRequest`].
//!
//! | Template | Type | Subject |
//! |----------|------|---------|
//! | Membership | `MembershipCredential` | `id, holderIdentifier, memberOf, status, startTime` |
//! | Bpn | `BpnCredential` | `id, bpn` |
//! | Dismantler | `DismantlerCredential` | `id, holderIdentifier, activityType, allowedVehicleBrands` |

use miw_core::{Did, Timestamp, WalletId};
use miw_vc::DidDocument;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::IssuanceSettings;
use crate::coordinator::IssuanceRequest;

/// Type tag of membership credentials.
pub const MEMBERSHIP_CREDENTIAL: &str = "MembershipCredential";
/// Type tag of business partner number credentials.
pub const BPN_CREDENTIAL: &str = "BpnCredential";
/// Type tag of dismantler credentials.
pub const DISMANTLER_CREDENTIAL: &str = "DismantlerCredential";

/// Default membership status.
pub const ACTIVE_STATUS: &str = "Active";

/// A typed claim layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "template", rename_all = "snake_case")]
pub enum CredentialTemplate {
    /// Membership in a network or association.
    Membership {
        /// Organisation the holder is a member of.
        member_of: String,
        /// Membership status.
        status: String,
        /// Start of membership.
        start_time: Timestamp,
    },
    /// The holder's business partner number.
    Bpn {
        /// Business partner number.
        bpn: String,
    },
    /// Authorisation to dismantle vehicles.
    Dismantler {
        /// Permitted activity.
        activity_type: String,
        /// Brands the holder may dismantle. Empty means unrestricted.
        allowed_vehicle_brands: Vec<String>,
    },
}

impl CredentialTemplate {
    /// Active membership starting at `start_time`.
    pub fn membership(member_of: impl Into<String>, start_time: Timestamp) -> Self {
        Self::Membership {
            member_of: member_of.into(),
            status: ACTIVE_STATUS.to_string(),
            start_time,
        }
    }

    /// Type tag of credentials built from this template.
    pub fn credential_type(&self) -> &'static str {
        match self {
            Self::Membership { .. } => MEMBERSHIP_CREDENTIAL,
            Self::Bpn { .. } => BPN_CREDENTIAL,
            Self::Dismantler { .. } => DISMANTLER_CREDENTIAL,
        }
    }

    /// Subject claims for `holder`, with the holder DID as subject id.
    pub fn claims(&self, holder: &WalletId, holder_did: &Did) -> Map<String, Value> {
        let mut claims = Map::new();
        claims.insert("id".into(), Value::String(holder_did.to_string()));
        match self {
            Self::Membership {
                member_of,
                status,
                start_time,
            } => {
                claims.insert("holderIdentifier".into(), holder.as_str().into());
                claims.insert("memberOf".into(), member_of.as_str().into());
                claims.insert("status".into(), status.as_str().into());
                claims.insert("startTime".into(), start_time.to_iso8601().into());
            }
            Self::Bpn { bpn } => {
                claims.insert("bpn".into(), bpn.as_str().into());
            }
            Self::Dismantler {
                activity_type,
                allowed_vehicle_brands,
            } => {
                claims.insert("holderIdentifier".into(), holder.as_str().into());
                claims.insert("activityType".into(), activity_type.as_str().into());
                claims.insert(
                    "allowedVehicleBrands".into(),
                    Value::Array(
                        allowed_vehicle_brands
                            .iter()
                            .map(|b| Value::String(b.clone()))
                            .collect(),
                    ),
                );
            }
        }
        claims
    }
}

/// Issuer-side inputs shared by every request from one deployment.
#[derive(Debug, Clone)]
pub struct IssuerProfile {
    settings: IssuanceSettings,
    document: DidDocument,
}

impl IssuerProfile {
    /// Profile from loaded settings and the issuer's DID document.
    pub fn new(settings: IssuanceSettings, document: DidDocument) -> Self {
        Self { settings, document }
    }

    /// The issuer wallet.
    pub fn wallet(&self) -> &WalletId {
        &self.settings.issuer_wallet
    }

    /// The issuer DID document.
    pub fn document(&self) -> &DidDocument {
        &self.document
    }

    /// Request issuing `template` to `holder`, valid for the configured
    /// number of days from `now`.
    pub fn request(
        &self,
        template: &CredentialTemplate,
        holder: WalletId,
        holder_did: Did,
        now: Timestamp,
    ) -> IssuanceRequest {
        let claims = template.claims(&holder, &holder_did);
        self.custom_request(
            holder,
            holder_did,
            vec![template.credential_type().to_string()],
            claims,
            now,
        )
    }

    /// Request for caller-supplied types and claims.
    pub fn custom_request(
        &self,
        holder: WalletId,
        holder_did: Did,
        types: Vec<String>,
        claims: Map<String, Value>,
        now: Timestamp,
    ) -> IssuanceRequest {
        let self_issued = holder == self.settings.issuer_wallet;
        IssuanceRequest {
            holder,
            holder_did,
            claims,
            types,
            issuer_document: self.document.clone(),
            issuer_wallet: self.settings.issuer_wallet.clone(),
            contexts: self.settings.contexts.clone(),
            expiry: self.settings.expiry_from(now),
            self_issued,
        }
    }
}
