//! # Credential assembly
//!
//! [`CredentialBuilder`] turns caller input into an [`UnsignedCredential`].
//! It is a pure transformation apart from two injected sources: a
//! [`Clock`] for the issuance instant and an [`IdSource`] for the
//! credential id. Fixing both makes the output reproducible.
//!
//! ## Normalization
//!
//! - `@context`: the W3C credentials context is placed first if missing;
//!   duplicates are dropped.
//! - `type`: `VerifiableCredential` is placed first if missing; duplicates
//!   are dropped keeping first occurrence. At least one other tag is
//!   required, and tags may not be blank or contain `,` (the persisted
//!   index joins tags with commas).

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use miw_core::{Clock, SystemClock, Timestamp};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::credential::{UnsignedCredential, VERIFIABLE_CREDENTIAL_TYPE, W3C_CREDENTIALS_CONTEXT};
use crate::did::DidDocument;
use crate::error::VcError;

/// Source of credential identifiers.
pub trait IdSource: Send + Sync {
    /// A fresh identifier. Never returns the same value twice.
    fn next_id(&self) -> String;
}

/// Random `urn:uuid:<v4>` identifiers.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidIdSource;

impl IdSource for UuidIdSource {
    fn next_id(&self) -> String {
        format!("urn:uuid:{}", Uuid::new_v4())
    }
}

/// Deterministic identifiers `urn:uuid:00000000-0000-4000-8000-<n>`,
/// counting up from 1.
#[derive(Debug, Default)]
pub struct SequentialIdSource(AtomicU64);

impl IdSource for SequentialIdSource {
    fn next_id(&self) -> String {
        let n = self.0.fetch_add(1, Ordering::Relaxed) + 1;
        format!("urn:uuid:00000000-0000-4000-8000-{n:012x}")
    }
}

/// Assembles unsigned credentials.
#[derive(Clone)]
pub struct CredentialBuilder {
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdSource>,
}

impl Default for CredentialBuilder {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock), Arc::new(UuidIdSource))
    }
}

impl CredentialBuilder {
    /// Builder with explicit time and id sources.
    pub fn new(clock: Arc<dyn Clock>, ids: Arc<dyn IdSource>) -> Self {
        Self { clock, ids }
    }

    /// Assemble an unsigned credential.
    ///
    /// The issuance instant is read from the clock; callers cannot supply
    /// it.
    ///
    /// # Errors
    ///
    /// - [`VcError::EmptyClaims`] for an empty claims map.
    /// - [`VcError::EmptyTypes`] / [`VcError::InvalidType`] for unusable
    ///   type lists.
    /// - [`VcError::InvalidExpiry`] if `expiry` is not strictly after the
    ///   issuance instant.
    pub fn build<S: AsRef<str>>(
        &self,
        claims: Map<String, Value>,
        types: &[S],
        issuer: &DidDocument,
        contexts: &[S],
        expiry: Timestamp,
    ) -> Result<UnsignedCredential, VcError> {
        if claims.is_empty() {
            return Err(VcError::EmptyClaims);
        }
        let types = normalize_types(types)?;

        let issued = self.clock.now();
        if expiry <= issued {
            return Err(VcError::InvalidExpiry { expiry, issued });
        }

        Ok(UnsignedCredential {
            context: normalize_contexts(contexts),
            id: self.ids.next_id(),
            types,
            issuer: issuer.id.clone(),
            issuance_date: issued,
            expiration_date: expiry,
            credential_subject: claims,
        })
    }
}

impl std::fmt::Debug for CredentialBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialBuilder").finish_non_exhaustive()
    }
}

fn push_unique(out: &mut Vec<String>, value: &str) {
    if !out.iter().any(|v| v == value) {
        out.push(value.to_string());
    }
}

fn normalize_types<S: AsRef<str>>(types: &[S]) -> Result<Vec<String>, VcError> {
    let mut out = Vec::with_capacity(types.len() + 1);
    if !types.iter().any(|t| t.as_ref() == VERIFIABLE_CREDENTIAL_TYPE) {
        out.push(VERIFIABLE_CREDENTIAL_TYPE.to_string());
    }
    for tag in types {
        let tag = tag.as_ref();
        if tag.trim().is_empty() || tag.contains(',') {
            return Err(VcError::InvalidType(tag.to_string()));
        }
        push_unique(&mut out, tag);
    }
    if out.len() < 2 {
        return Err(VcError::EmptyTypes);
    }
    Ok(out)
}

fn normalize_contexts<S: AsRef<str>>(contexts: &[S]) -> Vec<String> {
    let mut out = Vec::with_capacity(contexts.len() + 1);
    out.push(W3C_CREDENTIALS_CONTEXT.to_string());
    for ctx in contexts {
        push_unique(&mut out, ctx.as_ref());
    }
    out
}
