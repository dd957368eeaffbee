//! In-memory credential store backed by `DashMap`.
//!
//! Uniqueness is enforced with the entry API: the `(holder, type)` shard
//! stays locked from the vacancy check until the insert.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use miw_core::WalletId;

use super::{CredentialStore, StoreError};
use crate::record::CredentialRecord;

type RecordKey = (WalletId, String);

/// Thread-safe in-memory store.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    records: DashMap<RecordKey, CredentialRecord>,
    ids: DashMap<String, RecordKey>,
}

impl MemoryCredentialStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn exists_by_holder_and_type(
        &self,
        holder: &WalletId,
        credential_type: &str,
    ) -> Result<bool, StoreError> {
        Ok(self
            .records
            .contains_key(&(holder.clone(), credential_type.to_string())))
    }

    fn get_by_holder_and_type(
        &self,
        holder: &WalletId,
        credential_type: &str,
    ) -> Result<Option<CredentialRecord>, StoreError> {
        Ok(self
            .records
            .get(&(holder.clone(), credential_type.to_string()))
            .map(|r| r.value().clone()))
    }

    fn list_by_holder(&self, holder: &WalletId) -> Result<Vec<CredentialRecord>, StoreError> {
        let mut out: Vec<CredentialRecord> = self
            .records
            .iter()
            .filter(|r| &r.key().0 == holder)
            .map(|r| r.value().clone())
            .collect();
        out.sort_by(|a, b| a.credential_type.cmp(&b.credential_type));
        Ok(out)
    }

    fn save(&self, record: CredentialRecord) -> Result<CredentialRecord, StoreError> {
        let key = (record.holder.clone(), record.credential_type.clone());
        match self.records.entry(key.clone()) {
            Entry::Occupied(_) => Err(StoreError::Conflict {
                holder: key.0,
                credential_type: key.1,
            }),
            Entry::Vacant(slot) => match self.ids.entry(record.credential_id.clone()) {
                Entry::Occupied(_) => Err(StoreError::DuplicateId(record.credential_id)),
                Entry::Vacant(id_slot) => {
                    id_slot.insert(key);
                    slot.insert(record.clone());
                    Ok(record)
                }
            },
        }
    }
}
