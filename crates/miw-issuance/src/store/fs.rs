//! Filesystem credential store.
//!
//! Layout under the root directory:
//!
//! ```text
//! <root>/records/<holder>/<type>.json   one record per (holder, type)
//! <root>/ids/<credential id>            empty marker per credential id
//! ```
//!
//! Path components are percent-encoded. A record is written to a temp file
//! in the holder directory and published with a no-clobber hard link, so
//! the filesystem decides which of two racing saves wins. Id markers are
//! created with `O_EXCL` before the record is published and removed again
//! if publishing loses.

use std::fs::{self, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use miw_core::WalletId;
use tempfile::NamedTempFile;

use super::{CredentialStore, StoreError};
use crate::record::CredentialRecord;

const RECORD_EXTENSION: &str = "json";

/// Store rooted at a directory.
#[derive(Debug, Clone)]
pub struct FsCredentialStore {
    root: PathBuf,
}

impl FsCredentialStore {
    /// Store rooted at `root`. Directories are created on first save.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn holder_dir(&self, holder: &WalletId) -> PathBuf {
        self.root
            .join("records")
            .join(urlencoding::encode(holder.as_str()).as_ref())
    }

    fn record_path(&self, holder: &WalletId, credential_type: &str) -> PathBuf {
        self.holder_dir(holder).join(format!(
            "{}.{RECORD_EXTENSION}",
            urlencoding::encode(credential_type)
        ))
    }

    fn id_marker(&self, credential_id: &str) -> PathBuf {
        self.root
            .join("ids")
            .join(urlencoding::encode(credential_id).as_ref())
    }

    fn claim_id(&self, credential_id: &str) -> Result<PathBuf, StoreError> {
        let marker = self.id_marker(credential_id);
        if let Some(parent) = marker.parent() {
            fs::create_dir_all(parent)?;
        }
        match OpenOptions::new().write(true).create_new(true).open(&marker) {
            Ok(_) => Ok(marker),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                Err(StoreError::DuplicateId(credential_id.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn publish(&self, record: &CredentialRecord) -> Result<(), StoreError> {
        let dir = self.holder_dir(&record.holder);
        fs::create_dir_all(&dir)?;
        let tmp = NamedTempFile::new_in(&dir)?;
        {
            let mut writer = BufWriter::new(tmp.as_file());
            serde_json::to_writer_pretty(&mut writer, record)?;
            writer.flush()?;
        }
        tmp.as_file().sync_all()?;

        let target = self.record_path(&record.holder, &record.credential_type);
        match tmp.persist_noclobber(&target) {
            Ok(_) => Ok(()),
            Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => Err(StoreError::Conflict {
                holder: record.holder.clone(),
                credential_type: record.credential_type.clone(),
            }),
            Err(e) => Err(e.error.into()),
        }
    }
}

fn read_record(path: &Path) -> Result<Option<CredentialRecord>, StoreError> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

impl CredentialStore for FsCredentialStore {
    fn exists_by_holder_and_type(
        &self,
        holder: &WalletId,
        credential_type: &str,
    ) -> Result<bool, StoreError> {
        Ok(self.record_path(holder, credential_type).is_file())
    }

    fn get_by_holder_and_type(
        &self,
        holder: &WalletId,
        credential_type: &str,
    ) -> Result<Option<CredentialRecord>, StoreError> {
        read_record(&self.record_path(holder, credential_type))
    }

    fn list_by_holder(&self, holder: &WalletId) -> Result<Vec<CredentialRecord>, StoreError> {
        let entries = match fs::read_dir(self.holder_dir(holder)) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let mut out = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(RECORD_EXTENSION) {
                continue;
            }
            if let Some(record) = read_record(&path)? {
                out.push(record);
            }
        }
        out.sort_by(|a: &CredentialRecord, b| a.credential_type.cmp(&b.credential_type));
        Ok(out)
    }

    fn save(&self, record: CredentialRecord) -> Result<CredentialRecord, StoreError> {
        if self.exists_by_holder_and_type(&record.holder, &record.credential_type)? {
            return Err(StoreError::Conflict {
                holder: record.holder,
                credential_type: record.credential_type,
            });
        }
        let marker = self.claim_id(&record.credential_id)?;
        if let Err(e) = self.publish(&record) {
            if let Err(cleanup) = fs::remove_file(&marker) {
                tracing::warn!(
                    marker = %marker.display(),
                    error = %cleanup,
                    "failed to release credential id marker"
                );
            }
            return Err(e);
        }
        Ok(record)
    }
}
