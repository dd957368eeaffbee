//! # miw-cli — Issuance operator CLI
//!
//! Thin wrapper over `miw-issuance` for operators and smoke tests.
//!
//! ## Subcommands
//!
//! - `keygen` — provision a sealed issuer key and its DID document
//! - `issue` — issue one credential into a filesystem store
//! - `verify` — check a credential against an issuer DID document
//! - `lookup` — read stored credentials of a holder
//!
//! Handlers return the process exit code: `0` on success, `1` on a failed
//! check, `2` when issuance conflicts with an existing credential. Errors
//! propagate as `anyhow::Error` and exit with `1`.
//!
//! The vault secret is read from `MIW_ENCRYPTION_KEY` by the `run_*`
//! entry points; the `cmd_*` handlers take it as an argument.

use std::path::Path;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;

pub mod issue;
pub mod keys;
pub mod verify;

/// Read and parse a JSON file.
pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("failed to parse JSON: {}", path.display()))
}

/// Write a value as pretty JSON.
pub(crate) fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("failed to serialize JSON")?;
    std::fs::write(path, text).with_context(|| format!("failed to write {}", path.display()))
}

/// Print a value as pretty JSON on stdout.
pub(crate) fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).context("failed to serialize JSON")?
    );
    Ok(())
}
