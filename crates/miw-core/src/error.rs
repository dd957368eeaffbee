//! # Error Types
//!
//! Leaf error enums shared by every crate in the workspace. Higher layers
//! wrap these with `#[from]` in their own `thiserror` enums.

use thiserror::Error;

/// Error during canonical serialization.
#[derive(Error, Debug)]
pub enum CanonicalizationError {
    /// Float values have no deterministic canonical form. Carry them as strings.
    #[error("float values are not permitted in canonical representations; use a string or integer: {0}")]
    FloatRejected(f64),

    /// JSON serialization failed.
    #[error("serialization failed: {0}")]
    SerializationFailed(#[from] serde_json::Error),
}

/// Error constructing a validated domain primitive.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// DID does not conform to `did:<method>:<identifier>`.
    #[error("invalid DID format: \"{0}\" (expected did:<method>:<identifier>)")]
    InvalidDid(String),

    /// Wallet identifier is empty or contains whitespace.
    #[error("invalid wallet identifier: \"{0}\"")]
    InvalidWalletId(String),

    /// Timestamp string is not a valid UTC RFC 3339 value.
    #[error("invalid timestamp: \"{value}\" ({reason})")]
    InvalidTimestamp {
        /// The string that failed to parse.
        value: String,
        /// Why it was rejected.
        reason: String,
    },
}
