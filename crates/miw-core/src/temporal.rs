//! # Temporal Types — UTC Timestamps and Clocks
//!
//! Defines [`Timestamp`], a UTC-only timestamp truncated to whole seconds,
//! and the [`Clock`] abstraction that issuance components use to obtain
//! "now".
//!
//! ## Canonical Form
//!
//! Timestamps always render as `YYYY-MM-DDTHH:MM:SSZ`. Sub-second digits or
//! local offsets would produce different canonical byte sequences for the
//! same instant and break signature reproducibility, so both are removed at
//! construction.
//!
//! ## Clocks
//!
//! Components never call `Utc::now()` directly. They hold an
//! `Arc<dyn Clock>`; production wiring uses [`SystemClock`] and tests inject
//! a [`FixedClock`] to make credential assembly reproducible.

use chrono::{DateTime, Duration, Timelike, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ValidationError;

/// A UTC-only timestamp, truncated to seconds precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Current UTC time, truncated to seconds.
    pub fn now() -> Self {
        Self(truncate_to_seconds(Utc::now()))
    }

    /// Create from a `DateTime<Utc>`, truncating sub-seconds.
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self(truncate_to_seconds(dt))
    }

    /// Parse an RFC 3339 string, requiring the `Z` suffix.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidTimestamp`] for malformed input or
    /// any explicit offset (including `+00:00`).
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        if !s.ends_with('Z') {
            return Err(ValidationError::InvalidTimestamp {
                value: s.to_string(),
                reason: "must use Z suffix (UTC only)".to_string(),
            });
        }
        Self::parse_lenient(s)
    }

    /// Parse an RFC 3339 string with any offset, converting to UTC.
    pub fn parse_lenient(s: &str) -> Result<Self, ValidationError> {
        let dt = DateTime::parse_from_rfc3339(s).map_err(|e| ValidationError::InvalidTimestamp {
            value: s.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self(truncate_to_seconds(dt.with_timezone(&Utc))))
    }

    /// Create from Unix epoch seconds.
    pub fn from_epoch_secs(secs: i64) -> Result<Self, ValidationError> {
        DateTime::from_timestamp(secs, 0)
            .map(Self)
            .ok_or_else(|| ValidationError::InvalidTimestamp {
                value: secs.to_string(),
                reason: "out of range".to_string(),
            })
    }

    /// Access the inner `DateTime<Utc>`.
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Unix epoch seconds.
    pub fn epoch_secs(&self) -> i64 {
        self.0.timestamp()
    }

    /// This timestamp shifted by `delta`, clamped to the representable
    /// range instead of wrapping or staying put.
    pub fn offset(&self, delta: Duration) -> Self {
        match self.0.checked_add_signed(delta) {
            Some(dt) => Self(dt),
            None if delta < Duration::zero() => Self::from_utc(DateTime::<Utc>::MIN_UTC),
            None => Self::from_utc(DateTime::<Utc>::MAX_UTC),
        }
    }

    /// Render as ISO 8601 with `Z` suffix (e.g. `2026-01-15T12:00:00Z`).
    pub fn to_iso8601(&self) -> String {
        self.0.format("%Y-%m-%dT%H:%M:%SZ").to_string()
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_iso8601())
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_iso8601())
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse_lenient(&raw).map_err(serde::de::Error::custom)
    }
}

fn truncate_to_seconds(dt: DateTime<Utc>) -> DateTime<Utc> {
    dt.with_nanosecond(0).unwrap_or(dt)
}

/// Source of the current instant.
pub trait Clock: Send + Sync {
    /// The current instant, truncated to seconds.
    fn now(&self) -> Timestamp;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}

/// A clock pinned to one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(Timestamp);

impl FixedClock {
    /// Pin the clock to `at`.
    pub fn new(at: Timestamp) -> Self {
        Self(at)
    }
}

impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        self.0
    }
}
