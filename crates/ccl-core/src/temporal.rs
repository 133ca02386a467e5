//! # Temporal Types — UTC-Only Timestamps and Vintage Years
//!
//! Defines `Timestamp`, a UTC-only timestamp enforcing ISO8601 with Z
//! suffix at seconds precision, and `Vintage`, the validated production
//! year carried by every credit.
//!
//! ## Security Invariant
//!
//! Issuance proofs bind a production claim to an epoch-seconds bound, and
//! ledger events are content-addressed downstream. Both require one
//! deterministic encoding per instant. Local timezone offsets would
//! produce different byte sequences for the same instant, so non-UTC
//! inputs are **rejected at construction** — there is no silent
//! conversion.

use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// A UTC-only timestamp, truncated to seconds precision.
///
/// # Construction
///
/// - [`Timestamp::now()`] — current UTC time, truncated.
/// - [`Timestamp::from_utc()`] — from a `DateTime<Utc>`, truncating sub-seconds.
/// - [`Timestamp::parse()`] — from an ISO8601 string, rejecting non-UTC offsets.
/// - [`Timestamp::from_epoch_secs()`] — from Unix epoch seconds (the encoding
///   used by issuance-circuit public signals).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Create a timestamp from the current UTC time, truncated to seconds.
    pub fn now() -> Self {
        Self(truncate_to_seconds(Utc::now()))
    }

    /// Create a timestamp from a `chrono::DateTime<Utc>`, truncating sub-seconds.
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self(truncate_to_seconds(dt))
    }

    /// Parse a timestamp from an RFC 3339 / ISO8601 string.
    ///
    /// **Rejects non-UTC inputs.** Only timestamps with the `Z` suffix are
    /// accepted — even `+00:00`, which is semantically equivalent, is
    /// rejected so that canonical representations stay deterministic.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        if !s.ends_with('Z') {
            return Err(CoreError::InvalidTimestamp(format!(
                "timestamp must use Z suffix (UTC only), got: {s:?}"
            )));
        }
        let dt = DateTime::parse_from_rfc3339(s).map_err(|e| {
            CoreError::InvalidTimestamp(format!("invalid RFC 3339 timestamp {s:?}: {e}"))
        })?;
        Ok(Self(truncate_to_seconds(dt.with_timezone(&Utc))))
    }

    /// Create a timestamp from Unix epoch seconds.
    pub fn from_epoch_secs(secs: i64) -> Result<Self, CoreError> {
        let dt = DateTime::from_timestamp(secs, 0)
            .ok_or_else(|| CoreError::InvalidTimestamp(format!("invalid epoch seconds: {secs}")))?;
        Ok(Self(dt))
    }

    /// Returns the Unix epoch timestamp in seconds.
    pub fn epoch_secs(&self) -> i64 {
        self.0.timestamp()
    }

    /// Access the inner `DateTime<Utc>`.
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Render as ISO8601 with Z suffix (e.g., `2026-01-15T12:00:00Z`).
    pub fn to_iso8601(&self) -> String {
        self.0.format("%Y-%m-%dT%H:%M:%SZ").to_string()
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_iso8601())
    }
}

/// Truncate a `DateTime<Utc>` to seconds precision (discard nanoseconds).
fn truncate_to_seconds(dt: DateTime<Utc>) -> DateTime<Utc> {
    dt.with_nanosecond(0).unwrap_or(dt)
}

/// The production year of a carbon credit.
///
/// Bounded to a plausible range at construction; a credit minted with a
/// vintage outside it is a data-entry defect, not a ledger state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub struct Vintage(u16);

impl Vintage {
    /// Lowest accepted vintage year.
    pub const MIN_YEAR: u16 = 1990;
    /// Highest accepted vintage year.
    pub const MAX_YEAR: u16 = 2100;

    /// Construct a validated vintage year.
    pub fn new(year: u16) -> Result<Self, CoreError> {
        if !(Self::MIN_YEAR..=Self::MAX_YEAR).contains(&year) {
            return Err(CoreError::InvalidVintage {
                year,
                min: Self::MIN_YEAR,
                max: Self::MAX_YEAR,
            });
        }
        Ok(Self(year))
    }

    /// The year as a plain integer.
    pub fn year(&self) -> u16 {
        self.0
    }
}

impl TryFrom<u16> for Vintage {
    type Error = CoreError;

    fn try_from(year: u16) -> Result<Self, Self::Error> {
        Self::new(year)
    }
}

impl From<Vintage> for u16 {
    fn from(v: Vintage) -> u16 {
        v.0
    }
}

impl std::fmt::Display for Vintage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_now_has_no_subseconds() {
        let ts = Timestamp::now();
        assert_eq!(ts.as_datetime().nanosecond(), 0);
    }

    #[test]
    fn test_from_utc_truncates() {
        let dt = Utc.with_ymd_and_hms(2026, 1, 15, 12, 30, 45).unwrap();
        let dt_with_nanos = dt.with_nanosecond(123_456_789).unwrap();
        let ts = Timestamp::from_utc(dt_with_nanos);
        assert_eq!(ts.as_datetime().nanosecond(), 0);
        assert_eq!(ts.to_iso8601(), "2026-01-15T12:30:45Z");
    }

    #[test]
    fn test_parse_z_suffix_accepted() {
        let ts = Timestamp::parse("2026-01-15T12:00:00Z").unwrap();
        assert_eq!(ts.to_iso8601(), "2026-01-15T12:00:00Z");
    }

    #[test]
    fn test_parse_offsets_rejected() {
        assert!(Timestamp::parse("2026-01-15T12:00:00+00:00").is_err());
        assert!(Timestamp::parse("2026-01-15T17:00:00+05:00").is_err());
        assert!(Timestamp::parse("2026-01-15T08:00:00-04:00").is_err());
    }

    #[test]
    fn test_parse_invalid_format() {
        assert!(Timestamp::parse("not-a-date").is_err());
        assert!(Timestamp::parse("2026-01-15").is_err());
        assert!(Timestamp::parse("").is_err());
    }

    #[test]
    fn test_epoch_roundtrip() {
        let ts = Timestamp::parse("2026-01-15T12:00:00Z").unwrap();
        let secs = ts.epoch_secs();
        let ts2 = Timestamp::from_epoch_secs(secs).unwrap();
        assert_eq!(ts, ts2);
    }

    #[test]
    fn test_ordering() {
        let earlier = Timestamp::parse("2026-01-15T12:00:00Z").unwrap();
        let later = Timestamp::parse("2026-01-15T12:00:01Z").unwrap();
        assert!(earlier < later);
    }

    #[test]
    fn test_serde_roundtrip() {
        let ts = Timestamp::parse("2026-01-15T12:00:00Z").unwrap();
        let json = serde_json::to_string(&ts).unwrap();
        let parsed: Timestamp = serde_json::from_str(&json).unwrap();
        assert_eq!(ts, parsed);
    }

    // ---- Vintage ----

    #[test]
    fn test_vintage_accepts_plausible_years() {
        assert_eq!(Vintage::new(2024).unwrap().year(), 2024);
        assert_eq!(Vintage::new(Vintage::MIN_YEAR).unwrap().year(), 1990);
        assert_eq!(Vintage::new(Vintage::MAX_YEAR).unwrap().year(), 2100);
    }

    #[test]
    fn test_vintage_rejects_out_of_range() {
        assert!(Vintage::new(1989).is_err());
        assert!(Vintage::new(2101).is_err());
        assert!(Vintage::new(0).is_err());
    }

    #[test]
    fn test_vintage_serde_validates() {
        let v: Vintage = serde_json::from_str("2024").unwrap();
        assert_eq!(v.year(), 2024);
        let bad: Result<Vintage, _> = serde_json::from_str("1200");
        assert!(bad.is_err());
    }
}
