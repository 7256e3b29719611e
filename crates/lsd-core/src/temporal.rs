//! # Temporal Types — Normalized UTC Instants
//!
//! LSD servers publish timestamps either in UTC with a `Z` suffix or as
//! local wall-clock time with an explicit numeric offset. Every temporal
//! invariant the client checks (monotonic `updated` clocks, renewed
//! `rights.end`) compares instants, never raw strings, so both shapes are
//! normalized into a single [`Timestamp`] in UTC.
//!
//! ## Accepted Shapes
//!
//! ```text
//! YYYY-MM-DDTHH:MM:SSZ
//! YYYY-MM-DDTHH:MM:SS+HH:MM
//! YYYY-MM-DDTHH:MM:SS-HH:MM
//! ```
//!
//! Fractional seconds, offsets without a colon, hour-only offsets and
//! date-only strings are rejected. The protocol clock has one-second
//! granularity, so nothing finer is ever kept.

use chrono::{DateTime, FixedOffset, NaiveDateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TimestampError;

/// Length of the `YYYY-MM-DDTHH:MM:SS` prefix shared by both shapes.
const LOCAL_PART_LEN: usize = 19;

/// Length of a `±HH:MM` offset suffix.
const OFFSET_LEN: usize = 6;

const LOCAL_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// A UTC instant with seconds precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Parse and normalize an ISO-8601 timestamp to UTC.
    ///
    /// A positive offset is subtracted from the local wall-clock time and a
    /// negative offset is added, so `2016-07-01T12:00:00+02:00` and
    /// `2016-07-01T10:00:00Z` are the same instant.
    ///
    /// # Errors
    ///
    /// Returns [`TimestampError::InvalidTimestamp`] for any other shape,
    /// including partial or missing offsets.
    pub fn parse(s: &str) -> Result<Self, TimestampError> {
        let invalid = |reason: &str| TimestampError::InvalidTimestamp {
            input: s.to_string(),
            reason: reason.to_string(),
        };

        if !s.is_ascii() || s.len() <= LOCAL_PART_LEN {
            return Err(invalid("expected YYYY-MM-DDTHH:MM:SS followed by Z or ±HH:MM"));
        }
        let (local, suffix) = s.split_at(LOCAL_PART_LEN);

        if suffix == "Z" {
            let naive = NaiveDateTime::parse_from_str(local, LOCAL_FORMAT)
                .map_err(|e| invalid(&e.to_string()))?;
            return Ok(Self(naive.and_utc()));
        }

        if !is_numeric_offset(suffix) {
            return Err(invalid("offset must be Z or ±HH:MM"));
        }
        let dt: DateTime<FixedOffset> =
            DateTime::parse_from_str(s, &format!("{LOCAL_FORMAT}%:z"))
                .map_err(|e| invalid(&e.to_string()))?;
        Ok(Self(dt.with_timezone(&Utc)))
    }

    /// Current UTC time, truncated to seconds.
    pub fn now() -> Self {
        Self::from_utc(Utc::now())
    }

    /// Wrap a `DateTime<Utc>`, discarding sub-second components.
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self(dt.with_nanosecond(0).unwrap_or(dt))
    }

    /// Access the inner `DateTime<Utc>`.
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Whether `self` is strictly later than `earlier`.
    ///
    /// Equal instants do not count as an increase: the LSD clocks must
    /// advance on every mutation.
    pub fn strictly_after(&self, earlier: &Timestamp) -> bool {
        self.0 > earlier.0
    }

    /// Render in the canonical `YYYY-MM-DDTHH:MM:SSZ` form.
    pub fn to_iso8601(&self) -> String {
        self.0.format("%Y-%m-%dT%H:%M:%SZ").to_string()
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_iso8601())
    }
}

impl std::str::FromStr for Timestamp {
    type Err = TimestampError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// `±HH:MM`, digits only.
fn is_numeric_offset(suffix: &str) -> bool {
    let b = suffix.as_bytes();
    b.len() == OFFSET_LEN
        && (b[0] == b'+' || b[0] == b'-')
        && b[1].is_ascii_digit()
        && b[2].is_ascii_digit()
        && b[3] == b':'
        && b[4].is_ascii_digit()
        && b[5].is_ascii_digit()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    #[test]
    fn test_parse_z_suffix() {
        let ts = Timestamp::parse("2016-07-11T14:53:40Z").unwrap();
        assert_eq!(
            *ts.as_datetime(),
            Utc.with_ymd_and_hms(2016, 7, 11, 14, 53, 40).unwrap()
        );
    }

    #[test]
    fn test_positive_offset_is_subtracted() {
        let ts = Timestamp::parse("2016-07-11T14:53:40+02:00").unwrap();
        assert_eq!(ts.to_iso8601(), "2016-07-11T12:53:40Z");
    }

    #[test]
    fn test_negative_offset_is_added() {
        let ts = Timestamp::parse("2016-07-11T22:30:00-04:30").unwrap();
        assert_eq!(ts.to_iso8601(), "2016-07-12T03:00:00Z");
    }

    #[test]
    fn test_zero_offset_equals_z() {
        let a = Timestamp::parse("2020-01-01T00:00:00+00:00").unwrap();
        let b = Timestamp::parse("2020-01-01T00:00:00Z").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_offset_crosses_year_boundary() {
        let ts = Timestamp::parse("2021-01-01T01:00:00+09:00").unwrap();
        assert_eq!(ts.to_iso8601(), "2020-12-31T16:00:00Z");
    }

    #[test]
    fn test_rejects_other_shapes() {
        for bad in [
            "",
            "not-a-date",
            "2016-07-11",
            "2016-07-11T14:53:40",
            "2016-07-11T14:53:40.123Z",
            "2016-07-11T14:53:40+02",
            "2016-07-11T14:53:40+0200",
            "2016-07-11T14:53:40+02:0",
            "2016-07-11T14:53:40 +02:00",
            "2016-07-11T14:53:40z",
            "2016-13-11T14:53:40Z",
            "2016-07-11T25:53:40Z",
            "2016-07-11T14:53:40+ab:cd",
        ] {
            assert!(Timestamp::parse(bad).is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn test_error_carries_input() {
        let err = Timestamp::parse("2016-07-11").unwrap_err();
        let TimestampError::InvalidTimestamp { input, .. } = err;
        assert_eq!(input, "2016-07-11");
    }

    #[test]
    fn test_strictly_after() {
        let t1 = Timestamp::parse("2020-01-01T00:00:00Z").unwrap();
        let t2 = Timestamp::parse("2020-01-01T00:00:01Z").unwrap();
        assert!(t2.strictly_after(&t1));
        assert!(!t1.strictly_after(&t2));
        assert!(!t1.strictly_after(&t1));
    }

    #[test]
    fn test_now_has_no_subseconds() {
        assert_eq!(Timestamp::now().as_datetime().nanosecond(), 0);
    }

    #[test]
    fn test_from_str() {
        let ts: Timestamp = "2020-01-01T00:00:00Z".parse().unwrap();
        assert_eq!(ts.to_string(), "2020-01-01T00:00:00Z");
    }

    fn any_instant() -> impl Strategy<Value = DateTime<Utc>> {
        // 1970..2100
        (0i64..4_102_444_800).prop_map(|secs| DateTime::from_timestamp(secs, 0).unwrap())
    }

    fn any_offset_minutes() -> impl Strategy<Value = i32> {
        -(23 * 60 + 59)..=(23 * 60 + 59)
    }

    proptest! {
        /// Normalizing, rendering with Z, and normalizing again is a fixed point.
        #[test]
        fn normalization_is_idempotent(instant in any_instant(), offset in any_offset_minutes()) {
            let tz = FixedOffset::east_opt(offset * 60).unwrap();
            let local = instant.with_timezone(&tz).format("%Y-%m-%dT%H:%M:%S%:z").to_string();
            let once = Timestamp::parse(&local).unwrap();
            let twice = Timestamp::parse(&once.to_iso8601()).unwrap();
            prop_assert_eq!(once, twice);
            prop_assert_eq!(*once.as_datetime(), instant);
        }

        /// Strict increase is a strict order on normalized instants.
        #[test]
        fn strictly_after_is_strict(a in any_instant(), b in any_instant()) {
            prop_assume!(a < b);
            let t1 = Timestamp::from_utc(a);
            let t2 = Timestamp::from_utc(b);
            prop_assert!(t2.strictly_after(&t1));
            prop_assert!(!t1.strictly_after(&t2));
            prop_assert!(!t1.strictly_after(&t1));
        }
    }
}
