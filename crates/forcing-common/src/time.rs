//! Time handling: user-supplied dates, service date stamps and CF time units.
//!
//! Everything is UTC; no calendar other than the proleptic Gregorian one is
//! supported.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeDelta, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Compact stamp format used by the coverage service (e.g. `202403011200`).
pub const COMPACT_FORMAT: &str = "%Y%m%d%H%M";

/// Parse a date given on the command line or in a job file.
///
/// Accepts RFC 3339, `YYYY-mm-ddTHH:MM:SS`, `YYYY-mm-dd HH:MM[:SS]`,
/// `YYYY-mm-dd`, and the compact `YYYYmmddHHMM` / `YYYYmmddHH` / `YYYYmmdd`
/// forms.
pub fn parse_datetime(s: &str) -> Result<DateTime<Utc>, TimeParseError> {
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    for fmt in [
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
        COMPACT_FORMAT,
        "%Y%m%d%H%M%S",
    ] {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(Utc.from_utc_datetime(&ndt));
        }
    }

    if s.len() == 10 && s.chars().all(|c| c.is_ascii_digit()) {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(&format!("{}00", s), COMPACT_FORMAT) {
            return Ok(Utc.from_utc_datetime(&ndt));
        }
    }

    for fmt in ["%Y-%m-%d", "%Y%m%d"] {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            if let Some(ndt) = date.and_hms_opt(0, 0, 0) {
                return Ok(Utc.from_utc_datetime(&ndt));
            }
        }
    }

    Err(TimeParseError::InvalidFormat(s.to_string()))
}

/// Format a time as a compact service stamp.
pub fn format_compact(dt: &DateTime<Utc>) -> String {
    dt.format(COMPACT_FORMAT).to_string()
}

/// An inclusive time range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, TimeParseError> {
        if end < start {
            return Err(TimeParseError::ReversedRange {
                start: start.to_rfc3339(),
                end: end.to_rfc3339(),
            });
        }
        Ok(Self { start, end })
    }

    /// Parse two user-supplied dates into a range.
    pub fn parse(start: &str, end: &str) -> Result<Self, TimeParseError> {
        Self::new(parse_datetime(start)?, parse_datetime(end)?)
    }

    pub fn contains(&self, dt: &DateTime<Utc>) -> bool {
        dt >= &self.start && dt <= &self.end
    }
}

/// CF-convention time units, e.g. `"hours since 1970-01-01 00:00:00"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CfTimeUnits {
    /// Length of one unit in milliseconds
    pub unit_millis: i64,
    /// Reference instant
    pub epoch: DateTime<Utc>,
}

impl CfTimeUnits {
    pub fn parse(units: &str) -> Result<Self, TimeParseError> {
        let (unit, reference) = units
            .split_once(" since ")
            .ok_or_else(|| TimeParseError::InvalidUnits(units.to_string()))?;

        let unit_millis = match unit.trim().to_lowercase().as_str() {
            "milliseconds" | "millisecond" | "ms" => 1,
            "seconds" | "second" | "secs" | "sec" | "s" => 1_000,
            "minutes" | "minute" | "mins" | "min" => 60_000,
            "hours" | "hour" | "hrs" | "hr" | "h" => 3_600_000,
            "days" | "day" | "d" => 86_400_000,
            _ => return Err(TimeParseError::InvalidUnits(units.to_string())),
        };

        // Drop fractional seconds and a trailing "UTC"/"Z" before parsing.
        let reference = reference.trim().trim_end_matches("UTC").trim();
        let reference = match reference.split_once('.') {
            Some((head, _)) => head,
            None => reference,
        };
        let epoch = parse_datetime(reference)
            .or_else(|_| parse_datetime(reference.trim_end_matches('Z')))
            .map_err(|_| TimeParseError::InvalidUnits(units.to_string()))?;

        Ok(Self { unit_millis, epoch })
    }

    /// Convert a raw time value to an instant, rounded to the millisecond.
    ///
    /// Returns `None` for values that are not finite or land outside the
    /// representable range, such as the default NetCDF fill value.
    pub fn to_datetime(&self, value: f64) -> Option<DateTime<Utc>> {
        let millis = (value * self.unit_millis as f64).round();
        if !millis.is_finite() || millis.abs() >= i64::MAX as f64 {
            return None;
        }
        let delta = TimeDelta::try_milliseconds(millis as i64)?;
        self.epoch.checked_add_signed(delta)
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum TimeParseError {
    #[error("Invalid time format: {0}")]
    InvalidFormat(String),

    #[error("Invalid CF time units: {0}")]
    InvalidUnits(String),

    #[error("Time range ends ({end}) before it starts ({start})")]
    ReversedRange { start: String, end: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_parse_iso8601() {
        let dt = parse_datetime("2024-01-15T12:00:00Z").unwrap();
        assert_eq!(dt.year(), 2024);
        assert_eq!(dt.month(), 1);
        assert_eq!(dt.day(), 15);
        assert_eq!(dt.hour(), 12);
    }

    #[test]
    fn test_parse_compact_forms() {
        let expected = Utc.with_ymd_and_hms(2023, 10, 3, 6, 0, 0).unwrap();
        assert_eq!(parse_datetime("202310030600").unwrap(), expected);
        assert_eq!(parse_datetime("2023100306").unwrap(), expected);
        assert_eq!(parse_datetime("2023-10-03 06:00").unwrap(), expected);
        assert_eq!(
            parse_datetime("20231003").unwrap(),
            Utc.with_ymd_and_hms(2023, 10, 3, 0, 0, 0).unwrap()
        );
        assert!(parse_datetime("yesterday").is_err());
    }

    #[test]
    fn test_format_compact() {
        let dt = Utc.with_ymd_and_hms(2023, 10, 3, 6, 30, 0).unwrap();
        assert_eq!(format_compact(&dt), "202310030630");
    }

    #[test]
    fn test_time_range() {
        let range = TimeRange::parse("2024-01-01", "2024-01-02").unwrap();
        assert!(range.contains(&Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()));
        assert!(range.contains(&range.end));
        assert!(TimeRange::parse("2024-01-02", "2024-01-01").is_err());
    }

    #[test]
    fn test_cf_units() {
        let units = CfTimeUnits::parse("hours since 1970-01-01 00:00:00").unwrap();
        assert_eq!(
            units.to_datetime(24.0),
            Some(Utc.with_ymd_and_hms(1970, 1, 2, 0, 0, 0).unwrap())
        );

        let units = CfTimeUnits::parse("seconds since 2024-03-01T00:00:00Z").unwrap();
        assert_eq!(
            units.to_datetime(3600.0),
            Some(Utc.with_ymd_and_hms(2024, 3, 1, 1, 0, 0).unwrap())
        );

        let units = CfTimeUnits::parse("days since 2000-01-01 00:00:00.0").unwrap();
        assert_eq!(
            units.to_datetime(1.5),
            Some(Utc.with_ymd_and_hms(2000, 1, 2, 12, 0, 0).unwrap())
        );

        assert!(CfTimeUnits::parse("fortnights since 2000-01-01").is_err());
        assert!(CfTimeUnits::parse("hours").is_err());
    }

    #[test]
    fn test_cf_units_out_of_range_values() {
        let units = CfTimeUnits::parse("hours since 1970-01-01 00:00:00").unwrap();
        // NetCDF default fill for floats
        assert_eq!(units.to_datetime(9.969_209_968_386_869e36), None);
        assert_eq!(units.to_datetime(-9.969_209_968_386_869e36), None);
        assert_eq!(units.to_datetime(f64::NAN), None);
        assert_eq!(units.to_datetime(f64::INFINITY), None);
        // Fits in i64 milliseconds but not in a calendar date
        assert_eq!(units.to_datetime(1e12), None);
        assert!(units.to_datetime(-24.0).is_some());
    }
}
