//! Absolute instants and whole-minute durations.
//!
//! [`Timestamp`] plays the role `chronologic`'s `Timestamp`/`TimeValue`
//! pair plays, wrapping [`chrono::DateTime<Utc>`] instead of a
//! sub-nanosecond tick count: this domain's precision is whole minutes
//! (`spec.md` §3), so the teacher's tick-packing buys nothing here and is
//! dropped in favour of a direct `chrono` wrapper.

use std::fmt;
use std::ops::{Add, Sub};
use std::str::FromStr;

use chrono::{DateTime, Datelike, Duration, ParseError, Timelike, Utc};

/// An absolute instant, always UTC (`spec.md` §3: "All timestamps are
/// absolute instants in UTC").
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(into = "String", try_from = "String"))]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    #[inline]
    pub fn new(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    #[inline]
    pub fn now() -> Self {
        Self(Utc::now())
    }

    #[inline]
    pub fn to_datetime(&self) -> DateTime<Utc> {
        self.0
    }

    /// Day of week in `1..=7`, `1` = Monday (`spec.md` §3).
    #[inline]
    pub fn iso_weekday(&self) -> u8 {
        self.0.weekday().number_from_monday() as u8
    }

    /// Minutes elapsed since local (UTC) midnight: `hour * 60 + minute`.
    #[inline]
    pub fn minute_of_day(&self) -> u32 {
        self.0.hour() * 60 + self.0.minute()
    }

    #[inline]
    pub fn checked_add_minutes(&self, minutes: i64) -> Option<Timestamp> {
        self.0.checked_add_signed(Duration::minutes(minutes)).map(Timestamp)
    }

    /// `self - other`, in whole minutes (truncated towards zero).
    #[inline]
    pub fn diff_minutes(&self, other: &Timestamp) -> i64 {
        (self.0 - other.0).num_minutes()
    }

    #[inline]
    pub fn to_rfc3339(&self) -> String {
        self.0.to_rfc3339()
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

impl FromStr for Timestamp {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DateTime::parse_from_rfc3339(s).map(|dt| Timestamp(dt.with_timezone(&Utc)))
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }
}

impl From<Timestamp> for DateTime<Utc> {
    fn from(t: Timestamp) -> Self {
        t.0
    }
}

impl From<Timestamp> for String {
    fn from(t: Timestamp) -> Self {
        t.to_rfc3339()
    }
}

impl TryFrom<String> for Timestamp {
    type Error = ParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl Add<Minutes> for Timestamp {
    type Output = Timestamp;

    fn add(self, rhs: Minutes) -> Timestamp {
        self.checked_add_minutes(rhs.as_i64()).expect("timestamp overflow")
    }
}

impl Sub<Minutes> for Timestamp {
    type Output = Timestamp;

    fn sub(self, rhs: Minutes) -> Timestamp {
        self.checked_add_minutes(-rhs.as_i64()).expect("timestamp underflow")
    }
}

/// A whole-minute duration (`spec.md` §3: "duration (whole minutes, > 0)").
///
/// The domain equivalent of the teacher's `TimeValue`, simplified to the
/// precision this spec needs.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Minutes(pub u32);

impl Minutes {
    #[inline]
    pub fn as_i64(&self) -> i64 {
        self.0 as i64
    }
}

impl fmt::Display for Minutes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}min", self.0)
    }
}

impl From<u32> for Minutes {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_minutes_matches_naive_addition() {
        let s: Timestamp = "2024-01-15T08:00:00Z".parse().unwrap();
        let e = s + Minutes(240);
        assert_eq!(e, "2024-01-15T12:00:00Z".parse().unwrap());
    }

    #[test]
    fn iso_weekday_monday_is_one() {
        let monday: Timestamp = "2024-01-15T08:00:00Z".parse().unwrap();
        assert_eq!(monday.iso_weekday(), 1);
    }

    #[test]
    fn diff_minutes_roundtrip() {
        let a: Timestamp = "2024-01-15T08:00:00Z".parse().unwrap();
        let b: Timestamp = "2024-01-15T12:00:00Z".parse().unwrap();
        assert_eq!(b.diff_minutes(&a), 240);
    }

    #[test]
    fn minute_of_day_at_midnight() {
        let t: Timestamp = "2024-01-15T00:00:00Z".parse().unwrap();
        assert_eq!(t.minute_of_day(), 0);
    }
}
