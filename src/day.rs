//! Calendar day used as aggregate bound and point timestamp.
//!
//! A [`Day`] is always midnight-aligned in UTC. The same instant is used as the
//! `date_created <= ?` bound for aggregate queries and as the point timestamp,
//! so a point stamped at midnight describes the store state at that instant.

use std::fmt;

use chrono::{Days, NaiveDate, NaiveDateTime, NaiveTime, Utc};

/// Compact CLI date format (`20181025`).
pub const COMPACT_FORMAT: &str = "%Y%m%d";

const NANOS_PER_SECOND: i64 = 1_000_000_000;

/// A calendar date normalized to UTC midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Day(NaiveDate);

impl Day {
    /// Build from year/month/day, `None` if the date does not exist.
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    /// The current UTC date.
    pub fn today() -> Self {
        Self(Utc::now().date_naive())
    }

    /// Parse a `YYYYMMDD` date.
    pub fn parse_compact(s: &str) -> Result<Self, chrono::ParseError> {
        NaiveDate::parse_from_str(s.trim(), COMPACT_FORMAT).map(Self)
    }

    /// The underlying calendar date.
    pub fn date(&self) -> NaiveDate {
        self.0
    }

    /// Midnight of this day, used as the inclusive `date_created` bound.
    pub fn as_of(&self) -> NaiveDateTime {
        self.0.and_time(NaiveTime::MIN)
    }

    /// Nanoseconds since the Unix epoch at UTC midnight.
    pub fn timestamp_nanos(&self) -> i64 {
        self.as_of().and_utc().timestamp() * NANOS_PER_SECOND
    }

    /// The following calendar day, `None` past chrono's supported range.
    pub fn succ(&self) -> Option<Self> {
        self.0.checked_add_days(Days::new(1)).map(Self)
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}
