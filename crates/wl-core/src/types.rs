//! Core type definitions for workledger

use chrono::{Local, NaiveDate, NaiveDateTime, SubsecRound};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Timestamp format used on disk and in listings
pub const DATETIME_FORMAT: &str = "%d/%m/%Y %H:%M:%S";

/// Calendar date format used for date keys
pub const DATE_FORMAT: &str = "%d/%m/%Y";

/// Wall-clock format used in session ranges
pub const TIME_FORMAT: &str = "%H:%M:%S";

/// Current local time truncated to whole seconds.
///
/// The on-disk format carries no sub-second part, so anything stamped
/// with this survives a save/load cycle unchanged.
pub fn now() -> NaiveDateTime {
    Local::now().naive_local().trunc_subsecs(0)
}

/// Format a timestamp as `DD/MM/YYYY HH:MM:SS`
pub fn format_timestamp(ts: &NaiveDateTime) -> String {
    ts.format(DATETIME_FORMAT).to_string()
}

/// Parse a strict `DD/MM/YYYY HH:MM:SS` timestamp
pub fn parse_timestamp(s: &str) -> Result<NaiveDateTime, chrono::ParseError> {
    NaiveDateTime::parse_from_str(s.trim(), DATETIME_FORMAT)
}

/// Parse a timestamp typed on the command line.
///
/// Arguments are split on whitespace, so `DD/MM/YYYY-HH:MM:SS` is accepted
/// in addition to the canonical form.
pub fn parse_user_timestamp(s: &str) -> Result<NaiveDateTime, chrono::ParseError> {
    parse_timestamp(&s.trim().replacen('-', " ", 1))
}

/// Calendar-day key grouping sessions, rendered as `DD/MM/YYYY`.
///
/// Keys order chronologically, not lexically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DateKey(pub NaiveDate);

impl DateKey {
    /// Key for the calendar day of a timestamp
    pub fn of(ts: &NaiveDateTime) -> Self {
        DateKey(ts.date())
    }

    /// Underlying date
    pub fn date(&self) -> NaiveDate {
        self.0
    }
}

impl fmt::Display for DateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(DATE_FORMAT))
    }
}

impl FromStr for DateKey {
    type Err = chrono::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveDate::parse_from_str(s.trim(), DATE_FORMAT).map(DateKey)
    }
}

impl Serialize for DateKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DateKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse()
            .map_err(|e| serde::de::Error::custom(format!("invalid date key '{}': {}", s, e)))
    }
}
