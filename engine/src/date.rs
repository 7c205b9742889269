//! Allocation dates.
//!
//! Dates arrive as ISO-8601 strings in one of three shapes and are always
//! normalized to UTC before they are stored or compared:
//!
//! - RFC 3339 with an offset: `2030-05-01T09:30:00+02:00`
//! - a naive date-time, assumed UTC: `2030-05-01T09:30:00` (or with a space)
//! - a bare date, assumed midnight UTC: `2030-05-01`
//!
//! Stored dates are rendered as RFC 3339 with a `Z` suffix, so two equal
//! instants always produce the same string in the document store.

use crate::{error::Result, Error};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// A timezone-normalized allocation instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AllocationDate(DateTime<Utc>);

impl AllocationDate {
    /// Parse an ISO-8601 date or date-time, assuming UTC when no offset is given.
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();

        if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
            return Ok(Self(dt.with_timezone(&Utc)));
        }

        for format in NAIVE_FORMATS {
            if let Ok(naive) = NaiveDateTime::parse_from_str(input, format) {
                return Ok(Self(naive.and_utc()));
            }
        }

        if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
            return Ok(Self(date.and_time(NaiveTime::MIN).and_utc()));
        }

        Err(Error::InvalidDate(format!(
            "'{input}' is not an ISO-8601 date or date-time"
        )))
    }

    pub fn as_datetime(&self) -> DateTime<Utc> {
        self.0
    }

    pub fn date_naive(&self) -> NaiveDate {
        self.0.date_naive()
    }

    /// Canonical string form used for storage and equality filters.
    pub fn to_canonical(&self) -> String {
        self.0.to_rfc3339_opts(SecondsFormat::AutoSi, true)
    }
}

impl From<DateTime<Utc>> for AllocationDate {
    fn from(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }
}

impl FromStr for AllocationDate {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for AllocationDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_canonical())
    }
}

impl Serialize for AllocationDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for AllocationDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// How precisely two allocation dates must match to count as a double-booking.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateGranularity {
    /// Full instant comparison.
    #[default]
    Timestamp,
    /// Time of day is dropped: one allocation per vehicle per calendar day (UTC).
    Day,
}

impl DateGranularity {
    /// Reduce a date to the precision this granularity compares at.
    pub fn normalize(&self, date: AllocationDate) -> AllocationDate {
        match self {
            DateGranularity::Timestamp => date,
            DateGranularity::Day => {
                AllocationDate(date.date_naive().and_time(NaiveTime::MIN).and_utc())
            }
        }
    }

    /// Whether `date` lies strictly after `now`.
    pub fn is_future(&self, date: AllocationDate, now: DateTime<Utc>) -> bool {
        match self {
            DateGranularity::Timestamp => date.as_datetime() > now,
            DateGranularity::Day => date.date_naive() > now.date_naive(),
        }
    }

    /// Whether `date` lies strictly before `now`.
    pub fn is_past(&self, date: AllocationDate, now: DateTime<Utc>) -> bool {
        match self {
            DateGranularity::Timestamp => date.as_datetime() < now,
            DateGranularity::Day => date.date_naive() < now.date_naive(),
        }
    }
}

impl FromStr for DateGranularity {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "timestamp" => Ok(DateGranularity::Timestamp),
            "day" => Ok(DateGranularity::Day),
            other => Err(format!("unknown date granularity: {other}")),
        }
    }
}
