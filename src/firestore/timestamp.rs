//! Firestore Timestamp type
//!
//! Built from the `created` / `updated` strings PocketBase stores on every
//! record. Precision is whole seconds: `nanoseconds` is always 0, while
//! [`Timestamp::to_date`] still returns the full parsed instant.

use crate::error::FirestoreError;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;

/// Layout PocketBase uses for its date fields, e.g. `2024-05-01 12:30:45.123Z`
const POCKETBASE_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Firestore timestamp
///
/// Serializes as `{"seconds": .., "nanoseconds": 0}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Timestamp {
    seconds: i64,
    nanoseconds: i32,
    #[serde(skip)]
    date: DateTime<Utc>,
}

impl Timestamp {
    /// Timestamp of `date`, truncated to the second (floor)
    pub fn from_date(date: DateTime<Utc>) -> Self {
        Self {
            seconds: date.timestamp_millis().div_euclid(1000),
            nanoseconds: 0,
            date,
        }
    }

    /// Get current timestamp
    pub fn now() -> Self {
        Self::from_date(Utc::now())
    }

    /// Parse a PocketBase date string or an RFC 3339 date
    pub fn parse(raw: &str) -> Result<Self, FirestoreError> {
        if let Ok(date) = DateTime::parse_from_rfc3339(raw) {
            return Ok(Self::from_date(date.with_timezone(&Utc)));
        }

        let naive = raw.trim().trim_end_matches('Z');
        NaiveDateTime::parse_from_str(naive, POCKETBASE_DATE_FORMAT)
            .map(|date| Self::from_date(date.and_utc()))
            .map_err(|e| FirestoreError::InvalidArgument(format!("unparseable date {:?}: {}", raw, e)))
    }

    /// Seconds since Unix epoch
    pub fn seconds(&self) -> i64 {
        self.seconds
    }

    /// Always 0
    pub fn nanoseconds(&self) -> i32 {
        self.nanoseconds
    }

    /// The instant this timestamp was built from
    pub fn to_date(&self) -> DateTime<Utc> {
        self.date
    }

    /// Milliseconds since Unix epoch of [`Timestamp::to_date`]
    pub fn to_millis(&self) -> i64 {
        self.date.timestamp_millis()
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(date: DateTime<Utc>) -> Self {
        Self::from_date(date)
    }
}
