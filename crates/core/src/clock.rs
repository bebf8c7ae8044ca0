use chrono::{Local, NaiveDate};
use serde::Serialize;
use std::fmt;
use std::sync::Mutex;

/// Source of the current calendar day.
pub trait Clock: Send + Sync + fmt::Debug {
    fn today(&self) -> NaiveDate;
}

/// Wall-clock day in the local timezone.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalClock;

impl Clock for LocalClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// A clock that only moves when told to. Used for replaying history and in
/// tests that span several days.
#[derive(Debug)]
pub struct ManualClock {
    day: Mutex<NaiveDate>,
}

impl ManualClock {
    pub fn new(day: NaiveDate) -> Self {
        Self { day: Mutex::new(day) }
    }

    pub fn set(&self, day: NaiveDate) {
        *self.day.lock().unwrap_or_else(|e| e.into_inner()) = day;
    }

    /// Move forward by `days` calendar days.
    pub fn advance(&self, days: u64) {
        let mut day = self.day.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(next) = day.checked_add_days(chrono::Days::new(days)) {
            *day = next;
        }
    }
}

impl Clock for ManualClock {
    fn today(&self) -> NaiveDate {
        *self.day.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Calendar-day key in `YYYYMMDD` form. Lexical order is chronological.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct DateKey(String);

impl DateKey {
    pub fn from_date(date: NaiveDate) -> Self {
        Self(date.format("%Y%m%d").to_string())
    }

    /// Parse an 8-digit calendar date such as `"20240131"`.
    pub fn parse(raw: &str) -> Option<Self> {
        if raw.len() != 8 || !raw.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        NaiveDate::parse_from_str(raw, "%Y%m%d").ok()?;
        Some(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<NaiveDate> for DateKey {
    fn from(date: NaiveDate) -> Self {
        Self::from_date(date)
    }
}
