use std::fmt;

use chrono::{
    DateTime, Datelike, Days, Months as CalendarMonths, NaiveDate, NaiveDateTime, NaiveTime,
    TimeZone,
};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::domain::{Displayable, Timestamp};
use crate::errors::{LedgerError, Result};

/// Recurrence period of a template. Stored as its numeric code 0..=5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Period {
    Daily,
    Weekly,
    Monthly,
    Quarterly,
    HalfYearly,
    Yearly,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown period code {0}")]
pub struct UnknownPeriod(pub u8);

impl Period {
    pub const ALL: [Period; 6] = [
        Period::Daily,
        Period::Weekly,
        Period::Monthly,
        Period::Quarterly,
        Period::HalfYearly,
        Period::Yearly,
    ];

    pub fn code(self) -> u8 {
        match self {
            Period::Daily => 0,
            Period::Weekly => 1,
            Period::Monthly => 2,
            Period::Quarterly => 3,
            Period::HalfYearly => 4,
            Period::Yearly => 5,
        }
    }

    fn step(self) -> Step {
        match self {
            Period::Daily => Step::Days(1),
            Period::Weekly => Step::Days(7),
            Period::Monthly => Step::Months(1),
            Period::Quarterly => Step::Months(3),
            Period::HalfYearly => Step::Months(6),
            Period::Yearly => Step::Months(12),
        }
    }
}

enum Step {
    Days(u64),
    Months(u32),
}

impl TryFrom<u8> for Period {
    type Error = UnknownPeriod;

    fn try_from(code: u8) -> std::result::Result<Self, Self::Error> {
        Period::ALL
            .iter()
            .copied()
            .find(|period| period.code() == code)
            .ok_or(UnknownPeriod(code))
    }
}

impl From<Period> for u8 {
    fn from(period: Period) -> Self {
        period.code()
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_label())
    }
}

impl Displayable for Period {
    fn display_label(&self) -> String {
        match self {
            Period::Daily => "Daily",
            Period::Weekly => "Weekly",
            Period::Monthly => "Monthly",
            Period::Quarterly => "Quarterly",
            Period::HalfYearly => "Half-yearly",
            Period::Yearly => "Yearly",
        }
        .into()
    }
}

/// Calendar arithmetic on epoch-millisecond timestamps, evaluated in the
/// household's local time zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Calendar {
    tz: Tz,
}

impl Default for Calendar {
    fn default() -> Self {
        Self::new(Tz::UTC)
    }
}

impl Calendar {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    pub fn time_zone(&self) -> Tz {
        self.tz
    }

    /// Adds one unit of `period`. Month-based periods keep the day of month,
    /// clamped to the last day of shorter months.
    pub fn advance(&self, timestamp: Timestamp, period: Period) -> Result<Timestamp> {
        let local = self.local(timestamp)?.naive_local();
        let next = match period.step() {
            Step::Days(days) => local.checked_add_days(Days::new(days)),
            Step::Months(months) => local.checked_add_months(CalendarMonths::new(months)),
        }
        .ok_or(LedgerError::InvalidTimestamp(timestamp))?;
        self.from_local(next)
            .ok_or(LedgerError::InvalidTimestamp(timestamp))
    }

    /// Local first-of-month 00:00 of the month containing `timestamp`.
    pub fn start_of_month(&self, timestamp: Timestamp) -> Result<Timestamp> {
        let date = self.local(timestamp)?.date_naive();
        let first = date
            .with_day(1)
            .ok_or(LedgerError::InvalidTimestamp(timestamp))?;
        self.from_local(first.and_time(NaiveTime::MIN))
            .ok_or(LedgerError::InvalidTimestamp(timestamp))
    }

    /// Local 00:00 of the day containing `timestamp`.
    pub fn start_of_day(&self, timestamp: Timestamp) -> Result<Timestamp> {
        let date = self.local(timestamp)?.date_naive();
        self.from_local(date.and_time(NaiveTime::MIN))
            .ok_or(LedgerError::InvalidTimestamp(timestamp))
    }

    pub fn year_of(&self, timestamp: Timestamp) -> Result<i32> {
        Ok(self.local(timestamp)?.year())
    }

    /// Timestamp of local midnight on `date`.
    pub fn at_midnight(&self, date: NaiveDate) -> Option<Timestamp> {
        self.from_local(date.and_time(NaiveTime::MIN))
    }

    pub fn local(&self, timestamp: Timestamp) -> Result<DateTime<Tz>> {
        self.tz
            .timestamp_millis_opt(timestamp.millis())
            .single()
            .ok_or(LedgerError::InvalidTimestamp(timestamp))
    }

    fn from_local(&self, naive: NaiveDateTime) -> Option<Timestamp> {
        let resolved = self.tz.from_local_datetime(&naive).earliest().or_else(|| {
            // Wall-clock time skipped by a DST jump; take the first instant after it.
            let shifted = naive.checked_add_signed(chrono::Duration::hours(1))?;
            self.tz.from_local_datetime(&shifted).earliest()
        })?;
        Some(Timestamp(resolved.timestamp_millis()))
    }
}
