//! Calendar helpers. "Local" always means the widget's configured fixed UTC offset.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Offset as _, Utc};

use crate::foundation::core::TimeMs;
use crate::foundation::error::{ScopeError, ScopeResult};

const DAY_MS: i64 = 24 * 60 * 60 * 1000;

/// Fixed offset from UTC used for midnight alignment and labels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LocalZone {
    offset: FixedOffset,
}

impl Default for LocalZone {
    fn default() -> Self {
        Self::utc()
    }
}

impl LocalZone {
    pub fn utc() -> Self {
        Self {
            offset: Utc.fix(),
        }
    }

    pub fn from_offset_minutes(minutes: i32) -> ScopeResult<Self> {
        let offset = minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| {
                ScopeError::configuration(format!("utc offset of {minutes} minutes is out of range"))
            })?;
        Ok(Self { offset })
    }

    fn datetime(&self, t: TimeMs) -> ScopeResult<DateTime<FixedOffset>> {
        DateTime::from_timestamp_millis(t.0)
            .map(|utc| utc.with_timezone(&self.offset))
            .ok_or_else(|| ScopeError::data(format!("timestamp {} is out of range", t.0)))
    }

    /// Latest local midnight at or before `t`.
    pub fn midnight_at_or_before(&self, t: TimeMs) -> ScopeResult<TimeMs> {
        let date = self.datetime(t)?.date_naive();
        self.midnight_of(date)
    }

    /// Local midnight that starts `date`.
    pub fn midnight_of(&self, date: NaiveDate) -> ScopeResult<TimeMs> {
        let naive: NaiveDateTime = date
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| ScopeError::data(format!("no midnight for {date}")))?;
        let local = naive
            .and_local_timezone(self.offset)
            .single()
            .ok_or_else(|| ScopeError::data(format!("ambiguous midnight for {date}")))?;
        Ok(TimeMs(local.timestamp_millis()))
    }

    /// Label for a period start: the date alone when the period is a whole number of days,
    /// otherwise date and time.
    pub fn period_label(&self, t: TimeMs, period_ms: i64) -> String {
        let Ok(dt) = self.datetime(t) else {
            return t.0.to_string();
        };
        if period_ms >= DAY_MS && period_ms % DAY_MS == 0 {
            dt.format("%Y-%m-%d").to_string()
        } else {
            dt.format("%Y-%m-%d %H:%M:%S").to_string()
        }
    }

    /// Parse an RFC 3339 timestamp, or a bare `YYYY-MM-DD` date as local midnight.
    pub fn parse(&self, s: &str) -> ScopeResult<TimeMs> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return self.check(TimeMs(dt.timestamp_millis()));
        }
        self.midnight_of(parse_date(s)?)
    }

    /// `t` unchanged when it has a calendar date, otherwise a data error.
    pub fn check(&self, t: TimeMs) -> ScopeResult<TimeMs> {
        self.datetime(t).map(|_| t)
    }
}

/// [`LocalZone::parse`] in UTC.
pub fn parse_timestamp(s: &str) -> ScopeResult<TimeMs> {
    LocalZone::utc().parse(s)
}

pub(crate) fn parse_date(s: &str) -> ScopeResult<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|e| ScopeError::data(format!("invalid timestamp '{s}': {e}")))
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/time.rs"]
mod tests;
