use chrono::{NaiveDate, NaiveDateTime};
use std::fmt;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RangeError {
    #[error("end date {end} is before start date {start}")]
    EndBeforeStart { start: NaiveDate, end: NaiveDate },
}

/// Inclusive report window. The window covers the start date from midnight
/// through the last second of the end date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl ReportRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, RangeError> {
        if end < start {
            return Err(RangeError::EndBeforeStart { start, end });
        }
        Ok(ReportRange { start, end })
    }

    /// Start date; doubles as the fallback timestamp for records without one.
    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Last instant covered by the window (23:59:59 on the end date).
    pub fn end_instant(&self) -> NaiveDateTime {
        self.end.and_hms_opt(23, 59, 59).unwrap()
    }
}

impl fmt::Display for ReportRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}
