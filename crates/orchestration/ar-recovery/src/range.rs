//! Inclusive calendar-day iteration.

use chrono::{NaiveDate, NaiveDateTime};

/// Every calendar day from `start` to `end`, inclusive, ascending.
///
/// Empty when `start > end`.
#[derive(Debug, Clone)]
pub struct DayRange {
    next: Option<NaiveDate>,
    end: NaiveDate,
}

impl DayRange {
    /// Days between two dates, inclusive.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            next: (start <= end).then_some(start),
            end,
        }
    }

    /// Days covered by a timestamp window, each bound truncated to its date.
    pub fn covering(min: NaiveDateTime, max: NaiveDateTime) -> Self {
        Self::new(min.date(), max.date())
    }
}

impl Iterator for DayRange {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<NaiveDate> {
        let current = self.next?;
        self.next = current.succ_opt().filter(|next| *next <= self.end);
        Some(current)
    }
}
