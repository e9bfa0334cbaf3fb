//! Archive key derivation.

use chrono::{Datelike, NaiveDate};
use std::fmt;

/// English three-letter month abbreviations, January first.
pub const MONTH_ABBREVIATIONS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Three-letter abbreviation for a date's month.
pub fn month_abbreviation(date: NaiveDate) -> &'static str {
    MONTH_ABBREVIATIONS[date.month0() as usize]
}

/// Key of one day's archive inside the bucket.
///
/// Layout: `{YYYY}/{Mon}/ossec-archive-{DD}.json.gz`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectKey(String);

impl ObjectKey {
    /// Derive the key for `date`.
    ///
    /// ```
    /// use ar_recovery::ObjectKey;
    /// use chrono::NaiveDate;
    ///
    /// let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    /// assert_eq!(ObjectKey::for_date(date).as_str(), "2024/Jan/ossec-archive-01.json.gz");
    /// ```
    pub fn for_date(date: NaiveDate) -> Self {
        Self(format!(
            "{}/{}/ossec-archive-{:02}.json.gz",
            date.year(),
            month_abbreviation(date),
            date.day()
        ))
    }

    /// The key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `s3://{bucket}/{key}`, for log lines.
    pub fn uri(&self, bucket: &str) -> String {
        format!("s3://{}/{}", bucket, self.0)
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ObjectKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
