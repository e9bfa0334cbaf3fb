//! Record timestamp handling.

use crate::config::TIMESTAMP_FORMAT;
use ar_error::RecordError;
use chrono::NaiveDateTime;

/// Characters of the timestamp compared against the window.
pub const WINDOW_PREFIX_LEN: usize = 19;

/// Target length of the part before the first `+`.
pub const PADDED_HEAD_LEN: usize = 23;

/// Character position where padding zeros are inserted.
pub const PAD_POSITION: usize = 20;

/// Parse the first 19 characters (`YYYY-MM-DDTHH:MM:SS`) of a timestamp.
pub fn window_prefix(timestamp: &str) -> Result<NaiveDateTime, RecordError> {
    let prefix: String = timestamp.chars().take(WINDOW_PREFIX_LEN).collect();
    NaiveDateTime::parse_from_str(&prefix, TIMESTAMP_FORMAT)
        .map_err(|e| RecordError::Timestamp(format!("'{timestamp}': {e}")))
}

/// Widen the fractional-seconds part of a timestamp.
///
/// While the part before the first `+` is shorter than 23 characters, a `0`
/// is inserted at character position 20 (right after the decimal point):
/// `2024-01-01T12:00:00.1+00:00` becomes `2024-01-01T12:00:00.001+00:00`.
/// Strings without `+` are measured whole.
///
/// When the first `+` sits before position 20 an insertion would land after
/// it and never lengthen the measured part; the value is returned unchanged.
pub fn pad_fraction(timestamp: &str) -> String {
    let mut chars: Vec<char> = timestamp.chars().collect();

    loop {
        let plus = chars.iter().position(|c| *c == '+');
        if plus.is_some_and(|at| at < PAD_POSITION) {
            break;
        }

        let head_len = plus.unwrap_or(chars.len());
        if head_len >= PADDED_HEAD_LEN {
            break;
        }

        let at = PAD_POSITION.min(chars.len());
        chars.insert(at, '0');
    }

    chars.into_iter().collect()
}
