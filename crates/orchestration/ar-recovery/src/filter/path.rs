//! Optional nested field lookup.

use serde_json::Value;
use std::fmt;

/// A fixed path of object keys into a JSON record.
///
/// Lookups return `None` when any segment is missing or a parent is not an
/// object; they never fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldPath(&'static [&'static str]);

/// `data.win.eventInfo.resource`
pub const RESOURCE_PATH: FieldPath = FieldPath(&["data", "win", "eventInfo", "resource"]);

/// `data.win.system.eventID`
pub const EVENT_ID_PATH: FieldPath = FieldPath(&["data", "win", "system", "eventID"]);

impl FieldPath {
    /// The value at this path, if present.
    pub fn lookup<'a>(&self, record: &'a Value) -> Option<&'a Value> {
        self.0
            .iter()
            .try_fold(record, |value, segment| value.as_object()?.get(*segment))
    }

    /// The string at this path, if present and a string.
    pub fn lookup_str<'a>(&self, record: &'a Value) -> Option<&'a str> {
        self.lookup(record)?.as_str()
    }

    /// The integer at this path, if present and an integer.
    pub fn lookup_i64(&self, record: &Value) -> Option<i64> {
        self.lookup(record)?.as_i64()
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("."))
    }
}
