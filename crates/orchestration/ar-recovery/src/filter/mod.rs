//! Record filter.
//!
//! Each decompressed line is parsed as JSON, windowed on the first 19
//! characters of its `timestamp`, and matched against [`MatchRules`].
//! Parse and timestamp failures are errors; a record that simply lacks a
//! matched field is a silent [`Rejection`].

mod path;
mod timestamp;

pub use path::{EVENT_ID_PATH, FieldPath, RESOURCE_PATH};
pub use timestamp::{pad_fraction, window_prefix};

use crate::config::RecoveryConfig;
use ar_error::RecordError;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;

/// Default value of `data.win.eventInfo.resource`.
pub const DEFAULT_RESOURCE: &str = "test@mail.com";

/// Default accepted values of `data.win.system.eventID`.
pub const DEFAULT_EVENT_IDS: [i64; 2] = [302, 303];

/// Field-match predicates applied to every in-window record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRules {
    /// Required value of `data.win.eventInfo.resource`
    pub resource: String,

    /// Accepted `data.win.system.eventID` values. Empty accepts any record.
    pub event_ids: BTreeSet<i64>,
}

impl Default for MatchRules {
    fn default() -> Self {
        Self {
            resource: DEFAULT_RESOURCE.to_string(),
            event_ids: DEFAULT_EVENT_IDS.into_iter().collect(),
        }
    }
}

impl MatchRules {
    /// Rules for a resource with the default event IDs.
    pub fn new(resource: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            ..Self::default()
        }
    }

    /// Replace the accepted event IDs.
    pub fn with_event_ids(mut self, ids: impl IntoIterator<Item = i64>) -> Self {
        self.event_ids = ids.into_iter().collect();
        self
    }

    /// Disable the event ID predicate.
    pub fn with_any_event_id(mut self) -> Self {
        self.event_ids.clear();
        self
    }

    /// True when the event ID predicate is disabled.
    pub fn any_event_id(&self) -> bool {
        self.event_ids.is_empty()
    }

    pub fn resource_matches(&self, record: &Value) -> bool {
        RESOURCE_PATH.lookup_str(record) == Some(self.resource.as_str())
    }

    pub fn event_id_matches(&self, record: &Value) -> bool {
        if self.any_event_id() {
            return true;
        }
        EVENT_ID_PATH
            .lookup_i64(record)
            .is_some_and(|id| self.event_ids.contains(&id))
    }
}

/// Inclusive timestamp window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub min: NaiveDateTime,
    pub max: NaiveDateTime,
}

impl TimeWindow {
    pub fn new(min: NaiveDateTime, max: NaiveDateTime) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, at: NaiveDateTime) -> bool {
        self.min <= at && at <= self.max
    }
}

/// Why an otherwise valid record was not matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// Blank line
    Empty,
    OutsideWindow,
    ResourceMismatch,
    EventIdMismatch,
}

/// Result of evaluating one line.
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    /// The record matched; its timestamp has been normalised.
    Matched(Value),
    Rejected(Rejection),
}

impl Verdict {
    pub fn is_match(&self) -> bool {
        matches!(self, Verdict::Matched(_))
    }
}

/// Evaluates decompressed lines against a window and match rules.
#[derive(Debug, Clone)]
pub struct RecordFilter {
    window: TimeWindow,
    rules: MatchRules,
}

impl RecordFilter {
    pub fn new(window: TimeWindow, rules: MatchRules) -> Self {
        Self { window, rules }
    }

    /// Filter for the window and rules of a run configuration.
    pub fn from_config(config: &RecoveryConfig) -> Self {
        Self::new(
            TimeWindow::new(config.min_timestamp, config.max_timestamp),
            config.match_rules.clone(),
        )
    }

    pub fn window(&self) -> &TimeWindow {
        &self.window
    }

    pub fn rules(&self) -> &MatchRules {
        &self.rules
    }

    /// Evaluate one decoded line.
    pub fn evaluate(&self, line: &str) -> Result<Verdict, RecordError> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(Verdict::Rejected(Rejection::Empty));
        }

        let mut record: Value =
            serde_json::from_str(line).map_err(|e| RecordError::Malformed(e.to_string()))?;

        let raw = match record.get("timestamp") {
            Some(Value::String(raw)) => raw.clone(),
            Some(other) => {
                return Err(RecordError::Timestamp(format!(
                    "expected a string, got {other}"
                )));
            }
            None => return Err(RecordError::Timestamp("missing".to_string())),
        };
        let at = window_prefix(&raw)?;

        if let Some(slot) = record.get_mut("timestamp") {
            *slot = Value::String(pad_fraction(&raw));
        }

        if !self.window.contains(at) {
            return Ok(Verdict::Rejected(Rejection::OutsideWindow));
        }
        if !self.rules.resource_matches(&record) {
            return Ok(Verdict::Rejected(Rejection::ResourceMismatch));
        }
        if !self.rules.event_id_matches(&record) {
            return Ok(Verdict::Rejected(Rejection::EventIdMismatch));
        }

        Ok(Verdict::Matched(record))
    }
}
