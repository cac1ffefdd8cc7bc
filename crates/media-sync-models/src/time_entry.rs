use chrono::{DateTime, Duration, FixedOffset};
use serde::{Deserialize, Serialize};

/// A time entry built from a watch event, not yet submitted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimeEntryCandidate {
    pub description: String,
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
    pub workspace_id: u64,
    pub project_id: u64,
    pub tags: Vec<String>,
}

impl TimeEntryCandidate {
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }
}

/// A time entry as the destination reports it.
///
/// Timestamps stay as the raw strings the destination returned; comparison
/// happens after normalization.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct TimeEntry {
    pub id: Option<u64>,
    pub description: Option<String>,
    pub start: String,
    pub stop: Option<String>,
    pub project_id: Option<u64>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub workspace_id: Option<u64>,
}
