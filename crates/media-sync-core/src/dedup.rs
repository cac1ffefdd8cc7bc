use chrono::{DateTime, Timelike, Utc};
use media_sync_models::{TimeEntry, TimeEntryCandidate};
use media_sync_sources::{SourceError, TimeEntryDestination};
use std::collections::HashSet;
use tracing::debug;

/// Parse a destination timestamp and drop sub-second precision.
///
/// Both `Z` and numeric offsets are accepted; the result is the same instant
/// in UTC, so `20:00:00.5Z` and `22:00:00+02:00` compare equal.
pub fn normalize_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let parsed = DateTime::parse_from_rfc3339(raw.trim()).ok()?;
    parsed.with_timezone(&Utc).with_nanosecond(0)
}

fn normalize_instant<Tz: chrono::TimeZone>(dt: &DateTime<Tz>) -> Option<DateTime<Utc>> {
    dt.with_timezone(&Utc).with_nanosecond(0)
}

/// Whether `entry` already records `candidate`.
///
/// Every field has to agree. An entry that is still running (no stop) never
/// matches, and tags are compared as sets.
pub fn is_same_entry(entry: &TimeEntry, candidate: &TimeEntryCandidate) -> bool {
    if entry.description.as_deref() != Some(candidate.description.as_str()) {
        return false;
    }
    if entry.project_id != Some(candidate.project_id)
        || entry.workspace_id != Some(candidate.workspace_id)
    {
        return false;
    }

    let start_matches = match normalize_timestamp(&entry.start) {
        Some(start) => Some(start) == normalize_instant(&candidate.start),
        None => false,
    };
    let stop_matches = match entry.stop.as_deref().and_then(normalize_timestamp) {
        Some(stop) => Some(stop) == normalize_instant(&candidate.end),
        None => false,
    };
    if !start_matches || !stop_matches {
        return false;
    }

    let entry_tags: HashSet<&str> = entry.tags.iter().map(String::as_str).collect();
    let candidate_tags: HashSet<&str> = candidate.tags.iter().map(String::as_str).collect();
    entry_tags == candidate_tags
}

pub fn find_duplicate<'a>(
    entries: &'a [TimeEntry],
    candidate: &TimeEntryCandidate,
) -> Option<&'a TimeEntry> {
    entries.iter().find(|entry| is_same_entry(entry, candidate))
}

/// Checks candidates against the destination's current entries.
///
/// The listing is fetched fresh for every check, so entries created earlier in
/// the same run are seen.
pub struct DuplicateDetector<'a, D: TimeEntryDestination + ?Sized> {
    destination: &'a D,
}

impl<'a, D: TimeEntryDestination + ?Sized> DuplicateDetector<'a, D> {
    pub fn new(destination: &'a D) -> Self {
        Self { destination }
    }

    pub async fn exists(&self, candidate: &TimeEntryCandidate) -> Result<bool, SourceError> {
        let entries = self.destination.list_time_entries().await?;
        let duplicate = find_duplicate(&entries, candidate);
        if let Some(entry) = duplicate {
            debug!(
                operation = "dedup",
                entry_id = ?entry.id,
                description = %candidate.description,
                "Matched existing time entry"
            );
        }
        Ok(duplicate.is_some())
    }
}
