use chrono::Duration;
use media_sync_config::TogglSettings;
use media_sync_models::{TimeEntryCandidate, WatchHistory};

/// Turn a watch event into the time entry it should produce.
///
/// The entry ends when the item was marked watched and starts one runtime
/// earlier. Items without a runtime yield a zero-length entry.
pub fn build_candidate(item: &WatchHistory, toggl: &TogglSettings) -> TimeEntryCandidate {
    let end = item.watched_at;
    let start = end - Duration::minutes(i64::from(item.runtime_minutes));

    TimeEntryCandidate {
        description: format!("{} {}", item.kind().marker(), item.display_title()),
        start,
        end,
        workspace_id: toggl.workspace_id,
        project_id: toggl.project_id,
        tags: toggl.tags.clone(),
    }
}
