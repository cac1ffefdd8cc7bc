use crate::error::{read_json, SourceError};
use chrono::SecondsFormat;
use media_sync_models::{TimeEntry, TimeEntryCandidate};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

const SERVICE: &str = "toggl";

/// Provenance label attached to every created entry.
pub const CREATED_WITH: &str = "watchlog";

pub fn create_toggl_client() -> Client {
    Client::builder()
        .user_agent(concat!("watchlog/", env!("CARGO_PKG_VERSION")))
        .build()
        .unwrap_or_else(|_| Client::new())
}

/// Toggl reports the workspace as both `wid` and `workspace_id`, and older
/// payloads only carry one of them.
#[derive(Debug, Deserialize)]
struct TogglTimeEntry {
    id: Option<u64>,
    description: Option<String>,
    start: String,
    stop: Option<String>,
    project_id: Option<u64>,
    tags: Option<Vec<String>>,
    wid: Option<u64>,
    workspace_id: Option<u64>,
}

impl From<TogglTimeEntry> for TimeEntry {
    fn from(entry: TogglTimeEntry) -> Self {
        TimeEntry {
            id: entry.id,
            description: entry.description,
            start: entry.start,
            stop: entry.stop,
            project_id: entry.project_id,
            tags: entry.tags.unwrap_or_default(),
            workspace_id: entry.wid.or(entry.workspace_id),
        }
    }
}

#[derive(Debug, Serialize)]
struct NewTogglTimeEntry<'a> {
    description: &'a str,
    start: String,
    stop: String,
    duration: i64,
    created_with: &'static str,
    project_id: u64,
    tags: &'a [String],
    workspace_id: u64,
}

impl<'a> From<&'a TimeEntryCandidate> for NewTogglTimeEntry<'a> {
    fn from(candidate: &'a TimeEntryCandidate) -> Self {
        NewTogglTimeEntry {
            description: &candidate.description,
            start: candidate.start.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            stop: candidate.end.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            duration: candidate.duration().num_seconds(),
            created_with: CREATED_WITH,
            project_id: candidate.project_id,
            tags: &candidate.tags,
            workspace_id: candidate.workspace_id,
        }
    }
}

/// Every time entry visible to the token's user. No date filter is applied.
pub async fn list_time_entries(
    client: &Client,
    base_url: &str,
    api_token: &str,
) -> Result<Vec<TimeEntry>, SourceError> {
    let response = client
        .get(format!("{}/me/time_entries", base_url))
        .basic_auth(api_token, Some("api_token"))
        .header("Accept", "application/json")
        .send()
        .await
        .map_err(SourceError::transport(SERVICE))?;

    if !response.status().is_success() {
        return Err(SourceError::from_response(SERVICE, response).await);
    }

    // An account without entries may answer `null`
    let entries: Option<Vec<TogglTimeEntry>> = read_json(SERVICE, response).await?;
    let entries: Vec<TimeEntry> = entries
        .unwrap_or_default()
        .into_iter()
        .map(TimeEntry::from)
        .collect();

    debug!(count = entries.len(), "Fetched Toggl time entries");
    Ok(entries)
}

pub async fn create_time_entry(
    client: &Client,
    base_url: &str,
    api_token: &str,
    candidate: &TimeEntryCandidate,
) -> Result<(), SourceError> {
    let payload = NewTogglTimeEntry::from(candidate);

    let response = client
        .post(format!(
            "{}/workspaces/{}/time_entries",
            base_url, candidate.workspace_id
        ))
        .basic_auth(api_token, Some("api_token"))
        .json(&payload)
        .send()
        .await
        .map_err(SourceError::transport(SERVICE))?;

    if !response.status().is_success() {
        return Err(SourceError::from_response(SERVICE, response).await);
    }

    Ok(())
}
