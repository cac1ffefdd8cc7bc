//! Fakes for the source, destination and clock seams.

use crate::clock::Clock;
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use media_sync_models::{TimeEntry, TimeEntryCandidate, WatchHistory, WatchedMedia};
use media_sync_sources::{
    DeviceCode, DevicePoll, HistorySource, SourceError, TimeEntryDestination, TokenGrant,
};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 8, 12, 0, 0).unwrap()
}

pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
    sleeps: Mutex<Vec<Duration>>,
}

impl ManualClock {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
            sleeps: Mutex::new(Vec::new()),
        }
    }

    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap().clone()
    }
}

#[async_trait]
impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }

    async fn sleep(&self, duration: Duration) {
        self.sleeps.lock().unwrap().push(duration);
        let mut now = self.now.lock().unwrap();
        *now = *now + chrono::Duration::from_std(duration).unwrap();
    }
}

pub enum PollStep {
    Pending(u16),
    Authorized(TokenGrant),
    Rejected,
}

#[derive(Default)]
struct SourceState {
    polls: VecDeque<PollStep>,
    refresh: Option<TokenGrant>,
    history: Option<Vec<WatchHistory>>,
    calls: Vec<String>,
}

#[derive(Clone, Default)]
pub struct FakeSource {
    state: Arc<Mutex<SourceState>>,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_polls(self, polls: Vec<PollStep>) -> Self {
        self.state.lock().unwrap().polls = polls.into();
        self
    }

    pub fn with_refresh(self, grant: TokenGrant) -> Self {
        self.state.lock().unwrap().refresh = Some(grant);
        self
    }

    pub fn with_history(self, history: Vec<WatchHistory>) -> Self {
        self.state.lock().unwrap().history = Some(history);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    fn record(&self, call: impl Into<String>) {
        self.state.lock().unwrap().calls.push(call.into());
    }
}

pub fn grant(access: &str, expires_in: i64) -> TokenGrant {
    TokenGrant {
        access_token: access.to_string(),
        refresh_token: format!("{}-refresh", access),
        expires_in,
    }
}

#[async_trait]
impl HistorySource for FakeSource {
    fn source_name(&self) -> &str {
        "fake-trakt"
    }

    async fn request_device_code(&self) -> Result<DeviceCode, SourceError> {
        self.record("device_code");
        Ok(DeviceCode {
            device_code: "dev-123".to_string(),
            user_code: "ABCD1234".to_string(),
            verification_url: "https://trakt.tv/activate".to_string(),
            expires_in: 600,
            interval: 5,
        })
    }

    async fn poll_device_token(&self, device_code: &str) -> Result<DevicePoll, SourceError> {
        self.record(format!("poll:{}", device_code));
        let step = self.state.lock().unwrap().polls.pop_front();
        match step {
            Some(PollStep::Pending(status)) => Ok(DevicePoll::Pending(status)),
            Some(PollStep::Authorized(grant)) => Ok(DevicePoll::Authorized(grant)),
            Some(PollStep::Rejected) | None => Err(SourceError::decode("trakt", "device code rejected")),
        }
    }

    async fn refresh_token(&self, refresh_token: &str) -> Result<TokenGrant, SourceError> {
        self.record(format!("refresh:{}", refresh_token));
        let refresh = self.state.lock().unwrap().refresh.clone();
        refresh.ok_or_else(|| SourceError::decode("trakt", "invalid_grant"))
    }

    async fn get_watch_history(
        &self,
        access_token: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<WatchHistory>, SourceError> {
        self.record(format!(
            "history:{}:{}",
            access_token,
            since.to_rfc3339_opts(SecondsFormat::Secs, true)
        ));
        let history = self.state.lock().unwrap().history.clone();
        history.ok_or_else(|| SourceError::decode("trakt", "history unavailable"))
    }
}

#[derive(Default)]
struct DestinationState {
    entries: Vec<TimeEntry>,
    reject_descriptions: Vec<String>,
    listing_fails: bool,
    list_calls: usize,
    create_calls: usize,
    next_id: u64,
}

#[derive(Clone, Default)]
pub struct FakeDestination {
    state: Arc<Mutex<DestinationState>>,
}

impl FakeDestination {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries(self, entries: Vec<TimeEntry>) -> Self {
        self.state.lock().unwrap().entries = entries;
        self
    }

    pub fn rejecting(self, description: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .reject_descriptions
            .push(description.to_string());
        self
    }

    pub fn with_failing_listing(self) -> Self {
        self.state.lock().unwrap().listing_fails = true;
        self
    }

    pub fn entries(&self) -> Vec<TimeEntry> {
        self.state.lock().unwrap().entries.clone()
    }

    pub fn list_calls(&self) -> usize {
        self.state.lock().unwrap().list_calls
    }

    pub fn create_calls(&self) -> usize {
        self.state.lock().unwrap().create_calls
    }
}

#[async_trait]
impl TimeEntryDestination for FakeDestination {
    fn destination_name(&self) -> &str {
        "fake-toggl"
    }

    async fn list_time_entries(&self) -> Result<Vec<TimeEntry>, SourceError> {
        let mut state = self.state.lock().unwrap();
        state.list_calls += 1;
        if state.listing_fails {
            return Err(SourceError::decode("toggl", "listing unavailable"));
        }
        Ok(state.entries.clone())
    }

    async fn create_time_entry(&self, candidate: &TimeEntryCandidate) -> Result<(), SourceError> {
        let mut state = self.state.lock().unwrap();
        state.create_calls += 1;
        if state.reject_descriptions.contains(&candidate.description) {
            return Err(SourceError::decode("toggl", "rejected"));
        }
        state.next_id += 1;
        // The destination echoes timestamps in its own representation
        let entry = TimeEntry {
            id: Some(state.next_id),
            description: Some(candidate.description.clone()),
            start: candidate.start.with_timezone(&Utc).to_rfc3339(),
            stop: Some(candidate.end.with_timezone(&Utc).to_rfc3339()),
            project_id: Some(candidate.project_id),
            tags: candidate.tags.iter().rev().cloned().collect(),
            workspace_id: Some(candidate.workspace_id),
        };
        state.entries.push(entry);
        Ok(())
    }
}

pub fn episode(show: &str, season: u32, number: u32, title: &str, runtime: u32, watched_at: &str) -> WatchHistory {
    WatchHistory {
        watched_at: DateTime::parse_from_rfc3339(watched_at).unwrap(),
        media: WatchedMedia::Episode {
            show_title: show.to_string(),
            season,
            number,
            title: Some(title.to_string()),
        },
        runtime_minutes: runtime,
    }
}

pub fn movie(title: &str, year: Option<u32>, runtime: u32, watched_at: &str) -> WatchHistory {
    WatchHistory {
        watched_at: DateTime::parse_from_rfc3339(watched_at).unwrap(),
        media: WatchedMedia::Movie {
            title: title.to_string(),
            year,
        },
        runtime_minutes: runtime,
    }
}
