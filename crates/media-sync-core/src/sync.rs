use crate::clock::{Clock, SystemClock};
use crate::credentials::{log_device_prompt, CredentialManager, DevicePrompt};
use crate::error::SyncError;
use crate::sink::{SubmitOutcome, TimeEntrySink};
use crate::transform::build_candidate;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use media_sync_config::{check_history_days, Config, ConfigError, CredentialStore, Settings};
use media_sync_sources::{HistorySource, TimeEntryDestination};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

/// Outcome of one sync run.
#[derive(Debug, Clone, Serialize)]
pub struct SyncResult {
    /// History items retrieved for the window.
    pub fetched: usize,
    pub created: usize,
    /// Items whose entry already existed.
    pub skipped: usize,
    pub would_create: usize,
    pub failed: usize,
    pub dry_run: bool,
    pub since: DateTime<Utc>,
    pub duration: Duration,
    pub errors: Vec<String>,
}

impl SyncResult {
    fn new(since: DateTime<Utc>, dry_run: bool) -> Self {
        Self {
            fetched: 0,
            created: 0,
            skipped: 0,
            would_create: 0,
            failed: 0,
            dry_run,
            since,
            duration: Duration::ZERO,
            errors: Vec::new(),
        }
    }

    pub fn items_synced(&self) -> usize {
        self.created
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }
}

/// Progress hooks for a running sync. All methods default to no-ops.
pub trait SyncObserver: Send + Sync {
    fn history_fetched(&self, _count: usize) {}

    fn item_finished(&self, _description: &str, _outcome: Result<SubmitOutcome, &SyncError>) {}
}

/// Validate `config` and apply a history window override.
///
/// Runs before any client is built, so missing configuration never reaches
/// the network.
pub fn prepare_settings(config: &Config, days: Option<u32>) -> Result<Settings, SyncError> {
    let settings = config.validate()?;
    Ok(match days {
        Some(days) => settings.with_history_days(check_history_days("--days", days)?),
        None => settings,
    })
}

/// Start of the history window ending at `now`.
fn history_cutoff(now: DateTime<Utc>, days: u32) -> Result<DateTime<Utc>, SyncError> {
    ChronoDuration::try_days(i64::from(days))
        .and_then(|window| now.checked_sub_signed(window))
        .ok_or_else(|| {
            SyncError::Configuration(ConfigError::Invalid {
                key: "TRAKT_HISTORY_DAYS",
                reason: format!("a {} day window reaches past the earliest supported date", days),
            })
        })
}

/// Drives one run: credentials, history retrieval, then one submission per
/// item in retrieval order.
pub struct SyncOrchestrator<S, D, C = SystemClock> {
    settings: Settings,
    source: S,
    destination: D,
    store: CredentialStore,
    clock: C,
    dry_run: bool,
    observer: Option<Arc<dyn SyncObserver>>,
    prompt: DevicePrompt,
}

impl<S, D> SyncOrchestrator<S, D, SystemClock>
where
    S: HistorySource,
    D: TimeEntryDestination,
{
    pub fn new(settings: Settings, source: S, destination: D, store: CredentialStore) -> Self {
        Self {
            settings,
            source,
            destination,
            store,
            clock: SystemClock,
            dry_run: false,
            observer: None,
            prompt: log_device_prompt(),
        }
    }
}

impl<S, D, C> SyncOrchestrator<S, D, C>
where
    S: HistorySource,
    D: TimeEntryDestination,
    C: Clock,
{
    pub fn with_clock<C2: Clock>(self, clock: C2) -> SyncOrchestrator<S, D, C2> {
        SyncOrchestrator {
            settings: self.settings,
            source: self.source,
            destination: self.destination,
            store: self.store,
            clock,
            dry_run: self.dry_run,
            observer: self.observer,
            prompt: self.prompt,
        }
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn SyncObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn with_prompt(mut self, prompt: DevicePrompt) -> Self {
        self.prompt = prompt;
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn credentials(&self) -> CredentialManager<'_, S, C> {
        CredentialManager::new(
            &self.source,
            &self.store,
            &self.clock,
            self.settings.expiration_buffer,
        )
        .with_prompt(self.prompt.clone())
    }

    /// Run the sync.
    ///
    /// Credential and retrieval failures abort before anything is submitted.
    /// Per-item failures are counted in the result and the run continues.
    #[instrument(skip(self), fields(dry_run = self.dry_run))]
    pub async fn run(&self) -> Result<SyncResult, SyncError> {
        let started = Instant::now();
        let since = history_cutoff(self.clock.now(), self.settings.history_days)?;

        let credential = self.credentials().ensure_valid().await?;

        let mut result = SyncResult::new(since, self.dry_run);

        info!(
            operation = "fetch_history",
            source = self.source.source_name(),
            days = self.settings.history_days,
            since = %since,
            "Fetching watch history"
        );
        let history = self
            .source
            .get_watch_history(&credential.access_token, since)
            .await
            .map_err(|e| {
                warn!(operation = "fetch_history", error = %e, "History retrieval failed");
                SyncError::Retrieval(e)
            })?;
        result.fetched = history.len();
        if let Some(observer) = &self.observer {
            observer.history_fetched(history.len());
        }

        let sink = TimeEntrySink::new(&self.destination).with_dry_run(self.dry_run);
        for item in &history {
            let candidate = build_candidate(item, &self.settings.toggl);
            debug!(
                operation = "build_candidate",
                description = %candidate.description,
                start = %candidate.start,
                end = %candidate.end,
                "Prepared time entry"
            );

            let outcome = sink.submit(&candidate).await;
            match &outcome {
                Ok(SubmitOutcome::Created) => result.created += 1,
                Ok(SubmitOutcome::AlreadyExists) => result.skipped += 1,
                Ok(SubmitOutcome::WouldCreate) => result.would_create += 1,
                Err(e) => {
                    result.failed += 1;
                    result.errors.push(e.to_string());
                }
            }
            if let Some(observer) = &self.observer {
                observer.item_finished(&candidate.description, outcome.as_ref().copied());
            }
        }

        result.duration = started.elapsed();
        info!(
            operation = "sync",
            fetched = result.fetched,
            created = result.created,
            skipped = result.skipped,
            would_create = result.would_create,
            failed = result.failed,
            duration_ms = result.duration.as_millis() as u64,
            "Sync finished"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{
        episode, fixed_now, grant, movie, FakeDestination, FakeSource, ManualClock, PollStep,
    };
    use media_sync_config::{TogglSettings, TraktSettings};
    use media_sync_models::{CredentialRecord, TimeEntry};
    use std::sync::Mutex;
    use tempfile::TempDir;

    fn settings() -> Settings {
        Settings {
            trakt: TraktSettings {
                client_id: "client".to_string(),
                client_secret: "secret".to_string(),
                api_url: "http://trakt.invalid".to_string(),
            },
            toggl: TogglSettings {
                api_token: "token".to_string(),
                workspace_id: 11,
                project_id: 22,
                tags: vec!["tv".to_string(), "trakt".to_string()],
                api_url: "http://toggl.invalid".to_string(),
            },
            history_days: 7,
            expiration_buffer: ChronoDuration::minutes(60),
            page_size: 100,
        }
    }

    fn valid_store(dir: &TempDir) -> CredentialStore {
        let store = CredentialStore::new(dir.path().join("trakt_tokens.json"));
        store
            .save(&CredentialRecord::new(
                "access",
                "refresh",
                fixed_now() + ChronoDuration::days(30),
            ))
            .unwrap();
        store
    }

    fn history() -> Vec<media_sync_models::WatchHistory> {
        vec![
            episode("X", 1, 2, "Y", 30, "2024-05-07T20:30:00Z"),
            movie("Heat", Some(1995), 170, "2024-05-06T23:00:00Z"),
        ]
    }

    fn orchestrator(
        dir: &TempDir,
        source: FakeSource,
        destination: FakeDestination,
    ) -> SyncOrchestrator<FakeSource, FakeDestination, ManualClock> {
        SyncOrchestrator::new(settings(), source, destination, valid_store(dir))
            .with_clock(ManualClock::at(fixed_now()))
    }

    #[derive(Default)]
    struct Recorder {
        fetched: Mutex<Option<usize>>,
        items: Mutex<Vec<(String, bool)>>,
    }

    impl SyncObserver for Recorder {
        fn history_fetched(&self, count: usize) {
            *self.fetched.lock().unwrap() = Some(count);
        }

        fn item_finished(&self, description: &str, outcome: Result<SubmitOutcome, &SyncError>) {
            self.items
                .lock()
                .unwrap()
                .push((description.to_string(), outcome.is_ok()));
        }
    }

    #[tokio::test]
    async fn test_run_creates_entries_in_order() {
        let dir = TempDir::new().unwrap();
        let source = FakeSource::new().with_history(history());
        let destination = FakeDestination::new();
        let recorder = Arc::new(Recorder::default());

        let result = orchestrator(&dir, source.clone(), destination.clone())
            .with_observer(recorder.clone())
            .run()
            .await
            .unwrap();

        assert_eq!(result.fetched, 2);
        assert_eq!(result.created, 2);
        assert_eq!(result.since, fixed_now() - ChronoDuration::days(7));
        assert_eq!(
            source.calls(),
            vec!["history:access:2024-05-01T12:00:00Z".to_string()]
        );

        let entries = destination.entries();
        assert_eq!(entries[0].description.as_deref(), Some("📺 X - S01E02 - Y"));
        assert_eq!(entries[0].start, "2024-05-07T20:00:00+00:00");
        assert_eq!(entries[1].description.as_deref(), Some("🎞️ Heat (1995)"));

        assert_eq!(*recorder.fetched.lock().unwrap(), Some(2));
        assert_eq!(recorder.items.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_second_run_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let source = FakeSource::new().with_history(history());
        let destination = FakeDestination::new();

        let first = orchestrator(&dir, source.clone(), destination.clone())
            .run()
            .await
            .unwrap();
        let second = orchestrator(&dir, source, destination.clone())
            .run()
            .await
            .unwrap();

        assert_eq!(first.created, 2);
        assert_eq!(second.created, 0);
        assert_eq!(second.skipped, 2);
        assert_eq!(destination.entries().len(), 2);
        assert_eq!(destination.create_calls(), 2);
    }

    #[tokio::test]
    async fn test_failed_item_does_not_stop_run() {
        let dir = TempDir::new().unwrap();
        let source = FakeSource::new().with_history(history());
        let destination = FakeDestination::new().rejecting("📺 X - S01E02 - Y");

        let result = orchestrator(&dir, source, destination.clone())
            .run()
            .await
            .unwrap();

        assert_eq!(result.failed, 1);
        assert_eq!(result.created, 1);
        assert!(result.has_failures());
        assert_eq!(result.errors.len(), 1);
        assert_eq!(destination.create_calls(), 2);
    }

    #[tokio::test]
    async fn test_retrieval_failure_aborts_before_submission() {
        let dir = TempDir::new().unwrap();
        let source = FakeSource::new();
        let destination = FakeDestination::new();

        let err = orchestrator(&dir, source, destination.clone())
            .run()
            .await
            .unwrap_err();

        assert!(matches!(err, SyncError::Retrieval(_)));
        assert_eq!(destination.list_calls(), 0);
        assert_eq!(destination.create_calls(), 0);
    }

    #[tokio::test]
    async fn test_dry_run_reports_without_creating() {
        let dir = TempDir::new().unwrap();
        let existing = TimeEntry {
            id: Some(1),
            description: Some("🎞️ Heat (1995)".to_string()),
            start: "2024-05-06T20:10:00Z".to_string(),
            stop: Some("2024-05-06T23:00:00Z".to_string()),
            project_id: Some(22),
            tags: vec!["trakt".to_string(), "tv".to_string()],
            workspace_id: Some(11),
        };
        let source = FakeSource::new().with_history(history());
        let destination = FakeDestination::new().with_entries(vec![existing]);

        let result = orchestrator(&dir, source, destination.clone())
            .with_dry_run(true)
            .run()
            .await
            .unwrap();

        assert!(result.dry_run);
        assert_eq!(result.would_create, 1);
        assert_eq!(result.skipped, 1);
        assert_eq!(destination.create_calls(), 0);
    }

    #[tokio::test]
    async fn test_missing_credentials_authenticate_before_fetching() {
        let dir = TempDir::new().unwrap();
        let store = CredentialStore::new(dir.path().join("trakt_tokens.json"));
        let source = FakeSource::new()
            .with_polls(vec![PollStep::Pending(400), PollStep::Authorized(grant("new", 86_400))])
            .with_history(Vec::new());

        let result = SyncOrchestrator::new(settings(), source.clone(), FakeDestination::new(), store)
            .with_clock(ManualClock::at(fixed_now()))
            .run()
            .await
            .unwrap();

        assert_eq!(result.fetched, 0);
        let calls = source.calls();
        assert_eq!(calls[0], "device_code");
        assert!(calls.last().unwrap().starts_with("history:new:"));
    }

    #[tokio::test]
    async fn test_refresh_failure_aborts_run() {
        let dir = TempDir::new().unwrap();
        let store = CredentialStore::new(dir.path().join("trakt_tokens.json"));
        store
            .save(&CredentialRecord::new("old", "old-refresh", fixed_now()))
            .unwrap();
        let source = FakeSource::new().with_history(history());
        let destination = FakeDestination::new();

        let err = SyncOrchestrator::new(settings(), source.clone(), destination.clone(), store)
            .with_clock(ManualClock::at(fixed_now()))
            .run()
            .await
            .unwrap_err();

        assert!(matches!(err, SyncError::Refresh(_)));
        assert_eq!(source.calls(), vec!["refresh:old-refresh".to_string()]);
        assert_eq!(destination.list_calls(), 0);
    }

    #[tokio::test]
    async fn test_unrepresentable_window_fails_before_any_call() {
        let dir = TempDir::new().unwrap();
        let source = FakeSource::new().with_history(history());
        let destination = FakeDestination::new();
        let mut settings = settings();
        settings.history_days = u32::MAX;

        let err = SyncOrchestrator::new(settings, source.clone(), destination.clone(), valid_store(&dir))
            .with_clock(ManualClock::at(fixed_now()))
            .run()
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            SyncError::Configuration(ConfigError::Invalid { key: "TRAKT_HISTORY_DAYS", .. })
        ));
        assert!(source.calls().is_empty());
        assert_eq!(destination.list_calls(), 0);
    }

    #[test]
    fn test_prepare_settings_rejects_missing_configuration() {
        let err = prepare_settings(&Config::default(), None).unwrap_err();
        match err {
            SyncError::Configuration(inner) => {
                assert!(inner.to_string().contains("TOGGL_WORKSPACE_ID"));
            }
            other => panic!("expected configuration error, got {:?}", other),
        }
    }

    #[test]
    fn test_prepare_settings_applies_days_override() {
        let mut config = Config::default();
        config
            .apply_env(|key| {
                match key {
                    "TRAKT_CLIENT_ID" => Some("id"),
                    "TRAKT_CLIENT_SECRET" => Some("secret"),
                    "TOGGL_API_TOKEN" => Some("token"),
                    "TOGGL_WORKSPACE_ID" => Some("1"),
                    "TOGGL_PROJECT_ID" => Some("2"),
                    _ => None,
                }
                .map(str::to_string)
            })
            .unwrap();

        assert_eq!(prepare_settings(&config, None).unwrap().history_days, 7);
        assert_eq!(prepare_settings(&config, Some(30)).unwrap().history_days, 30);
        assert!(matches!(
            prepare_settings(&config, Some(u32::MAX)),
            Err(SyncError::Configuration(ConfigError::Invalid { key: "--days", .. }))
        ));
    }
}
