use crate::clock::Clock;
use crate::error::SyncError;
use chrono::{DateTime, Duration, Utc};
use media_sync_config::CredentialStore;
use media_sync_models::CredentialRecord;
use media_sync_sources::{DeviceCode, DevicePoll, HistorySource, SourceError, TokenGrant};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Callback that shows the user where to approve a device code.
pub type DevicePrompt = Arc<dyn Fn(&DeviceCode) + Send + Sync>;

/// Prompt used when the caller does not supply one.
pub fn log_device_prompt() -> DevicePrompt {
    Arc::new(|code: &DeviceCode| {
        info!(
            operation = "authenticate",
            "Go to {} and enter code: {}", code.verification_url, code.user_code
        );
    })
}

/// Where the stored credential stands relative to the refresh buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialState {
    Unauthenticated,
    Valid(CredentialRecord),
    Expiring(CredentialRecord),
}

impl CredentialState {
    pub fn assess(record: Option<CredentialRecord>, now: DateTime<Utc>, buffer: Duration) -> Self {
        match record {
            None => CredentialState::Unauthenticated,
            Some(record) if record.is_near_expiration(now, buffer) => {
                CredentialState::Expiring(record)
            }
            Some(record) => CredentialState::Valid(record),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CredentialState::Unauthenticated => "unauthenticated",
            CredentialState::Valid(_) => "valid",
            CredentialState::Expiring(_) => "expiring",
        }
    }

    pub fn record(&self) -> Option<&CredentialRecord> {
        match self {
            CredentialState::Unauthenticated => None,
            CredentialState::Valid(record) | CredentialState::Expiring(record) => Some(record),
        }
    }
}

/// Keeps the history source's OAuth credential usable.
///
/// Missing or unreadable credentials go through the device flow. Credentials
/// inside the expiration buffer are refreshed; a rejected refresh is fatal and
/// does not fall back to the device flow.
pub struct CredentialManager<'a, S: HistorySource + ?Sized, C: Clock + ?Sized> {
    source: &'a S,
    store: &'a CredentialStore,
    clock: &'a C,
    buffer: Duration,
    prompt: DevicePrompt,
}

impl<'a, S: HistorySource + ?Sized, C: Clock + ?Sized> CredentialManager<'a, S, C> {
    pub fn new(source: &'a S, store: &'a CredentialStore, clock: &'a C, buffer: Duration) -> Self {
        Self {
            source,
            store,
            clock,
            buffer,
            prompt: log_device_prompt(),
        }
    }

    pub fn with_prompt(mut self, prompt: DevicePrompt) -> Self {
        self.prompt = prompt;
        self
    }

    pub fn state(&self) -> CredentialState {
        CredentialState::assess(self.store.load(), self.clock.now(), self.buffer)
    }

    /// Return a credential that is not near expiration, authenticating or
    /// refreshing as needed.
    pub async fn ensure_valid(&self) -> Result<CredentialRecord, SyncError> {
        match self.state() {
            CredentialState::Valid(record) => {
                debug!(
                    operation = "ensure_valid",
                    expires_at = %record.expires_at,
                    "Stored credential is valid"
                );
                Ok(record)
            }
            CredentialState::Expiring(record) => {
                info!(
                    operation = "ensure_valid",
                    expires_at = %record.expires_at,
                    "Credential is near expiration, refreshing"
                );
                self.refresh(&record).await
            }
            CredentialState::Unauthenticated => {
                info!(
                    operation = "ensure_valid",
                    "No usable credential found, starting device authorization"
                );
                self.authenticate().await
            }
        }
    }

    /// Run the device flow to completion and persist the resulting credential.
    ///
    /// The first poll goes out immediately; every pending answer waits one
    /// provider interval before the next poll.
    pub async fn authenticate(&self) -> Result<CredentialRecord, SyncError> {
        let code = self
            .source
            .request_device_code()
            .await
            .map_err(SyncError::Authentication)?;

        (self.prompt)(&code);
        let interval = std::time::Duration::from_secs(code.interval);

        loop {
            match self
                .source
                .poll_device_token(&code.device_code)
                .await
                .map_err(SyncError::Authentication)?
            {
                DevicePoll::Authorized(grant) => {
                    info!(operation = "authenticate", "Device authorization approved");
                    return self.persist(grant, SyncError::Authentication);
                }
                DevicePoll::Pending(status) => {
                    debug!(
                        operation = "authenticate",
                        status,
                        interval_secs = code.interval,
                        "Authorization pending"
                    );
                    self.clock.sleep(interval).await;
                }
            }
        }
    }

    pub async fn refresh(&self, record: &CredentialRecord) -> Result<CredentialRecord, SyncError> {
        let grant = self
            .source
            .refresh_token(&record.refresh_token)
            .await
            .map_err(|e| {
                warn!(operation = "refresh", error = %e, "Token refresh rejected");
                SyncError::Refresh(e)
            })?;
        info!(operation = "refresh", "Access token refreshed");
        self.persist(grant, SyncError::Refresh)
    }

    /// Store the grant. A lifetime that overflows the expiration is reported
    /// through `rejected` and leaves the store untouched.
    fn persist(
        &self,
        grant: TokenGrant,
        rejected: fn(SourceError) -> SyncError,
    ) -> Result<CredentialRecord, SyncError> {
        let expires_in = grant.expires_in;
        let record = CredentialRecord::issued(
            grant.access_token,
            grant.refresh_token,
            self.clock.now(),
            expires_in,
        )
        .ok_or_else(|| {
            rejected(SourceError::decode(
                "trakt",
                format!("token lifetime of {} seconds is out of range", expires_in),
            ))
        })?;
        self.store.save(&record)?;
        debug!(
            operation = "persist_credentials",
            path = %self.store.path().display(),
            expires_at = %record.expires_at,
            "Saved credential"
        );
        Ok(record)
    }
}
