use crate::error::SourceError;
use crate::trakt::{DeviceCode, DevicePoll, TokenGrant};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use media_sync_models::{TimeEntry, TimeEntryCandidate, WatchHistory};

/// Where watch history comes from, including the OAuth device flow that guards it.
///
/// Every method is a single request; looping and persistence belong to the caller.
#[async_trait]
pub trait HistorySource: Send + Sync {
    fn source_name(&self) -> &str;

    // Authentication
    async fn request_device_code(&self) -> Result<DeviceCode, SourceError>;
    async fn poll_device_token(&self, device_code: &str) -> Result<DevicePoll, SourceError>;
    async fn refresh_token(&self, refresh_token: &str) -> Result<TokenGrant, SourceError>;

    // Data retrieval
    /// Every history item watched at or after `since`, in source order.
    async fn get_watch_history(
        &self,
        access_token: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<WatchHistory>, SourceError>;
}

/// Where time entries end up.
#[async_trait]
pub trait TimeEntryDestination: Send + Sync {
    fn destination_name(&self) -> &str;

    /// All current entries of the authenticated user, unfiltered.
    async fn list_time_entries(&self) -> Result<Vec<TimeEntry>, SourceError>;

    async fn create_time_entry(&self, candidate: &TimeEntryCandidate) -> Result<(), SourceError>;
}
