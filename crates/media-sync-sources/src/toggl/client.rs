use crate::error::SourceError;
use crate::toggl::api;
use crate::traits::TimeEntryDestination;
use async_trait::async_trait;
use media_sync_config::{Settings, TogglSettings};
use media_sync_models::{TimeEntry, TimeEntryCandidate};
use reqwest::Client;
use std::sync::Arc;

#[derive(Clone)]
pub struct TogglClient {
    client: Arc<Client>,
    settings: TogglSettings,
}

impl TogglClient {
    pub fn new(settings: &Settings) -> Self {
        Self {
            client: Arc::new(api::create_toggl_client()),
            settings: settings.toggl.clone(),
        }
    }
}

#[async_trait]
impl TimeEntryDestination for TogglClient {
    fn destination_name(&self) -> &str {
        "toggl"
    }

    async fn list_time_entries(&self) -> Result<Vec<TimeEntry>, SourceError> {
        api::list_time_entries(&self.client, &self.settings.api_url, &self.settings.api_token).await
    }

    async fn create_time_entry(&self, candidate: &TimeEntryCandidate) -> Result<(), SourceError> {
        api::create_time_entry(
            &self.client,
            &self.settings.api_url,
            &self.settings.api_token,
            candidate,
        )
        .await
    }
}
