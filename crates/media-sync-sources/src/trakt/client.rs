use crate::error::SourceError;
use crate::traits::HistorySource;
use crate::trakt::{api, auth};
use crate::trakt::auth::{DeviceCode, DevicePoll, TokenGrant};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use media_sync_config::{Settings, TraktSettings};
use media_sync_models::WatchHistory;
use reqwest::Client;
use std::sync::Arc;

#[derive(Clone)]
pub struct TraktClient {
    client: Arc<Client>,
    settings: TraktSettings,
    page_size: u32,
}

impl TraktClient {
    pub fn new(settings: &Settings) -> Self {
        Self {
            client: Arc::new(auth::create_trakt_client()),
            settings: settings.trakt.clone(),
            page_size: settings.page_size,
        }
    }
}

#[async_trait]
impl HistorySource for TraktClient {
    fn source_name(&self) -> &str {
        "trakt"
    }

    async fn request_device_code(&self) -> Result<DeviceCode, SourceError> {
        auth::request_device_code(&self.client, &self.settings.api_url, &self.settings.client_id).await
    }

    async fn poll_device_token(&self, device_code: &str) -> Result<DevicePoll, SourceError> {
        auth::poll_device_token(
            &self.client,
            &self.settings.api_url,
            &self.settings.client_id,
            &self.settings.client_secret,
            device_code,
        )
        .await
    }

    async fn refresh_token(&self, refresh_token: &str) -> Result<TokenGrant, SourceError> {
        auth::refresh_access_token(
            &self.client,
            &self.settings.api_url,
            &self.settings.client_id,
            &self.settings.client_secret,
            refresh_token,
        )
        .await
    }

    async fn get_watch_history(
        &self,
        access_token: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<WatchHistory>, SourceError> {
        api::get_watch_history(
            &self.client,
            &self.settings.api_url,
            access_token,
            &self.settings.client_id,
            since,
            self.page_size,
        )
        .await
    }
}
