use crate::error::{read_json, SourceError};
use crate::trakt::auth::{API_VERSION, SERVICE};
use chrono::{DateTime, SecondsFormat, Utc};
use media_sync_models::{WatchHistory, WatchedMedia};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

#[derive(Debug, Deserialize)]
struct TraktMovie {
    title: String,
    year: Option<u32>,
    runtime: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct TraktShow {
    title: String,
}

#[derive(Debug, Deserialize)]
struct TraktEpisode {
    title: Option<String>,
    season: Option<u32>,
    number: Option<u32>,
    runtime: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct TraktHistoryItem {
    id: Option<u64>,
    watched_at: String,
    #[serde(rename = "type")]
    item_type: String,
    movie: Option<TraktMovie>,
    show: Option<TraktShow>,
    episode: Option<TraktEpisode>,
}

impl TraktHistoryItem {
    /// `Ok(None)` for item types the history sync does not handle.
    fn into_watch_history(self) -> Result<Option<WatchHistory>, SourceError> {
        let (media, runtime) = match self.item_type.as_str() {
            "episode" => {
                let episode = self
                    .episode
                    .ok_or_else(|| SourceError::decode(SERVICE, "missing episode data"))?;
                let show = self
                    .show
                    .ok_or_else(|| SourceError::decode(SERVICE, "missing show data for episode"))?;
                (
                    WatchedMedia::Episode {
                        show_title: show.title,
                        season: episode.season.unwrap_or(0),
                        number: episode.number.unwrap_or(0),
                        title: episode.title,
                    },
                    episode.runtime,
                )
            }
            "movie" => {
                let movie = self
                    .movie
                    .ok_or_else(|| SourceError::decode(SERVICE, "missing movie data"))?;
                (
                    WatchedMedia::Movie {
                        title: movie.title,
                        year: movie.year,
                    },
                    movie.runtime,
                )
            }
            other => {
                warn!(
                    "Skipping Trakt history item of unsupported type '{}' (id={:?})",
                    other, self.id
                );
                return Ok(None);
            }
        };

        let watched_at = DateTime::parse_from_rfc3339(&self.watched_at).map_err(|e| {
            SourceError::decode(
                SERVICE,
                format!("invalid watched_at '{}': {}", self.watched_at, e),
            )
        })?;

        Ok(Some(WatchHistory {
            watched_at,
            media,
            runtime_minutes: runtime.unwrap_or(0),
        }))
    }
}

async fn fetch_history_page(
    client: &Client,
    base_url: &str,
    access_token: &str,
    client_id: &str,
    start_at: &str,
    page: u32,
    page_size: u32,
) -> Result<Vec<TraktHistoryItem>, SourceError> {
    let page_param = page.to_string();
    let limit_param = page_size.to_string();

    let response = client
        .get(format!("{}/sync/history", base_url))
        .query(&[
            ("extended", "full"),
            ("start_at", start_at),
            ("page", page_param.as_str()),
            ("limit", limit_param.as_str()),
        ])
        .header("Authorization", format!("Bearer {}", access_token))
        .header("trakt-api-version", API_VERSION)
        .header("trakt-api-key", client_id)
        .header("Content-Type", "application/json")
        .send()
        .await
        .map_err(SourceError::transport(SERVICE))?;

    if !response.status().is_success() {
        return Err(SourceError::from_response(SERVICE, response).await);
    }

    read_json(SERVICE, response).await
}

/// Fetch watch history since `since`, page by page until an empty page.
///
/// Any failed page fails the whole fetch; partial history is never returned.
pub async fn get_watch_history(
    client: &Client,
    base_url: &str,
    access_token: &str,
    client_id: &str,
    since: DateTime<Utc>,
    page_size: u32,
) -> Result<Vec<WatchHistory>, SourceError> {
    let start_at = since.to_rfc3339_opts(SecondsFormat::Millis, true);
    let mut all_history = Vec::new();
    let mut page = 1;

    loop {
        let items = fetch_history_page(
            client,
            base_url,
            access_token,
            client_id,
            &start_at,
            page,
            page_size,
        )
        .await?;

        if items.is_empty() {
            break;
        }

        debug!(page, items = items.len(), "Fetched Trakt history page");
        for item in items {
            if let Some(history) = item.into_watch_history()? {
                all_history.push(history);
            }
        }
        page += 1;
    }

    debug!(
        "Fetched Trakt watch history: total_items={}, requests={}",
        all_history.len(),
        page
    );

    Ok(all_history)
}
