use crate::error::{read_json, SourceError};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::fmt;

const REDIRECT_URI: &str = "urn:ietf:wg:oauth:2.0:oob";
pub(crate) const SERVICE: &str = "trakt";
pub(crate) const API_VERSION: &str = "2";

/// Poll statuses that mean "keep waiting": pending approval (400), unknown
/// code (404), expired code (410), denied (418) and slow down (429).
pub const PENDING_STATUSES: [u16; 5] = [400, 404, 410, 418, 429];

pub fn create_trakt_client() -> Client {
    Client::builder()
        .user_agent(concat!("watchlog/", env!("CARGO_PKG_VERSION")))
        .build()
        .unwrap_or_else(|_| Client::new())
}

/// Codes handed out at the start of the device flow.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeviceCode {
    pub device_code: String,
    pub user_code: String,
    pub verification_url: String,
    pub expires_in: u64,
    /// Seconds to wait between token polls.
    pub interval: u64,
}

/// Token pair returned by the device-token and refresh endpoints.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenGrant {
    pub access_token: String,
    pub refresh_token: String,
    /// Lifetime in seconds.
    pub expires_in: i64,
}

impl fmt::Debug for TokenGrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenGrant")
            .field("access_token", &"***")
            .field("refresh_token", &"***")
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

#[derive(Debug)]
pub enum DevicePoll {
    Authorized(TokenGrant),
    /// Not approved yet; carries the status the provider answered with.
    Pending(u16),
}

pub async fn request_device_code(
    client: &Client,
    base_url: &str,
    client_id: &str,
) -> Result<DeviceCode, SourceError> {
    let response = client
        .post(format!("{}/oauth/device/code", base_url))
        .json(&serde_json::json!({ "client_id": client_id }))
        .header("Content-Type", "application/json")
        .header("trakt-api-version", API_VERSION)
        .header("trakt-api-key", client_id)
        .send()
        .await
        .map_err(SourceError::transport(SERVICE))?;

    if !response.status().is_success() {
        return Err(SourceError::from_response(SERVICE, response).await);
    }

    read_json(SERVICE, response).await
}

/// Ask once whether the user has approved `device_code`.
pub async fn poll_device_token(
    client: &Client,
    base_url: &str,
    client_id: &str,
    client_secret: &str,
    device_code: &str,
) -> Result<DevicePoll, SourceError> {
    let payload = serde_json::json!({
        "code": device_code,
        "client_id": client_id,
        "client_secret": client_secret,
    });

    let response = client
        .post(format!("{}/oauth/device/token", base_url))
        .json(&payload)
        .header("Content-Type", "application/json")
        .send()
        .await
        .map_err(SourceError::transport(SERVICE))?;

    let status = response.status();
    if status == StatusCode::OK {
        return Ok(DevicePoll::Authorized(read_json(SERVICE, response).await?));
    }
    if PENDING_STATUSES.contains(&status.as_u16()) {
        return Ok(DevicePoll::Pending(status.as_u16()));
    }

    Err(SourceError::from_response(SERVICE, response).await)
}

pub async fn refresh_access_token(
    client: &Client,
    base_url: &str,
    client_id: &str,
    client_secret: &str,
    refresh_token: &str,
) -> Result<TokenGrant, SourceError> {
    let payload = serde_json::json!({
        "refresh_token": refresh_token,
        "client_id": client_id,
        "client_secret": client_secret,
        "redirect_uri": REDIRECT_URI,
        "grant_type": "refresh_token"
    });

    let response = client
        .post(format!("{}/oauth/token", base_url))
        .json(&payload)
        .header("Accept", "application/json")
        .header("Content-Type", "application/json")
        .send()
        .await
        .map_err(SourceError::transport(SERVICE))?;

    if !response.status().is_success() {
        return Err(SourceError::from_response(SERVICE, response).await);
    }

    read_json(SERVICE, response).await
}
