use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_TRAKT_API_URL: &str = "https://api.trakt.tv";
pub const DEFAULT_TOGGL_API_URL: &str = "https://api.track.toggl.com/api/v9";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("failed to load .env file: {0}")]
    Dotenv(#[from] dotenvy::Error),
    #[error("missing required configuration: {}", .0.join(", "))]
    Missing(Vec<&'static str>),
    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Raw configuration as read from `config.toml` and the environment.
///
/// Every field is optional here; [`Config::validate`] turns it into [`Settings`].
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub trakt: TraktConfig,
    #[serde(default)]
    pub toggl: TogglConfig,
    #[serde(default)]
    pub sync: SyncOptions,
}

#[derive(Default, Clone, Serialize, Deserialize)]
pub struct TraktConfig {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub history_days: Option<u32>,
    pub api_url: Option<String>,
}

#[derive(Default, Clone, Serialize, Deserialize)]
pub struct TogglConfig {
    pub api_token: Option<String>,
    pub workspace_id: Option<u64>,
    pub project_id: Option<u64>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub api_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncOptions {
    #[serde(default = "default_expiration_buffer_minutes")]
    pub expiration_buffer_minutes: u32,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            expiration_buffer_minutes: default_expiration_buffer_minutes(),
            page_size: default_page_size(),
        }
    }
}

fn default_expiration_buffer_minutes() -> u32 {
    60
}

fn default_page_size() -> u32 {
    100
}

fn default_history_days() -> u32 {
    7
}

/// Longest history window accepted, in days.
pub const MAX_HISTORY_DAYS: u32 = 36_500;

/// Check a history window taken from `key`. Anything past
/// [`MAX_HISTORY_DAYS`] is rejected so the cutoff stays a real date.
pub fn check_history_days(key: &'static str, days: u32) -> Result<u32, ConfigError> {
    if days > MAX_HISTORY_DAYS {
        return Err(ConfigError::Invalid {
            key,
            reason: format!("{} days exceeds the maximum of {}", days, MAX_HISTORY_DAYS),
        });
    }
    Ok(days)
}

/// Validated, immutable settings handed to every component.
#[derive(Debug, Clone)]
pub struct Settings {
    pub trakt: TraktSettings,
    pub toggl: TogglSettings,
    pub history_days: u32,
    pub expiration_buffer: Duration,
    pub page_size: u32,
}

impl Settings {
    pub fn with_history_days(mut self, days: u32) -> Self {
        self.history_days = days;
        self
    }
}

#[derive(Clone)]
pub struct TraktSettings {
    pub client_id: String,
    pub client_secret: String,
    pub api_url: String,
}

#[derive(Clone)]
pub struct TogglSettings {
    pub api_token: String,
    pub workspace_id: u64,
    pub project_id: u64,
    pub tags: Vec<String>,
    pub api_url: String,
}

impl fmt::Debug for TraktConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TraktConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_deref().map(mask))
            .field("history_days", &self.history_days)
            .field("api_url", &self.api_url)
            .finish()
    }
}

impl fmt::Debug for TogglConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TogglConfig")
            .field("api_token", &self.api_token.as_deref().map(mask))
            .field("workspace_id", &self.workspace_id)
            .field("project_id", &self.project_id)
            .field("tags", &self.tags)
            .field("api_url", &self.api_url)
            .finish()
    }
}

impl fmt::Debug for TraktSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TraktSettings")
            .field("client_id", &self.client_id)
            .field("client_secret", &mask(&self.client_secret))
            .field("api_url", &self.api_url)
            .finish()
    }
}

impl fmt::Debug for TogglSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TogglSettings")
            .field("api_token", &mask(&self.api_token))
            .field("workspace_id", &self.workspace_id)
            .field("project_id", &self.project_id)
            .field("tags", &self.tags)
            .field("api_url", &self.api_url)
            .finish()
    }
}

fn mask(secret: &str) -> String {
    if secret.chars().count() <= 4 {
        "****".to_string()
    } else {
        let head: String = secret.chars().take(4).collect();
        format!("{}****", head)
    }
}

impl Config {
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// File (when present) overlaid with the process environment.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let config = if path.exists() {
            Self::load_from_file(path)?
        } else {
            tracing::debug!("No config file at {}, using environment only", path.display());
            Self::default()
        };
        config.with_process_env()
    }

    /// Like [`Config::load`], but for a path the user named: the file must exist.
    pub fn load_required(path: &Path) -> Result<Self, ConfigError> {
        Self::load_from_file(path)?.with_process_env()
    }

    fn with_process_env(mut self) -> Result<Self, ConfigError> {
        self.apply_env(|key| std::env::var(key).ok())?;
        Ok(self)
    }

    /// Load `.env` from the working directory without overriding variables that are already set.
    pub fn load_dotenv() -> Result<(), ConfigError> {
        match dotenvy::dotenv() {
            Ok(path) => {
                tracing::debug!("Loaded environment from {}", path.display());
                Ok(())
            }
            Err(e) if e.not_found() => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Overlay values from an environment lookup. Blank values count as unset.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        if let Some(value) = get("TRAKT_CLIENT_ID") {
            self.trakt.client_id = Some(value);
        }
        if let Some(value) = get("TRAKT_CLIENT_SECRET") {
            self.trakt.client_secret = Some(value);
        }
        if let Some(value) = get("TRAKT_HISTORY_DAYS") {
            self.trakt.history_days = Some(parse_number("TRAKT_HISTORY_DAYS", &value)?);
        }
        if let Some(value) = get("TRAKT_API_URL") {
            self.trakt.api_url = Some(value);
        }
        if let Some(value) = get("TOGGL_API_TOKEN") {
            self.toggl.api_token = Some(value);
        }
        if let Some(value) = get("TOGGL_WORKSPACE_ID") {
            self.toggl.workspace_id = Some(parse_number("TOGGL_WORKSPACE_ID", &value)?);
        }
        if let Some(value) = get("TOGGL_PROJECT_ID") {
            self.toggl.project_id = Some(parse_number("TOGGL_PROJECT_ID", &value)?);
        }
        if let Some(value) = lookup("TOGGL_TAGS") {
            self.toggl.tags = parse_tags(&value);
        }
        if let Some(value) = get("TOGGL_API_URL") {
            self.toggl.api_url = Some(value);
        }

        Ok(())
    }

    /// Check that every required value is present, reporting all gaps at once.
    pub fn validate(&self) -> Result<Settings, ConfigError> {
        let mut missing = Vec::new();

        let client_id = required(&self.trakt.client_id, "TRAKT_CLIENT_ID", &mut missing);
        let client_secret = required(&self.trakt.client_secret, "TRAKT_CLIENT_SECRET", &mut missing);
        let api_token = required(&self.toggl.api_token, "TOGGL_API_TOKEN", &mut missing);
        if self.toggl.workspace_id.is_none() {
            missing.push("TOGGL_WORKSPACE_ID");
        }
        if self.toggl.project_id.is_none() {
            missing.push("TOGGL_PROJECT_ID");
        }

        let (client_id, client_secret, api_token, workspace_id, project_id) = match (
            client_id,
            client_secret,
            api_token,
            self.toggl.workspace_id,
            self.toggl.project_id,
        ) {
            (Some(a), Some(b), Some(c), Some(d), Some(e)) => (a, b, c, d, e),
            _ => return Err(ConfigError::Missing(missing)),
        };

        let history_days = check_history_days(
            "TRAKT_HISTORY_DAYS",
            self.trakt.history_days.unwrap_or_else(default_history_days),
        )?;

        if self.sync.page_size == 0 {
            return Err(ConfigError::Invalid {
                key: "sync.page_size",
                reason: "must be greater than zero".to_string(),
            });
        }

        Ok(Settings {
            trakt: TraktSettings {
                client_id,
                client_secret,
                api_url: base_url(self.trakt.api_url.as_deref(), DEFAULT_TRAKT_API_URL),
            },
            toggl: TogglSettings {
                api_token,
                workspace_id,
                project_id,
                tags: self
                    .toggl
                    .tags
                    .iter()
                    .map(|tag| tag.trim().to_string())
                    .filter(|tag| !tag.is_empty())
                    .collect(),
                api_url: base_url(self.toggl.api_url.as_deref(), DEFAULT_TOGGL_API_URL),
            },
            history_days,
            expiration_buffer: Duration::minutes(i64::from(self.sync.expiration_buffer_minutes)),
            page_size: self.sync.page_size,
        })
    }
}

fn required(
    value: &Option<String>,
    key: &'static str,
    missing: &mut Vec<&'static str>,
) -> Option<String> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Some(v.to_string()),
        _ => {
            missing.push(key);
            None
        }
    }
}

fn parse_number<T>(key: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: fmt::Display,
{
    value.parse().map_err(|e: T::Err| ConfigError::Invalid {
        key,
        reason: format!("'{}' is not a valid number ({})", value, e),
    })
}

/// Split a comma separated tag list, dropping blank segments.
pub fn parse_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

fn base_url(configured: Option<&str>, default: &str) -> String {
    configured
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .unwrap_or(default)
        .trim_end_matches('/')
        .to_string()
}
