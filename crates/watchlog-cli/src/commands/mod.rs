pub mod auth;
pub mod logout;
pub mod status;
pub mod sync;
pub mod sync_ui;

use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use media_sync_config::{Config, CredentialStore, PathManager};
use std::path::{Path, PathBuf};

/// Config file overlaid with the environment. Not validated.
///
/// A path given with `--config`/`WATCHLOG_CONFIG` must exist; the default
/// location may be absent.
pub fn load_config(config_path: Option<&Path>) -> Result<Config> {
    let config_file = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathManager::default().config_file());
    tracing::debug!(operation = "load_config", path = %config_file.display(), "Loading configuration");

    let config = match config_path {
        Some(path) => Config::load_required(path),
        None => Config::load(&config_file),
    };
    config.wrap_err_with(|| format!("Failed to load configuration from {}", config_file.display()))
}

pub fn credentials_path() -> PathBuf {
    std::env::var_os("WATCHLOG_CREDENTIALS")
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathManager::default().credentials_file())
}

pub fn credential_store() -> CredentialStore {
    CredentialStore::new(credentials_path())
}
