pub mod config;
pub mod credentials;
pub mod paths;

pub use config::{
    check_history_days, Config, ConfigError, Settings, SyncOptions, TogglConfig, TogglSettings,
    TraktConfig, TraktSettings, MAX_HISTORY_DAYS,
};
pub use credentials::{CredentialStore, CredentialStoreError};
pub use paths::{PathManager, base_path_override};
