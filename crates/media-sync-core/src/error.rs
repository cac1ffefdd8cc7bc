use media_sync_config::{ConfigError, CredentialStoreError};
use media_sync_sources::SourceError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigError),

    /// Device flow rejected or errored.
    #[error("authentication failed: {0}")]
    Authentication(#[source] SourceError),

    /// Refresh endpoint rejected the stored refresh token. Not retried.
    #[error("token refresh failed: {0}")]
    Refresh(#[source] SourceError),

    /// A history page failed; the run saw no history at all.
    #[error("failed to retrieve watch history: {0}")]
    Retrieval(#[source] SourceError),

    /// Per-item failure; never escapes the item loop.
    #[error("failed to submit time entry '{description}': {source}")]
    Submission {
        description: String,
        #[source]
        source: SourceError,
    },

    #[error("credential store error: {0}")]
    CredentialStore(#[from] CredentialStoreError),
}

impl SyncError {
    /// Whether the run can carry on with the next item.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, SyncError::Submission { .. })
    }
}
