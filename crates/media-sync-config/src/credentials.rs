use media_sync_models::CredentialRecord;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum CredentialStoreError {
    #[error("failed to write credentials to {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to serialize credentials: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Owner-only JSON file holding the one credential record.
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the stored record.
    ///
    /// A missing, unreadable or unparsable file all mean "no credentials".
    pub fn load(&self) -> Option<CredentialRecord> {
        if !self.path.exists() {
            debug!("No credential file at {}", self.path.display());
            return None;
        }

        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) => {
                warn!("Could not read credential file {}: {}", self.path.display(), e);
                return None;
            }
        };

        match serde_json::from_str(&content) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(
                    "Ignoring unparsable credential file {}: {}",
                    self.path.display(),
                    e
                );
                None
            }
        }
    }

    /// Replace the stored record.
    pub fn save(&self, record: &CredentialRecord) -> Result<(), CredentialStoreError> {
        let io_err = |source| CredentialStoreError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        let content = serde_json::to_string_pretty(record)?;

        // Write to temp file first, then rename for atomicity
        let temp_path = self.path.with_extension("json.tmp");
        let mut file = restricted_options().open(&temp_path).map_err(io_err)?;
        file.write_all(content.as_bytes()).map_err(io_err)?;
        file.sync_all().map_err(io_err)?;
        drop(file);

        fs::rename(&temp_path, &self.path).map_err(io_err)?;
        restrict_permissions(&self.path).map_err(io_err)?;

        debug!("Saved credentials to {}", self.path.display());
        Ok(())
    }

    /// Delete the stored record. Returns whether a file was removed.
    pub fn clear(&self) -> Result<bool, CredentialStoreError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(CredentialStoreError::Io {
                path: self.path.clone(),
                source,
            }),
        }
    }
}

fn restricted_options() -> fs::OpenOptions {
    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    options
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> io::Result<()> {
    Ok(())
}
