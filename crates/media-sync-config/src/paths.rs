use std::io;
use std::path::{Path, PathBuf};

/// Base directory override taken from `WATCHLOG_BASE_PATH` (containers, tests).
pub fn base_path_override() -> Option<PathBuf> {
    std::env::var_os("WATCHLOG_BASE_PATH")
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}

pub struct PathManager {
    config_dir: PathBuf,
    log_dir: PathBuf,
}

impl PathManager {
    /// Platform paths, e.g. `~/.config/watchlog` on Linux.
    pub fn new() -> Option<Self> {
        let base_dir = dirs::config_dir()?.join("watchlog");
        Some(Self::from_base(base_dir))
    }

    pub fn from_base(base: PathBuf) -> Self {
        Self {
            log_dir: base.join("logs"),
            config_dir: base,
        }
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join("config.toml")
    }

    pub fn credentials_file(&self) -> PathBuf {
        self.config_dir.join("trakt_tokens.json")
    }

    pub fn log_file(&self) -> PathBuf {
        self.log_dir.join("watchlog.log")
    }

    pub fn ensure_directories(&self) -> io::Result<()> {
        std::fs::create_dir_all(&self.config_dir)?;
        std::fs::create_dir_all(&self.log_dir)?;
        Ok(())
    }
}

impl Default for PathManager {
    fn default() -> Self {
        if let Some(base) = base_path_override() {
            return Self::from_base(base);
        }

        // No platform config dir (e.g. minimal containers): keep everything next to the working directory
        Self::new().unwrap_or_else(|| Self::from_base(PathBuf::from(".")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_derive_from_base() {
        let paths = PathManager::from_base(PathBuf::from("/srv/watchlog"));
        assert_eq!(paths.config_file(), PathBuf::from("/srv/watchlog/config.toml"));
        assert_eq!(
            paths.credentials_file(),
            PathBuf::from("/srv/watchlog/trakt_tokens.json")
        );
        assert_eq!(paths.log_file(), PathBuf::from("/srv/watchlog/logs/watchlog.log"));
    }

    #[test]
    fn test_ensure_directories_creates_tree() {
        let dir = tempfile::tempdir().unwrap();
        let paths = PathManager::from_base(dir.path().join("nested"));
        paths.ensure_directories().unwrap();
        assert!(paths.config_dir().is_dir());
        assert!(paths.log_dir().is_dir());
    }
}
