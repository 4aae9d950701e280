//! On-disk layout.
//!
//! ```text
//! ~/.splyt/
//!   config.json
//!   depot/          checkpoint and archived bins
//!   logs/splyt.jsonl
//! ```

use crate::{CoreError, CoreResult};
use std::path::{Path, PathBuf};

/// Overrides the home-based root.
pub const HOME_ENV: &str = "SPLYT_HOME";

/// Locations under the SDK root directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
    root: PathBuf,
}

impl Paths {
    /// `$SPLYT_HOME`, falling back to `~/.splyt`.
    pub fn new() -> CoreResult<Self> {
        if let Some(root) = std::env::var_os(HOME_ENV).filter(|root| !root.is_empty()) {
            return Ok(Self::with_base_dir(root.into()));
        }
        dirs::home_dir()
            .map(|home| Self::with_base_dir(home.join(".splyt")))
            .ok_or_else(|| CoreError::Path("no home directory to place ~/.splyt in".to_string()))
    }

    pub fn with_base_dir(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn base_dir(&self) -> &Path {
        &self.root
    }

    pub fn config_file(&self) -> PathBuf {
        self.root.join("config.json")
    }

    /// Blob store directory for the event depot.
    pub fn depot_dir(&self) -> PathBuf {
        self.root.join("depot")
    }

    pub fn log_file(&self) -> PathBuf {
        self.root.join("logs").join("splyt.jsonl")
    }

    /// Create the root and depot directories.
    pub fn ensure_dirs(&self) -> CoreResult<()> {
        std::fs::create_dir_all(self.depot_dir())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_layout_under_root() {
        let paths = Paths::with_base_dir(PathBuf::from("/srv/splyt"));
        assert_eq!(paths.base_dir(), Path::new("/srv/splyt"));
        assert_eq!(paths.config_file(), Path::new("/srv/splyt/config.json"));
        assert_eq!(paths.depot_dir(), Path::new("/srv/splyt/depot"));
        assert_eq!(paths.log_file(), Path::new("/srv/splyt/logs/splyt.jsonl"));
    }

    #[test]
    fn test_ensure_dirs() {
        let dir = tempdir().unwrap();
        let paths = Paths::with_base_dir(dir.path().join("nested").join("splyt"));

        paths.ensure_dirs().unwrap();

        assert!(paths.base_dir().is_dir());
        assert!(paths.depot_dir().is_dir());
    }
}
