//! Where docqa keeps its own files.

use directories::ProjectDirs;
use std::path::{Path, PathBuf};

/// Config and data locations.
///
/// The documents folder is not part of this; it comes from the config.
#[derive(Debug, Clone)]
pub struct AppPaths {
    pub config_dir: PathBuf,
    pub data_dir: PathBuf,
    pub config_file: PathBuf,
    /// Line history of the chat prompt.
    pub history_file: PathBuf,
    /// Saved chat transcripts, one JSON file per session.
    pub transcript_dir: PathBuf,
}

impl AppPaths {
    /// Platform specific locations, `None` when the home directory is unknown.
    pub fn new() -> Option<Self> {
        let proj_dirs = ProjectDirs::from("com", "docqa", "docqa")?;
        Some(Self::from_dirs(proj_dirs.config_dir(), proj_dirs.data_dir()))
    }

    /// Lay out the files under explicit config and data directories.
    pub fn from_dirs(config_dir: &Path, data_dir: &Path) -> Self {
        Self {
            config_file: config_dir.join("config.toml"),
            history_file: data_dir.join("chat_history"),
            transcript_dir: data_dir.join("transcripts"),
            config_dir: config_dir.to_path_buf(),
            data_dir: data_dir.to_path_buf(),
        }
    }

    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.config_dir)?;
        std::fs::create_dir_all(&self.data_dir)?;
        std::fs::create_dir_all(&self.transcript_dir)?;
        Ok(())
    }

    /// `docqa init` has written a config file.
    pub fn is_initialized(&self) -> bool {
        self.config_file.exists()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_paths() {
        let paths = AppPaths::new().unwrap();
        assert!(paths.config_file.ends_with("config.toml"));
        assert!(paths.history_file.starts_with(&paths.data_dir));
    }

    #[test]
    fn test_initialization() {
        let root = tempfile::tempdir().unwrap();
        let paths = AppPaths::from_dirs(&root.path().join("config"), &root.path().join("data"));
        assert!(!paths.is_initialized());

        paths.ensure_dirs().unwrap();
        assert!(paths.transcript_dir.is_dir());
        assert!(!paths.is_initialized());

        crate::Config::create_default_file(&paths.config_file).unwrap();
        assert!(paths.is_initialized());
    }
}
