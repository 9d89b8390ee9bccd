//! CLI command implementations.

pub mod ask;
pub mod chat;
pub mod config;
pub mod corpus;
pub mod init;
pub mod scan;

use anyhow::{Context, Result};
use clap::Args;
use docqa_config::{AppPaths, Config};
use std::path::PathBuf;

/// Where documents are loaded from.
#[derive(Args, Debug, Clone, Default)]
pub struct SourceArgs {
    /// Documents folder (default: general.documents_dir from config)
    #[arg(short, long, env = "DOCQA_DOCUMENTS_DIR", conflicts_with = "file")]
    pub dir: Option<PathBuf>,

    /// Load a single file instead of a folder
    #[arg(short, long)]
    pub file: Option<PathBuf>,
}

/// What a command should load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Directory(PathBuf),
    File(PathBuf),
}

impl SourceArgs {
    /// Resolve against the configuration. Explicit flags win.
    pub fn target(&self, config: &Config) -> Target {
        if let Some(file) = &self.file {
            return Target::File(docqa_config::expand_path(&file.to_string_lossy()));
        }
        match &self.dir {
            Some(dir) => Target::Directory(docqa_config::expand_path(&dir.to_string_lossy())),
            None => Target::Directory(config.documents_path()),
        }
    }
}

/// Get the application paths.
pub fn get_paths() -> Result<AppPaths> {
    AppPaths::new().context("Failed to determine application directories")
}

/// Load the configuration, falling back to defaults when there is no file.
pub fn load_config() -> Result<Config> {
    let config = Config::load().context("Failed to load configuration")?;
    if !config.ui.color {
        colored::control::set_override(false);
    }
    Ok(config)
}
