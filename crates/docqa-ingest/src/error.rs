//! Error types for the ingestion pipeline.

use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Result type for pipeline operations.
pub type IngestResult<T> = Result<T, IngestError>;

/// Result type for a single load attempt.
pub type LoadResult<T> = Result<T, LoadError>;

/// Errors that stop a pipeline run.
///
/// Failures of individual files never show up here; they are recorded in
/// the batch as [`crate::LoadOutcome`]s.
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid source: {0}")]
    Source(#[from] docqa_core::Error),

    #[error("Documents directory not found: {}", .0.display())]
    DirectoryNotFound(PathBuf),

    #[error("Not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("No usable content: none of the {scanned} scanned file(s) produced any text")]
    EmptyCorpus { scanned: usize },
}

impl IngestError {
    /// Whether this error comes from a bad location rather than bad content.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            IngestError::DirectoryNotFound(_)
                | IngestError::NotADirectory(_)
                | IngestError::FileNotFound(_)
        )
    }
}

/// Why one load attempt for one file failed.
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LoadError {
    #[error("Failed to read {}: {message}", .path.display())]
    Io { path: PathBuf, message: String },

    #[error("Parse error for {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },

    #[error("No extractable text in {}", .path.display())]
    NoText { path: PathBuf },

    #[error("Loading {} timed out after {timeout:?}", .path.display())]
    Timeout { path: PathBuf, timeout: Duration },

    #[error("Loader for {} aborted: {message}", .path.display())]
    Aborted { path: PathBuf, message: String },
}

impl LoadError {
    pub fn io(path: &Path, err: std::io::Error) -> Self {
        LoadError::Io {
            path: path.to_path_buf(),
            message: err.to_string(),
        }
    }

    pub fn parse(path: &Path, message: impl Into<String>) -> Self {
        LoadError::Parse {
            path: path.to_path_buf(),
            message: message.into(),
        }
    }

    pub fn no_text(path: &Path) -> Self {
        LoadError::NoText {
            path: path.to_path_buf(),
        }
    }
}
