//! Errors raised by the core types.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A transcript could not be written as JSON.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Path has no file name: {}", .0.display())]
    NoFileName(PathBuf),
}

pub type Result<T> = std::result::Result<T, Error>;
