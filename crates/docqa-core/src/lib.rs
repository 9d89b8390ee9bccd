//! Docqa Core - Core types and domain models for document question answering.

mod error;
mod types;

pub use error::{Error, Result};
pub use types::*;
