//! Docqa Ingest - Document loading pipeline.
//!
//! This crate provides:
//! - Directory scanning (non-recursive)
//! - Per-extension loading strategies with a generic fallback
//! - The batch report of what loaded, what was skipped and what failed
//! - Content chunking for retrieval

mod batch;
mod chunker;
mod error;
mod parsers;
mod pipeline;
mod scan;
mod strategy;

pub use batch::{Batch, BatchSummary, FileReport, LoadOutcome};
pub use chunker::{ChunkConfig, Chunker};
pub use error::{IngestError, IngestResult, LoadError, LoadResult};
pub use parsers::DocumentParser;
pub use pipeline::{Pipeline, PipelineOptions};
pub use scan::scan_directory;
pub use strategy::{BuiltinStrategies, Strategy, StrategyRunner};
