//! Per-file outcomes and the batch they add up to.

use crate::error::{IngestError, IngestResult, LoadError};
use crate::strategy::Strategy;
use docqa_core::{LoadedUnit, SourceFile};
use serde::Serialize;
use sha2::{Digest, Sha256};

/// What happened to one source file.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LoadOutcome {
    /// The file produced `units` units. `recovered_from` holds the primary
    /// failure when the units came from the fallback.
    Loaded {
        units: usize,
        strategy: Strategy,
        recovered_from: Option<LoadError>,
    },
    /// No strategy handles the extension.
    SkippedUnsupported { extension: String },
    /// The primary strategy failed and declares no fallback.
    FailedPrimary { error: LoadError },
    /// Primary and fallback both failed.
    FailedFallback {
        primary: LoadError,
        fallback: LoadError,
    },
}

impl LoadOutcome {
    pub fn is_loaded(&self) -> bool {
        matches!(self, LoadOutcome::Loaded { .. })
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, LoadOutcome::SkippedUnsupported { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(
            self,
            LoadOutcome::FailedPrimary { .. } | LoadOutcome::FailedFallback { .. }
        )
    }

    /// Units contributed to the batch.
    pub fn unit_count(&self) -> usize {
        match self {
            LoadOutcome::Loaded { units, .. } => *units,
            _ => 0,
        }
    }

    /// Every failure recorded for the file, primary first.
    pub fn errors(&self) -> Vec<&LoadError> {
        match self {
            LoadOutcome::Loaded {
                recovered_from: Some(error),
                ..
            } => vec![error],
            LoadOutcome::FailedPrimary { error } => vec![error],
            LoadOutcome::FailedFallback { primary, fallback } => vec![primary, fallback],
            _ => vec![],
        }
    }
}

impl std::fmt::Display for LoadOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadOutcome::Loaded {
                units,
                strategy,
                recovered_from: None,
            } => write!(f, "loaded {} unit(s) via {}", units, strategy),
            LoadOutcome::Loaded {
                units,
                strategy,
                recovered_from: Some(primary),
            } => write!(
                f,
                "loaded {} unit(s) via {} after primary failure: {}",
                units, strategy, primary
            ),
            LoadOutcome::SkippedUnsupported { extension } if extension.is_empty() => {
                write!(f, "skipped: no file extension")
            }
            LoadOutcome::SkippedUnsupported { extension } => {
                write!(f, "skipped: unsupported file type .{}", extension)
            }
            LoadOutcome::FailedPrimary { error } => write!(f, "failed: {}", error),
            LoadOutcome::FailedFallback { primary, fallback } => {
                write!(f, "failed: {}; fallback also failed: {}", primary, fallback)
            }
        }
    }
}

/// Outcome for one scanned file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileReport {
    pub file: SourceFile,
    pub outcome: LoadOutcome,
}

/// Counts over a batch, for display and JSON output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub scanned: usize,
    pub loaded: usize,
    pub skipped: usize,
    pub failed: usize,
    pub units: usize,
}

/// Result of one pipeline run: per-file reports in scan order and the
/// loaded units in the same order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Batch {
    pub reports: Vec<FileReport>,
    pub units: Vec<LoadedUnit>,
}

impl Batch {
    pub(crate) fn push(&mut self, file: SourceFile, outcome: LoadOutcome, units: Vec<LoadedUnit>) {
        debug_assert!(outcome.is_loaded() || units.is_empty());
        self.units.extend(units);
        self.reports.push(FileReport { file, outcome });
    }

    pub fn total_scanned(&self) -> usize {
        self.reports.len()
    }

    pub fn loaded_count(&self) -> usize {
        self.loaded().count()
    }

    pub fn skipped_count(&self) -> usize {
        self.skipped().count()
    }

    pub fn failed_count(&self) -> usize {
        self.failures().count()
    }

    pub fn unit_count(&self) -> usize {
        self.units.len()
    }

    /// True when no usable content was produced.
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn loaded(&self) -> impl Iterator<Item = &FileReport> {
        self.reports.iter().filter(|r| r.outcome.is_loaded())
    }

    pub fn skipped(&self) -> impl Iterator<Item = &FileReport> {
        self.reports.iter().filter(|r| r.outcome.is_skipped())
    }

    pub fn failures(&self) -> impl Iterator<Item = &FileReport> {
        self.reports.iter().filter(|r| r.outcome.is_failed())
    }

    pub fn summary(&self) -> BatchSummary {
        BatchSummary {
            scanned: self.total_scanned(),
            loaded: self.loaded_count(),
            skipped: self.skipped_count(),
            failed: self.failed_count(),
            units: self.unit_count(),
        }
    }

    /// SHA-256 over the unit sequence. Equal for runs over an unchanged
    /// directory.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for unit in &self.units {
            hasher.update(unit.source.as_bytes());
            hasher.update([0u8]);
            hasher.update(unit.content.as_bytes());
            hasher.update([0u8]);
        }
        hasher
            .finalize()
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect()
    }

    /// Hand the units off for indexing.
    ///
    /// An empty unit sequence is [`IngestError::EmptyCorpus`]: callers must
    /// stop rather than index nothing.
    pub fn into_corpus(self) -> IngestResult<Vec<LoadedUnit>> {
        if self.units.is_empty() {
            return Err(IngestError::EmptyCorpus {
                scanned: self.reports.len(),
            });
        }
        Ok(self.units)
    }
}
