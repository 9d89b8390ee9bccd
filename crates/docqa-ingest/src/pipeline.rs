//! The load-with-fallback pipeline.

use crate::batch::{Batch, LoadOutcome};
use crate::error::{IngestError, IngestResult, LoadError, LoadResult};
use crate::scan::scan_directory;
use crate::strategy::{BuiltinStrategies, Strategy, StrategyRunner};
use docqa_config::IngestConfig;
use docqa_core::{LoadedUnit, SourceFile};
use std::collections::HashSet;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Tunables for a pipeline run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineOptions {
    /// Upper bound for a single strategy attempt. `None` waits forever.
    pub load_timeout: Option<Duration>,
}

impl PipelineOptions {
    pub fn from_config(config: &IngestConfig) -> Self {
        Self {
            load_timeout: config.load_timeout(),
        }
    }
}

/// Loads every supported file of a directory into a [`Batch`].
///
/// Files are processed one at a time in enumeration order. A file that
/// cannot be loaded is recorded in the batch and the run carries on.
pub struct Pipeline {
    runner: Arc<dyn StrategyRunner>,
    options: PipelineOptions,
}

impl Pipeline {
    /// Create a pipeline using the built-in parsers.
    pub fn new(options: PipelineOptions) -> Self {
        Self::with_runner(Arc::new(BuiltinStrategies), options)
    }

    /// Create a pipeline with a custom strategy runner.
    pub fn with_runner(runner: Arc<dyn StrategyRunner>, options: PipelineOptions) -> Self {
        Self { runner, options }
    }

    pub fn from_config(config: &IngestConfig) -> Self {
        Self::new(PipelineOptions::from_config(config))
    }

    pub fn options(&self) -> PipelineOptions {
        self.options
    }

    /// Scan `dir` and load everything in it.
    ///
    /// Only a bad directory is an error. Per-file problems end up in the
    /// returned batch.
    pub fn run(&self, dir: &Path) -> IngestResult<Batch> {
        info!("Loading documents from {:?}", dir);
        let files = scan_directory(dir)?;
        Ok(self.process(files))
    }

    /// Load an already enumerated list of files.
    pub fn process(&self, files: Vec<SourceFile>) -> Batch {
        let mut batch = Batch::default();
        let mut seen = HashSet::new();

        for file in files {
            if !seen.insert(file.path.clone()) {
                debug!("Skipping duplicate entry {:?}", file.path);
                continue;
            }
            let (outcome, units) = self.load_one(&file);
            batch.push(file, outcome, units);
        }

        let summary = batch.summary();
        info!(
            "Batch complete: {} scanned, {} loaded, {} skipped, {} failed, {} unit(s)",
            summary.scanned, summary.loaded, summary.skipped, summary.failed, summary.units
        );

        batch
    }

    /// Load a single file, checking that it exists first.
    pub fn load_file(&self, path: &Path) -> IngestResult<Batch> {
        if !path.is_file() {
            return Err(IngestError::FileNotFound(path.to_path_buf()));
        }
        let file = SourceFile::from_path(path)?;
        Ok(self.process(vec![file]))
    }

    fn load_one(&self, file: &SourceFile) -> (LoadOutcome, Vec<LoadedUnit>) {
        let Some(primary) = Strategy::for_extension(&file.extension) else {
            debug!("No strategy for {} (extension {:?})", file.file_name, file.extension);
            return (
                LoadOutcome::SkippedUnsupported {
                    extension: file.extension.clone(),
                },
                Vec::new(),
            );
        };

        let primary_error = match self.attempt(primary, file) {
            Ok(units) => return loaded(file, primary, None, units),
            Err(e) => e,
        };

        let Some(fallback) = primary.fallback() else {
            warn!("{}: {} failed: {}", file.file_name, primary, primary_error);
            return (
                LoadOutcome::FailedPrimary {
                    error: primary_error,
                },
                Vec::new(),
            );
        };

        warn!(
            "{}: {} failed, trying {}: {}",
            file.file_name, primary, fallback, primary_error
        );

        match self.attempt(fallback, file) {
            Ok(units) => loaded(file, fallback, Some(primary_error), units),
            Err(fallback_error) => {
                warn!(
                    "{}: fallback {} failed too: {}",
                    file.file_name, fallback, fallback_error
                );
                (
                    LoadOutcome::FailedFallback {
                        primary: primary_error,
                        fallback: fallback_error,
                    },
                    Vec::new(),
                )
            }
        }
    }

    /// Run one strategy, bounded by the configured timeout.
    fn attempt(&self, strategy: Strategy, file: &SourceFile) -> LoadResult<Vec<LoadedUnit>> {
        debug!("Trying {} on {}", strategy, file.file_name);

        let Some(timeout) = self.options.load_timeout else {
            return run_guarded(self.runner.as_ref(), strategy, file);
        };

        let (tx, rx) = mpsc::channel();
        let runner = Arc::clone(&self.runner);
        let job = file.clone();
        thread::spawn(move || {
            let result = run_guarded(runner.as_ref(), strategy, &job);
            // The receiver is gone if we already timed out
            let _ = tx.send(result);
        });

        match rx.recv_timeout(timeout) {
            Ok(result) => result,
            Err(mpsc::RecvTimeoutError::Timeout) => Err(LoadError::Timeout {
                path: file.path.clone(),
                timeout,
            }),
            Err(mpsc::RecvTimeoutError::Disconnected) => Err(LoadError::Aborted {
                path: file.path.clone(),
                message: "loader thread exited without a result".to_string(),
            }),
        }
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(PipelineOptions::default())
    }
}

fn loaded(
    file: &SourceFile,
    strategy: Strategy,
    recovered_from: Option<LoadError>,
    mut units: Vec<LoadedUnit>,
) -> (LoadOutcome, Vec<LoadedUnit>) {
    units.retain(|u| !u.content.trim().is_empty());
    info!(
        "Loaded {} via {}: {} unit(s)",
        file.file_name,
        strategy,
        units.len()
    );
    (
        LoadOutcome::Loaded {
            units: units.len(),
            strategy,
            recovered_from,
        },
        units,
    )
}

/// Run a strategy, turning a panic into [`LoadError::Aborted`].
fn run_guarded(
    runner: &dyn StrategyRunner,
    strategy: Strategy,
    file: &SourceFile,
) -> LoadResult<Vec<LoadedUnit>> {
    panic::catch_unwind(AssertUnwindSafe(|| runner.run(strategy, file))).unwrap_or_else(|payload| {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "loader panicked".to_string());
        Err(LoadError::Aborted {
            path: file.path.clone(),
            message,
        })
    })
}
