//! Placeholder discovery across documents.
//!
//! Each file is scanned into its own [`Accumulator`]. Files run on a bounded
//! worker pool and the accumulators are merged in input order once every
//! task has finished, so no state is shared between workers.

mod aggregate;
mod result;

use std::path::{Path, PathBuf};
use std::time::Instant;

use rayon::prelude::*;
use tracing::{info, warn};

pub use aggregate::{Accumulator, Placeholder, PlaceholderLocation};
pub(crate) use result::serialize_millis;
pub use result::{BatchStatus, ScanResult};

use crate::cancel::CancellationToken;
use crate::error::{EngineError, FileError};
use crate::package::{DocumentPackage, PackageOpener};
use crate::pattern::{PatternOptions, PlaceholderPattern};
use crate::resolver::resolve;
use crate::traversal::traverse;

/// Build the worker pool that bounds per-file parallelism.
///
/// A cap of zero uses rayon's default thread count.
pub(crate) fn worker_pool(cap: usize) -> Result<rayon::ThreadPool, EngineError> {
    let threads = if cap == 0 {
        rayon::current_num_threads()
    } else {
        cap
    };
    Ok(rayon::ThreadPoolBuilder::new().num_threads(threads).build()?)
}

/// Scans documents for placeholders.
pub struct Scanner<O> {
    opener: O,
    max_parallelism: usize,
}

impl<O: PackageOpener> Scanner<O> {
    pub fn new(opener: O) -> Self {
        Self {
            opener,
            max_parallelism: 0,
        }
    }

    /// Limit concurrent file scans. Zero means one per available core.
    #[must_use]
    pub fn with_max_parallelism(mut self, cap: usize) -> Self {
        self.max_parallelism = cap;
        self
    }

    /// Scan `files` with one compiled pattern.
    ///
    /// Per-file failures are recorded in the result. Only a worker pool
    /// failure aborts the call.
    pub fn scan(
        &self,
        files: &[PathBuf],
        pattern: &PlaceholderPattern,
        cancel: &CancellationToken,
    ) -> Result<ScanResult, EngineError> {
        let start = Instant::now();
        let pool = worker_pool(self.max_parallelism)?;

        let outcomes: Vec<Result<Accumulator, EngineError>> = pool.install(|| {
            files
                .par_iter()
                .map(|path| self.scan_file(path, pattern, cancel))
                .collect()
        });

        let mut accumulator = Accumulator::new();
        let mut errors = Vec::new();
        let mut scanned_files = 0;
        let mut cancelled = false;

        for (path, outcome) in files.iter().zip(outcomes) {
            match outcome {
                Ok(file_accumulator) => {
                    scanned_files += 1;
                    accumulator.merge(file_accumulator);
                }
                Err(EngineError::Cancelled) => cancelled = true,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Failed to scan document");
                    errors.push(FileError::new(path, &e));
                }
            }
        }

        let placeholders = accumulator.into_placeholders();
        let total_occurrences = placeholders.iter().map(|p| p.total_occurrences).sum();
        let result = ScanResult {
            status: BatchStatus::from_counts(errors.len(), cancelled),
            total_files: files.len(),
            scanned_files,
            failed_files: errors.len(),
            total_placeholders: placeholders.len(),
            total_occurrences,
            placeholders,
            errors,
            duration: start.elapsed(),
        };

        info!(
            files = result.total_files,
            scanned = result.scanned_files,
            failed = result.failed_files,
            placeholders = result.total_placeholders,
            occurrences = result.total_occurrences,
            status = ?result.status,
            "Scan finished"
        );
        Ok(result)
    }

    /// Compile each pattern up front, scan once per pattern and merge.
    ///
    /// Any invalid pattern fails the whole call before a file is opened.
    pub fn scan_patterns<S: AsRef<str>>(
        &self,
        files: &[PathBuf],
        patterns: &[S],
        options: PatternOptions,
        cancel: &CancellationToken,
    ) -> Result<ScanResult, EngineError> {
        let compiled = patterns
            .iter()
            .map(|p| PlaceholderPattern::new(p.as_ref(), options))
            .collect::<Result<Vec<_>, _>>()?;

        let mut merged: Option<ScanResult> = None;
        for pattern in &compiled {
            let result = self.scan(files, pattern, cancel)?;
            merged = Some(match merged {
                Some(previous) => previous.merge(result),
                None => result,
            });
            if cancel.is_cancelled() {
                break;
            }
        }

        match merged {
            Some(result) => Ok(result),
            None => self.scan(files, &PlaceholderPattern::default(), cancel),
        }
    }

    /// Scan one file. Errors propagate instead of being recorded.
    pub fn scan_single_file(
        &self,
        path: &Path,
        pattern: &PlaceholderPattern,
    ) -> Result<Vec<Placeholder>, EngineError> {
        self.scan_file(path, pattern, &CancellationToken::new())
            .map(Accumulator::into_placeholders)
    }

    fn scan_file(
        &self,
        path: &Path,
        pattern: &PlaceholderPattern,
        cancel: &CancellationToken,
    ) -> Result<Accumulator, EngineError> {
        cancel.check()?;
        let mut package = self
            .opener
            .open(path, false)
            .map_err(|e| EngineError::from_package(path, e))?;

        let mut accumulator = Accumulator::new();
        let stats = traverse(&mut package, cancel, |document, section, paragraph| {
            let nodes = document.text_nodes(paragraph);
            let resolved = resolve(pattern, &nodes);
            if resolved.occurrences.is_empty() {
                return Ok(());
            }
            let label = section.to_string();
            for occurrence in &resolved.occurrences {
                accumulator.record(occurrence, pattern.source(), path, &label, || {
                    resolved.context(occurrence)
                });
            }
            Ok(())
        })?;

        info!(
            path = %path.display(),
            parts = stats.parts,
            paragraphs = stats.paragraphs,
            placeholders = accumulator.len(),
            "Scanned document"
        );
        Ok(accumulator)
    }
}
