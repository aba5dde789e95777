//! Placeholder replacement across documents.
//!
//! Each file is opened, traversed once, and saved once after every paragraph
//! has been rewritten. A failure or cancellation before the save leaves the
//! original document untouched.

mod mapping;
mod result;

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::time::Instant;

use rayon::prelude::*;
use tracing::{debug, info, warn};

pub use mapping::{MAX_KEY_LEN, ReplacementMap, sanitize_value};
pub use result::{FileReplaceResult, ReplaceResult, UnreplacedPlaceholder};

use crate::cancel::CancellationToken;
use crate::error::{EngineError, FileError};
use crate::flatten::FlattenedText;
use crate::image::{ImageData, InlineImage, fit_within, pixels_to_emu};
use crate::package::{Backup, DocumentPackage, PackageOpener, ParagraphNodes};
use crate::pattern::PlaceholderPattern;
use crate::resolver::resolve;
use crate::rewriter::{Replacement, rewrite_span};
use crate::scan::{BatchStatus, worker_pool};
use crate::traversal::traverse;

/// Options for a replace batch.
#[derive(Debug, Clone, Default)]
pub struct ReplaceOptions {
    /// Copy each file before modifying it.
    pub make_backup: bool,
    /// Treat a failed backup as a failure of the file.
    pub backup_required: bool,
    /// Write results here instead of overwriting the inputs. Every processed
    /// file is written, even without replacements.
    pub output_dir: Option<PathBuf>,
    /// Count replacements without writing or backing up anything.
    pub dry_run: bool,
    /// Process files on the worker pool instead of one after another.
    pub parallel: bool,
}

/// Planned edit for one occurrence.
enum Edit {
    Text(String),
    Image(InlineImage),
}

/// Result of one file plus the mapping keys it used.
struct FileOutcome {
    result: FileReplaceResult,
    used: BTreeSet<String>,
    cancelled: bool,
}

/// Replaces placeholders in documents.
pub struct Replacer<O> {
    opener: O,
    backup: Option<Box<dyn Backup>>,
    pattern: PlaceholderPattern,
    max_parallelism: usize,
}

impl<O: PackageOpener> Replacer<O> {
    pub fn new(opener: O) -> Self {
        Self {
            opener,
            backup: None,
            pattern: PlaceholderPattern::default(),
            max_parallelism: 0,
        }
    }

    /// Backup collaborator used when [`ReplaceOptions::make_backup`] is set.
    #[must_use]
    pub fn with_backup(mut self, backup: impl Backup + 'static) -> Self {
        self.backup = Some(Box::new(backup));
        self
    }

    #[must_use]
    pub fn with_pattern(mut self, pattern: PlaceholderPattern) -> Self {
        self.pattern = pattern;
        self
    }

    /// Limit concurrent files in parallel mode. Zero means one per core.
    #[must_use]
    pub fn with_max_parallelism(mut self, cap: usize) -> Self {
        self.max_parallelism = cap;
        self
    }

    /// Replace placeholders in `files` using `map`.
    ///
    /// Per-file failures are recorded in the result. Only a worker pool
    /// failure aborts the call.
    pub fn replace(
        &self,
        files: &[PathBuf],
        map: &ReplacementMap,
        options: &ReplaceOptions,
        cancel: &CancellationToken,
    ) -> Result<ReplaceResult, EngineError> {
        let start = Instant::now();

        let outcomes: Vec<FileOutcome> = if options.parallel {
            let pool = worker_pool(self.max_parallelism)?;
            pool.install(|| {
                files
                    .par_iter()
                    .map(|path| self.replace_file(path, map, options, cancel))
                    .collect()
            })
        } else {
            let mut outcomes = Vec::with_capacity(files.len());
            for path in files {
                let outcome = self.replace_file(path, map, options, cancel);
                let stop = outcome.cancelled;
                outcomes.push(outcome);
                if stop {
                    break;
                }
            }
            outcomes
        };

        let mut used = BTreeSet::new();
        let mut cancelled = false;
        let mut results = Vec::with_capacity(outcomes.len());
        for outcome in outcomes {
            if outcome.cancelled {
                cancelled = true;
                continue;
            }
            used.extend(outcome.used);
            results.push(outcome.result);
        }

        let successful_files = results.iter().filter(|r| r.success).count();
        let failed_files = results.len() - successful_files;
        let result = ReplaceResult {
            status: BatchStatus::from_counts(failed_files, cancelled),
            total_files: files.len(),
            successful_files,
            failed_files,
            total_replacements: results.iter().map(|r| r.replacements).sum(),
            unused_mappings: map.unused(&used).map(str::to_owned).collect(),
            files: results,
            dry_run: options.dry_run,
            duration: start.elapsed(),
        };

        info!(
            files = result.total_files,
            succeeded = result.successful_files,
            failed = result.failed_files,
            replacements = result.total_replacements,
            dry_run = options.dry_run,
            status = ?result.status,
            "Replace finished"
        );
        Ok(result)
    }

    fn replace_file(
        &self,
        path: &Path,
        map: &ReplacementMap,
        options: &ReplaceOptions,
        cancel: &CancellationToken,
    ) -> FileOutcome {
        let mut result = FileReplaceResult::new(path.to_path_buf());
        let mut used = BTreeSet::new();

        match self.rewrite_file(path, map, options, cancel, &mut result, &mut used) {
            Ok(()) => {
                result.success = true;
                info!(
                    path = %path.display(),
                    replacements = result.replacements,
                    unreplaced = result.unreplaced.len(),
                    "Processed document"
                );
            }
            Err(EngineError::Cancelled) => {
                return FileOutcome {
                    result,
                    used: BTreeSet::new(),
                    cancelled: true,
                };
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to replace in document");
                result.replacements = 0;
                result.output_path = None;
                result.error = Some(FileError::new(path, &e));
            }
        }

        FileOutcome {
            result,
            used,
            cancelled: false,
        }
    }

    fn rewrite_file(
        &self,
        path: &Path,
        map: &ReplacementMap,
        options: &ReplaceOptions,
        cancel: &CancellationToken,
        result: &mut FileReplaceResult,
        used: &mut BTreeSet<String>,
    ) -> Result<(), EngineError> {
        cancel.check()?;
        let mut package = self
            .opener
            .open(path, !options.dry_run)
            .map_err(|e| EngineError::from_package(path, e))?;

        if options.make_backup && !options.dry_run {
            self.backup_file(path, options, result)?;
        }

        let mut images: HashMap<String, Option<ImageData>> = HashMap::new();
        let mut unreplaced: BTreeMap<String, usize> = BTreeMap::new();
        let mut replacements = 0;

        traverse(&mut package, cancel, |document, _, paragraph| {
            let nodes = document.text_nodes(paragraph);
            let resolved = resolve(&self.pattern, &nodes);
            let mut edits: Vec<(Range<usize>, Edit)> = Vec::new();

            for occurrence in &resolved.occurrences {
                let Some(value) = map.get(&occurrence.name) else {
                    *unreplaced.entry(occurrence.name.clone()).or_default() += 1;
                    continue;
                };
                used.insert(ReplacementMap::fold(&occurrence.name));

                let edit = match &occurrence.image {
                    None => Edit::Text(value.to_owned()),
                    Some(props) => {
                        let image = images
                            .entry(value.to_owned())
                            .or_insert_with(|| load_image(path, value));
                        let Some(image) = image else {
                            *unreplaced.entry(occurrence.name.clone()).or_default() += 1;
                            continue;
                        };
                        if options.dry_run {
                            replacements += 1;
                            continue;
                        }
                        let relationship_id = document
                            .register_image(paragraph.part, image)
                            .map_err(|e| EngineError::from_package(path, e))?;
                        let (width, height) = fit_within(
                            (image.width, image.height),
                            (props.max_width, props.max_height),
                        );
                        Edit::Image(InlineImage {
                            relationship_id,
                            name: occurrence.name.clone(),
                            width_emu: pixels_to_emu(width),
                            height_emu: pixels_to_emu(height),
                        })
                    }
                };

                replacements += 1;
                if !options.dry_run {
                    edits.push((occurrence.span.clone(), edit));
                }
            }

            if edits.is_empty() {
                return Ok(());
            }
            let Some(mut editor) = document.paragraph_mut(paragraph) else {
                return Ok(());
            };
            // Right to left: pending spans all lie before the edited region.
            for (span, edit) in edits.iter().rev() {
                let flat = FlattenedText::new(&editor.text_nodes());
                let replacement = match edit {
                    Edit::Text(value) => Replacement::Text(value),
                    Edit::Image(image) => Replacement::Image(image),
                };
                rewrite_span(editor.as_mut(), &flat, span, replacement);
            }
            Ok(())
        })?;

        result.replacements = replacements;
        result.unreplaced = unreplaced
            .into_iter()
            .map(|(name, occurrences)| UnreplacedPlaceholder {
                name,
                file_path: path.to_path_buf(),
                occurrences,
            })
            .collect();

        if options.dry_run {
            return Ok(());
        }

        let target = match &options.output_dir {
            Some(dir) => {
                std::fs::create_dir_all(dir).map_err(|source| EngineError::Io {
                    path: dir.clone(),
                    source,
                })?;
                dir.join(path.file_name().unwrap_or_default())
            }
            None => path.to_path_buf(),
        };
        if options.output_dir.is_some() || package.is_modified() {
            package
                .save(&target)
                .map_err(|e| EngineError::from_package(&target, e))?;
            result.output_path = Some(target);
        }
        Ok(())
    }

    fn backup_file(
        &self,
        path: &Path,
        options: &ReplaceOptions,
        result: &mut FileReplaceResult,
    ) -> Result<(), EngineError> {
        let Some(backup) = &self.backup else {
            return Ok(());
        };
        match backup.backup(path) {
            Ok(copy) => {
                debug!(path = %path.display(), backup = %copy.display(), "Created backup");
                result.backup_path = Some(copy);
                Ok(())
            }
            Err(source) if options.backup_required => Err(EngineError::Backup {
                path: path.to_path_buf(),
                source,
            }),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Backup failed, continuing");
                result.backup_error = Some(e.to_string());
                Ok(())
            }
        }
    }
}

fn load_image(document: &Path, value: &str) -> Option<ImageData> {
    let bytes = match std::fs::read(value) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(document = %document.display(), image = value, error = %e, "Cannot read image");
            return None;
        }
    };
    match ImageData::from_bytes(bytes) {
        Ok(image) => Some(image),
        Err(e) => {
            warn!(document = %document.display(), image = value, error = %e, "Cannot use image");
            None
        }
    }
}
