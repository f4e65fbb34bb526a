//! Sequential batch processing
//!
//! Each input document is split (or passed through), each part cleaned of
//! blank pages, and the original archived. A failure affects only the
//! document it happened in; the batch always continues with the next one.

use std::fs;
use std::path::{Path, PathBuf};

use glob::glob;

use crate::archive::move_to_archive;
use crate::clean::{remove_blank_pages, CleanOptions};
use crate::diagnostics::DiagnosticSink;
use crate::error::{Error, Result};
use crate::pdf::write::copy_atomic;
use crate::split::{pass_through_file, split_file};

/// Options for a batch run
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Where split parts (or pass-through copies) are written
    pub split_dir: PathBuf,
    /// Where cleaned parts are written; cleaning is skipped without it
    pub clean_dir: Option<PathBuf>,
    /// Pages per part; 0 passes each document through as a single part
    pub every: usize,
    /// Whether to remove blank pages
    pub clean: bool,
    pub clean_options: CleanOptions,
    /// Where originals are moved after processing
    pub archive_dir: Option<PathBuf>,
}

impl BatchOptions {
    pub fn new(split_dir: impl Into<PathBuf>) -> Self {
        Self {
            split_dir: split_dir.into(),
            clean_dir: None,
            every: 0,
            clean: true,
            clean_options: CleanOptions::default(),
            archive_dir: None,
        }
    }

    fn clean_target(&self) -> Option<&Path> {
        if self.clean {
            self.clean_dir.as_deref()
        } else {
            None
        }
    }
}

/// Totals of a batch run
#[derive(Debug, Default)]
pub struct BatchSummary {
    /// Input documents attempted
    pub documents: usize,
    /// Parts written to the split directory
    pub parts: usize,
    /// Parts written to the clean directory
    pub cleaned: usize,
    /// Blank pages removed across all cleaned parts
    pub removed_pages: usize,
    /// Documents that failed, with the error message
    pub failures: Vec<(PathBuf, String)>,
}

impl BatchSummary {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Every file in `in_dir` with a `.pdf` extension (any case), sorted by path
pub fn collect_inputs(in_dir: &Path) -> Result<Vec<PathBuf>> {
    if !in_dir.is_dir() {
        return Err(Error::FileNotFound(in_dir.to_path_buf()));
    }

    let mut inputs = Vec::new();
    for entry in fs::read_dir(in_dir)? {
        let path = entry?.path();
        let is_pdf = path
            .extension()
            .is_some_and(|ext| ext.to_string_lossy().eq_ignore_ascii_case("pdf"));
        if path.is_file() && is_pdf {
            inputs.push(path);
        }
    }
    inputs.sort();
    Ok(inputs)
}

/// Expand glob patterns in input paths
///
/// Arguments without glob characters are taken literally. The result is
/// sorted for consistent ordering.
pub fn expand_globs(patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();

    for pattern in patterns {
        if pattern.contains('*') || pattern.contains('?') || pattern.contains('[') {
            let entries = glob(pattern).map_err(|e| Error::InvalidGlob(format!("{}: {}", pattern, e)))?;
            let mut matched = false;
            for entry in entries {
                match entry {
                    Ok(path) => {
                        paths.push(path);
                        matched = true;
                    }
                    Err(e) => log::warn!("glob error for {}: {}", pattern, e),
                }
            }
            if !matched {
                return Err(Error::NoFilesMatched(pattern.clone()));
            }
        } else {
            paths.push(PathBuf::from(pattern));
        }
    }

    paths.sort();
    Ok(paths)
}

/// Process `inputs` one after another
pub fn run_batch(inputs: &[PathBuf], options: &BatchOptions, sink: &mut dyn DiagnosticSink) -> BatchSummary {
    let mut summary = BatchSummary::default();
    if inputs.is_empty() {
        log::warn!("no PDF files to process");
        return summary;
    }

    for (idx, src) in inputs.iter().enumerate() {
        summary.documents += 1;
        if options.every > 0 {
            log::info!(
                "[{}/{}] splitting {} every {} pages -> {}",
                idx + 1,
                inputs.len(),
                src.display(),
                options.every,
                options.split_dir.display()
            );
        } else {
            log::info!(
                "[{}/{}] no split, copying {} -> {}",
                idx + 1,
                inputs.len(),
                src.display(),
                options.split_dir.display()
            );
        }

        if let Err(e) = process_document(src, options, sink, &mut summary) {
            log::error!("failed to process {}: {}", src.display(), e);
            summary.failures.push((src.clone(), e.to_string()));
        }

        if let Some(archive_dir) = &options.archive_dir {
            if src.exists() {
                match move_to_archive(src, archive_dir) {
                    Ok(moved) => log::info!("archived {} -> {}", src.display(), moved.display()),
                    Err(e) => log::error!("failed to archive {}: {}", src.display(), e),
                }
            }
        }
    }

    log::info!("parts written: {}", summary.parts);
    if options.clean_target().is_some() {
        log::info!("parts cleaned: {}, blank pages removed: {}", summary.cleaned, summary.removed_pages);
    }
    summary
}

fn process_document(
    src: &Path,
    options: &BatchOptions,
    sink: &mut dyn DiagnosticSink,
    summary: &mut BatchSummary,
) -> Result<()> {
    let parts = if options.every > 0 {
        split_file(src, &options.split_dir, options.every, sink)?
    } else {
        vec![pass_through_file(src, &options.split_dir)?]
    };
    summary.parts += parts.len();
    log::info!("{} part(s) from {}", parts.len(), src.display());

    let Some(clean_dir) = options.clean_target() else {
        return Ok(());
    };
    for part in &parts {
        let Some(name) = part.file_name() else {
            continue;
        };
        let dst = clean_dir.join(name);

        match remove_blank_pages(part, &dst, &options.clean_options, sink) {
            Ok(outcome) => {
                log::info!("{}: {}", dst.display(), outcome);
                summary.removed_pages += outcome.removed_pages();
                summary.cleaned += 1;
            }
            Err(e) => {
                log::error!("blank page removal failed for {}: {}; copying unchanged", part.display(), e);
                match copy_atomic(part, &dst) {
                    Ok(()) => summary.cleaned += 1,
                    Err(e) => log::error!("fallback copy of {} failed: {}", part.display(), e),
                }
            }
        }
    }
    Ok(())
}
