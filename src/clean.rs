//! Blank page removal
//!
//! Pages classified blank are dropped and the rest written as a new,
//! untagged document. When every page of a document looks blank the
//! classification is more likely wrong than the document empty, so by
//! default the input is copied unchanged instead.

use std::fmt;
use std::fs;
use std::path::Path;

use lopdf::{Document, ObjectId};

use crate::blank::{classify_document, BlankThresholds, ClassifyContext};
use crate::diagnostics::DiagnosticSink;
use crate::error::{Error, Result};
use crate::pdf::assemble::extract_pages;
use crate::pdf::graph::page_ids;
use crate::pdf::untag::strip_tags;
use crate::pdf::write::{save_document, write_bytes_atomic};

/// Options for blank page removal
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CleanOptions {
    pub thresholds: BlankThresholds,
    /// Copy the input unchanged when every page is classified blank;
    /// otherwise write a document without pages
    pub fallback_on_all_blank: bool,
}

impl Default for CleanOptions {
    fn default() -> Self {
        Self {
            thresholds: BlankThresholds::default(),
            fallback_on_all_blank: true,
        }
    }
}

/// What [`remove_blank_pages`] wrote
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanOutcome {
    /// Non-blank pages were written as a new document
    Cleaned { kept: usize, removed: usize },
    /// Every page looked blank; the input bytes were copied unchanged
    FallbackCopy { pages: usize },
    /// Every page looked blank; a document without pages was written
    Emptied { removed: usize },
}

impl CleanOutcome {
    /// Pages missing from the output compared to the input
    pub fn removed_pages(&self) -> usize {
        match *self {
            CleanOutcome::Cleaned { removed, .. } | CleanOutcome::Emptied { removed } => removed,
            CleanOutcome::FallbackCopy { .. } => 0,
        }
    }
}

impl fmt::Display for CleanOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            CleanOutcome::Cleaned { kept, removed } => write!(f, "kept {} pages, removed {}", kept, removed),
            CleanOutcome::FallbackCopy { pages } => {
                write!(f, "all {} pages blank, copied unchanged", pages)
            }
            CleanOutcome::Emptied { removed } => write!(f, "all {} pages blank, wrote empty document", removed),
        }
    }
}

/// Object ids of the pages of `doc` that are not blank, in page order
pub fn non_blank_pages(ctx: &mut ClassifyContext<'_>, doc: &Document) -> Vec<ObjectId> {
    classify_document(ctx, doc)
        .into_iter()
        .filter(|(_, _, verdict)| !verdict.is_blank())
        .map(|(_, id, _)| id)
        .collect()
}

/// Drop the blank pages of `src` and write the result to `dst`
pub fn remove_blank_pages(
    src: &Path,
    dst: &Path,
    options: &CleanOptions,
    sink: &mut dyn DiagnosticSink,
) -> Result<CleanOutcome> {
    if !src.exists() {
        return Err(Error::FileNotFound(src.to_path_buf()));
    }

    let bytes = fs::read(src)?;
    let source = Document::load_mem(&bytes)?;
    let total = page_ids(&source).len();

    let kept = {
        let mut ctx = ClassifyContext::new(options.thresholds, &mut *sink);
        non_blank_pages(&mut ctx, &source)
    };
    let removed = total - kept.len();

    if kept.is_empty() && total > 0 {
        log::debug!(
            "{}: all {} pages blank; fallback_on_all_blank={}",
            src.display(),
            total,
            options.fallback_on_all_blank
        );
        if options.fallback_on_all_blank {
            write_bytes_atomic(&bytes, dst)?;
            return Ok(CleanOutcome::FallbackCopy { pages: total });
        }
        let mut empty = extract_pages(&source, &[], sink)?;
        save_document(&mut empty, dst)?;
        return Ok(CleanOutcome::Emptied { removed });
    }

    let mut cleaned = extract_pages(&source, &kept, sink)?;
    strip_tags(&mut cleaned);
    save_document(&mut cleaned, dst)?;

    Ok(CleanOutcome::Cleaned { kept: kept.len(), removed })
}
