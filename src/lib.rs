//! PDF Batch Tools Library
//!
//! Batch processing of scanned PDF documents. This library provides
//! functionality to:
//! - Split documents into parts of a fixed number of pages
//! - Classify pages as blank and drop them
//! - Strip structure tagging and write every output as PDF 1.4
//! - Walk malformed, cyclic object graphs without hanging or panicking
//!
//! # Example
//!
//! ```no_run
//! use pdf_batch_tools::batch::{collect_inputs, run_batch, BatchOptions};
//! use pdf_batch_tools::diagnostics::LogSink;
//! use std::path::{Path, PathBuf};
//!
//! let mut options = BatchOptions::new("02_split");
//! options.every = 2;
//! options.clean_dir = Some(PathBuf::from("03_clean"));
//!
//! let inputs = collect_inputs(Path::new("01_input")).expect("Failed to list inputs");
//! let summary = run_batch(&inputs, &options, &mut LogSink);
//! println!("{} parts, {} blank pages removed", summary.parts, summary.removed_pages);
//! ```

pub mod archive;
pub mod batch;
pub mod blank;
pub mod clean;
pub mod diagnostics;
pub mod error;
pub mod pdf;
pub mod split;

// Re-export commonly used items
pub use error::{Error, Result};
