//! PDF Batch CLI tool
//!
//! A command-line tool for splitting PDFs, removing blank pages and
//! stripping structure tagging.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use env_logger::{Env, Target, WriteStyle};

use pdf_batch_tools::batch::{collect_inputs, expand_globs, run_batch, BatchOptions};
use pdf_batch_tools::blank::{classify_document, BlankThresholds, ClassifyContext};
use pdf_batch_tools::clean::{remove_blank_pages, CleanOptions};
use pdf_batch_tools::diagnostics::{Diagnostic, DiagnosticSink, LogSink};
use pdf_batch_tools::pdf::{extract_metadata, untag_file};
use pdf_batch_tools::split::split_file;

/// PDF Batch - Split PDFs, drop blank pages, strip tagging
#[derive(Parser)]
#[command(name = "pdf-batch")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "EXAMPLES:
    # Split every input into 2-page parts and clean them
    pdf-batch batch --in-dir ./01_input --split-dir ./02_split --clean-dir ./03_clean --every 2

    # Same, archiving the originals afterwards
    pdf-batch batch --in-dir ./01_input --split-dir ./02_split --clean-dir ./03_clean --archive-dir ./99_archive

    # Show why each page is or is not blank
    pdf-batch --debug-pages classify scan.pdf")]
struct Cli {
    /// Also write log output to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Log per-page metrics and decisions
    #[arg(long, global = true)]
    debug_pages: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Split, clean and archive a batch of PDF files
    Batch {
        /// Directory with the input PDFs
        #[arg(long, required_unless_present = "inputs")]
        in_dir: Option<PathBuf>,

        /// Input PDF files instead of --in-dir. Supports glob patterns like "*.pdf"
        #[arg(conflicts_with = "in_dir")]
        inputs: Vec<String>,

        /// Output directory for split parts
        #[arg(long)]
        split_dir: PathBuf,

        /// Output directory for cleaned parts (cleaning is skipped without it)
        #[arg(long)]
        clean_dir: Option<PathBuf>,

        /// Split every N pages; N <= 0 copies each document as a single part
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        every: i64,

        /// Do not remove blank pages
        #[arg(long)]
        no_clean: bool,

        /// Move each original here after processing
        #[arg(long)]
        archive_dir: Option<PathBuf>,

        #[command(flatten)]
        thresholds: ThresholdArgs,

        /// Write a document without pages when all pages are blank
        #[arg(long)]
        no_fallback_empty: bool,
    },

    /// Split one PDF into parts of N pages
    Split {
        /// Input PDF file
        input: PathBuf,

        /// Output directory
        #[arg(short, long)]
        output: PathBuf,

        /// Pages per part
        #[arg(long, default_value_t = 2)]
        every: usize,
    },

    /// Remove blank pages from one PDF
    Clean {
        /// Input PDF file
        input: PathBuf,

        /// Output PDF file path
        #[arg(short, long)]
        output: PathBuf,

        #[command(flatten)]
        thresholds: ThresholdArgs,

        /// Write a document without pages when all pages are blank
        #[arg(long)]
        no_fallback_empty: bool,
    },

    /// Strip structure tagging and save as PDF 1.4
    Untag {
        /// Input PDF file
        input: PathBuf,

        /// Output PDF file path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Print the blank/non-blank verdict of every page
    Classify {
        /// PDF file to inspect
        input: PathBuf,

        #[command(flatten)]
        thresholds: ThresholdArgs,
    },

    /// Show information about a PDF file
    Info {
        /// PDF file to inspect
        input: PathBuf,
    },
}

/// Blank page detection thresholds
#[derive(Args)]
struct ThresholdArgs {
    /// Minimum alphanumeric characters for a page to count as non-blank
    #[arg(long, default_value_t = 5)]
    min_alnum: usize,

    /// Minimum share of alphanumeric characters among non-whitespace ones
    #[arg(long, default_value_t = 0.2)]
    min_alnum_ratio: f64,

    /// Content streams longer than this many bytes mark a page as non-blank
    #[arg(long, default_value_t = 40)]
    min_bytes: usize,

    /// Do not treat pages with images as non-blank
    #[arg(long)]
    no_image_nonblank: bool,
}

impl ThresholdArgs {
    fn thresholds(&self) -> BlankThresholds {
        BlankThresholds {
            min_alnum_chars: self.min_alnum,
            min_alnum_ratio: self.min_alnum_ratio,
            min_stream_bytes: self.min_bytes,
            treat_any_image_as_nonblank: !self.no_image_nonblank,
            ..BlankThresholds::default()
        }
    }
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.log_file.as_deref(), cli.debug_pages) {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }

    let result = match cli.command {
        Commands::Batch {
            in_dir,
            inputs,
            split_dir,
            clean_dir,
            every,
            no_clean,
            archive_dir,
            thresholds,
            no_fallback_empty,
        } => {
            let options = BatchOptions {
                split_dir,
                clean_dir,
                every: usize::try_from(every).unwrap_or(0),
                clean: !no_clean,
                clean_options: CleanOptions {
                    thresholds: thresholds.thresholds(),
                    fallback_on_all_blank: !no_fallback_empty,
                },
                archive_dir,
            };
            cmd_batch(in_dir, inputs, &options)
        }
        Commands::Split { input, output, every } => cmd_split(&input, &output, every),
        Commands::Clean { input, output, thresholds, no_fallback_empty } => {
            let options = CleanOptions {
                thresholds: thresholds.thresholds(),
                fallback_on_all_blank: !no_fallback_empty,
            };
            cmd_clean(&input, &output, &options)
        }
        Commands::Untag { input, output } => cmd_untag(&input, &output),
        Commands::Classify { input, thresholds } => cmd_classify(&input, thresholds.thresholds()),
        Commands::Info { input } => cmd_info(&input),
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

/// Log to stderr, and to `log_file` as well when given
fn init_logging(log_file: Option<&Path>, debug_pages: bool) -> Result<()> {
    let level = if debug_pages { "debug" } else { "info" };
    let mut builder = env_logger::Builder::from_env(Env::default().default_filter_or(level));

    if let Some(path) = log_file {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create log directory {}", parent.display()))?;
        }
        let file = File::options()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open log file {}", path.display()))?;
        builder
            .target(Target::Pipe(Box::new(Tee { file })))
            .write_style(WriteStyle::Never);
    }

    builder.init();
    Ok(())
}

/// Writes log records to stderr and a file
struct Tee {
    file: File,
}

impl Write for Tee {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        io::stderr().write_all(buf)?;
        self.file.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()?;
        self.file.flush()
    }
}

/// Run the full split/clean/archive pipeline
fn cmd_batch(in_dir: Option<PathBuf>, inputs: Vec<String>, options: &BatchOptions) -> Result<()> {
    let inputs = match in_dir {
        Some(dir) => collect_inputs(&dir).with_context(|| format!("Failed to list {}", dir.display()))?,
        None => expand_globs(&inputs)?,
    };

    let summary = run_batch(&inputs, options, &mut LogSink);

    eprintln!(
        "Processed {} documents: {} parts, {} cleaned, {} blank pages removed",
        summary.documents, summary.parts, summary.cleaned, summary.removed_pages
    );
    if !summary.is_success() {
        for (path, message) in &summary.failures {
            eprintln!("  failed: {}: {}", path.display(), message);
        }
        bail!("{} of {} documents failed", summary.failures.len(), summary.documents);
    }
    Ok(())
}

/// Split one PDF into parts
fn cmd_split(input: &Path, output: &Path, every: usize) -> Result<()> {
    let parts = split_file(input, output, every, &mut LogSink)
        .with_context(|| format!("Failed to split {}", input.display()))?;

    for part in &parts {
        println!("{}", part.display());
    }
    eprintln!("Wrote {} parts to {}", parts.len(), output.display());
    Ok(())
}

/// Remove blank pages from one PDF
fn cmd_clean(input: &Path, output: &Path, options: &CleanOptions) -> Result<()> {
    let outcome = remove_blank_pages(input, output, options, &mut LogSink)
        .with_context(|| format!("Failed to clean {}", input.display()))?;

    eprintln!("{}: {}", output.display(), outcome);
    Ok(())
}

/// Strip tagging from one PDF
fn cmd_untag(input: &Path, output: &Path) -> Result<()> {
    let report = untag_file(input, output).with_context(|| format!("Failed to untag {}", input.display()))?;

    eprintln!("Removed {} tagging entries", report.total());
    eprintln!("Output: {}", output.display());
    Ok(())
}

/// Print the verdict of every page
fn cmd_classify(input: &Path, thresholds: BlankThresholds) -> Result<()> {
    if !input.exists() {
        bail!("Input file not found: {}", input.display());
    }
    let doc = lopdf::Document::load(input).with_context(|| format!("Failed to load {}", input.display()))?;

    let mut events: Vec<Diagnostic> = Vec::new();
    {
        let mut ctx = ClassifyContext::new(thresholds, &mut events);
        classify_document(&mut ctx, &doc);
    }

    let mut log_sink = LogSink;
    for event in events {
        match event {
            Diagnostic::PageClassified { page, verdict, metrics } => {
                println!("Page {}: {} ({}) {}", page, verdict.label(), verdict.reason, metrics);
            }
            other => log_sink.record(other),
        }
    }
    Ok(())
}

/// Show information about a PDF
fn cmd_info(input: &Path) -> Result<()> {
    let metadata = extract_metadata(input).with_context(|| format!("Failed to read {}", input.display()))?;

    println!("File: {}", input.display());
    println!("Version: {}", metadata.version);
    println!("Pages: {}", metadata.page_count);

    if let Some(title) = &metadata.title {
        println!("Title: {}", title);
    }
    if let Some(author) = &metadata.author {
        println!("Author: {}", author);
    }
    println!("Tagged: {}", if metadata.is_tagged() { "yes" } else { "no" });
    for marker in &metadata.tag_markers {
        println!("  {:?}", marker);
    }

    Ok(())
}
