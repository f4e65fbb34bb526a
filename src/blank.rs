//! Blank page classification
//!
//! A page is kept when any of these signals fires, checked in order:
//! enough alphanumeric text, a large enough content stream, an image
//! somewhere in its (possibly inherited) resources. Otherwise it is blank.

use std::fmt;

use lopdf::{Document, ObjectId};

use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::pdf::graph::{page_ids, resolve, Node};
use crate::pdf::images::has_images;
use crate::pdf::inherit::get_inherited;

/// Tunable thresholds for blank page detection
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlankThresholds {
    /// Minimum number of alphanumeric characters for text to count
    pub min_alnum_chars: usize,
    /// Minimum share of alphanumeric characters among non-whitespace ones
    pub min_alnum_ratio: f64,
    /// Content streams longer than this (decoded) mark a page as non-blank
    pub min_stream_bytes: usize,
    /// Whether any image XObject marks a page as non-blank
    pub treat_any_image_as_nonblank: bool,
    /// Visible text length reported in page diagnostics; does not affect the verdict
    pub text_len_threshold: usize,
}

impl Default for BlankThresholds {
    fn default() -> Self {
        Self {
            min_alnum_chars: 5,
            min_alnum_ratio: 0.2,
            min_stream_bytes: 40,
            treat_any_image_as_nonblank: true,
            text_len_threshold: 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Blank,
    NonBlank,
}

/// Which rule decided a verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reason {
    AlnumThreshold,
    StreamBytes,
    ImageFound,
    BelowThresholds,
}

impl Reason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Reason::AlnumThreshold => "alnum_threshold",
            Reason::StreamBytes => "stream_bytes",
            Reason::ImageFound => "image_found",
            Reason::BelowThresholds => "below_thresholds",
        }
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of classifying one page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassificationVerdict {
    pub verdict: Verdict,
    pub reason: Reason,
}

impl ClassificationVerdict {
    fn non_blank(reason: Reason) -> Self {
        Self { verdict: Verdict::NonBlank, reason }
    }

    fn blank() -> Self {
        Self { verdict: Verdict::Blank, reason: Reason::BelowThresholds }
    }

    pub fn is_blank(&self) -> bool {
        self.verdict == Verdict::Blank
    }

    pub fn label(&self) -> &'static str {
        match self.verdict {
            Verdict::Blank => "BLANK",
            Verdict::NonBlank => "NON-BLANK",
        }
    }
}

/// Character counts over a page's extracted text
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TextStats {
    /// Characters after trimming surrounding whitespace
    pub visible_len: usize,
    pub alnum: usize,
    pub non_whitespace: usize,
}

impl TextStats {
    pub fn measure(text: &str) -> Self {
        let mut stats = Self { visible_len: text.trim().chars().count(), ..Self::default() };
        for c in text.chars() {
            if is_counted_alnum(c) {
                stats.alnum += 1;
            }
            if !c.is_whitespace() {
                stats.non_whitespace += 1;
            }
        }
        stats
    }

    /// Alphanumeric share of non-whitespace characters, 0 for empty text
    pub fn alnum_ratio(&self) -> f64 {
        if self.non_whitespace == 0 {
            0.0
        } else {
            self.alnum as f64 / self.non_whitespace as f64
        }
    }
}

/// Latin letters, digits and German umlauts/eszett
pub fn is_counted_alnum(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, 'Ä' | 'Ö' | 'Ü' | 'ä' | 'ö' | 'ü' | 'ß')
}

/// Signals measured for a page; later signals are absent when an earlier rule decided
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PageMetrics {
    pub text: TextStats,
    pub meets_text_len: bool,
    pub stream_bytes: Option<usize>,
    pub image_found: Option<bool>,
}

impl fmt::Display for PageMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "text_len={} alnum={} alnum_ratio={:.3}",
            self.text.visible_len,
            self.text.alnum,
            self.text.alnum_ratio()
        )?;
        if let Some(bytes) = self.stream_bytes {
            write!(f, " stream_bytes={}", bytes)?;
        }
        if let Some(found) = self.image_found {
            write!(f, " image_found={}", found)?;
        }
        Ok(())
    }
}

/// Thresholds plus the sink that receives per-page events
pub struct ClassifyContext<'s> {
    pub thresholds: BlankThresholds,
    sink: &'s mut dyn DiagnosticSink,
}

impl<'s> ClassifyContext<'s> {
    pub fn new(thresholds: BlankThresholds, sink: &'s mut dyn DiagnosticSink) -> Self {
        Self { thresholds, sink }
    }

    pub fn sink(&mut self) -> &mut dyn DiagnosticSink {
        &mut *self.sink
    }
}

/// Classify page `page_number` (1-based, object `page_id`) of `doc`
pub fn classify_page(
    ctx: &mut ClassifyContext<'_>,
    doc: &Document,
    page_number: u32,
    page_id: ObjectId,
) -> ClassificationVerdict {
    let text = match doc.extract_text(&[page_number]) {
        Ok(text) => text,
        Err(e) => {
            ctx.sink().record(Diagnostic::TextExtraction { page: page_number, reason: e.to_string() });
            String::new()
        }
    };
    classify_page_with_text(ctx, doc, page_number, page_id, &text)
}

/// Classify a page whose text has already been extracted
pub fn classify_page_with_text(
    ctx: &mut ClassifyContext<'_>,
    doc: &Document,
    page_number: u32,
    page_id: ObjectId,
    text: &str,
) -> ClassificationVerdict {
    let thresholds = ctx.thresholds;
    let mut metrics = PageMetrics { text: TextStats::measure(text), ..PageMetrics::default() };
    metrics.meets_text_len = metrics.text.visible_len >= thresholds.text_len_threshold;

    let verdict = decide(ctx, doc, page_id, &thresholds, &mut metrics);
    ctx.sink().record(Diagnostic::PageClassified { page: page_number, verdict, metrics });
    verdict
}

fn decide(
    ctx: &mut ClassifyContext<'_>,
    doc: &Document,
    page_id: ObjectId,
    thresholds: &BlankThresholds,
    metrics: &mut PageMetrics,
) -> ClassificationVerdict {
    if metrics.text.alnum >= thresholds.min_alnum_chars
        && metrics.text.alnum_ratio() >= thresholds.min_alnum_ratio
    {
        return ClassificationVerdict::non_blank(Reason::AlnumThreshold);
    }

    let stream_bytes = content_stream_bytes(doc, page_id);
    metrics.stream_bytes = Some(stream_bytes);
    if stream_bytes > thresholds.min_stream_bytes {
        return ClassificationVerdict::non_blank(Reason::StreamBytes);
    }

    if thresholds.treat_any_image_as_nonblank {
        let resources = get_inherited(doc, page_id, b"Resources", ctx.sink());
        let found = has_images(doc, resources.map(|r| r.object), ctx.sink());
        metrics.image_found = Some(found);
        if found {
            return ClassificationVerdict::non_blank(Reason::ImageFound);
        }
    }

    ClassificationVerdict::blank()
}

/// Total decoded length of the page's content streams
///
/// Streams whose filters cannot be decoded count with their raw length.
pub fn content_stream_bytes(doc: &Document, page_id: ObjectId) -> usize {
    let Ok(page) = doc.get_dictionary(page_id) else {
        return 0;
    };
    let Ok(contents) = page.get(b"Contents") else {
        return 0;
    };

    match resolve(doc, contents).node() {
        Node::Stream(stream) => decoded_len(stream),
        Node::Array(items) => items
            .iter()
            .map(|item| match resolve(doc, item).node() {
                Node::Stream(stream) => decoded_len(stream),
                Node::Dictionary(_) | Node::Array(_) | Node::Name(_) | Node::Reference(_) | Node::Scalar(_) => 0,
            })
            .sum(),
        Node::Dictionary(_) | Node::Name(_) | Node::Reference(_) | Node::Scalar(_) => 0,
    }
}

fn decoded_len(stream: &lopdf::Stream) -> usize {
    if !stream.dict.has(b"Filter") {
        return stream.content.len();
    }
    stream
        .decompressed_content()
        .map(|content| content.len())
        .unwrap_or(stream.content.len())
}

/// Classify every page of `doc` in page order
pub fn classify_document(ctx: &mut ClassifyContext<'_>, doc: &Document) -> Vec<(u32, ObjectId, ClassificationVerdict)> {
    (1u32..)
        .zip(page_ids(doc))
        .map(|(number, id)| (number, id, classify_page(ctx, doc, number, id)))
        .collect()
}
