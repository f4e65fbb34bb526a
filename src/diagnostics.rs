//! Diagnostic events raised while walking and classifying documents
//!
//! Nothing reported here aborts an operation. Callers pass a sink to collect
//! the events; [`LogSink`] forwards them to the `log` facade.

use crate::blank::{ClassificationVerdict, PageMetrics};
use crate::pdf::graph::GraphDefect;
use crate::pdf::images::InspectionFailure;

/// A recovered problem or a per-page decision
#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    /// A reference could not be resolved completely
    Graph(GraphDefect),
    /// A resource entry could not be inspected; an image was assumed
    Inspection(InspectionFailure),
    /// Text extraction failed and the page was treated as text-free
    TextExtraction { page: u32, reason: String },
    /// Final verdict for one page
    PageClassified {
        page: u32,
        verdict: ClassificationVerdict,
        metrics: PageMetrics,
    },
}

/// Receiver for diagnostic events
pub trait DiagnosticSink {
    fn record(&mut self, diagnostic: Diagnostic);
}

/// Collects events in memory
impl DiagnosticSink for Vec<Diagnostic> {
    fn record(&mut self, diagnostic: Diagnostic) {
        self.push(diagnostic);
    }
}

/// Forwards events to the `log` facade
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn record(&mut self, diagnostic: Diagnostic) {
        match diagnostic {
            Diagnostic::Graph(defect) => log::debug!("malformed object graph: {}", defect),
            Diagnostic::Inspection(failure) => {
                log::warn!("{}; treating page as containing an image", failure)
            }
            Diagnostic::TextExtraction { page, reason } => {
                log::debug!("page {}: text extraction failed: {}", page, reason)
            }
            Diagnostic::PageClassified { page, verdict, metrics } => {
                log::debug!("page {}: {}", page, metrics);
                log::debug!("page {}: {} reason={}", page, verdict.label(), verdict.reason);
            }
        }
    }
}
