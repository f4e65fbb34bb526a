//! PDF metadata extraction

use std::path::Path;

use lopdf::{Document, Object};

use crate::error::{Error, Result};
use crate::pdf::graph::{catalog, resolve, resolve_entry, Node};
use crate::pdf::untag::{tagging_markers, TagMarker};

/// Count pages by reading the Count field from the root Pages dictionary
///
/// This is more reliable than get_pages() for trees whose intermediate nodes
/// are damaged, and it follows indirect Count values.
fn count_pages_from_catalog(doc: &Document) -> Result<usize> {
    let (_, catalog) = catalog(doc).ok_or_else(|| Error::General("No usable Root in trailer".to_string()))?;

    let pages = resolve_entry(doc, catalog, b"Pages")
        .ok_or_else(|| Error::General("No Pages in catalog".to_string()))?;
    let pages = pages
        .dict()
        .ok_or_else(|| Error::General("Pages is not a dictionary".to_string()))?;

    let count = resolve_entry(doc, pages, b"Count")
        .ok_or_else(|| Error::General("No Count in Pages".to_string()))?;

    match count.object {
        Object::Integer(n) if *n >= 0 => Ok(*n as usize),
        _ => Err(Error::General("Count is not a non-negative integer".to_string())),
    }
}

/// PDF metadata
#[derive(Debug, Clone)]
pub struct PdfMetadata {
    /// Number of pages in the PDF
    pub page_count: usize,
    /// Version from the file header
    pub version: String,
    /// Document title (if present)
    pub title: Option<String>,
    /// Document author (if present)
    pub author: Option<String>,
    /// Tagging entries still present
    pub tag_markers: Vec<TagMarker>,
}

impl PdfMetadata {
    pub fn is_tagged(&self) -> bool {
        !self.tag_markers.is_empty()
    }
}

/// Metadata of an already loaded document
pub fn document_metadata(doc: &Document) -> Result<PdfMetadata> {
    let page_count = count_pages_from_catalog(doc)?;

    let info = doc
        .trailer
        .get(b"Info")
        .ok()
        .and_then(|info| resolve(doc, info).dict());
    let text = |key: &[u8]| {
        let value = resolve_entry(doc, info?, key)?;
        match value.node() {
            Node::Scalar(Object::String(bytes, _)) => Some(String::from_utf8_lossy(bytes).into_owned()),
            _ => None,
        }
    };

    Ok(PdfMetadata {
        page_count,
        version: doc.version.clone(),
        title: text(b"Title"),
        author: text(b"Author"),
        tag_markers: tagging_markers(doc),
    })
}

/// Extract metadata from a PDF file
pub fn extract_metadata(path: &Path) -> Result<PdfMetadata> {
    if !path.exists() {
        return Err(Error::FileNotFound(path.to_path_buf()));
    }

    let doc = Document::load(path)?;
    document_metadata(&doc)
}

/// Count the number of pages in a PDF file
///
/// This is a quick operation that reads the Count field from the Pages dictionary.
pub fn count_pages(path: &Path) -> Result<usize> {
    if !path.exists() {
        return Err(Error::FileNotFound(path.to_path_buf()));
    }

    let doc = Document::load(path)?;
    count_pages_from_catalog(&doc)
}
