//! PDF object-graph handling module

pub mod assemble;
pub mod graph;
pub mod images;
pub mod inherit;
pub mod metadata;
pub mod untag;
pub mod write;

#[cfg(test)]
pub(crate) mod fixtures;

// Re-export commonly used items
pub use assemble::extract_pages;
pub use graph::{page_ids, resolve, resolve_with_limit, GraphDefect, Node, Resolved};
pub use images::has_images;
pub use inherit::get_inherited;
pub use metadata::{count_pages, document_metadata, extract_metadata, PdfMetadata};
pub use untag::{strip_tags, tagging_markers, untag_file, StripReport, TagMarker};
pub use write::{copy_atomic, save_document, write_bytes_atomic};
