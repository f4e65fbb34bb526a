//! Splitting documents into fixed-size parts
//!
//! Each part is assembled as a standalone document and stripped of tagging
//! before it is handed out, so no part ever carries structure metadata
//! copied from the source.

use std::path::{Path, PathBuf};

use lopdf::Document;

use crate::diagnostics::DiagnosticSink;
use crate::error::{Error, Result};
use crate::pdf::assemble::extract_pages;
use crate::pdf::graph::page_ids;
use crate::pdf::untag::{strip_tags, untag_file};
use crate::pdf::write::save_document;

/// One output document of a split
#[derive(Debug)]
pub struct SplitPart {
    /// 1-based position among the parts
    pub index: usize,
    /// 1-based page numbers of the source that this part holds
    pub page_numbers: Vec<u32>,
    pub document: Document,
}

/// Output file name for part `index` of a document named `stem`
pub fn part_file_name(stem: &str, index: usize) -> String {
    format!("{}_part_{:03}.pdf", stem, index)
}

/// Split `source` into consecutive runs of at most `pages_per_part` pages
///
/// A document without pages yields no parts. `pages_per_part` must be
/// positive.
pub fn split_document(
    source: &Document,
    pages_per_part: usize,
    sink: &mut dyn DiagnosticSink,
) -> Result<Vec<SplitPart>> {
    if pages_per_part == 0 {
        return Err(Error::InvalidArgument("pages per part must be greater than zero".to_string()));
    }

    let pages: Vec<(u32, lopdf::ObjectId)> = (1u32..).zip(page_ids(source)).collect();
    let mut parts = Vec::with_capacity(pages.len().div_ceil(pages_per_part));

    for (offset, chunk) in pages.chunks(pages_per_part).enumerate() {
        let page_ids: Vec<_> = chunk.iter().map(|&(_, id)| id).collect();
        let mut document = extract_pages(source, &page_ids, sink)?;
        strip_tags(&mut document);

        parts.push(SplitPart {
            index: offset + 1,
            page_numbers: chunk.iter().map(|&(number, _)| number).collect(),
            document,
        });
    }

    Ok(parts)
}

/// Split the file `src` into `<stem>_part_<NNN>.pdf` files inside `out_dir`
///
/// Returns the written paths in part order.
pub fn split_file(
    src: &Path,
    out_dir: &Path,
    pages_per_part: usize,
    sink: &mut dyn DiagnosticSink,
) -> Result<Vec<PathBuf>> {
    if !src.exists() {
        return Err(Error::FileNotFound(src.to_path_buf()));
    }
    if pages_per_part == 0 {
        return Err(Error::InvalidArgument("pages per part must be greater than zero".to_string()));
    }

    let source = Document::load(src)?;
    let stem = file_stem(src);

    let mut written = Vec::new();
    for mut part in split_document(&source, pages_per_part, sink)? {
        let path = out_dir.join(part_file_name(&stem, part.index));
        save_document(&mut part.document, &path)?;
        log::debug!("wrote {} (pages {:?})", path.display(), part.page_numbers);
        written.push(path);
    }

    if written.is_empty() {
        log::warn!("{} has no pages; nothing to split", src.display());
    }
    Ok(written)
}

/// Copy `src` into `out_dir` under its own name, untagged and declared PDF 1.4
pub fn pass_through_file(src: &Path, out_dir: &Path) -> Result<PathBuf> {
    let name = src
        .file_name()
        .ok_or_else(|| Error::InvalidArgument(format!("{} has no file name", src.display())))?;
    let target = out_dir.join(name);
    untag_file(src, &target)?;
    Ok(target)
}

pub(crate) fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Diagnostic;
    use crate::pdf::fixtures;
    use crate::pdf::untag::tagging_markers;

    fn markers(count: usize) -> Vec<Vec<u8>> {
        (1..=count).map(|i| format!("% page {}", i).into_bytes()).collect()
    }

    #[test]
    fn test_zero_pages_per_part_is_rejected() {
        let (doc, _) = fixtures::document_with_pages(&[b""]);
        let mut events: Vec<Diagnostic> = Vec::new();
        let result = split_document(&doc, 0, &mut events);
        assert!(matches!(result, Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_five_pages_by_two_gives_two_two_one() {
        let contents = markers(5);
        let refs: Vec<&[u8]> = contents.iter().map(Vec::as_slice).collect();
        let (doc, _) = fixtures::document_with_pages(&refs);
        let mut events: Vec<Diagnostic> = Vec::new();

        let parts = split_document(&doc, 2, &mut events).expect("split");

        let counts: Vec<usize> = parts.iter().map(|p| p.document.get_pages().len()).collect();
        assert_eq!(counts, vec![2, 2, 1]);
        let numbers: Vec<Vec<u32>> = parts.iter().map(|p| p.page_numbers.clone()).collect();
        assert_eq!(numbers, vec![vec![1, 2], vec![3, 4], vec![5]]);
        assert_eq!(parts.iter().map(|p| p.index).collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn test_part_counts_sum_to_page_count() {
        for total in 0..=7usize {
            let contents = markers(total);
            let refs: Vec<&[u8]> = contents.iter().map(Vec::as_slice).collect();
            let (doc, _) = fixtures::document_with_pages(&refs);

            for n in 1..=4usize {
                let mut events: Vec<Diagnostic> = Vec::new();
                let parts = split_document(&doc, n, &mut events).expect("split");
                assert_eq!(parts.len(), total.div_ceil(n), "P={total} n={n}");
                let sum: usize = parts.iter().map(|p| p.document.get_pages().len()).sum();
                assert_eq!(sum, total, "P={total} n={n}");
            }
        }
    }

    #[test]
    fn test_cyclic_page_tree_neither_repeats_nor_drops_pages() {
        let contents = markers(2);
        let refs: Vec<&[u8]> = contents.iter().map(Vec::as_slice).collect();
        let (mut doc, pages) = fixtures::document_with_pages(&refs);
        fixtures::loop_page_tree(&mut doc, &pages);
        let mut events: Vec<Diagnostic> = Vec::new();

        let parts = split_document(&doc, 1, &mut events).expect("split");

        assert_eq!(parts.len(), 2);
        let numbers: Vec<Vec<u32>> = parts.iter().map(|p| p.page_numbers.clone()).collect();
        assert_eq!(numbers, vec![vec![1], vec![2]]);
        for part in &parts {
            assert_eq!(part.document.get_pages().len(), 1, "part {}", part.index);
        }
    }

    #[test]
    fn test_parts_carry_no_tagging() {
        let (mut doc, pages) = fixtures::document_with_pages(&[b"", b"", b""]);
        fixtures::add_tagging(&mut doc, &pages);
        let mut events: Vec<Diagnostic> = Vec::new();

        for part in split_document(&doc, 2, &mut events).expect("split") {
            let left = tagging_markers(&part.document);
            assert!(left.is_empty(), "part {}: {:?}", part.index, left);
            assert_eq!(part.document.version, "1.4");
        }
    }

    #[test]
    fn test_part_file_name() {
        assert_eq!(part_file_name("scan", 1), "scan_part_001.pdf");
        assert_eq!(part_file_name("scan", 1234), "scan_part_1234.pdf");
    }
}
