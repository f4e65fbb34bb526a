//! Writing documents to disk
//!
//! Output goes to a temporary file next to the destination and is renamed
//! into place once complete, so a failed write never leaves a partial file
//! at the destination path.

use std::fs;
use std::io::Write;
use std::path::Path;

use lopdf::Document;
use tempfile::NamedTempFile;

use crate::error::{Error, Result};
use crate::pdf::graph::catalog_mut;

/// PDF version every written document declares
pub const TARGET_VERSION: &str = "1.4";

/// Declare `doc` as PDF 1.4 and drop any catalog-level version override
pub fn normalize_version(doc: &mut Document) {
    doc.version = TARGET_VERSION.to_string();
    if let Some(catalog) = catalog_mut(doc) {
        catalog.remove(b"Version");
    }
}

/// Normalize, compress and atomically save `doc` to `path`
pub fn save_document(doc: &mut Document, path: &Path) -> Result<()> {
    normalize_version(doc);
    doc.compress();

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)?;
    write_bytes_atomic(&bytes, path)
}

/// Atomically replace `path` with `bytes`
pub fn write_bytes_atomic(bytes: &[u8], path: &Path) -> Result<()> {
    let write_error = |source| Error::Write { path: path.to_path_buf(), source };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(write_error)?;

    let mut temp = NamedTempFile::new_in(dir).map_err(write_error)?;
    temp.write_all(bytes).map_err(write_error)?;
    temp.as_file().sync_all().map_err(write_error)?;
    temp.persist(path).map_err(|e| write_error(e.error))?;
    Ok(())
}

/// Atomically copy `src` to `dst` byte for byte
pub fn copy_atomic(src: &Path, dst: &Path) -> Result<()> {
    if !src.exists() {
        return Err(Error::FileNotFound(src.to_path_buf()));
    }
    let bytes = fs::read(src)?;
    write_bytes_atomic(&bytes, dst)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::fixtures;
    use crate::pdf::graph::catalog;
    use tempfile::TempDir;

    #[test]
    fn test_normalize_version_drops_catalog_override() {
        let (mut doc, pages) = fixtures::document_with_pages(&[b""]);
        fixtures::add_tagging(&mut doc, &pages);

        normalize_version(&mut doc);
        assert_eq!(doc.version, "1.4");
        let (_, catalog) = catalog(&doc).expect("catalog");
        assert!(!catalog.has(b"Version"));
    }

    #[test]
    fn test_save_document_writes_pdf_14_header() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("nested").join("out.pdf");
        let (mut doc, _) = fixtures::document_with_pages(&[b"", b""]);

        save_document(&mut doc, &path).expect("save");

        let bytes = fs::read(&path).expect("read back");
        assert!(bytes.starts_with(b"%PDF-1.4"));
        let reloaded = Document::load_mem(&bytes).expect("reload");
        assert_eq!(reloaded.get_pages().len(), 2);
    }

    #[test]
    fn test_atomic_write_leaves_no_temp_files() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("data.bin");

        write_bytes_atomic(b"first", &path).expect("first write");
        write_bytes_atomic(b"second", &path).expect("overwrite");

        assert_eq!(fs::read(&path).expect("read"), b"second");
        let entries = fs::read_dir(temp_dir.path()).expect("list").count();
        assert_eq!(entries, 1);
    }

    #[test]
    fn test_write_into_a_file_path_fails_without_output() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let blocker = temp_dir.path().join("blocker");
        fs::write(&blocker, b"not a directory").expect("create blocker");
        let path = blocker.join("out.pdf");

        let result = write_bytes_atomic(b"data", &path);
        assert!(matches!(result, Err(Error::Write { .. })));
        assert!(!path.exists());
    }

    #[test]
    fn test_copy_atomic_missing_source() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let result = copy_atomic(&temp_dir.path().join("missing.pdf"), &temp_dir.path().join("out.pdf"));
        assert!(matches!(result, Err(Error::FileNotFound(_))));
    }
}
