//! Shared fixtures for integration tests
#![allow(dead_code)]

use std::path::{Path, PathBuf};

use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};

/// Content for a page carrying visible text, tagged with `label`
pub fn text_page(label: &str) -> Vec<u8> {
    format!("% {}\nBT /F1 12 Tf 72 720 Td (Invoice 4471 section {}) Tj ET", label, label).into_bytes()
}

/// Content for a page with nothing on it
pub fn blank_page() -> Vec<u8> {
    Vec::new()
}

/// A document with one page per entry of `contents`, optionally carrying
/// a full set of structure tagging
pub fn build_document(contents: &[Vec<u8>], tagged: bool) -> Document {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });

    let mut page_ids: Vec<ObjectId> = Vec::new();
    for (index, content) in contents.iter().enumerate() {
        let content_id = doc.add_object(Stream::new(Dictionary::new(), content.clone()));
        let mut page = dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        };
        if tagged {
            let annot_id = doc.add_object(dictionary! {
                "Type" => "Annot",
                "Subtype" => "Text",
                "StructParent" => Object::Integer(1000 + index as i64),
            });
            page.set("StructParents", Object::Integer(index as i64));
            page.set("Tabs", Object::Name(b"S".to_vec()));
            page.set("Annots", Object::Array(vec![Object::Reference(annot_id)]));
        }
        page_ids.push(doc.add_object(page));
    }

    let kids: Vec<Object> = page_ids.iter().map(|&id| Object::Reference(id)).collect();
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => Object::Array(kids),
            "Count" => Object::Integer(page_ids.len() as i64),
            "Resources" => dictionary! { "Font" => dictionary! { "F1" => font_id } },
            "MediaBox" => Object::Array(vec![Object::Integer(0), Object::Integer(0), Object::Integer(595), Object::Integer(842)]),
        }),
    );

    let mut catalog = dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    };
    if tagged {
        let struct_root = doc.add_object(dictionary! { "Type" => "StructTreeRoot" });
        catalog.set("StructTreeRoot", struct_root);
        catalog.set("MarkInfo", dictionary! { "Marked" => true });
        catalog.set("RoleMap", dictionary! { "Heading" => "H1" });
        catalog.set("ClassMap", Dictionary::new());
    }
    let catalog_id = doc.add_object(catalog);
    doc.trailer.set("Root", catalog_id);

    doc
}

/// Write a fixture document to `dir/name`
pub fn write_pdf(dir: &Path, name: &str, contents: &[Vec<u8>], tagged: bool) -> PathBuf {
    let path = dir.join(name);
    let mut doc = build_document(contents, tagged);
    doc.save(&path).expect("Failed to write fixture PDF");
    path
}

/// Labels of the pages of the PDF at `path`, in page order
pub fn page_labels(path: &Path) -> Vec<String> {
    let doc = Document::load(path).expect("Failed to load PDF");
    doc.get_pages()
        .into_values()
        .map(|page_id| {
            let content = doc.get_page_content(page_id).expect("Failed to read page content");
            let text = String::from_utf8_lossy(&content).into_owned();
            text.lines()
                .find_map(|line| line.strip_prefix("% "))
                .unwrap_or_default()
                .to_string()
        })
        .collect()
}

/// Labels `p1..=pN`
pub fn labels(count: usize) -> Vec<String> {
    (1..=count).map(|i| format!("p{}", i)).collect()
}
