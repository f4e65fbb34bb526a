//! Removal of structure tagging
//!
//! Strips the structure tree and its companions from the catalog, the
//! structural-parent and tab-order keys from every page and annotation, and
//! finally scrubs MarkInfo records from anywhere in the object graph
//! reachable from the catalog.

use std::collections::BTreeSet;
use std::path::Path;

use lopdf::{Dictionary, Document, Object, ObjectId};

use crate::error::{Error, Result};
use crate::pdf::graph::{catalog, catalog_mut, page_ids, resolve, Node};
use crate::pdf::write::save_document;

/// Catalog entries that make a document tagged
pub const CATALOG_TAG_KEYS: [&[u8]; 4] = [b"StructTreeRoot", b"MarkInfo", b"RoleMap", b"ClassMap"];

/// Page entries tied to the structure tree
pub const PAGE_TAG_KEYS: [&[u8]; 2] = [b"StructParents", b"Tabs"];

/// Annotation entry tied to the structure tree
pub const ANNOTATION_TAG_KEY: &[u8] = b"StructParent";

/// Counts of entries removed by [`strip_tags`]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StripReport {
    pub catalog_entries: usize,
    pub page_entries: usize,
    pub annotation_entries: usize,
    pub nested_mark_info: usize,
}

impl StripReport {
    pub fn total(&self) -> usize {
        self.catalog_entries + self.page_entries + self.annotation_entries + self.nested_mark_info
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// Remove all tagging metadata from `doc`
///
/// Running it again on the same document removes nothing.
pub fn strip_tags(doc: &mut Document) -> StripReport {
    let mut report = StripReport::default();

    if let Some(catalog) = catalog_mut(doc) {
        report.catalog_entries = remove_keys(catalog, &CATALOG_TAG_KEYS);
    }

    let pages = page_ids(doc);
    let mut annot_refs = Vec::new();
    let mut annot_arrays = Vec::new();

    for page_id in pages {
        let Ok(Object::Dictionary(page)) = doc.get_object_mut(page_id) else {
            continue;
        };
        report.page_entries += remove_keys(page, &PAGE_TAG_KEYS);

        match page.get_mut(b"Annots") {
            Ok(Object::Array(items)) => report.annotation_entries += scrub_annotations(items, &mut annot_refs),
            Ok(Object::Reference(id)) => annot_arrays.push(*id),
            _ => {}
        }
    }

    for array_id in annot_arrays {
        if let Ok(Object::Array(items)) = doc.get_object_mut(array_id) {
            report.annotation_entries += scrub_annotations(items, &mut annot_refs);
        }
    }

    let annot_ids: Vec<ObjectId> = annot_refs
        .into_iter()
        .filter_map(|id| {
            let start = Object::Reference(id);
            let resolved = resolve(doc, &start);
            resolved.dict().and(resolved.id)
        })
        .collect();
    for id in annot_ids {
        if let Ok(Object::Dictionary(dict)) = doc.get_object_mut(id) {
            report.annotation_entries += remove_keys(dict, &[ANNOTATION_TAG_KEY]);
        }
    }

    report.nested_mark_info = scrub_mark_info(doc);

    if !report.is_empty() {
        log::debug!("stripped tagging: {:?}", report);
    }
    report
}

/// Scrub direct annotations in place and collect references to indirect ones
fn scrub_annotations(items: &mut [Object], refs: &mut Vec<ObjectId>) -> usize {
    let mut removed = 0;
    for annot in items.iter_mut() {
        match annot {
            Object::Dictionary(dict) => removed += remove_keys(dict, &[ANNOTATION_TAG_KEY]),
            Object::Reference(id) => refs.push(*id),
            _ => {}
        }
    }
    removed
}

fn remove_keys(dict: &mut Dictionary, keys: &[&[u8]]) -> usize {
    keys.iter().filter(|key| dict.remove(key).is_some()).count()
}

/// Delete MarkInfo from every dictionary reachable from the catalog
///
/// Indirect objects are visited once each, so reference cycles terminate.
/// Direct nesting is walked with an explicit stack.
fn scrub_mark_info(doc: &mut Document) -> usize {
    let mut removed = 0;
    let mut pending = Vec::new();
    let mut visited = BTreeSet::new();

    match doc.trailer.get_mut(b"Root") {
        Ok(Object::Reference(id)) => pending.push(*id),
        Ok(root) => removed += scrub_object(root, &mut pending),
        Err(_) => return 0,
    }

    while let Some(id) = pending.pop() {
        if !visited.insert(id) {
            continue;
        }
        if let Ok(object) = doc.get_object_mut(id) {
            removed += scrub_object(object, &mut pending);
        }
    }
    removed
}

fn scrub_object(object: &mut Object, pending: &mut Vec<ObjectId>) -> usize {
    let mut removed = 0;
    let mut stack: Vec<&mut Object> = vec![object];

    while let Some(current) = stack.pop() {
        let dict = match current {
            Object::Dictionary(dict) => dict,
            Object::Stream(stream) => &mut stream.dict,
            Object::Array(items) => {
                stack.extend(items.iter_mut());
                continue;
            }
            Object::Reference(id) => {
                pending.push(*id);
                continue;
            }
            Object::Null
            | Object::Boolean(_)
            | Object::Integer(_)
            | Object::Real(_)
            | Object::Name(_)
            | Object::String(_, _) => continue,
        };
        if dict.remove(b"MarkInfo").is_some() {
            removed += 1;
        }
        stack.extend(dict.iter_mut().map(|(_, value)| value));
    }
    removed
}

/// A tagging entry still present in a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagMarker {
    Catalog(String),
    Page { page: u32, key: String },
    Annotation { page: u32 },
    /// MarkInfo below the catalog; `holder` is the enclosing indirect object
    NestedMarkInfo { holder: Option<ObjectId> },
}

/// List every tagging entry [`strip_tags`] would remove
pub fn tagging_markers(doc: &Document) -> Vec<TagMarker> {
    let mut markers = Vec::new();

    if let Some((_, catalog)) = catalog(doc) {
        for key in CATALOG_TAG_KEYS {
            if catalog.has(key) {
                markers.push(TagMarker::Catalog(String::from_utf8_lossy(key).into_owned()));
            }
        }
    }

    for (page_number, page_id) in (1u32..).zip(page_ids(doc)) {
        let Ok(page) = doc.get_dictionary(page_id) else {
            continue;
        };
        for key in PAGE_TAG_KEYS {
            if page.has(key) {
                markers.push(TagMarker::Page { page: page_number, key: String::from_utf8_lossy(key).into_owned() });
            }
        }
        let Ok(annots) = page.get(b"Annots") else {
            continue;
        };
        if let Node::Array(items) = resolve(doc, annots).node() {
            for annot in items {
                if resolve(doc, annot).dict().is_some_and(|dict| dict.has(ANNOTATION_TAG_KEY)) {
                    markers.push(TagMarker::Annotation { page: page_number });
                }
            }
        }
    }

    markers.extend(nested_mark_info(doc).into_iter().map(|holder| TagMarker::NestedMarkInfo { holder }));
    markers
}

/// Holders of MarkInfo entries anywhere below the catalog's own entries
fn nested_mark_info(doc: &Document) -> Vec<Option<ObjectId>> {
    let Some((catalog_id, catalog)) = catalog(doc) else {
        return Vec::new();
    };

    let mut found = Vec::new();
    let mut visited: BTreeSet<ObjectId> = catalog_id.into_iter().collect();
    let mut stack: Vec<(&Object, Option<ObjectId>)> = catalog.iter().map(|(_, value)| (value, catalog_id)).collect();

    while let Some((current, holder)) = stack.pop() {
        let dict = match Node::of(current) {
            Node::Dictionary(dict) => dict,
            Node::Stream(stream) => &stream.dict,
            Node::Array(items) => {
                stack.extend(items.iter().map(|item| (item, holder)));
                continue;
            }
            Node::Reference(id) => {
                if visited.insert(id) {
                    if let Ok(target) = doc.get_object(id) {
                        stack.push((target, Some(id)));
                    }
                }
                continue;
            }
            Node::Name(_) | Node::Scalar(_) => continue,
        };
        if dict.has(b"MarkInfo") {
            found.push(holder);
        }
        stack.extend(dict.iter().map(|(_, value)| (value, holder)));
    }
    found
}

/// Load `input`, strip its tagging and write it to `output` as PDF 1.4
pub fn untag_file(input: &Path, output: &Path) -> Result<StripReport> {
    if !input.exists() {
        return Err(Error::FileNotFound(input.to_path_buf()));
    }
    let mut doc = Document::load(input)?;
    let report = strip_tags(&mut doc);
    // The detached structure tree stays in the object table until pruned
    doc.prune_objects();
    save_document(&mut doc, output)?;
    Ok(report)
}
