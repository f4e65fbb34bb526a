//! Standalone documents from a subset of pages
//!
//! The subset gets its own page tree and a fresh catalog holding nothing but
//! `/Type` and `/Pages`, so catalog-level structure from the source (tagging
//! included) is never carried over. Attributes the pages inherited from the
//! old tree are written onto each page before that tree is detached.

use std::collections::{BTreeMap, BTreeSet};

use lopdf::{Dictionary, Document, Object, ObjectId};

use crate::diagnostics::DiagnosticSink;
use crate::error::{Error, Result};
use crate::pdf::graph;
use crate::pdf::inherit::{get_inherited, INHERITABLE_KEYS};
use crate::pdf::write::normalize_version;

/// Build a document holding exactly `page_ids` of `source`, in the given order
///
/// Every id must be a page of `source` and may appear only once. Objects no
/// longer reachable from the new catalog are dropped and the remaining ones
/// renumbered.
pub fn extract_pages(
    source: &Document,
    page_ids: &[ObjectId],
    sink: &mut dyn DiagnosticSink,
) -> Result<Document> {
    let source_pages: BTreeSet<ObjectId> = graph::page_ids(source).into_iter().collect();

    let mut kept = BTreeSet::new();
    for &id in page_ids {
        if !source_pages.contains(&id) {
            return Err(Error::InvalidArgument(format!("{} {} R is not a page of the document", id.0, id.1)));
        }
        if !kept.insert(id) {
            return Err(Error::InvalidArgument(format!("page {} {} R requested twice", id.0, id.1)));
        }
    }

    // Inherited values are looked up before anything is rewired
    let mut materialized: BTreeMap<ObjectId, Vec<(&[u8], Object)>> = BTreeMap::new();
    for &page_id in page_ids {
        let Ok(page) = source.get_dictionary(page_id) else {
            return Err(Error::General(format!("page {} {} R is not a dictionary", page_id.0, page_id.1)));
        };
        let mut values = Vec::new();
        for key in INHERITABLE_KEYS {
            if page.has(key) {
                continue;
            }
            if let Some(value) = get_inherited(source, page_id, key, sink) {
                values.push((key, value.to_embedded()));
            }
        }
        materialized.insert(page_id, values);
    }

    let mut doc = source.clone();
    let detached = old_tree_nodes(&doc, &source_pages, &kept);
    detach_references(&mut doc, &detached);

    let pages_id = doc.new_object_id();
    for &page_id in page_ids {
        let page = doc.get_object_mut(page_id)?.as_dict_mut()?;
        for (key, value) in materialized.remove(&page_id).unwrap_or_default() {
            page.set(key, value);
        }
        page.set("Parent", Object::Reference(pages_id));
    }

    let kids: Vec<Object> = page_ids.iter().map(|&id| Object::Reference(id)).collect();
    let mut pages = Dictionary::new();
    pages.set("Type", Object::Name(b"Pages".to_vec()));
    pages.set("Count", Object::Integer(page_ids.len() as i64));
    pages.set("Kids", Object::Array(kids));
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = doc.new_object_id();
    let mut catalog = Dictionary::new();
    catalog.set("Type", Object::Name(b"Catalog".to_vec()));
    catalog.set("Pages", Object::Reference(pages_id));
    doc.objects.insert(catalog_id, Object::Dictionary(catalog));

    let mut trailer = Dictionary::new();
    trailer.set("Root", Object::Reference(catalog_id));
    if let Ok(info) = source.trailer.get(b"Info") {
        trailer.set("Info", info.clone());
    }
    doc.trailer = trailer;

    doc.prune_objects();
    doc.renumber_objects();
    normalize_version(&mut doc);

    log::debug!("assembled {} of {} pages", page_ids.len(), source_pages.len());
    Ok(doc)
}

/// Pages left out of the subset plus every intermediate node of the old page tree
fn old_tree_nodes(doc: &Document, source_pages: &BTreeSet<ObjectId>, kept: &BTreeSet<ObjectId>) -> BTreeSet<ObjectId> {
    let mut nodes: BTreeSet<ObjectId> = source_pages.difference(kept).copied().collect();
    for (&id, object) in &doc.objects {
        if let Object::Dictionary(dict) = object {
            if matches!(dict.get(b"Type"), Ok(Object::Name(name)) if name == b"Pages") {
                nodes.insert(id);
            }
        }
    }
    nodes
}

/// Replace every reference to `targets` with null, so annotations and links
/// pointing at dropped pages do not keep them (and their tree) alive
fn detach_references(doc: &mut Document, targets: &BTreeSet<ObjectId>) {
    if targets.is_empty() {
        return;
    }
    for object in doc.objects.values_mut() {
        detach_in(object, targets);
    }
}

fn detach_in(object: &mut Object, targets: &BTreeSet<ObjectId>) {
    if matches!(object, Object::Reference(id) if targets.contains(id)) {
        *object = Object::Null;
        return;
    }
    match object {
        Object::Array(items) => items.iter_mut().for_each(|item| detach_in(item, targets)),
        Object::Dictionary(dict) => dict.iter_mut().for_each(|(_, value)| detach_in(value, targets)),
        Object::Stream(stream) => stream.dict.iter_mut().for_each(|(_, value)| detach_in(value, targets)),
        Object::Null
        | Object::Boolean(_)
        | Object::Integer(_)
        | Object::Real(_)
        | Object::Name(_)
        | Object::String(_, _)
        | Object::Reference(_) => {}
    }
}
