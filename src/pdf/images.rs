//! Image detection in resource dictionaries
//!
//! Walks the XObject table of a resource dictionary. Image XObjects end the
//! search; Form XObjects are searched through their own resources. An entry
//! that cannot be inspected counts as an image, since wrongly dropping a page
//! with content is worse than keeping a blank one.

use std::collections::BTreeSet;
use std::fmt;

use lopdf::{Dictionary, Document, Object, ObjectId};

use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::pdf::graph::{resolve, GraphDefect, Node};

/// Deepest chain of nested Form XObjects that is searched
pub const MAX_FORM_DEPTH: usize = 32;

/// Why a resource entry could not be inspected
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InspectionFailureKind {
    Unresolvable(GraphDefect),
    DepthExceeded,
}

/// An XObject entry whose kind could not be determined
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InspectionFailure {
    /// Resource name of the entry
    pub entry: String,
    pub kind: InspectionFailureKind,
}

impl fmt::Display for InspectionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            InspectionFailureKind::Unresolvable(defect) => {
                write!(f, "XObject /{} could not be inspected ({})", self.entry, defect)
            }
            InspectionFailureKind::DepthExceeded => write!(
                f,
                "XObject /{} nests forms deeper than {} levels",
                self.entry, MAX_FORM_DEPTH
            ),
        }
    }
}

/// Whether `resources` holds an image XObject directly or inside a form
pub fn has_images(doc: &Document, resources: Option<&Object>, sink: &mut dyn DiagnosticSink) -> bool {
    let Some(resources) = resources else {
        return false;
    };

    let mut scan = Scan { doc, visited: BTreeSet::new(), sink };
    match scan.resources(resources, 0) {
        Ok(found) => found,
        Err(failure) => {
            scan.sink.record(Diagnostic::Inspection(failure));
            true
        }
    }
}

struct Scan<'a, 's> {
    doc: &'a Document,
    visited: BTreeSet<ObjectId>,
    sink: &'s mut dyn DiagnosticSink,
}

impl<'a, 's> Scan<'a, 's> {
    fn resources(&mut self, resources: &'a Object, depth: usize) -> Result<bool, InspectionFailure> {
        let resolved = resolve(self.doc, resources);
        if let Some(defect) = resolved.defect {
            self.sink.record(Diagnostic::Graph(defect));
        }
        if let Some(id) = resolved.id {
            if !self.visited.insert(id) {
                return Ok(false);
            }
        }
        let Some(dict) = resolved.dict() else {
            return Ok(false);
        };

        let Ok(xobjects) = dict.get(b"XObject") else {
            return Ok(false);
        };
        let xobjects = resolve(self.doc, xobjects);
        if let Some(defect) = xobjects.defect {
            self.sink.record(Diagnostic::Graph(defect));
        }
        let Some(xobjects) = xobjects.dict() else {
            return Ok(false);
        };

        for (name, entry) in xobjects.iter() {
            if self.entry(name, entry, depth)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn entry(&mut self, name: &[u8], entry: &'a Object, depth: usize) -> Result<bool, InspectionFailure> {
        let failure = |kind| InspectionFailure { entry: String::from_utf8_lossy(name).into_owned(), kind };

        let resolved = resolve(self.doc, entry);
        if let Some(defect) = resolved.defect {
            return Err(failure(InspectionFailureKind::Unresolvable(defect)));
        }

        let dict = match resolved.node() {
            Node::Dictionary(dict) => dict,
            Node::Stream(stream) => &stream.dict,
            Node::Reference(id) => {
                return Err(failure(InspectionFailureKind::Unresolvable(GraphDefect::HopLimit(id))));
            }
            Node::Array(_) | Node::Name(_) | Node::Scalar(_) => return Ok(false),
        };

        match subtype(self.doc, dict) {
            Some(b"Image") => Ok(true),
            Some(b"Form") => {
                if depth >= MAX_FORM_DEPTH {
                    return Err(failure(InspectionFailureKind::DepthExceeded));
                }
                if let Some(id) = resolved.id {
                    if !self.visited.insert(id) {
                        return Ok(false);
                    }
                }
                match dict.get(b"Resources") {
                    Ok(nested) => self.resources(nested, depth + 1),
                    Err(_) => Ok(false),
                }
            }
            _ => Ok(false),
        }
    }
}

fn subtype<'a>(doc: &'a Document, dict: &'a Dictionary) -> Option<&'a [u8]> {
    let value = dict.get(b"Subtype").ok()?;
    resolve(doc, value).node().name()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::fixtures;
    use lopdf::dictionary;

    fn xobjects(entries: Vec<(&str, Object)>) -> Object {
        let mut table = Dictionary::new();
        for (name, value) in entries {
            table.set(name, value);
        }
        Object::Dictionary(dictionary! { "XObject" => table })
    }

    #[test]
    fn test_absent_resources_have_no_images() {
        let doc = Document::with_version("1.4");
        let mut events: Vec<Diagnostic> = Vec::new();
        assert!(!has_images(&doc, None, &mut events));
        assert!(!has_images(&doc, Some(&Object::Dictionary(Dictionary::new())), &mut events));
    }

    #[test]
    fn test_direct_image_is_found() {
        let mut doc = Document::with_version("1.4");
        let image = doc.add_object(fixtures::image_stream());
        let resources = xobjects(vec![("Im0", Object::Reference(image))]);

        let mut events: Vec<Diagnostic> = Vec::new();
        assert!(has_images(&doc, Some(&resources), &mut events));
        assert!(events.is_empty());
    }

    #[test]
    fn test_image_inside_form_is_found() {
        let mut doc = Document::with_version("1.4");
        let image = doc.add_object(fixtures::image_stream());
        let inner = xobjects(vec![("Im0", Object::Reference(image))]);
        let form = doc.add_object(fixtures::form_stream(inner));
        let resources = xobjects(vec![("Fm0", Object::Reference(form))]);

        let mut events: Vec<Diagnostic> = Vec::new();
        assert!(has_images(&doc, Some(&resources), &mut events));
    }

    #[test]
    fn test_form_without_images_is_not_an_image() {
        let mut doc = Document::with_version("1.4");
        let form = doc.add_object(fixtures::form_stream(Object::Dictionary(Dictionary::new())));
        let resources = xobjects(vec![("Fm0", Object::Reference(form))]);

        let mut events: Vec<Diagnostic> = Vec::new();
        assert!(!has_images(&doc, Some(&resources), &mut events));
    }

    #[test]
    fn test_self_containing_form_terminates() {
        let mut doc = Document::with_version("1.4");
        let form_id = doc.new_object_id();
        let resources = xobjects(vec![("Fm0", Object::Reference(form_id))]);
        doc.objects.insert(form_id, Object::Stream(fixtures::form_stream(resources.clone())));

        let mut events: Vec<Diagnostic> = Vec::new();
        assert!(!has_images(&doc, Some(&resources), &mut events));
    }

    #[test]
    fn test_unresolvable_entry_counts_as_image() {
        let doc = Document::with_version("1.4");
        let resources = xobjects(vec![("Im0", Object::Reference((40, 0)))]);

        let mut events: Vec<Diagnostic> = Vec::new();
        assert!(has_images(&doc, Some(&resources), &mut events));
        assert!(matches!(
            events.as_slice(),
            [Diagnostic::Inspection(InspectionFailure {
                kind: InspectionFailureKind::Unresolvable(GraphDefect::Dangling((40, 0))),
                ..
            })]
        ));
    }

    #[test]
    fn test_scalar_entries_are_skipped() {
        let doc = Document::with_version("1.4");
        let resources = xobjects(vec![("Junk", Object::Integer(3))]);

        let mut events: Vec<Diagnostic> = Vec::new();
        assert!(!has_images(&doc, Some(&resources), &mut events));
    }

    #[test]
    fn test_deep_form_nesting_counts_as_image() {
        let mut doc = Document::with_version("1.4");
        let mut resources = Object::Dictionary(Dictionary::new());
        for _ in 0..=MAX_FORM_DEPTH + 1 {
            let form = doc.add_object(fixtures::form_stream(resources));
            resources = xobjects(vec![("Fm", Object::Reference(form))]);
        }

        let mut events: Vec<Diagnostic> = Vec::new();
        assert!(has_images(&doc, Some(&resources), &mut events));
        assert!(events.iter().any(|e| matches!(
            e,
            Diagnostic::Inspection(InspectionFailure { kind: InspectionFailureKind::DepthExceeded, .. })
        )));
    }
}
