//! Bounded, cycle-tolerant resolution of indirect references
//!
//! Documents are untrusted input: a reference may point at itself, into a
//! longer cycle, or at an object that does not exist. Resolution here never
//! fails. It follows at most a fixed number of hops, remembers every object
//! identity it passed through, and hands back the last value it reached
//! together with a [`GraphDefect`] describing why it stopped early.

use std::collections::BTreeSet;
use std::fmt;

use lopdf::{Dictionary, Document, Object, ObjectId, Stream};

/// Hop bound for general reference resolution
pub const REFERENCE_HOP_LIMIT: usize = 5;

/// Hop bound for walks up a page's ancestor chain
pub const ANCESTOR_HOP_LIMIT: usize = 10;

/// Why a resolution stopped before reaching a direct value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphDefect {
    /// The reference leads back to an object already visited
    Cycle(ObjectId),
    /// The reference points at a missing or null object
    Dangling(ObjectId),
    /// The hop bound ran out while still holding a reference
    HopLimit(ObjectId),
}

impl fmt::Display for GraphDefect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (what, (num, generation)) = match *self {
            GraphDefect::Cycle(id) => ("reference cycle at", id),
            GraphDefect::Dangling(id) => ("dangling reference", id),
            GraphDefect::HopLimit(id) => ("hop limit reached at", id),
        };
        write!(f, "{} {} {} R", what, num, generation)
    }
}

/// Outcome of a best-effort resolution
#[derive(Debug, Clone, Copy)]
pub struct Resolved<'a> {
    /// The last value reached; still a reference when `defect` is set
    pub object: &'a Object,
    /// Identity of `object` when it was reached through a reference
    pub id: Option<ObjectId>,
    /// Set when resolution stopped early
    pub defect: Option<GraphDefect>,
}

impl<'a> Resolved<'a> {
    /// Tagged view of the resolved value
    pub fn node(&self) -> Node<'a> {
        Node::of(self.object)
    }

    /// Dictionary of the resolved value (streams expose their stream dictionary)
    pub fn dict(&self) -> Option<&'a Dictionary> {
        self.node().dict()
    }

    /// The value as it should be re-embedded elsewhere in the same document:
    /// a reference when it lives in the object table, a copy otherwise
    pub fn to_embedded(&self) -> Object {
        match self.id {
            Some(id) if self.defect.is_none() => Object::Reference(id),
            _ => self.object.clone(),
        }
    }
}

/// Tagged view over the kinds of PDF object the traversals care about
#[derive(Debug, Clone, Copy)]
pub enum Node<'a> {
    Dictionary(&'a Dictionary),
    Stream(&'a Stream),
    Array(&'a [Object]),
    Name(&'a [u8]),
    Reference(ObjectId),
    Scalar(&'a Object),
}

impl<'a> Node<'a> {
    pub fn of(object: &'a Object) -> Self {
        match object {
            Object::Dictionary(dict) => Node::Dictionary(dict),
            Object::Stream(stream) => Node::Stream(stream),
            Object::Array(items) => Node::Array(items.as_slice()),
            Object::Name(name) => Node::Name(name.as_slice()),
            Object::Reference(id) => Node::Reference(*id),
            Object::Null
            | Object::Boolean(_)
            | Object::Integer(_)
            | Object::Real(_)
            | Object::String(_, _) => Node::Scalar(object),
        }
    }

    pub fn dict(&self) -> Option<&'a Dictionary> {
        match *self {
            Node::Dictionary(dict) => Some(dict),
            Node::Stream(stream) => Some(&stream.dict),
            Node::Array(_) | Node::Name(_) | Node::Reference(_) | Node::Scalar(_) => None,
        }
    }

    pub fn name(&self) -> Option<&'a [u8]> {
        match *self {
            Node::Name(name) => Some(name),
            Node::Dictionary(_) | Node::Stream(_) | Node::Array(_) | Node::Reference(_) | Node::Scalar(_) => None,
        }
    }
}

/// Resolve `object` with the general hop bound
pub fn resolve<'a>(doc: &'a Document, object: &'a Object) -> Resolved<'a> {
    resolve_with_limit(doc, object, REFERENCE_HOP_LIMIT)
}

/// Resolve `object`, following at most `max_hops` references
pub fn resolve_with_limit<'a>(doc: &'a Document, object: &'a Object, max_hops: usize) -> Resolved<'a> {
    let mut current = object;
    let mut id = None;
    let mut seen = BTreeSet::new();
    let mut hops = 0;

    while let Object::Reference(next_id) = current {
        let next_id = *next_id;
        if !seen.insert(next_id) {
            return Resolved { object: current, id, defect: Some(GraphDefect::Cycle(next_id)) };
        }
        if hops == max_hops {
            return Resolved { object: current, id, defect: Some(GraphDefect::HopLimit(next_id)) };
        }
        match doc.objects.get(&next_id) {
            Some(Object::Null) | None => {
                return Resolved { object: current, id, defect: Some(GraphDefect::Dangling(next_id)) };
            }
            Some(target) => {
                current = target;
                id = Some(next_id);
                hops += 1;
            }
        }
    }

    Resolved { object: current, id, defect: None }
}

/// Look up `key` in `dict` and resolve its value
pub fn resolve_entry<'a>(doc: &'a Document, dict: &'a Dictionary, key: &[u8]) -> Option<Resolved<'a>> {
    dict.get(key).ok().map(|value| resolve(doc, value))
}

/// Identity and dictionary of the document catalog, if the trailer's Root resolves to one
pub fn catalog(doc: &Document) -> Option<(Option<ObjectId>, &Dictionary)> {
    let root = resolve(doc, doc.trailer.get(b"Root").ok()?);
    root.dict().map(|dict| (root.id, dict))
}

/// Mutable catalog dictionary, whether the trailer's Root is a reference or inline
pub fn catalog_mut(doc: &mut Document) -> Option<&mut Dictionary> {
    let catalog_id = catalog(doc)?.0;
    match catalog_id {
        Some(id) => match doc.get_object_mut(id).ok()? {
            Object::Dictionary(dict) => Some(dict),
            Object::Stream(stream) => Some(&mut stream.dict),
            _ => None,
        },
        None => match doc.trailer.get_mut(b"Root").ok()? {
            Object::Dictionary(dict) => Some(dict),
            _ => None,
        },
    }
}

/// Page object ids in document order, walking the page tree from the catalog
///
/// Every node is visited once, so a `Kids` array that lists a node already
/// seen (itself, an ancestor, or a page twice) cannot repeat pages. Entries
/// that do not resolve to a dictionary are skipped.
pub fn page_ids(doc: &Document) -> Vec<ObjectId> {
    let mut pages = Vec::new();
    let Some(root) = catalog(doc).and_then(|(_, catalog)| catalog.get(b"Pages").ok()) else {
        return pages;
    };

    let mut seen = BTreeSet::new();
    let mut pending: Vec<&Object> = vec![root];
    while let Some(entry) = pending.pop() {
        let resolved = resolve(doc, entry);
        let (Some(id), None) = (resolved.id, resolved.defect) else {
            continue;
        };
        if !seen.insert(id) {
            continue;
        }
        let Some(dict) = resolved.dict() else {
            continue;
        };
        match dict.get(b"Kids").map(|kids| resolve(doc, kids).node()) {
            Ok(Node::Array(kids)) => pending.extend(kids.iter().rev()),
            _ if !matches!(dict.get(b"Type"), Ok(Object::Name(name)) if name == b"Pages") => pages.push(id),
            _ => {}
        }
    }
    pages
}
