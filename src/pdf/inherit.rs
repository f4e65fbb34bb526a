//! Inherited page attributes
//!
//! Resources, MediaBox, CropBox and Rotate may be declared once on a Pages
//! node and apply to every page below it. Lookups walk the Parent chain
//! upward, bounded by [`ANCESTOR_HOP_LIMIT`].

use std::collections::BTreeSet;

use lopdf::{Document, Object, ObjectId};

use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::pdf::graph::{resolve, resolve_with_limit, Resolved, ANCESTOR_HOP_LIMIT};

/// Page attributes a page may inherit from its ancestors
pub const INHERITABLE_KEYS: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Find `key` on the page `page_id` or its nearest ancestor defining it
///
/// Returns `None` when no node along the chain defines the key, when the
/// chain is broken, or when it loops back on itself.
pub fn get_inherited<'a>(
    doc: &'a Document,
    page_id: ObjectId,
    key: &[u8],
    sink: &mut dyn DiagnosticSink,
) -> Option<Resolved<'a>> {
    let mut current = doc.get_object(page_id).ok()?;
    let mut visited = BTreeSet::from([page_id]);

    for _ in 0..ANCESTOR_HOP_LIMIT {
        let node = resolve(doc, current);
        let dict = node.dict()?;

        if let Ok(value) = dict.get(key) {
            let value = resolve(doc, value);
            if let Some(defect) = value.defect {
                sink.record(Diagnostic::Graph(defect));
            }
            if !matches!(value.object, Object::Null) {
                return Some(value);
            }
        }

        let parent = dict.get(b"Parent").ok()?;
        let parent = resolve_with_limit(doc, parent, ANCESTOR_HOP_LIMIT);
        if let Some(defect) = parent.defect {
            sink.record(Diagnostic::Graph(defect));
            return None;
        }
        if let Some(parent_id) = parent.id {
            if !visited.insert(parent_id) {
                log::debug!("page {:?}: Parent chain loops back to {:?}", page_id, parent_id);
                return None;
            }
        }
        current = parent.object;
    }

    None
}
