//! In-memory documents for unit tests

use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};

/// Objects `1..=length`, each referencing the next, the last pointing back at the first
pub fn reference_ring(length: usize) -> Document {
    let mut doc = Document::with_version("1.4");
    for i in 1..=length as u32 {
        let next = if i as usize == length { 1 } else { i + 1 };
        doc.objects.insert((i, 0), Object::Reference((next, 0)));
    }
    doc.max_id = length as u32;
    doc
}

/// A document whose pages carry one content stream each, with fonts and
/// MediaBox declared once on the Pages node
pub fn document_with_pages(contents: &[&[u8]]) -> (Document, Vec<ObjectId>) {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut page_ids = Vec::new();
    for content in contents {
        let content_id = doc.add_object(Stream::new(Dictionary::new(), content.to_vec()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        page_ids.push(page_id);
    }

    let kids: Vec<Object> = page_ids.iter().map(|&id| Object::Reference(id)).collect();
    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => Object::Array(kids),
        "Count" => Object::Integer(page_ids.len() as i64),
        "Resources" => resources_id,
        "MediaBox" => Object::Array(vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Integer(595),
            Object::Integer(842),
        ]),
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    (doc, page_ids)
}

/// A 1x1 grey image XObject
pub fn image_stream() -> Stream {
    Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => Object::Integer(1),
            "Height" => Object::Integer(1),
            "ColorSpace" => "DeviceGray",
            "BitsPerComponent" => Object::Integer(8),
        },
        vec![0x80],
    )
}

/// A form XObject drawing nothing, with the given resources
pub fn form_stream(resources: Object) -> Stream {
    Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Form",
            "BBox" => Object::Array(vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(10),
                Object::Integer(10),
            ]),
            "Resources" => resources,
        },
        Vec::new(),
    )
}

/// Set `key` on the page dictionary `page_id`
pub fn set_page_entry(doc: &mut Document, page_id: ObjectId, key: &str, value: Object) {
    if let Ok(Object::Dictionary(page)) = doc.get_object_mut(page_id) {
        page.set(key, value);
    }
}

/// Add a full set of tagging metadata: catalog structure entries, per-page
/// keys, an annotation with a structural parent, and a MarkInfo record
/// buried in an unrelated self-referencing dictionary
pub fn add_tagging(doc: &mut Document, page_ids: &[ObjectId]) {
    let struct_root = doc.add_object(dictionary! {
        "Type" => "StructTreeRoot",
        "ParentTreeNextKey" => Object::Integer(page_ids.len() as i64),
    });

    let names_id = doc.new_object_id();
    doc.objects.insert(
        names_id,
        Object::Dictionary(dictionary! {
            "Self" => names_id,
            "Deep" => Object::Array(vec![Object::Dictionary(dictionary! {
                "MarkInfo" => dictionary! { "Marked" => true },
            })]),
        }),
    );

    let root_id = doc
        .trailer
        .get(b"Root")
        .and_then(Object::as_reference)
        .expect("fixture has an indirect root");
    if let Ok(Object::Dictionary(catalog)) = doc.get_object_mut(root_id) {
        catalog.set("StructTreeRoot", struct_root);
        catalog.set("MarkInfo", dictionary! { "Marked" => true, "Suspects" => false });
        catalog.set("RoleMap", dictionary! { "Heading" => "H1" });
        catalog.set("ClassMap", dictionary! { "Bold" => dictionary! { "O" => "Layout" } });
        catalog.set("Version", "1.7");
        catalog.set("Names", names_id);
    }

    for (index, &page_id) in page_ids.iter().enumerate() {
        let annot_id = doc.add_object(dictionary! {
            "Type" => "Annot",
            "Subtype" => "Text",
            "StructParent" => Object::Integer(100 + index as i64),
        });
        set_page_entry(doc, page_id, "StructParents", Object::Integer(index as i64));
        set_page_entry(doc, page_id, "Tabs", Object::Name(b"S".to_vec()));
        set_page_entry(doc, page_id, "Annots", Object::Array(vec![Object::Reference(annot_id)]));
    }
}

/// Make the root Pages node list itself in its own `Kids`, followed by `extra`
pub fn loop_page_tree(doc: &mut Document, extra: &[ObjectId]) {
    let pages_id = doc
        .catalog()
        .and_then(|catalog| catalog.get(b"Pages"))
        .and_then(Object::as_reference)
        .expect("pages reference");
    let kids = doc
        .get_object_mut(pages_id)
        .and_then(Object::as_dict_mut)
        .and_then(|pages| pages.get_mut(b"Kids"))
        .and_then(Object::as_array_mut)
        .expect("kids array");
    kids.push(Object::Reference(pages_id));
    kids.extend(extra.iter().map(|&id| Object::Reference(id)));
}
