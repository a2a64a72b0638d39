//! HTML parsing and mutation for page content.
//!
//! Thin helpers over html5ever's rcdom: parse a page or fragment, find the
//! marked insertion points, read their attributes, splice rendered fragments
//! in, and serialize the tree back to a string.

use std::rc::Rc;

use html5ever::ParseOpts;
use html5ever::parse_document;
use html5ever::serialize::{SerializeOpts, serialize};
use html5ever::tendril::TendrilSink;
use html5ever::tree_builder::TreeBuilderOpts;
use markup5ever_rcdom::{Handle, NodeData, RcDom, SerializableHandle};

use crate::error::{QuotepressError, QuotepressResult};

/// Parse HTML content into a DOM tree.
pub fn parse_html(html: &str) -> RcDom {
    let opts = ParseOpts {
        tree_builder: TreeBuilderOpts {
            drop_doctype: false,
            ..Default::default()
        },
        ..Default::default()
    };

    parse_document(RcDom::default(), opts)
        .from_utf8()
        .one(html.as_bytes())
}

/// Parse a fragment of HTML (not a full document).
pub fn parse_fragment(html: &str) -> RcDom {
    let wrapped = format!("<html><head></head><body>{html}</body></html>");
    parse_html(&wrapped)
}

/// Serialize a DOM tree back to an HTML string.
pub fn serialize_html(dom: &RcDom) -> QuotepressResult<String> {
    let mut bytes = Vec::new();
    let document: SerializableHandle = dom.document.clone().into();

    serialize(&mut bytes, &document, SerializeOpts::default())
        .map_err(|e| QuotepressError::markup(format!("serialize document: {e}")))?;

    String::from_utf8(bytes).map_err(|e| QuotepressError::markup(format!("non-utf8 output: {e}")))
}

/// Find all elements whose `id` attribute equals `id`, in document order.
pub fn find_elements_by_id(handle: &Handle, id: &str) -> Vec<Handle> {
    let mut results = Vec::new();
    find_by_id_recursive(handle, id, &mut results);
    results
}

fn find_by_id_recursive(handle: &Handle, id: &str, results: &mut Vec<Handle>) {
    if get_attribute(handle, "id").as_deref() == Some(id) {
        results.push(handle.clone());
    }

    for child in handle.children.borrow().iter() {
        find_by_id_recursive(child, id, results);
    }
}

/// Get the first element with the given local name.
pub fn find_first_element(handle: &Handle, name: &str) -> Option<Handle> {
    if let NodeData::Element { name: ref qname, .. } = handle.data
        && qname.local.as_ref() == name
    {
        return Some(handle.clone());
    }

    for child in handle.children.borrow().iter() {
        if let Some(found) = find_first_element(child, name) {
            return Some(found);
        }
    }

    None
}

/// Get an attribute value from an element.
pub fn get_attribute(handle: &Handle, attr_name: &str) -> Option<String> {
    if let NodeData::Element { ref attrs, .. } = handle.data {
        for attr in attrs.borrow().iter() {
            if attr.name.local.as_ref() == attr_name {
                return Some(attr.value.to_string());
            }
        }
    }
    None
}

/// Move the body children of a parsed fragment under `target`.
pub fn append_fragment_children(target: &Handle, fragment: &RcDom) {
    let Some(body) = find_first_element(&fragment.document, "body") else {
        return;
    };

    let children: Vec<Handle> = body.children.borrow_mut().drain(..).collect();
    let mut target_children = target.children.borrow_mut();
    for child in children {
        child.parent.set(Some(Rc::downgrade(target)));
        target_children.push(child);
    }
}
