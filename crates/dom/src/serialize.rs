use std::collections::HashSet;

use once_cell::sync::Lazy;

use crate::tree::{Document, NodeData, NodeId};

static VOID_ELEMENTS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
        "source", "track", "wbr",
    ]
    .into_iter()
    .collect()
});

/// Serialize the whole document back to HTML.
pub fn to_html(doc: &Document) -> String {
    let mut out = String::new();
    if doc
        .children(doc.root())
        .iter()
        .any(|c| doc.element(*c).map(|el| el.name == "html").unwrap_or(false))
    {
        out.push_str("<!DOCTYPE html>\n");
    }
    for child in doc.children(doc.root()) {
        write_node(doc, *child, &mut out);
    }
    out
}

/// Serialize an element's children (its inner HTML).
pub fn inner_html(doc: &Document, id: NodeId) -> String {
    let mut out = String::new();
    for child in doc.children(id) {
        write_node(doc, *child, &mut out);
    }
    out
}

fn write_node(doc: &Document, id: NodeId, out: &mut String) {
    match doc.data(id) {
        NodeData::Document => {
            for child in doc.children(id) {
                write_node(doc, *child, out);
            }
        }
        NodeData::Text(text) => out.push_str(&escape_text(text)),
        NodeData::Element(el) => {
            out.push('<');
            out.push_str(&el.name);
            for (name, value) in &el.attrs {
                out.push(' ');
                out.push_str(name);
                out.push_str("=\"");
                out.push_str(&escape_attr(value));
                out.push('"');
            }
            out.push('>');
            if VOID_ELEMENTS.contains(el.name.as_str()) {
                return;
            }
            for child in doc.children(id) {
                write_node(doc, *child, out);
            }
            out.push_str("</");
            out.push_str(&el.name);
            out.push('>');
        }
    }
}

fn escape_text(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

fn escape_attr(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
