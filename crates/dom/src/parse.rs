use ego_tree::NodeRef;
use scraper::node::Node as HtmlNode;
use scraper::Html;

use crate::tree::{Document, ElementData, NodeId};

/// Parse a full HTML document into an arena [`Document`]. Doctype,
/// comments and processing instructions are dropped; the highlight engine
/// only anchors against elements and text.
pub fn parse_document(html: &str) -> Document {
    let parsed = Html::parse_document(html);
    let mut doc = Document::new();
    let root = doc.root();
    for child in parsed.tree.root().children() {
        copy_node(child, root, &mut doc);
    }
    doc
}

/// Parse an HTML fragment and append its nodes under `parent`. Used to
/// replay a record's serialized marker content on structural restore.
pub fn append_fragment(doc: &mut Document, parent: NodeId, html: &str) {
    let parsed = Html::parse_fragment(html);
    for child in parsed.tree.root().children() {
        // html5ever wraps fragment content in a synthetic <html> element
        if let HtmlNode::Element(el) = child.value() {
            if el.name() == "html" {
                for grandchild in child.children() {
                    copy_node(grandchild, parent, doc);
                }
                continue;
            }
        }
        copy_node(child, parent, doc);
    }
}

fn copy_node(src: NodeRef<'_, HtmlNode>, parent: NodeId, doc: &mut Document) {
    match src.value() {
        HtmlNode::Element(el) => {
            let mut data = ElementData::new(el.name());
            for (name, value) in el.attrs() {
                data.set_attr(name, value);
            }
            let id = doc.create_element(data);
            doc.append_child(parent, id);
            for child in src.children() {
                copy_node(child, id, doc);
            }
        }
        HtmlNode::Text(text) => {
            let id = doc.create_text(text.text.to_string());
            doc.append_child(parent, id);
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_document_structure() {
        let doc = parse_document(
            "<html><head><title>A Page</title></head><body><p>hello <a href=\"/x\">link</a></p></body></html>",
        );
        assert_eq!(doc.title().as_deref(), Some("A Page"));
        let body = doc.body();
        assert_eq!(doc.text_content(body), "hello link");

        let link = doc.first_element_named("a").unwrap();
        assert_eq!(doc.element(link).unwrap().attr("href"), Some("/x"));
    }

    #[test]
    fn test_parse_wraps_bare_fragment_in_body() {
        let doc = parse_document("<p>one</p><p>two</p>");
        let body = doc.body();
        assert_eq!(doc.children(body).len(), 2);
        assert_eq!(doc.text_content(body), "onetwo");
    }

    #[test]
    fn test_comments_are_dropped() {
        let doc = parse_document("<body><!-- note --><p>kept</p></body>");
        assert_eq!(doc.text_content(doc.body()), "kept");
    }

    #[test]
    fn test_append_fragment() {
        let mut doc = parse_document("<body><div id=\"slot\"></div></body>");
        let slot = doc.first_element_named("div").unwrap();
        append_fragment(&mut doc, slot, "before <a href=\"/y\">mid</a> after");
        assert_eq!(doc.text_content(slot), "before mid after");
        let link = doc.first_element_named("a").unwrap();
        assert_eq!(doc.element(link).unwrap().attr("href"), Some("/y"));
    }
}
