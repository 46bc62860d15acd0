use std::cmp::Ordering;

use crate::tree::{Document, NodeId};
use crate::walk;

/// A point inside a text node, as a byte offset into its content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub node: NodeId,
    pub offset: usize,
}

/// A contiguous span of document text between two positions, both inside
/// text nodes. Mirrors the subset of DOM Range the engine needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DomRange {
    pub start: Position,
    pub end: Position,
}

impl DomRange {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// Range fully inside one text node.
    pub fn in_node(node: NodeId, start: usize, end: usize) -> Self {
        Self {
            start: Position { node, offset: start },
            end: Position { node, offset: end },
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.start.node == self.end.node && self.start.offset == self.end.offset
    }

    /// Both endpoints are attached text nodes, offsets are in-bounds char
    /// boundaries, and start does not follow end.
    pub fn is_valid(&self, doc: &Document) -> bool {
        let Some(start_text) = doc.text(self.start.node) else {
            return false;
        };
        let Some(end_text) = doc.text(self.end.node) else {
            return false;
        };
        if self.start.offset > start_text.len() || !start_text.is_char_boundary(self.start.offset) {
            return false;
        }
        if self.end.offset > end_text.len() || !end_text.is_char_boundary(self.end.offset) {
            return false;
        }
        match doc.order(self.start.node, self.end.node) {
            Ordering::Less => true,
            Ordering::Equal => self.start.offset <= self.end.offset,
            Ordering::Greater => false,
        }
    }

    /// The string value of the range: the covered slice of every text node
    /// between the endpoints, in document order.
    pub fn text(&self, doc: &Document) -> String {
        if self.start.node == self.end.node {
            return doc
                .text(self.start.node)
                .and_then(|t| t.get(self.start.offset..self.end.offset))
                .unwrap_or_default()
                .to_string();
        }

        let mut out = String::new();
        let nodes = walk::text_nodes(doc, doc.root(), |_, _| false);
        let mut inside = false;
        for node in nodes {
            if node == self.start.node {
                inside = true;
                if let Some(t) = doc.text(node).and_then(|t| t.get(self.start.offset..)) {
                    out.push_str(t);
                }
                continue;
            }
            if node == self.end.node {
                if let Some(t) = doc.text(node).and_then(|t| t.get(..self.end.offset)) {
                    out.push_str(t);
                }
                break;
            }
            if inside {
                if let Some(t) = doc.text(node) {
                    out.push_str(t);
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_document;

    #[test]
    fn test_single_node_text() {
        let doc = parse_document("<body><p>hello world</p></body>");
        let p = doc.first_element_named("p").unwrap();
        let text = doc.children(p)[0];
        let range = DomRange::in_node(text, 6, 11);
        assert!(range.is_valid(&doc));
        assert_eq!(range.text(&doc), "world");
    }

    #[test]
    fn test_cross_node_text() {
        let doc = parse_document("<body><p>one <a href=\"/x\">two</a> three</p></body>");
        let p = doc.first_element_named("p").unwrap();
        let first = doc.children(p)[0];
        let link = doc.children(p)[1];
        let link_text = doc.children(link)[0];
        let range = DomRange::new(
            Position { node: first, offset: 0 },
            Position { node: link_text, offset: 3 },
        );
        assert!(range.is_valid(&doc));
        assert_eq!(range.text(&doc), "one two");
    }

    #[test]
    fn test_backwards_range_is_invalid() {
        let doc = parse_document("<body><p>one <em>two</em></p></body>");
        let p = doc.first_element_named("p").unwrap();
        let first = doc.children(p)[0];
        let em = doc.children(p)[1];
        let em_text = doc.children(em)[0];
        let range = DomRange::new(
            Position { node: em_text, offset: 0 },
            Position { node: first, offset: 1 },
        );
        assert!(!range.is_valid(&doc));
    }

    #[test]
    fn test_collapsed() {
        let doc = parse_document("<body><p>x</p></body>");
        let p = doc.first_element_named("p").unwrap();
        let text = doc.children(p)[0];
        assert!(DomRange::in_node(text, 1, 1).is_collapsed());
        assert!(!DomRange::in_node(text, 0, 1).is_collapsed());
    }
}
