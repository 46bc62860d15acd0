use crate::range::{DomRange, Position};
use crate::tree::{Document, NodeId};

/// Text nodes under `root` in document order. `skip` is consulted for each
/// element; a true result prunes that whole subtree, which is how the
/// resolver stays out of existing highlight markers.
pub fn text_nodes<F>(doc: &Document, root: NodeId, skip: F) -> Vec<NodeId>
where
    F: Fn(&Document, NodeId) -> bool,
{
    let mut out = Vec::new();
    let mut stack = vec![root];
    while let Some(id) = stack.pop() {
        if doc.is_text(id) {
            out.push(id);
            continue;
        }
        if doc.is_element(id) && id != root && skip(doc, id) {
            continue;
        }
        for child in doc.children(id).iter().rev() {
            stack.push(*child);
        }
    }
    out
}

/// Find the first occurrence of `needle` in the concatenated text under
/// `root`, possibly spanning several text nodes, and map it back to a DOM
/// range. Stands in for a live browser selection in headless use.
pub fn find_text_range<F>(doc: &Document, root: NodeId, needle: &str, skip: F) -> Option<DomRange>
where
    F: Fn(&Document, NodeId) -> bool,
{
    if needle.is_empty() {
        return None;
    }

    let mut joined = String::new();
    let mut spans: Vec<(NodeId, usize, usize)> = Vec::new();
    for node in text_nodes(doc, root, skip) {
        let text = doc.text(node).unwrap_or("");
        if text.is_empty() {
            continue;
        }
        spans.push((node, joined.len(), text.len()));
        joined.push_str(text);
    }

    let start_global = joined.find(needle)?;
    let end_global = start_global + needle.len();

    let start = spans
        .iter()
        .find(|(_, offset, len)| *offset <= start_global && start_global < offset + len)
        .map(|(node, offset, _)| Position {
            node: *node,
            offset: start_global - offset,
        })?;
    let end = spans
        .iter()
        .find(|(_, offset, len)| *offset < end_global && end_global <= offset + len)
        .map(|(node, offset, _)| Position {
            node: *node,
            offset: end_global - offset,
        })?;

    Some(DomRange::new(start, end))
}
