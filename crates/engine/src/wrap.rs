use lumora_core::{Error, Result};
use lumora_dom::{Document, DomRange, NodeId};
use tracing::debug;

/// Wrap the content covered by `range` in `marker` (a detached element
/// built by the caller). Ranges inside one text node split that node;
/// ranges crossing element boundaries split the boundary text nodes and
/// recursively clone each partially covered element, so structure and
/// attributes (notably link `href`s) survive inside the marker.
///
/// Every failure is detected before the first mutation: on `Err` the
/// document is exactly as it was.
pub fn wrap_range(doc: &mut Document, range: DomRange, marker: NodeId) -> Result<()> {
    if range.is_collapsed() {
        return Err(Error::EmptySelection("selection is collapsed".to_string()));
    }
    if !range.is_valid(doc) {
        return Err(Error::WrapFailed(
            "range does not point at document text".to_string(),
        ));
    }
    if !doc.is_element(marker) || doc.parent(marker).is_some() {
        return Err(Error::WrapFailed("marker must be a detached element".to_string()));
    }

    if range.start.node == range.end.node {
        return wrap_in_single_node(doc, range, marker);
    }

    // Cross-element: both boundary nodes must contribute at least one
    // character, otherwise the boundary walk below degenerates.
    let start_len = doc.text(range.start.node).map(str::len).unwrap_or(0);
    if range.start.offset >= start_len || range.end.offset == 0 {
        return Err(Error::WrapFailed("degenerate range boundary".to_string()));
    }
    let ancestor = doc
        .common_ancestor(range.start.node, range.end.node)
        .ok_or_else(|| Error::WrapFailed("endpoints share no ancestor".to_string()))?;

    // End side first: split the end text node so its tail stays outside,
    // then split every ancestor element up to the common ancestor so that
    // everything after the end boundary moves into attribute-preserving
    // clones outside the covered run.
    let end_len = doc.text(range.end.node).map(str::len).unwrap_or(0);
    if range.end.offset < end_len {
        doc.split_text(range.end.node, range.end.offset);
    }
    let mut end_top = range.end.node;
    while doc.parent(end_top) != Some(ancestor) {
        let parent = doc
            .parent(end_top)
            .ok_or_else(|| Error::WrapFailed("detached range endpoint".to_string()))?;
        let index = doc
            .child_index(end_top)
            .ok_or_else(|| Error::WrapFailed("detached range endpoint".to_string()))?;
        if index + 1 < doc.children(parent).len() {
            doc.split_element(parent, index + 1);
        }
        end_top = parent;
    }

    // Start side: split the start text node so its head stays outside,
    // then walk up, moving the covered tail of each partially covered
    // element into a clone that joins the covered run.
    let mut start_node = range.start.node;
    if range.start.offset > 0 {
        start_node = doc
            .split_text(start_node, range.start.offset)
            .ok_or_else(|| Error::WrapFailed("start offset not splittable".to_string()))?;
    }
    let mut start_top = start_node;
    while doc.parent(start_top) != Some(ancestor) {
        let parent = doc
            .parent(start_top)
            .ok_or_else(|| Error::WrapFailed("detached range endpoint".to_string()))?;
        let index = doc
            .child_index(start_top)
            .ok_or_else(|| Error::WrapFailed("detached range endpoint".to_string()))?;
        if index > 0 {
            start_top = doc
                .split_element(parent, index)
                .ok_or_else(|| Error::WrapFailed("element not splittable".to_string()))?;
        } else {
            start_top = parent;
        }
    }

    let first = doc
        .child_index(start_top)
        .ok_or_else(|| Error::WrapFailed("covered run start lost".to_string()))?;
    let last = doc
        .child_index(end_top)
        .ok_or_else(|| Error::WrapFailed("covered run end lost".to_string()))?;
    if first > last {
        return Err(Error::WrapFailed("covered run is inverted".to_string()));
    }

    let covered: Vec<NodeId> = doc.children(ancestor)[first..=last].to_vec();
    doc.insert_before(start_top, marker);
    for node in covered {
        doc.append_child(marker, node);
    }
    debug!(nodes = doc.children(marker).len(), "Wrapped cross-element range");
    Ok(())
}

fn wrap_in_single_node(doc: &mut Document, range: DomRange, marker: NodeId) -> Result<()> {
    let node = range.start.node;
    let len = doc.text(node).map(str::len).unwrap_or(0);

    // Trailing split first so the start offset stays valid.
    if range.end.offset < len {
        doc.split_text(node, range.end.offset);
    }
    let covered = if range.start.offset > 0 {
        doc.split_text(node, range.start.offset)
            .ok_or_else(|| Error::WrapFailed("start offset not splittable".to_string()))?
    } else {
        node
    };

    doc.insert_before(covered, marker);
    doc.append_child(marker, covered);
    Ok(())
}

/// Replace a marker with its children, merging the text nodes that become
/// adjacent. Returns false when the marker is not attached.
pub fn unwrap_marker(doc: &mut Document, marker: NodeId) -> bool {
    doc.replace_with_children(marker)
}
