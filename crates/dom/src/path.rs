use crate::tree::{Document, NodeId};

/// Structural path of an element: `/html[1]/body[1]/p[2]`, indexing among
/// same-named element siblings. Stable across reloads as long as the
/// page's structure around the element has not changed.
pub fn element_path(doc: &Document, id: NodeId) -> Option<String> {
    doc.element(id)?;
    let mut parts = Vec::new();
    let mut current = id;
    loop {
        let Some(el) = doc.element(current) else {
            break;
        };
        let name = el.name.clone();
        let parent = doc.parent(current);
        let mut index = 1;
        if let Some(p) = parent {
            for sibling in doc.children(p) {
                if *sibling == current {
                    break;
                }
                if doc
                    .element(*sibling)
                    .map(|e| e.name == name)
                    .unwrap_or(false)
                {
                    index += 1;
                }
            }
        }
        parts.push(format!("{}[{}]", name, index));
        match parent {
            Some(p) if doc.is_element(p) => current = p,
            _ => break,
        }
    }
    parts.reverse();
    Some(format!("/{}", parts.join("/")))
}

/// Resolve a structural path back to an element, or `None` when the
/// current document no longer has that shape.
pub fn resolve_path(doc: &Document, path: &str) -> Option<NodeId> {
    let trimmed = path.trim_start_matches('/');
    if trimmed.is_empty() {
        return None;
    }

    let mut current = doc.root();
    for segment in trimmed.split('/') {
        let (name, wanted) = parse_segment(segment)?;
        let mut seen = 0;
        let mut found = None;
        for child in doc.children(current) {
            if doc.element(*child).map(|e| e.name == name).unwrap_or(false) {
                seen += 1;
                if seen == wanted {
                    found = Some(*child);
                    break;
                }
            }
        }
        current = found?;
    }
    Some(current)
}

fn parse_segment(segment: &str) -> Option<(&str, usize)> {
    match segment.split_once('[') {
        Some((name, rest)) => {
            let index: usize = rest.strip_suffix(']')?.parse().ok()?;
            if name.is_empty() || index == 0 {
                return None;
            }
            Some((name, index))
        }
        None if !segment.is_empty() => Some((segment, 1)),
        None => None,
    }
}
