use chrono::{TimeZone, Utc};
use lumora_core::HighlightColor;
use lumora_dom::{Document, ElementData, NodeId};

/// Class carried by every marker element.
pub const MARKER_CLASS: &str = "lumora-highlight";
/// Transient class applied by jump-to so the page's CSS can pulse it.
pub const FLASH_CLASS: &str = "lumora-flash";
pub const ID_ATTR: &str = "data-highlight-id";
pub const COLOR_ATTR: &str = "data-color";

/// Build a detached marker element for one highlight. The palette triple
/// is exposed as CSS custom properties so page styles stay in control of
/// the actual rendering.
pub fn build_marker(
    doc: &mut Document,
    highlight_id: &str,
    color: HighlightColor,
    created_at: i64,
) -> NodeId {
    let style = color.style();
    let mut el = ElementData::new("span");
    el.set_attr("class", MARKER_CLASS);
    el.set_attr(ID_ATTR, highlight_id);
    el.set_attr(COLOR_ATTR, color.as_str());
    el.set_attr(
        "style",
        &format!(
            "--highlight-bg: {}; --highlight-border: {}; --highlight-text: {};",
            style.bg, style.border, style.text
        ),
    );
    let when = Utc
        .timestamp_millis_opt(created_at)
        .single()
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_default();
    el.set_attr("title", &format!("Highlighted on {}", when));
    doc.create_element(el)
}

pub fn is_marker(doc: &Document, id: NodeId) -> bool {
    doc.element(id)
        .map(|el| el.has_class(MARKER_CLASS))
        .unwrap_or(false)
}

/// Whether a node sits inside an existing marker (the node itself counts).
pub fn in_marker(doc: &Document, id: NodeId) -> bool {
    if is_marker(doc, id) {
        return true;
    }
    doc.ancestors(id).into_iter().any(|a| is_marker(doc, a))
}

pub fn marker_id(doc: &Document, id: NodeId) -> Option<String> {
    if !is_marker(doc, id) {
        return None;
    }
    doc.element(id)
        .and_then(|el| el.attr(ID_ATTR))
        .map(|v| v.to_string())
}

/// All markers currently in the document, in document order.
pub fn all_markers(doc: &Document) -> Vec<NodeId> {
    doc.descendants(doc.root())
        .into_iter()
        .filter(|id| is_marker(doc, *id))
        .collect()
}

pub fn find_marker(doc: &Document, highlight_id: &str) -> Option<NodeId> {
    all_markers(doc)
        .into_iter()
        .find(|id| marker_id(doc, *id).as_deref() == Some(highlight_id))
}

/// Flash exactly one marker: any previous flash is cleared first.
pub fn set_flash(doc: &mut Document, target: NodeId) {
    for m in all_markers(doc) {
        if let Some(el) = doc.element_mut(m) {
            el.remove_class(FLASH_CLASS);
        }
    }
    if let Some(el) = doc.element_mut(target) {
        el.add_class(FLASH_CLASS);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumora_dom::parse_document;

    #[test]
    fn test_build_marker_attrs() {
        let mut doc = Document::new();
        let m = build_marker(&mut doc, "highlight_1_1", HighlightColor::Green, 1_700_000_000_000);
        let el = doc.element(m).unwrap();
        assert!(el.has_class(MARKER_CLASS));
        assert_eq!(el.attr(ID_ATTR), Some("highlight_1_1"));
        assert_eq!(el.attr(COLOR_ATTR), Some("green"));
        assert!(el.attr("style").unwrap().contains("--highlight-bg: #d1f2eb"));
        assert!(el.attr("title").unwrap().starts_with("Highlighted on "));
    }

    #[test]
    fn test_find_marker_by_id() {
        let doc = parse_document(
            "<body><p><span class=\"lumora-highlight\" data-highlight-id=\"highlight_2_1\">x</span></p></body>",
        );
        assert!(find_marker(&doc, "highlight_2_1").is_some());
        assert!(find_marker(&doc, "highlight_2_2").is_none());
    }

    #[test]
    fn test_in_marker() {
        let doc = parse_document(
            "<body><p><span class=\"lumora-highlight\" data-highlight-id=\"h\"><em>deep</em></span></p></body>",
        );
        let em = doc.first_element_named("em").unwrap();
        let deep_text = doc.children(em)[0];
        assert!(in_marker(&doc, deep_text));
        let p = doc.first_element_named("p").unwrap();
        assert!(!in_marker(&doc, p));
    }

    #[test]
    fn test_set_flash_moves() {
        let mut doc = parse_document(
            "<body><span class=\"lumora-highlight\" data-highlight-id=\"a\">1</span><span class=\"lumora-highlight\" data-highlight-id=\"b\">2</span></body>",
        );
        let a = find_marker(&doc, "a").unwrap();
        let b = find_marker(&doc, "b").unwrap();
        set_flash(&mut doc, a);
        assert!(doc.element(a).unwrap().has_class(FLASH_CLASS));
        set_flash(&mut doc, b);
        assert!(!doc.element(a).unwrap().has_class(FLASH_CLASS));
        assert!(doc.element(b).unwrap().has_class(FLASH_CLASS));
    }
}
