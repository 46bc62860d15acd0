use lumora_core::HighlightRecord;
use lumora_dom::{resolve_path, text_nodes, Document, DomRange};
use tracing::debug;

use crate::marker;

/// Which strategy produced a resolved anchor. Structural anchors are the
/// only ones where replaying the record's serialized content is sound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnchorStrategy {
    ContextBounded,
    Structural,
    Substring,
}

#[derive(Debug, Clone, Copy)]
pub struct ResolvedAnchor {
    pub range: DomRange,
    pub strategy: AnchorStrategy,
}

/// Re-find the text of a persisted record in the current document.
///
/// Strategies in strict precedence order, first success wins, always the
/// earliest document-order candidate, never scoring across candidates:
/// 1. context-bounded single-text-node search (both contexts when present,
///    one-sided otherwise), skipping text inside existing markers;
/// 2. structural: the stored element path resolves and that element holds
///    the text unambiguously (exactly one occurrence);
/// 3. plain first single-text-node substring occurrence.
///
/// `None` is a non-fatal miss: the record stays eligible for later passes.
pub fn locate(doc: &Document, record: &HighlightRecord) -> Option<ResolvedAnchor> {
    let needle = record.text.as_str();
    if needle.is_empty() {
        return None;
    }

    let candidates = text_nodes(doc, doc.body(), |d, id| marker::is_marker(d, id));

    if record.context_before.is_some() || record.context_after.is_some() {
        for &node in &candidates {
            let content = doc.text(node).unwrap_or("");
            if let Some(start) = context_match(
                content,
                needle,
                record.context_before.as_deref(),
                record.context_after.as_deref(),
            ) {
                return Some(ResolvedAnchor {
                    range: DomRange::in_node(node, start, start + needle.len()),
                    strategy: AnchorStrategy::ContextBounded,
                });
            }
        }
        debug!(id = %record.id, "Context search missed, trying structural");
    }

    if let Some(anchor) = structural_match(doc, record) {
        return Some(anchor);
    }

    for &node in &candidates {
        let content = doc.text(node).unwrap_or("");
        if let Some(start) = content.find(needle) {
            return Some(ResolvedAnchor {
                range: DomRange::in_node(node, start, start + needle.len()),
                strategy: AnchorStrategy::Substring,
            });
        }
    }

    None
}

/// First occurrence of `needle` in `content` whose surrounding text
/// satisfies the present context constraints.
fn context_match(
    content: &str,
    needle: &str,
    before: Option<&str>,
    after: Option<&str>,
) -> Option<usize> {
    let mut from = 0;
    while let Some(rel) = content[from..].find(needle) {
        let at = from + rel;
        let tail = at + needle.len();
        let before_ok = before.map(|b| content[..at].ends_with(b)).unwrap_or(true);
        let after_ok = after.map(|a| content[tail..].starts_with(a)).unwrap_or(true);
        if before_ok && after_ok {
            return Some(at);
        }
        // step one char so overlapping occurrences are still visited
        let step = content[at..].chars().next().map(char::len_utf8).unwrap_or(1);
        from = at + step;
    }
    None
}

/// The stored element path resolves, the element contains the text exactly
/// once, and a single text node carries the occurrence.
fn structural_match(doc: &Document, record: &HighlightRecord) -> Option<ResolvedAnchor> {
    let path = record.element_path.as_deref()?;
    let element = resolve_path(doc, path)?;
    if doc.text_content(element).matches(record.text.as_str()).count() != 1 {
        return None;
    }

    for node in text_nodes(doc, element, |d, id| marker::is_marker(d, id)) {
        let content = doc.text(node).unwrap_or("");
        if let Some(start) = content.find(record.text.as_str()) {
            return Some(ResolvedAnchor {
                range: DomRange::in_node(node, start, start + record.text.len()),
                strategy: AnchorStrategy::Structural,
            });
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumora_core::HighlightColor;
    use lumora_dom::parse_document;

    fn record(text: &str) -> HighlightRecord {
        HighlightRecord {
            id: "highlight_1_1".to_string(),
            text: text.to_string(),
            color: HighlightColor::Yellow,
            created_at: 0,
            page_url: "https://example.com/".to_string(),
            context_before: None,
            context_after: None,
            element_path: None,
            serialized_content: None,
            note: None,
        }
    }

    #[test]
    fn test_context_bounded_exact_case() {
        // unique sentence, both contexts present
        let doc = parse_document("<body><p>the quick brown fox</p></body>");
        let mut rec = record("quick brown");
        rec.context_before = Some("the ".to_string());
        rec.context_after = Some(" fox".to_string());

        let anchor = locate(&doc, &rec).unwrap();
        assert_eq!(anchor.strategy, AnchorStrategy::ContextBounded);
        assert_eq!(anchor.range.text(&doc), "quick brown");
    }

    #[test]
    fn test_context_before_selects_second_occurrence() {
        let doc = parse_document(
            "<body><p>first error here</p><p>second error here</p></body>",
        );
        let mut rec = record("error");
        rec.context_before = Some("second ".to_string());

        let anchor = locate(&doc, &rec).unwrap();
        assert_eq!(anchor.strategy, AnchorStrategy::ContextBounded);
        let p2 = doc.children(doc.body())[1];
        assert!(doc.is_ancestor_of(p2, anchor.range.start.node));
    }

    #[test]
    fn test_plain_fallback_picks_first_occurrence() {
        let doc = parse_document("<body><p>alpha beta</p><p>alpha beta</p></body>");
        let anchor = locate(&doc, &record("beta")).unwrap();
        assert_eq!(anchor.strategy, AnchorStrategy::Substring);
        let p1 = doc.children(doc.body())[0];
        assert!(doc.is_ancestor_of(p1, anchor.range.start.node));
    }

    #[test]
    fn test_stale_context_falls_back_to_substring() {
        let doc = parse_document("<body><p>brand new words around target</p></body>");
        let mut rec = record("target");
        rec.context_before = Some("old context ".to_string());

        let anchor = locate(&doc, &rec).unwrap();
        assert_eq!(anchor.strategy, AnchorStrategy::Substring);
        assert_eq!(anchor.range.text(&doc), "target");
    }

    #[test]
    fn test_structural_match_unambiguous() {
        let doc = parse_document("<body><div><p>target</p></div><p>elsewhere</p></body>");
        let mut rec = record("target");
        rec.element_path = Some("/html[1]/body[1]/div[1]/p[1]".to_string());

        let anchor = locate(&doc, &rec).unwrap();
        assert_eq!(anchor.strategy, AnchorStrategy::Structural);
        assert_eq!(anchor.range.text(&doc), "target");
    }

    #[test]
    fn test_structural_skipped_when_ambiguous() {
        let doc = parse_document("<body><p>dup and dup</p></body>");
        let mut rec = record("dup");
        rec.element_path = Some("/html[1]/body[1]/p[1]".to_string());

        // ambiguous inside the element: falls through to plain first match
        let anchor = locate(&doc, &rec).unwrap();
        assert_eq!(anchor.strategy, AnchorStrategy::Substring);
        assert_eq!(anchor.range.start.offset, 0);
    }

    #[test]
    fn test_skips_text_inside_markers() {
        let doc = parse_document(
            "<body><p><span class=\"lumora-highlight\" data-highlight-id=\"h\">token</span></p><p>token</p></body>",
        );
        let anchor = locate(&doc, &record("token")).unwrap();
        let p2 = doc.children(doc.body())[1];
        assert!(doc.is_ancestor_of(p2, anchor.range.start.node));
    }

    #[test]
    fn test_miss_is_none() {
        let doc = parse_document("<body><p>nothing relevant</p></body>");
        assert!(locate(&doc, &record("absent text")).is_none());
        assert!(locate(&doc, &record("")).is_none());
    }
}
