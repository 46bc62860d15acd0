use std::sync::Arc;

use chrono::Utc;
use lumora_core::{
    normalize_page_url, EngineAction, EngineEvent, EngineResponse, Error, ExportFormat,
    HighlightColor, HighlightRecord, Notice, RestoreReport, Result, Settings,
};
use lumora_dom::{append_fragment, find_text_range, inner_html, Document, DomRange};
use lumora_storage::HighlightStore;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::export::ExportDocument;
use crate::marker;
use crate::resolver::{self, AnchorStrategy};
use crate::store::PageHighlightStore;
use crate::wrap;

/// Maximum length of each captured context string, in chars.
const CONTEXT_CHARS: usize = 20;

/// One engine instance owns the document of one page, the in-memory record
/// list, and the best-effort side channels (persistence, change events).
/// All DOM mutation flows through here.
pub struct HighlightEngine {
    doc: Document,
    page_url: String,
    title: String,
    settings: Settings,
    store: PageHighlightStore,
    persistence: Option<Arc<dyn HighlightStore>>,
    event_tx: Option<mpsc::Sender<EngineEvent>>,
}

impl HighlightEngine {
    pub fn new(doc: Document, page_url: &str) -> Self {
        let title = doc.title().unwrap_or_default();
        Self {
            doc,
            page_url: normalize_page_url(page_url),
            title,
            settings: Settings::default(),
            store: PageHighlightStore::new(),
            persistence: None,
            event_tx: None,
        }
    }

    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_persistence(mut self, store: Arc<dyn HighlightStore>) -> Self {
        self.persistence = Some(store);
        self
    }

    pub fn with_events(mut self, tx: mpsc::Sender<EngineEvent>) -> Self {
        self.event_tx = Some(tx);
        self
    }

    pub fn doc(&self) -> &Document {
        &self.doc
    }

    pub fn page_url(&self) -> &str {
        &self.page_url
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn set_settings(&mut self, settings: Settings) {
        self.settings = settings;
    }

    /// Records in creation order.
    pub fn records(&self) -> &[HighlightRecord] {
        self.store.records()
    }

    /// Page-load entry point: pull persisted records for this URL and
    /// render every one the resolver can still place.
    pub async fn init(&mut self) -> RestoreReport {
        if let Some(store) = &self.persistence {
            match store.load(&self.page_url).await {
                Ok(records) => {
                    debug!(count = records.len(), page = %self.page_url, "Loaded persisted highlights");
                    self.store.adopt(records);
                }
                Err(e) => {
                    warn!(error = %e, "Persistence unavailable, starting with empty set");
                }
            }
        }
        self.restore_all().await
    }

    /// Wrap the selection in a marker and record it. The range is fully
    /// validated before the first mutation, so a failure leaves the
    /// document untouched.
    pub async fn create(
        &mut self,
        range: DomRange,
        color: Option<HighlightColor>,
    ) -> Result<HighlightRecord> {
        if range.is_collapsed() {
            return Err(Error::EmptySelection("nothing is selected".to_string()));
        }
        if !range.is_valid(&self.doc) {
            return Err(Error::WrapFailed(
                "selection does not map onto the document".to_string(),
            ));
        }
        let value = range.text(&self.doc);
        let text = value.trim().to_string();
        if text.is_empty() {
            return Err(Error::EmptySelection("selection is only whitespace".to_string()));
        }

        let (context_before, context_after) = self.capture_context(&range);
        let color = color.unwrap_or(self.settings.current_color);
        let now = Utc::now().timestamp_millis();
        let id = self.store.next_id(now);
        let marker_node = marker::build_marker(&mut self.doc, &id, color, now);
        wrap::wrap_range(&mut self.doc, range, marker_node)?;

        let parent_path = self
            .doc
            .parent(marker_node)
            .and_then(|p| lumora_dom::element_path(&self.doc, p));
        let serialized_content = {
            let html = inner_html(&self.doc, marker_node);
            (!html.is_empty()).then_some(html)
        };

        let record = HighlightRecord {
            id,
            text,
            color,
            created_at: now,
            page_url: self.page_url.clone(),
            context_before,
            context_after,
            element_path: parent_path,
            serialized_content,
            note: None,
        };
        self.store.push(record.clone());
        info!(id = %record.id, color = color.as_str(), "Created highlight");

        if self.settings.auto_save {
            self.persist().await;
        }
        self.push_updated();
        Ok(record)
    }

    /// Unwrap the marker and drop the record. True when either existed:
    /// an unresolved record (no marker on the page) must still be
    /// deletable.
    pub async fn remove(&mut self, id: &str) -> bool {
        let mut found = false;
        if let Some(node) = marker::find_marker(&self.doc, id) {
            wrap::unwrap_marker(&mut self.doc, node);
            found = true;
        }
        if self.store.remove(id).is_some() {
            found = true;
        }
        if found {
            info!(id, "Removed highlight");
            self.persist().await;
            self.push_updated();
        }
        found
    }

    /// Unwrap every marker and drop every record, deleting the persisted
    /// key for this page.
    pub async fn clear_all(&mut self) {
        for node in marker::all_markers(&self.doc) {
            wrap::unwrap_marker(&mut self.doc, node);
        }
        let removed = self.store.clear();
        if let Some(store) = &self.persistence {
            if let Err(e) = store.delete(&self.page_url).await {
                warn!(error = %e, "Failed to delete persisted highlights");
            }
        }
        info!(removed, "Cleared all highlights");
        self.push_updated();
    }

    /// Render every record the resolver can place, in creation order.
    /// Already-rendered ids are skipped, so a second pass on an unchanged
    /// document changes nothing. Unresolved records are kept for future
    /// passes.
    pub async fn restore_all(&mut self) -> RestoreReport {
        let mut report = RestoreReport::default();
        let records: Vec<HighlightRecord> = self.store.records().to_vec();

        for record in records {
            if marker::find_marker(&self.doc, &record.id).is_some() {
                report.restored += 1;
                continue;
            }
            let Some(anchor) = resolver::locate(&self.doc, &record) else {
                debug!(id = %record.id, "Record did not resolve, keeping for later");
                report.unresolved += 1;
                continue;
            };

            let marker_node =
                marker::build_marker(&mut self.doc, &record.id, record.color, record.created_at);
            match wrap::wrap_range(&mut self.doc, anchor.range, marker_node) {
                Ok(()) => {
                    if anchor.strategy == AnchorStrategy::Structural {
                        if let Some(content) = &record.serialized_content {
                            self.replay_content(marker_node, content);
                        }
                    }
                    report.restored += 1;
                }
                Err(e) => {
                    debug!(id = %record.id, error = %e, "Wrap failed during restore");
                    report.unresolved += 1;
                }
            }
        }

        info!(
            restored = report.restored,
            unresolved = report.unresolved,
            "Restore pass finished"
        );
        if report.restored > 0 {
            self.push_updated();
        }
        report
    }

    /// Swap the marker's wrapped content for the inner structure captured
    /// at creation time, so embedded links and formatting come back even
    /// when the page now holds plain text.
    fn replay_content(&mut self, marker_node: lumora_dom::NodeId, content: &str) {
        for child in self.doc.children(marker_node).to_vec() {
            self.doc.detach(child);
        }
        append_fragment(&mut self.doc, marker_node, content);
    }

    /// Jump-to: flash the marker. False when the highlight is not
    /// currently rendered; a no-op, not an error.
    pub fn locate_on_page(&mut self, id: &str) -> bool {
        match marker::find_marker(&self.doc, id) {
            Some(node) => {
                marker::set_flash(&mut self.doc, node);
                true
            }
            None => false,
        }
    }

    /// Concatenated highlight texts for the caller's clipboard.
    pub fn copy_all(&self) -> String {
        self.store
            .records()
            .iter()
            .map(|r| r.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Wholesale text replacement of one record; the rendered marker is
    /// left as it stands.
    pub async fn edit(&mut self, id: &str, new_text: &str) -> bool {
        let trimmed = new_text.trim();
        if trimmed.is_empty() {
            return false;
        }
        let Some(existing) = self.store.get(id).cloned() else {
            return false;
        };
        let record = HighlightRecord {
            text: trimmed.to_string(),
            ..existing
        };
        self.store.replace(id, record);
        self.persist().await;
        self.push_updated();
        true
    }

    pub fn export_all(&self) -> ExportDocument {
        ExportDocument::build(&self.page_url, &self.title, self.store.records(), Utc::now())
    }

    /// The trigger surface. Every failure becomes a response value; this
    /// must never panic or bubble an error out of a user action.
    pub async fn handle(&mut self, action: EngineAction) -> EngineResponse {
        let response = match action {
            EngineAction::HighlightSelectedText { text, color } => {
                let selection = find_text_range(&self.doc, self.doc.body(), &text, |d, id| {
                    marker::is_marker(d, id)
                });
                match selection {
                    None => EngineResponse::failed(Notice::warning(
                        "Please select some text to highlight",
                    )),
                    Some(range) => match self.create(range, color).await {
                        Ok(record) => EngineResponse::ok()
                            .with_highlights(self.store.records().to_vec())
                            .with_notice(Notice::success(format!(
                                "Text highlighted with {} color",
                                record.color.as_str()
                            ))),
                        Err(Error::EmptySelection(_)) => EngineResponse::failed(Notice::warning(
                            "Please select some text to highlight",
                        )),
                        Err(e) => {
                            warn!(error = %e, "Failed to highlight text");
                            EngineResponse::failed(Notice::error("Failed to highlight text"))
                        }
                    },
                }
            }
            EngineAction::ClearAllHighlights => {
                self.clear_all().await;
                EngineResponse::ok()
                    .with_highlights(Vec::new())
                    .with_notice(Notice::info("All highlights cleared"))
            }
            EngineAction::RemoveHighlight { id } => {
                if self.remove(&id).await {
                    EngineResponse::ok()
                        .with_highlights(self.store.records().to_vec())
                        .with_notice(Notice::info("Highlight removed"))
                } else {
                    EngineResponse::failed(Notice::warning("No such highlight"))
                }
            }
            EngineAction::JumpToHighlight { id } => {
                if self.locate_on_page(&id) {
                    EngineResponse::ok()
                } else {
                    EngineResponse::failed(Notice::warning(
                        "Highlight is not visible on this page",
                    ))
                }
            }
            EngineAction::GetHighlights => {
                EngineResponse::ok().with_highlights(self.store.records().to_vec())
            }
            EngineAction::ExportAllHighlights { format } => {
                let document = self.export_all();
                let rendered = match format.unwrap_or_default() {
                    ExportFormat::Json => document.to_json(),
                    ExportFormat::Text => Ok(document.render_text()),
                };
                match rendered {
                    Ok(payload) => EngineResponse::ok()
                        .with_payload(payload)
                        .with_notice(Notice::success("Highlights exported successfully")),
                    Err(e) => {
                        warn!(error = %e, "Failed to export highlights");
                        EngineResponse::failed(Notice::error("Failed to export highlights"))
                    }
                }
            }
            EngineAction::CopyHighlights => EngineResponse::ok()
                .with_payload(self.copy_all())
                .with_notice(Notice::success("All highlights copied to clipboard")),
        };

        if self.settings.show_notifications {
            response
        } else {
            EngineResponse {
                notice: None,
                ..response
            }
        }
    }

    /// Context strings flank the trimmed text, so whitespace the trim
    /// dropped is folded into the context side it belongs to.
    fn capture_context(&self, range: &DomRange) -> (Option<String>, Option<String>) {
        let raw = range.text(&self.doc);
        let lead = &raw[..raw.len() - raw.trim_start().len()];
        let trail = &raw[raw.trim_end().len()..];

        let start_text = self.doc.text(range.start.node).unwrap_or("");
        let end_text = self.doc.text(range.end.node).unwrap_or("");
        let before_full = format!("{}{}", &start_text[..range.start.offset], lead);
        let after_full = format!("{}{}", trail, &end_text[range.end.offset..]);

        let before = last_chars(&before_full, CONTEXT_CHARS);
        let after = first_chars(&after_full, CONTEXT_CHARS);
        (
            (!before.is_empty()).then_some(before),
            (!after.is_empty()).then_some(after),
        )
    }

    /// Best-effort write-through; a failing store never blocks the user.
    async fn persist(&self) {
        let Some(store) = &self.persistence else {
            debug!("No persistence attached");
            return;
        };
        if let Err(e) = store.save(&self.page_url, self.store.records()).await {
            warn!(error = %e, "Failed to persist highlights, keeping in-memory state");
        }
    }

    /// Fire-and-forget change event; a missing or full receiver is not an
    /// error.
    fn push_updated(&self) {
        let Some(tx) = &self.event_tx else {
            return;
        };
        let event = EngineEvent::HighlightsUpdated {
            page_url: self.page_url.clone(),
            highlights: self.store.records().to_vec(),
        };
        if let Err(e) = tx.try_send(event) {
            debug!(error = %e, "No event receiver, ignoring");
        }
    }
}

fn last_chars(s: &str, n: usize) -> String {
    let count = s.chars().count();
    if count <= n {
        s.to_string()
    } else {
        s.chars().skip(count - n).collect()
    }
}

fn first_chars(s: &str, n: usize) -> String {
    s.chars().take(n).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumora_dom::{parse_document, to_html};
    use lumora_storage::MemoryHighlightStore;

    const PAGE: &str = "https://example.com/article";

    fn engine_for(html: &str) -> HighlightEngine {
        HighlightEngine::new(parse_document(html), PAGE)
    }

    fn select(engine: &HighlightEngine, text: &str) -> DomRange {
        find_text_range(engine.doc(), engine.doc().body(), text, |d, id| {
            marker::is_marker(d, id)
        })
        .expect("selection text present")
    }

    #[tokio::test]
    async fn test_create_then_remove_is_identity_on_text() {
        let mut engine = engine_for("<body><p>the quick brown fox</p></body>");
        let before = engine.doc().text_content(engine.doc().body());

        let range = select(&engine, "quick brown");
        let record = engine.create(range, None).await.unwrap();
        assert_eq!(marker::all_markers(engine.doc()).len(), 1);

        assert!(engine.remove(&record.id).await);
        assert!(marker::all_markers(engine.doc()).is_empty());
        assert_eq!(engine.doc().text_content(engine.doc().body()), before);
        assert!(engine.records().is_empty());
    }

    #[tokio::test]
    async fn test_record_text_is_trimmed_selection() {
        let mut engine = engine_for("<body><p>alpha beta gamma</p></body>");
        let range = select(&engine, " beta ");
        let record = engine.create(range, None).await.unwrap();
        assert_eq!(record.text, "beta");
        // trimmed whitespace folds into the contexts
        assert_eq!(record.context_before.as_deref(), Some("alpha "));
        assert_eq!(record.context_after.as_deref(), Some(" gamma"));
    }

    #[tokio::test]
    async fn test_context_capture() {
        let mut engine = engine_for("<body><p>the quick brown fox</p></body>");
        let range = select(&engine, "quick brown");
        let record = engine.create(range, None).await.unwrap();
        assert_eq!(record.context_before.as_deref(), Some("the "));
        assert_eq!(record.context_after.as_deref(), Some(" fox"));
        assert!(record.element_path.is_some());
        assert_eq!(record.serialized_content.as_deref(), Some("quick brown"));
    }

    #[tokio::test]
    async fn test_collapsed_selection_is_empty_selection_error() {
        let mut engine = engine_for("<body><p>words</p></body>");
        let p = engine.doc().first_element_named("p").unwrap();
        let text = engine.doc().children(p)[0];
        let err = engine
            .create(DomRange::in_node(text, 2, 2), None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::EmptySelection(_)));
    }

    #[tokio::test]
    async fn test_clear_all_empties_dom_and_storage() {
        let store = Arc::new(MemoryHighlightStore::new());
        let mut engine = engine_for("<body><p>one two three</p></body>")
            .with_persistence(store.clone());

        let range = select(&engine, "one");
        engine.create(range, None).await.unwrap();
        let range = select(&engine, "three");
        engine.create(range, None).await.unwrap();
        assert_eq!(store.load(PAGE).await.unwrap().len(), 2);

        engine.clear_all().await;
        assert!(marker::all_markers(engine.doc()).is_empty());
        assert!(engine.records().is_empty());
        assert!(store.load(PAGE).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_restore_round_trip_and_idempotence() {
        let html = "<body><p>the quick brown fox</p></body>";
        let store = Arc::new(MemoryHighlightStore::new());

        let mut first = engine_for(html).with_persistence(store.clone());
        let range = select(&first, "quick brown");
        first.create(range, Some(HighlightColor::Blue)).await.unwrap();

        // fresh page load: same HTML, same store
        let mut second = engine_for(html).with_persistence(store.clone());
        let report = second.init().await;
        assert_eq!(report, RestoreReport { restored: 1, unresolved: 0 });
        assert_eq!(marker::all_markers(second.doc()).len(), 1);
        let marker_node = marker::all_markers(second.doc())[0];
        assert_eq!(second.doc().text_content(marker_node), "quick brown");

        // a second pass must not duplicate markers
        let again = second.restore_all().await;
        assert_eq!(again, RestoreReport { restored: 1, unresolved: 0 });
        assert_eq!(marker::all_markers(second.doc()).len(), 1);
    }

    #[tokio::test]
    async fn test_unresolved_records_are_kept() {
        let store = Arc::new(MemoryHighlightStore::new());
        let stale = HighlightRecord {
            id: "highlight_1_1".to_string(),
            text: "vanished paragraph".to_string(),
            color: HighlightColor::Yellow,
            created_at: 1,
            page_url: PAGE.to_string(),
            context_before: None,
            context_after: None,
            element_path: None,
            serialized_content: None,
            note: None,
        };
        store.save(PAGE, &[stale]).await.unwrap();

        let mut engine = engine_for("<body><p>entirely different</p></body>")
            .with_persistence(store.clone());
        let report = engine.init().await;
        assert_eq!(report, RestoreReport { restored: 0, unresolved: 1 });
        // not dropped: still listed and still deletable
        assert_eq!(engine.records().len(), 1);
        assert!(engine.remove("highlight_1_1").await);
        assert!(engine.records().is_empty());
    }

    #[tokio::test]
    async fn test_structural_restore_replays_serialized_content() {
        let html = "<body><div><p>read the docs today</p></div></body>";
        let store = Arc::new(MemoryHighlightStore::new());
        let record = HighlightRecord {
            id: "highlight_5_1".to_string(),
            text: "the docs".to_string(),
            color: HighlightColor::Green,
            created_at: 5,
            page_url: PAGE.to_string(),
            context_before: None,
            context_after: None,
            element_path: Some("/html[1]/body[1]/div[1]/p[1]".to_string()),
            serialized_content: Some("the <a href=\"/d\">docs</a>".to_string()),
            note: None,
        };
        store.save(PAGE, &[record]).await.unwrap();

        let mut engine = engine_for(html).with_persistence(store.clone());
        let report = engine.init().await;
        assert_eq!(report.restored, 1);
        assert_eq!(
            engine.doc().text_content(engine.doc().body()),
            "read the docs today"
        );
        // the captured link structure came back
        let link = engine.doc().first_element_named("a").unwrap();
        assert_eq!(engine.doc().element(link).unwrap().attr("href"), Some("/d"));
    }

    #[tokio::test]
    async fn test_remove_nonexistent_returns_false_without_mutation() {
        let mut engine = engine_for("<body><p>stable</p></body>");
        let range = select(&engine, "stable");
        engine.create(range, None).await.unwrap();
        let html_before = to_html(engine.doc());

        assert!(!engine.remove("highlight_404_404").await);
        assert_eq!(engine.records().len(), 1);
        assert_eq!(to_html(engine.doc()), html_before);
    }

    #[tokio::test]
    async fn test_events_are_pushed_and_dropped_receiver_is_silent() {
        let (tx, mut rx) = mpsc::channel(8);
        let mut engine = engine_for("<body><p>watched words</p></body>").with_events(tx);

        let range = select(&engine, "watched");
        engine.create(range, None).await.unwrap();
        match rx.recv().await.unwrap() {
            EngineEvent::HighlightsUpdated { highlights, page_url } => {
                assert_eq!(page_url, PAGE);
                assert_eq!(highlights.len(), 1);
            }
        }

        // receiver gone: the next mutation must simply not care
        drop(rx);
        let range = select(&engine, "words");
        assert!(engine.create(range, None).await.is_ok());
    }

    #[tokio::test]
    async fn test_handle_highlight_and_missing_selection() {
        let mut engine = engine_for("<body><p>pick me</p></body>");
        let response = engine
            .handle(EngineAction::HighlightSelectedText {
                text: "pick me".to_string(),
                color: None,
            })
            .await;
        assert!(response.success);
        assert_eq!(response.highlights.unwrap().len(), 1);

        let response = engine
            .handle(EngineAction::HighlightSelectedText {
                text: "not on page".to_string(),
                color: None,
            })
            .await;
        assert!(!response.success);
        assert!(response.notice.is_some());
    }

    #[tokio::test]
    async fn test_handle_export_empty_is_valid() {
        let mut engine = engine_for("<body><p>blank</p></body>");
        let response = engine
            .handle(EngineAction::ExportAllHighlights { format: None })
            .await;
        assert!(response.success);
        let value: serde_json::Value =
            serde_json::from_str(response.payload.as_deref().unwrap()).unwrap();
        assert_eq!(value["totalHighlights"], 0);
        assert!(value["highlights"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_notifications_setting_gates_notices() {
        let mut settings = Settings::default();
        settings.show_notifications = false;
        let mut engine = engine_for("<body><p>quiet page</p></body>").with_settings(settings);

        let response = engine
            .handle(EngineAction::HighlightSelectedText {
                text: "quiet".to_string(),
                color: None,
            })
            .await;
        assert!(response.success);
        assert!(response.notice.is_none());
    }

    #[tokio::test]
    async fn test_jump_to_flashes_rendered_marker() {
        let mut engine = engine_for("<body><p>jump target</p></body>");
        let range = select(&engine, "target");
        let record = engine.create(range, None).await.unwrap();

        assert!(engine.locate_on_page(&record.id));
        let node = marker::find_marker(engine.doc(), &record.id).unwrap();
        assert!(engine.doc().element(node).unwrap().has_class(marker::FLASH_CLASS));
        assert!(!engine.locate_on_page("highlight_404_404"));
    }

    #[tokio::test]
    async fn test_copy_all_joins_texts() {
        let mut engine = engine_for("<body><p>first part and second part</p></body>");
        let range = select(&engine, "first part");
        engine.create(range, None).await.unwrap();
        let range = select(&engine, "second part");
        engine.create(range, None).await.unwrap();
        assert_eq!(engine.copy_all(), "first part\n\nsecond part");
    }

    #[tokio::test]
    async fn test_edit_replaces_record_text() {
        let store = Arc::new(MemoryHighlightStore::new());
        let mut engine =
            engine_for("<body><p>editable text</p></body>").with_persistence(store.clone());
        let range = select(&engine, "editable");
        let record = engine.create(range, None).await.unwrap();

        assert!(engine.edit(&record.id, "  corrected  ").await);
        assert_eq!(engine.records()[0].text, "corrected");
        assert_eq!(store.load(PAGE).await.unwrap()[0].text, "corrected");
        assert!(!engine.edit(&record.id, "   ").await);
        assert!(!engine.edit("highlight_404_404", "x").await);
    }

    #[tokio::test]
    async fn test_persistence_failure_does_not_block() {
        // no persistence attached at all; every operation still succeeds
        let mut engine = engine_for("<body><p>offline words</p></body>");
        let range = select(&engine, "offline");
        let record = engine.create(range, None).await.unwrap();
        assert!(engine.remove(&record.id).await);
    }
}
