use lumora_core::HighlightRecord;

/// In-memory record list for the active page. The engine is the sole
/// owner and mutator; everything else sees snapshots. Ids combine the
/// creation timestamp with a counter that only moves forward, so they stay
/// unique within a page session and across reloads.
#[derive(Debug, Default)]
pub struct PageHighlightStore {
    records: Vec<HighlightRecord>,
    counter: u64,
}

impl PageHighlightStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the list with records loaded from persistence.
    pub fn adopt(&mut self, records: Vec<HighlightRecord>) {
        self.records = records;
    }

    pub fn next_id(&mut self, now_ms: i64) -> String {
        self.counter += 1;
        format!("highlight_{}_{}", now_ms, self.counter)
    }

    pub fn push(&mut self, record: HighlightRecord) {
        self.records.push(record);
    }

    pub fn get(&self, id: &str) -> Option<&HighlightRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn remove(&mut self, id: &str) -> Option<HighlightRecord> {
        let index = self.records.iter().position(|r| r.id == id)?;
        Some(self.records.remove(index))
    }

    /// Wholesale replacement of one record, keeping its list position.
    pub fn replace(&mut self, id: &str, record: HighlightRecord) -> bool {
        match self.records.iter_mut().find(|r| r.id == id) {
            Some(slot) => {
                *slot = record;
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) -> usize {
        let count = self.records.len();
        self.records.clear();
        count
    }

    /// Records in creation order.
    pub fn records(&self) -> &[HighlightRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumora_core::HighlightColor;

    fn record(id: &str) -> HighlightRecord {
        HighlightRecord {
            id: id.to_string(),
            text: "t".to_string(),
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
    fn test_ids_are_unique_and_monotonic() {
        let mut store = PageHighlightStore::new();
        let a = store.next_id(1000);
        let b = store.next_id(1000);
        assert_ne!(a, b);
        assert!(a.starts_with("highlight_1000_"));
    }

    #[test]
    fn test_remove_missing_leaves_list_alone() {
        let mut store = PageHighlightStore::new();
        store.push(record("highlight_1_1"));
        assert!(store.remove("highlight_9_9").is_none());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_replace_keeps_position() {
        let mut store = PageHighlightStore::new();
        store.push(record("highlight_1_1"));
        store.push(record("highlight_1_2"));

        let mut edited = record("highlight_1_1");
        edited.text = "edited".to_string();
        assert!(store.replace("highlight_1_1", edited));
        assert_eq!(store.records()[0].text, "edited");
        assert!(!store.replace("highlight_9_9", record("highlight_9_9")));
    }
}
