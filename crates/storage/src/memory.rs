use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use lumora_core::{Error, HighlightRecord, Result};

use crate::HighlightStore;

/// In-memory store: backs tests and ephemeral sessions where nothing
/// should touch the disk.
#[derive(Default)]
pub struct MemoryHighlightStore {
    inner: Mutex<HashMap<String, Vec<HighlightRecord>>>,
}

impl MemoryHighlightStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MemoryHighlightStore {
    fn locked(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, Vec<HighlightRecord>>>> {
        self.inner
            .lock()
            .map_err(|_| Error::Storage("store lock poisoned".to_string()))
    }
}

#[async_trait]
impl HighlightStore for MemoryHighlightStore {
    async fn load(&self, page_url: &str) -> Result<Vec<HighlightRecord>> {
        let inner = self.locked()?;
        Ok(inner.get(page_url).cloned().unwrap_or_default())
    }

    async fn save(&self, page_url: &str, records: &[HighlightRecord]) -> Result<()> {
        let mut inner = self.locked()?;
        inner.insert(page_url.to_string(), records.to_vec());
        Ok(())
    }

    async fn delete(&self, page_url: &str) -> Result<()> {
        let mut inner = self.locked()?;
        inner.remove(page_url);
        Ok(())
    }

    async fn pages(&self) -> Result<Vec<String>> {
        let inner = self.locked()?;
        let mut pages: Vec<String> = inner.keys().cloned().collect();
        pages.sort();
        Ok(pages)
    }
}
