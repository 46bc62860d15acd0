use async_trait::async_trait;
use chrono::Utc;
use lumora_core::{HighlightRecord, Paths, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::HighlightStore;

/// On-disk shape of one page's records. The envelope keeps the original
/// URL readable without decoding the filename.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageFile {
    page_url: String,
    updated_at: String,
    highlights: Vec<HighlightRecord>,
}

/// Outcome of a retention prune pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PruneReport {
    pub pages_pruned: usize,
    pub highlights_removed: usize,
}

/// File-backed store: one JSON document per normalized page URL under
/// `~/.lumora/highlights/`.
pub struct FileHighlightStore {
    paths: Paths,
}

impl FileHighlightStore {
    pub fn new(paths: Paths) -> Self {
        Self { paths }
    }

    /// Drop highlights older than `days` across all pages, deleting page
    /// keys that end up empty.
    pub async fn prune_older_than(&self, days: i64) -> Result<PruneReport> {
        let cutoff = Utc::now().timestamp_millis() - days * 24 * 60 * 60 * 1000;
        let mut report = PruneReport::default();

        for page_url in self.pages().await? {
            let records = self.load(&page_url).await?;
            let kept: Vec<HighlightRecord> = records
                .iter()
                .filter(|r| r.created_at > cutoff)
                .cloned()
                .collect();
            let removed = records.len() - kept.len();
            if removed == 0 {
                continue;
            }

            report.pages_pruned += 1;
            report.highlights_removed += removed;
            if kept.is_empty() {
                self.delete(&page_url).await?;
            } else {
                self.save(&page_url, &kept).await?;
            }
        }

        if report.highlights_removed > 0 {
            info!(
                pages = report.pages_pruned,
                highlights = report.highlights_removed,
                "Pruned stale highlights"
            );
        }
        Ok(report)
    }
}

#[async_trait]
impl HighlightStore for FileHighlightStore {
    async fn load(&self, page_url: &str) -> Result<Vec<HighlightRecord>> {
        let path = self.paths.highlight_file(page_url);
        if !path.exists() {
            return Ok(Vec::new());
        }

        let raw = std::fs::read_to_string(&path)?;
        match serde_json::from_str::<PageFile>(&raw) {
            Ok(file) => Ok(file.highlights),
            Err(e) => {
                // A corrupt file must not take the page down; start fresh.
                warn!(path = %path.display(), error = %e, "Unreadable highlight file, ignoring");
                Ok(Vec::new())
            }
        }
    }

    async fn save(&self, page_url: &str, records: &[HighlightRecord]) -> Result<()> {
        self.paths.ensure_dirs()?;
        let path = self.paths.highlight_file(page_url);
        let file = PageFile {
            page_url: page_url.to_string(),
            updated_at: Utc::now().to_rfc3339(),
            highlights: records.to_vec(),
        };
        std::fs::write(&path, serde_json::to_string_pretty(&file)?)?;
        debug!(page = page_url, count = records.len(), "Saved highlights");
        Ok(())
    }

    async fn delete(&self, page_url: &str) -> Result<()> {
        let path = self.paths.highlight_file(page_url);
        if path.exists() {
            std::fs::remove_file(&path)?;
        }
        Ok(())
    }

    async fn pages(&self) -> Result<Vec<String>> {
        let dir = self.paths.highlights_dir();
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut pages = Vec::new();
        for entry in std::fs::read_dir(&dir)? {
            let entry = entry?;
            let name = entry.file_name();
            let Some(stem) = name.to_str().and_then(|n| n.strip_suffix(".json")) else {
                continue;
            };
            match urlencoding::decode(stem) {
                Ok(url) => pages.push(url.into_owned()),
                Err(_) => debug!(file = ?name, "Skipping non-key file in highlights dir"),
            }
        }
        pages.sort();
        Ok(pages)
    }
}
