pub mod file;
pub mod memory;
pub mod settings;

use async_trait::async_trait;
use lumora_core::{HighlightRecord, Result};

pub use file::{FileHighlightStore, PruneReport};
pub use memory::MemoryHighlightStore;
pub use settings::SettingsStore;

/// Key-value persistence for highlight records, keyed by normalized page
/// URL. The engine treats every call as best-effort: a failing store must
/// never block a user action.
#[async_trait]
pub trait HighlightStore: Send + Sync {
    /// Records for one page, in creation order. A missing key is an empty
    /// list, not an error.
    async fn load(&self, page_url: &str) -> Result<Vec<HighlightRecord>>;

    /// Replace the stored records for one page (last write wins).
    async fn save(&self, page_url: &str, records: &[HighlightRecord]) -> Result<()>;

    /// Drop the key for one page entirely.
    async fn delete(&self, page_url: &str) -> Result<()>;

    /// Every page URL with stored records.
    async fn pages(&self) -> Result<Vec<String>>;
}
