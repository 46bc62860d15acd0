pub mod config;
pub mod error;
pub mod message;
pub mod page;
pub mod paths;
pub mod types;

pub use config::Config;
pub use error::{Error, Result};
pub use message::{EngineAction, EngineEvent, EngineRequest, EngineResponse, ExportFormat};
pub use page::{file_page_url, normalize_page_url};
pub use paths::Paths;
pub use types::{
    ColorStyle, HighlightColor, HighlightRecord, Notice, NoticeLevel, RestoreReport, Settings,
};
