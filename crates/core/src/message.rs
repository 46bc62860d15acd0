use serde::{Deserialize, Serialize};

use crate::types::{HighlightRecord, Notice};

/// Export output flavors. JSON carries the full structured document, text
/// is the human-readable rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Json,
    Text,
}

/// One action requested of the engine by a trigger surface (context menu,
/// popup button, keyboard shortcut). The wire tag names match the message
/// actions the original extension surfaces sent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum EngineAction {
    HighlightSelectedText {
        /// The selected string to anchor and wrap.
        text: String,
        /// Palette override; the current setting applies when absent.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        color: Option<crate::types::HighlightColor>,
    },
    ClearAllHighlights,
    RemoveHighlight {
        id: String,
    },
    JumpToHighlight {
        id: String,
    },
    GetHighlights,
    ExportAllHighlights {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        format: Option<ExportFormat>,
    },
    CopyHighlights,
}

/// An inbound request: which surface asked, and what for.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineRequest {
    pub surface: String,
    #[serde(flatten)]
    pub action: EngineAction,
}

impl EngineRequest {
    pub fn menu(action: EngineAction) -> Self {
        Self {
            surface: "menu".to_string(),
            action,
        }
    }

    pub fn popup(action: EngineAction) -> Self {
        Self {
            surface: "popup".to_string(),
            action,
        }
    }

    pub fn shortcut(action: EngineAction) -> Self {
        Self {
            surface: "shortcut".to_string(),
            action,
        }
    }
}

/// Result of one engine action. Failures are values, never panics: the
/// engine converts every error at this boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineResponse {
    pub success: bool,
    /// Updated record list, where the action changed or queried it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub highlights: Option<Vec<HighlightRecord>>,
    /// Action payload: exported document or copied text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notice: Option<Notice>,
}

impl EngineResponse {
    pub fn ok() -> Self {
        Self {
            success: true,
            highlights: None,
            payload: None,
            notice: None,
        }
    }

    pub fn failed(notice: Notice) -> Self {
        Self {
            success: false,
            highlights: None,
            payload: None,
            notice: Some(notice),
        }
    }

    pub fn with_highlights(mut self, highlights: Vec<HighlightRecord>) -> Self {
        self.highlights = Some(highlights);
        self
    }

    pub fn with_payload(mut self, payload: impl Into<String>) -> Self {
        self.payload = Some(payload.into());
        self
    }

    pub fn with_notice(mut self, notice: Notice) -> Self {
        self.notice = Some(notice);
        self
    }
}

/// Push message from the engine to any listening UI. Delivery is not
/// guaranteed; senders must tolerate a missing receiver.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum EngineEvent {
    #[serde(rename_all = "camelCase")]
    HighlightsUpdated {
        page_url: String,
        highlights: Vec<HighlightRecord>,
    },
}
