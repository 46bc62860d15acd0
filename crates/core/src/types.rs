use serde::{Deserialize, Serialize};

/// Display triple for one highlight color: background, border, foreground.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorStyle {
    pub bg: &'static str,
    pub border: &'static str,
    pub text: &'static str,
}

/// The fixed highlight palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum HighlightColor {
    #[default]
    Yellow,
    Green,
    Blue,
    Pink,
    Orange,
    Purple,
}

impl HighlightColor {
    pub fn as_str(&self) -> &'static str {
        match self {
            HighlightColor::Yellow => "yellow",
            HighlightColor::Green => "green",
            HighlightColor::Blue => "blue",
            HighlightColor::Pink => "pink",
            HighlightColor::Orange => "orange",
            HighlightColor::Purple => "purple",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "yellow" => Some(HighlightColor::Yellow),
            "green" => Some(HighlightColor::Green),
            "blue" => Some(HighlightColor::Blue),
            "pink" => Some(HighlightColor::Pink),
            "orange" => Some(HighlightColor::Orange),
            "purple" => Some(HighlightColor::Purple),
            _ => None,
        }
    }

    pub fn style(&self) -> ColorStyle {
        match self {
            HighlightColor::Yellow => ColorStyle {
                bg: "#fff3cd",
                border: "#ffd700",
                text: "#856404",
            },
            HighlightColor::Green => ColorStyle {
                bg: "#d1f2eb",
                border: "#10b981",
                text: "#0d5744",
            },
            HighlightColor::Blue => ColorStyle {
                bg: "#cce7ff",
                border: "#3b82f6",
                text: "#1e3a8a",
            },
            HighlightColor::Pink => ColorStyle {
                bg: "#fce7f3",
                border: "#ec4899",
                text: "#831843",
            },
            HighlightColor::Orange => ColorStyle {
                bg: "#fed7aa",
                border: "#f97316",
                text: "#9a3412",
            },
            HighlightColor::Purple => ColorStyle {
                bg: "#e9d5ff",
                border: "#8b5cf6",
                text: "#5b21b6",
            },
        }
    }

    pub fn all() -> &'static [HighlightColor] {
        &[
            HighlightColor::Yellow,
            HighlightColor::Green,
            HighlightColor::Blue,
            HighlightColor::Pink,
            HighlightColor::Orange,
            HighlightColor::Purple,
        ]
    }
}

/// One persisted annotation, serialized camelCase on the wire and on
/// disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HighlightRecord {
    pub id: String,
    pub text: String,
    pub color: HighlightColor,
    /// Creation instant, epoch millis.
    pub created_at: i64,
    /// Normalized page URL (fragment stripped).
    pub page_url: String,
    /// Up to 20 chars of text immediately preceding the highlight,
    /// used to disambiguate repeated occurrences on restore.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_before: Option<String>,
    /// Up to 20 chars of text immediately following the highlight.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_after: Option<String>,
    /// Structural path of the marker's parent element at creation time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element_path: Option<String>,
    /// The marker's inner HTML at creation time, replayed verbatim when a
    /// structural restore is possible.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serialized_content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Global user settings, persisted under their own storage key.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default)]
    pub current_color: HighlightColor,
    #[serde(default = "default_true")]
    pub auto_save: bool,
    #[serde(default = "default_true")]
    pub show_notifications: bool,
}

fn default_true() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            current_color: HighlightColor::Yellow,
            auto_save: true,
            show_notifications: true,
        }
    }
}

/// Outcome of a restore pass over the persisted records of one page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestoreReport {
    pub restored: usize,
    pub unresolved: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// Transient, non-blocking user-facing notification text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}
