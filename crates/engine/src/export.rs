use chrono::{DateTime, TimeZone, Utc};
use lumora_core::{HighlightRecord, Result};
use serde::Serialize;

/// One exported entry. Timestamps become RFC 3339 strings on the way out.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedHighlight {
    pub text: String,
    pub color: String,
    pub timestamp: String,
    pub note: String,
}

/// Page-scoped, creation-ordered snapshot of all highlights. Building it
/// never mutates engine state, and zero highlights is a valid document.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    pub url: String,
    pub title: String,
    pub timestamp: String,
    pub total_highlights: usize,
    pub highlights: Vec<ExportedHighlight>,
}

impl ExportDocument {
    pub fn build(
        url: &str,
        title: &str,
        records: &[HighlightRecord],
        exported_at: DateTime<Utc>,
    ) -> Self {
        Self {
            url: url.to_string(),
            title: title.to_string(),
            timestamp: exported_at.to_rfc3339(),
            total_highlights: records.len(),
            highlights: records
                .iter()
                .map(|r| ExportedHighlight {
                    text: r.text.clone(),
                    color: r.color.as_str().to_string(),
                    timestamp: iso_of_millis(r.created_at),
                    note: r.note.clone().unwrap_or_default(),
                })
                .collect(),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Plain-text rendering: a header block, then one
    /// `[COLOR] text (date)` line per highlight in creation order.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        out.push_str("LUMORA HIGHLIGHTS EXPORT\n");
        out.push_str("========================\n\n");
        out.push_str(&format!("Website: {}\n", self.url));
        out.push_str(&format!("Page Title: {}\n", self.title));
        out.push_str(&format!("Exported: {}\n", self.timestamp));
        out.push_str(&format!("Total Highlights: {}\n\n", self.total_highlights));

        for entry in &self.highlights {
            let date = entry
                .timestamp
                .parse::<DateTime<Utc>>()
                .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|_| entry.timestamp.clone());
            out.push_str(&format!(
                "[{}] {} ({})\n",
                entry.color.to_uppercase(),
                entry.text,
                date
            ));
        }
        out
    }
}

fn iso_of_millis(ms: i64) -> String {
    Utc.timestamp_millis_opt(ms)
        .single()
        .map(|t| t.to_rfc3339())
        .unwrap_or_default()
}
