use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::types::HighlightColor;

/// Process-level configuration, read from `~/.lumora/config.json`. User
/// preferences that change at runtime live in [`crate::types::Settings`]
/// instead; this file only seeds defaults and fixed knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Seed color for first-run settings.
    #[serde(default)]
    pub default_color: HighlightColor,
    /// Highlights older than this many days are dropped by the prune pass.
    #[serde(default = "default_retention_days")]
    pub retention_days: i64,
    /// Bound for the request/event channels.
    #[serde(default = "default_bus_buffer")]
    pub bus_buffer: usize,
}

fn default_retention_days() -> i64 {
    30
}

fn default_bus_buffer() -> usize {
    64
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_color: HighlightColor::Yellow,
            retention_days: default_retention_days(),
            bus_buffer: default_bus_buffer(),
        }
    }
}

impl Config {
    /// Load from the given file, falling back to defaults when the file is
    /// missing. A malformed file is an error; silently ignoring it would
    /// hide typos from the user.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)?;
        let config = serde_json::from_str(&raw)?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}
