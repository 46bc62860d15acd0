use lumora_core::{Paths, Result, Settings};
use tracing::{debug, warn};

/// Loads and saves the global user settings (`~/.lumora/settings.json`),
/// seeding defaults on first run.
pub struct SettingsStore {
    paths: Paths,
}

impl SettingsStore {
    pub fn new(paths: Paths) -> Self {
        Self { paths }
    }

    pub fn load(&self) -> Settings {
        let path = self.paths.settings_file();
        if !path.exists() {
            debug!("No settings file, using defaults");
            return Settings::default();
        }
        match std::fs::read_to_string(&path)
            .map_err(lumora_core::Error::from)
            .and_then(|raw| serde_json::from_str(&raw).map_err(lumora_core::Error::from))
        {
            Ok(settings) => settings,
            Err(e) => {
                warn!(error = %e, "Failed to load settings, using defaults");
                Settings::default()
            }
        }
    }

    pub fn save(&self, settings: &Settings) -> Result<()> {
        self.paths.ensure_dirs()?;
        std::fs::write(
            self.paths.settings_file(),
            serde_json::to_string_pretty(settings)?,
        )?;
        Ok(())
    }
}
