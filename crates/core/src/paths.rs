use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Paths {
    pub base: PathBuf,
}

impl Paths {
    pub fn new() -> Self {
        let base = dirs::home_dir()
            .map(|h| h.join(".lumora"))
            .unwrap_or_else(|| PathBuf::from(".lumora"));
        Self { base }
    }

    pub fn with_base(base: PathBuf) -> Self {
        Self { base }
    }

    pub fn config_file(&self) -> PathBuf {
        self.base.join("config.json")
    }

    pub fn settings_file(&self) -> PathBuf {
        self.base.join("settings.json")
    }

    pub fn highlights_dir(&self) -> PathBuf {
        self.base.join("highlights")
    }

    /// File holding the records of one page. The normalized page URL is
    /// percent-encoded so it is safe as a filename and decodes back losslessly.
    pub fn highlight_file(&self, page_url: &str) -> PathBuf {
        let key = urlencoding::encode(page_url);
        self.highlights_dir().join(format!("{}.json", key))
    }

    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.base)?;
        std::fs::create_dir_all(self.highlights_dir())?;
        Ok(())
    }
}

impl Default for Paths {
    fn default() -> Self {
        Self::new()
    }
}
