use url::Url;

/// Normalize a page URL for use as a storage key: parse, strip the
/// fragment, and keep everything else as-is. Unparseable inputs fall back
/// to a plain fragment split so a record is never lost to a weird URL.
pub fn normalize_page_url(raw: &str) -> String {
    match Url::parse(raw) {
        Ok(mut url) => {
            url.set_fragment(None);
            url.to_string()
        }
        Err(_) => raw.split('#').next().unwrap_or(raw).to_string(),
    }
}

/// Page URL for a local HTML file, so the CLI can treat a file on disk as
/// the page being annotated.
pub fn file_page_url(path: &std::path::Path) -> Option<String> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir().ok()?.join(path)
    };
    Url::from_file_path(absolute).ok().map(|u| u.to_string())
}
