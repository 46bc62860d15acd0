use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Empty selection: {0}")]
    EmptySelection(String),

    #[error("Wrap failed: {0}")]
    WrapFailed(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Dom error: {0}")]
    Dom(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Channel error: {0}")]
    Channel(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, Error>;
