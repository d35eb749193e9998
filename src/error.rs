use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum ArcIndexError {
    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("unknown hub: {0}")]
    UnknownHub(String),

    #[error("invalid freshness boundary (expected YYYY-MM-DD): {0}")]
    InvalidFreshness(String),

    #[error("hub request failed: {0}")]
    HubHttp(String),

    #[error("hub returned status {status}: {message}")]
    HubStatus { status: u16, message: String },

    #[error("unexpected hub response: {0}")]
    HubPayload(String),

    #[error("failed to read spreadsheet: {0}")]
    Grid(String),

    #[error("no index has been built yet at {0}")]
    #[diagnostic(help("run `arc-index build` first"))]
    IndexUnavailable(PathBuf),

    #[error("persisted index is unreadable: {0}")]
    IndexCorrupt(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),

    #[error("failed to start worker pool: {0}")]
    WorkerPool(String),
}

impl ArcIndexError {
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            ArcIndexError::HubHttp(_) | ArcIndexError::HubStatus { .. } | ArcIndexError::HubPayload(_)
        )
    }
}
