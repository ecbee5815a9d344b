//! Error types for the cell build pipeline

use thiserror::Error;

/// Main error type for the pipeline
#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error("Data shape error: {0}")]
    DataShape(String),

    #[error("Build error: {0}")]
    Build(String),

    #[error("Render sink error: {0}")]
    Sink(String),

    #[error("Job error: {0}")]
    Job(&'static str),

    /// Returned by every poll after the one that surfaced the original failure.
    #[error("Job already failed")]
    JobFailed,
}
