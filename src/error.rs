// Error types for octocache.
// Covers configuration failures, GitHub API transport errors, and cache I/O.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum OctocacheError {
    #[error("Must provide GITHUB_AUTH")]
    MissingAuth,

    #[error("GitHub API error: {0}")]
    Api(#[from] reqwest::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, OctocacheError>;
