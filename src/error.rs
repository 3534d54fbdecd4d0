//! Error types for the voyage planner.

/// Top-level error type for query distribution and dispatch.
#[derive(Debug, thiserror::Error)]
pub enum VoyageError {
    /// Configuration error (unknown worker class, zero capacity, bad TOML).
    #[error("config error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Query batch or report could not be (de)serialized.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Search layer error (provider construction, orchestrator config).
    #[error("search error: {0}")]
    Search(#[from] voyage_search::SearchError),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, VoyageError>;
