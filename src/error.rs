//! Error types for analysis runs

use thiserror::Error;

use crate::embedding::EmbeddingError;

/// Errors that abort an analysis run.
///
/// Per-message embedding failures are not represented here: they degrade the
/// affected message and are counted in the run summary instead.
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// Malformed, empty or unparseable transcript input
    #[error("Input error: {0}")]
    Input(String),

    /// Invalid thresholds or settings, rejected before any work is done
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The exemplar set could not be embedded, so nothing can be classified
    #[error("Failed to embed exemplar set: {0}")]
    Exemplars(#[source] EmbeddingError),

    /// Embedding cache failure
    #[error("Embedding cache error: {0}")]
    Cache(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
