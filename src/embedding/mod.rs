//! Text embedding providers
//!
//! Providers:
//! - HashingEmbedder: local, deterministic feature hashing (default)
//! - OllamaEmbedder: HTTP client for an Ollama embeddings endpoint
//!
//! The analysis core only sees the `EmbeddingProvider` trait.

mod hashing;
mod ollama;

pub use hashing::HashingEmbedder;
pub use ollama::OllamaEmbedder;

use thiserror::Error;

use crate::config::{EmbeddingConfig, ProviderKind};

/// Errors that can occur during embedding generation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EmbeddingError {
    /// Backend could not be reached or kept failing
    #[error("Embedding provider unavailable: {0}")]
    Unavailable(String),

    /// Backend answered with something that is not an embedding
    #[error("Invalid embedding response: {0}")]
    InvalidResponse(String),

    /// Two vectors that must be compared have different lengths
    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// Maps text to a fixed-length vector
pub trait EmbeddingProvider: Send + Sync {
    /// Stable identifier of the model producing the vectors.
    /// Vectors from providers with different ids are not comparable.
    fn id(&self) -> String;

    /// Generate an embedding vector for the given text
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;
}

/// Build the provider selected in the configuration
pub fn from_config(config: &EmbeddingConfig) -> Result<Box<dyn EmbeddingProvider>, EmbeddingError> {
    match config.provider {
        ProviderKind::Hashed => Ok(Box::new(HashingEmbedder::new(config.dimension))),
        ProviderKind::Ollama => Ok(Box::new(OllamaEmbedder::new(
            &config.endpoint,
            &config.model,
            config.timeout_secs,
            config.max_attempts,
        )?)),
    }
}

/// Cosine similarity in [-1, 1]; zero vectors have similarity 0
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32, EmbeddingError> {
    if a.len() != b.len() {
        return Err(EmbeddingError::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let magnitude_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let magnitude_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if magnitude_a == 0.0 || magnitude_b == 0.0 {
        return Ok(0.0);
    }

    Ok(dot_product / (magnitude_a * magnitude_b))
}
