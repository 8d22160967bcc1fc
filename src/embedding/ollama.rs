//! Ollama embeddings client
//!
//! Blocking `POST {endpoint}/api/embeddings` with `{model, prompt}`.
//! Transport errors and 5xx responses are retried with exponential backoff;
//! anything else fails immediately.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{EmbeddingError, EmbeddingProvider};

const BACKOFF_BASE_MS: u64 = 250;
const BACKOFF_MAX_MS: u64 = 30_000;

pub struct OllamaEmbedder {
    endpoint: String,
    model: String,
    client: reqwest::blocking::Client,
    max_attempts: u32,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f32>,
}

impl OllamaEmbedder {
    pub fn new(
        endpoint: &str,
        model: &str,
        timeout_secs: u64,
        max_attempts: u32,
    ) -> Result<Self, EmbeddingError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| EmbeddingError::Unavailable(format!("HTTP client setup failed: {}", e)))?;

        Ok(Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            model: model.to_string(),
            client,
            max_attempts,
        })
    }

    fn request_once(&self, url: &str, text: &str) -> Result<Vec<f32>, Attempt> {
        let response = self
            .client
            .post(url)
            .json(&EmbeddingRequest {
                model: &self.model,
                prompt: text,
            })
            .send()
            .map_err(|e| Attempt::Retry(format!("request failed: {}", e)))?;

        let status = response.status();
        if status.is_server_error() {
            return Err(Attempt::Retry(format!("server returned {}", status)));
        }
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(Attempt::Fatal(EmbeddingError::Unavailable(format!(
                "model '{}' not found at {}",
                self.model, self.endpoint
            ))));
        }
        if !status.is_success() {
            return Err(Attempt::Fatal(EmbeddingError::InvalidResponse(format!(
                "unexpected status {}",
                status
            ))));
        }

        let body: EmbeddingResponse = response.json().map_err(|e| {
            Attempt::Fatal(EmbeddingError::InvalidResponse(format!(
                "failed to parse response: {}",
                e
            )))
        })?;

        if body.embedding.is_empty() {
            return Err(Attempt::Fatal(EmbeddingError::InvalidResponse(
                "empty embedding".to_string(),
            )));
        }
        Ok(body.embedding)
    }
}

/// Doubling delay after failed attempt `attempt`, capped
fn backoff(attempt: u32) -> Duration {
    let factor = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
    Duration::from_millis(BACKOFF_BASE_MS.saturating_mul(factor).min(BACKOFF_MAX_MS))
}

enum Attempt {
    Retry(String),
    Fatal(EmbeddingError),
}

impl EmbeddingProvider for OllamaEmbedder {
    fn id(&self) -> String {
        format!("ollama:{}", self.model)
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let url = format!("{}/api/embeddings", self.endpoint);
        let mut last_error = String::new();

        for attempt in 0..self.max_attempts {
            match self.request_once(&url, text) {
                Ok(vector) => return Ok(vector),
                Err(Attempt::Fatal(e)) => return Err(e),
                Err(Attempt::Retry(reason)) => {
                    tracing::debug!(attempt, %reason, "embedding request failed, retrying");
                    last_error = reason;
                    if attempt + 1 < self.max_attempts {
                        std::thread::sleep(backoff(attempt));
                    }
                }
            }
        }

        Err(EmbeddingError::Unavailable(format!(
            "{} after {} attempts",
            last_error, self.max_attempts
        )))
    }
}
