//! Configuration management with YAML support

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::AnalysisError;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub embedding: EmbeddingConfig,

    #[serde(default)]
    pub resolver: ResolverConfig,

    #[serde(default)]
    pub classifier: ClassifierConfig,

    #[serde(default)]
    pub persistence: PersistencePolicy,
}

/// Exemplar embedding cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    #[serde(default = "default_cache_path")]
    pub path: String,
}

/// Which embedding backend to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// Local deterministic feature hashing
    Hashed,
    /// Ollama `/api/embeddings` endpoint
    Ollama,
}

/// Embedding provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default = "default_provider")]
    pub provider: ProviderKind,

    /// Vector length for the hashed provider
    #[serde(default = "default_dimension")]
    pub dimension: usize,

    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Requests per text before the provider gives up (first try included)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

/// Order in which the addressee rules are tried
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddresseePrecedence {
    /// Explicit name mention, then last distinct speaker
    MentionFirst,
    /// Last distinct speaker, then explicit mention
    LastSpeakerFirst,
    /// Ignore mentions entirely
    LastSpeakerOnly,
}

/// Addressee resolution configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Number of preceding messages searched for the last distinct speaker
    #[serde(default = "default_window")]
    pub window: usize,

    #[serde(default = "default_precedence")]
    pub precedence: AddresseePrecedence,
}

/// Hostility classifier configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClassifierConfig {
    /// Inclusive lower bound for `is_hostile`
    #[serde(default = "default_hostility_threshold")]
    pub hostility_threshold: f32,

    /// YAML file replacing the built-in exemplar set
    #[serde(default)]
    pub exemplars_path: Option<String>,

    /// Fixed scoring worker count (None = rayon default)
    #[serde(default)]
    pub workers: Option<usize>,
}

/// Thresholds that define what counts as a persistent case.
///
/// Unknown keys are rejected so a misspelled threshold never falls back to
/// its default.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PersistencePolicy {
    #[serde(default = "default_min_hostile_count")]
    pub min_hostile_count: usize,

    #[serde(default = "default_min_span_days")]
    pub min_span_days: f64,

    #[serde(default = "default_max_gap_days")]
    pub max_gap_days: f64,

    /// Upper bound accepted for `min_span_days`
    #[serde(default = "default_max_transcript_days")]
    pub max_transcript_days: f64,
}

// Default value functions
fn default_enabled() -> bool {
    true
}

fn default_cache_path() -> String {
    "~/.local/share/chatwitness/embeddings.db".to_string()
}

fn default_provider() -> ProviderKind {
    ProviderKind::Hashed
}

fn default_dimension() -> usize {
    512
}

fn default_endpoint() -> String {
    "http://localhost:11434".to_string()
}

fn default_model() -> String {
    "nomic-embed-text".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_attempts() -> u32 {
    3
}

fn default_window() -> usize {
    5
}

fn default_precedence() -> AddresseePrecedence {
    AddresseePrecedence::MentionFirst
}

fn default_hostility_threshold() -> f32 {
    0.6
}

fn default_min_hostile_count() -> usize {
    3
}

fn default_min_span_days() -> f64 {
    1.0
}

fn default_max_gap_days() -> f64 {
    7.0
}

fn default_max_transcript_days() -> f64 {
    3650.0
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: default_cache_path(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            dimension: default_dimension(),
            endpoint: default_endpoint(),
            model: default_model(),
            timeout_secs: default_timeout_secs(),
            max_attempts: default_max_attempts(),
        }
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            window: default_window(),
            precedence: default_precedence(),
        }
    }
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            hostility_threshold: default_hostility_threshold(),
            exemplars_path: None,
            workers: None,
        }
    }
}

impl Default for PersistencePolicy {
    fn default() -> Self {
        Self {
            min_hostile_count: default_min_hostile_count(),
            min_span_days: default_min_span_days(),
            max_gap_days: default_max_gap_days(),
            max_transcript_days: default_max_transcript_days(),
        }
    }
}

impl PersistencePolicy {
    /// Reject thresholds that would make the evidentiary bar meaningless.
    /// Values are never clamped.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if self.min_hostile_count == 0 {
            return Err(AnalysisError::Configuration(
                "min_hostile_count must be at least 1".to_string(),
            ));
        }
        for (name, value) in [
            ("min_span_days", self.min_span_days),
            ("max_gap_days", self.max_gap_days),
            ("max_transcript_days", self.max_transcript_days),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(AnalysisError::Configuration(format!(
                    "{} must be a finite, non-negative number of days (got {})",
                    name, value
                )));
            }
        }
        if self.min_span_days > self.max_transcript_days {
            return Err(AnalysisError::Configuration(format!(
                "min_span_days ({}) exceeds the maximum transcript duration of {} days",
                self.min_span_days, self.max_transcript_days
            )));
        }
        Ok(())
    }
}

impl Config {
    /// Load configuration from a YAML file.
    ///
    /// An explicit `path` must exist and parse. Without one, searches:
    /// 1. ./chatwitness.yaml (current directory)
    /// 2. <config dir>/chatwitness/chatwitness.yaml
    /// and falls back to defaults when neither exists.
    pub fn load(path: Option<&str>) -> Result<Self> {
        if let Some(path) = path {
            let path = PathBuf::from(shellexpand::tilde(path).to_string());
            return Ok(Self::from_file(&path)?);
        }

        let mut search_paths = vec![PathBuf::from("chatwitness.yaml")];
        if let Some(dir) = dirs::config_dir() {
            search_paths.push(dir.join("chatwitness").join("chatwitness.yaml"));
        }

        for search_path in &search_paths {
            if search_path.exists() {
                return Ok(Self::from_file(search_path)?);
            }
        }

        // No config file found, use defaults
        Ok(Config::default())
    }

    fn from_file(path: &Path) -> Result<Self, AnalysisError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            AnalysisError::Configuration(format!(
                "cannot read config file {}: {}",
                path.display(),
                e
            ))
        })?;
        let config: Config = serde_yaml::from_str(&content).map_err(|e| {
            AnalysisError::Configuration(format!("invalid config file {}: {}", path.display(), e))
        })?;
        tracing::debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Check every section; the first problem found is returned.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if self.resolver.window == 0 {
            return Err(AnalysisError::Configuration(
                "resolver.window must be at least 1".to_string(),
            ));
        }
        let threshold = self.classifier.hostility_threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(AnalysisError::Configuration(format!(
                "classifier.hostility_threshold must lie in [0, 1] (got {})",
                threshold
            )));
        }
        if self.classifier.workers == Some(0) {
            return Err(AnalysisError::Configuration(
                "classifier.workers must be at least 1 when set".to_string(),
            ));
        }
        if self.embedding.max_attempts == 0 {
            return Err(AnalysisError::Configuration(
                "embedding.max_attempts must be at least 1".to_string(),
            ));
        }
        if self.embedding.provider == ProviderKind::Hashed && self.embedding.dimension == 0 {
            return Err(AnalysisError::Configuration(
                "embedding.dimension must be at least 1".to_string(),
            ));
        }
        self.persistence.validate()
    }

    /// Get the cache path, expanding ~ to home directory
    pub fn cache_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.cache.path).to_string())
    }

    /// Get the exemplar file path, if configured
    pub fn exemplars_path(&self) -> Option<PathBuf> {
        self.classifier
            .exemplars_path
            .as_ref()
            .map(|p| PathBuf::from(shellexpand::tilde(p).to_string()))
    }
}
