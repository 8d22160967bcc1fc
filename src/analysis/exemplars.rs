//! Versioned exemplar sets
//!
//! Exemplars are the reference phrases hostility is measured against.
//! Changing the list changes every score, so each set carries a version
//! label and a content fingerprint that is recorded with the outputs.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::Path;

use crate::error::{AnalysisError, Result};

pub const BUILTIN_VERSION: &str = "builtin-v1";

const BUILTIN_PHRASES: &[&str] = &[
    // insults
    "you are so stupid",
    "you're an idiot",
    "what a loser",
    "you are pathetic",
    "you're disgusting",
    "shut up you freak",
    // threats
    "i'm going to hurt you",
    "watch your back",
    "you'll regret this",
    "i will beat you up",
    "i know where you live",
    // exclusion
    "nobody likes you",
    "no one wants you here",
    "get out of this group",
    "go away and never come back",
    "we don't want to hang out with you",
    // degradation
    "you are worthless",
    "you're a waste of space",
    "everyone is laughing at you",
    "you should just disappear",
    "you're ugly",
    // Korean
    "꺼져",
    "닥쳐",
    "너 진짜 한심하다",
    "아무도 너 안 좋아해",
    "너랑 안 놀아",
    "죽여버린다",
    "찐따",
    "병신",
    "너 같은 건 없어져야 돼",
];

/// A named, ordered list of exemplar phrases
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExemplarSet {
    version: String,
    phrases: Vec<String>,
}

impl ExemplarSet {
    pub fn new(version: &str, phrases: Vec<String>) -> Self {
        Self {
            version: version.to_string(),
            phrases,
        }
    }

    /// The set shipped with the binary
    pub fn builtin() -> Self {
        Self::new(
            BUILTIN_VERSION,
            BUILTIN_PHRASES.iter().map(|p| p.to_string()).collect(),
        )
    }

    /// Load a `{version, phrases}` YAML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let set: ExemplarSet = serde_yaml::from_str(&content).map_err(|e| {
            AnalysisError::Configuration(format!(
                "invalid exemplar file {}: {}",
                path.display(),
                e
            ))
        })?;
        set.validate()?;
        Ok(set)
    }

    pub fn validate(&self) -> Result<()> {
        if self.version.trim().is_empty() {
            return Err(AnalysisError::Configuration(
                "exemplar set needs a version label".to_string(),
            ));
        }
        if self.phrases.is_empty() {
            return Err(AnalysisError::Configuration(
                "exemplar set is empty".to_string(),
            ));
        }
        if let Some(position) = self.phrases.iter().position(|p| p.trim().is_empty()) {
            return Err(AnalysisError::Configuration(format!(
                "exemplar {} is blank",
                position
            )));
        }
        Ok(())
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn phrases(&self) -> &[String] {
        &self.phrases
    }

    pub fn len(&self) -> usize {
        self.phrases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phrases.is_empty()
    }

    /// Hex SHA-256 over the version and every phrase, length-prefixed
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for part in std::iter::once(&self.version).chain(&self.phrases) {
            hasher.update((part.len() as u64).to_le_bytes());
            hasher.update(part.as_bytes());
        }
        hex::encode(hasher.finalize())
    }
}
