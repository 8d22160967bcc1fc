//! Exemplar-similarity hostility classifier
//!
//! A message's hostility score is its highest cosine similarity to any
//! exemplar phrase, clamped to [0, 1]. Exemplar vectors are computed once
//! per classifier (or taken from the cache), never per message.

use serde::Serialize;
use std::sync::Arc;

use super::ExemplarSet;
use crate::embedding::{cosine_similarity, EmbeddingError, EmbeddingProvider};
use crate::error::{AnalysisError, Result};
use crate::store::EmbeddingCache;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Classification {
    pub hostility_score: f32,
    pub is_hostile: bool,
    /// Index of the closest exemplar, None when nothing was compared
    pub exemplar_index: Option<usize>,
}

impl Classification {
    /// Score for blank text or a degraded message
    pub fn benign() -> Self {
        Self {
            hostility_score: 0.0,
            is_hostile: false,
            exemplar_index: None,
        }
    }
}

/// Scores message text for hostility
pub trait HostilityClassifier: Send + Sync {
    fn classify(&self, text: &str) -> std::result::Result<Classification, EmbeddingError>;
}

pub struct ExemplarClassifier {
    provider: Arc<dyn EmbeddingProvider>,
    exemplar_vectors: Vec<Vec<f32>>,
    threshold: f32,
}

impl ExemplarClassifier {
    /// Embed the exemplar set, reusing cached vectors when available.
    ///
    /// Failing to embed any exemplar is fatal for the run.
    pub fn new(
        provider: Arc<dyn EmbeddingProvider>,
        exemplars: &ExemplarSet,
        threshold: f32,
        cache: Option<&mut EmbeddingCache>,
    ) -> Result<Self> {
        exemplars.validate()?;
        let provider_id = provider.id();

        let cached = match cache.as_deref() {
            Some(c) => c.load(exemplars, &provider_id)?,
            None => None,
        };

        let exemplar_vectors = match cached {
            Some(vectors) => {
                tracing::info!(
                    version = exemplars.version(),
                    provider = %provider_id,
                    "using cached exemplar embeddings"
                );
                vectors
            }
            None => {
                let vectors = exemplars
                    .phrases()
                    .iter()
                    .map(|phrase| provider.embed(phrase))
                    .collect::<std::result::Result<Vec<_>, _>>()
                    .map_err(AnalysisError::Exemplars)?;
                if let Some(cache) = cache {
                    cache.save(exemplars, &provider_id, &vectors)?;
                }
                tracing::info!(
                    version = exemplars.version(),
                    count = vectors.len(),
                    provider = %provider_id,
                    "embedded exemplar set"
                );
                vectors
            }
        };

        Ok(Self {
            provider,
            exemplar_vectors,
            threshold,
        })
    }
}

impl HostilityClassifier for ExemplarClassifier {
    fn classify(&self, text: &str) -> std::result::Result<Classification, EmbeddingError> {
        if text.trim().is_empty() {
            return Ok(Classification::benign());
        }

        let vector = self.provider.embed(text)?;

        let mut best: Option<(usize, f32)> = None;
        for (index, exemplar) in self.exemplar_vectors.iter().enumerate() {
            let similarity = cosine_similarity(exemplar, &vector)?;
            // Strictly greater: the first exemplar wins ties
            if best.map_or(true, |(_, s)| similarity > s) {
                best = Some((index, similarity));
            }
        }

        Ok(match best {
            Some((index, similarity)) => {
                let hostility_score = similarity.clamp(0.0, 1.0);
                Classification {
                    hostility_score,
                    is_hostile: hostility_score >= self.threshold,
                    exemplar_index: Some(index),
                }
            }
            None => Classification::benign(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Fixed vectors per text; counts calls
    struct TableProvider {
        calls: AtomicUsize,
    }

    impl TableProvider {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl EmbeddingProvider for TableProvider {
        fn id(&self) -> String {
            "table".to_string()
        }

        fn embed(&self, text: &str) -> std::result::Result<Vec<f32>, EmbeddingError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match text {
                "exemplar" => Ok(vec![3.0, 4.0]),
                "close" => Ok(vec![4.0, 3.0]),
                "opposite" => Ok(vec![-3.0, -4.0]),
                "broken" => Err(EmbeddingError::Unavailable("down".into())),
                "short" => Ok(vec![1.0]),
                _ => Ok(vec![4.0, -3.0]),
            }
        }
    }

    fn classifier(provider: Arc<TableProvider>, threshold: f32) -> ExemplarClassifier {
        let set = ExemplarSet::new("t", vec!["exemplar".into()]);
        ExemplarClassifier::new(provider, &set, threshold, None).unwrap()
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let c = classifier(Arc::new(TableProvider::new()), 0.96);
        let result = c.classify("close").unwrap();
        assert_eq!(result.hostility_score, 0.96);
        assert!(result.is_hostile);
        assert_eq!(result.exemplar_index, Some(0));
    }

    #[test]
    fn test_below_threshold_and_negative_similarity() {
        let c = classifier(Arc::new(TableProvider::new()), 0.97);
        assert!(!c.classify("close").unwrap().is_hostile);

        let opposite = c.classify("opposite").unwrap();
        assert_eq!(opposite.hostility_score, 0.0);
        assert!(!opposite.is_hostile);
    }

    #[test]
    fn test_blank_text_skips_provider() {
        let provider = Arc::new(TableProvider::new());
        let c = classifier(provider.clone(), 0.5);
        let before = provider.calls.load(Ordering::SeqCst);

        assert_eq!(c.classify("   \n\t").unwrap(), Classification::benign());
        assert_eq!(provider.calls.load(Ordering::SeqCst), before);
    }

    #[test]
    fn test_provider_errors_surface_to_caller() {
        let c = classifier(Arc::new(TableProvider::new()), 0.5);
        assert!(c.classify("broken").is_err());
        assert!(matches!(
            c.classify("short"),
            Err(EmbeddingError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_exemplar_failure_is_fatal() {
        let set = ExemplarSet::new("t", vec!["broken".into()]);
        let result = ExemplarClassifier::new(Arc::new(TableProvider::new()), &set, 0.5, None);
        assert!(matches!(result, Err(AnalysisError::Exemplars(_))));
    }

    #[test]
    fn test_cache_avoids_reembedding() {
        let mut cache = EmbeddingCache::open_in_memory().unwrap();
        let set = ExemplarSet::new("t", vec!["exemplar".into()]);

        let first = Arc::new(TableProvider::new());
        ExemplarClassifier::new(first.clone(), &set, 0.5, Some(&mut cache)).unwrap();
        assert_eq!(first.calls.load(Ordering::SeqCst), 1);

        let second = Arc::new(TableProvider::new());
        let c = ExemplarClassifier::new(second.clone(), &set, 0.5, Some(&mut cache)).unwrap();
        assert_eq!(second.calls.load(Ordering::SeqCst), 0);
        assert!(c.classify("close").unwrap().is_hostile);
    }
}
