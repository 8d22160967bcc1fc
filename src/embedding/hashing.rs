//! Deterministic feature-hashing embedder
//!
//! Word unigrams and character trigrams are hashed (FNV-1a, 64 bit) into a
//! fixed number of signed buckets and the result is L2-normalised. The
//! hash is fixed, so vectors are identical across runs, platforms and
//! compiler releases. Similarity is lexical, not semantic.

use super::{EmbeddingError, EmbeddingProvider};

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

const WORD_WEIGHT: f32 = 1.0;
const TRIGRAM_WEIGHT: f32 = 0.5;

pub struct HashingEmbedder {
    dimension: usize,
}

impl HashingEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }

    fn add_feature(&self, vector: &mut [f32], kind: u8, feature: &str, weight: f32) {
        let hash = fnv1a(kind, feature.as_bytes());
        let bucket = (hash % self.dimension as u64) as usize;
        let sign = if hash >> 63 == 0 { 1.0 } else { -1.0 };
        vector[bucket] += sign * weight;
    }
}

fn fnv1a(kind: u8, bytes: &[u8]) -> u64 {
    let mut hash = FNV_OFFSET;
    for byte in std::iter::once(&kind).chain(bytes) {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

fn words(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric() && c != '\'')
        .map(|w| w.trim_matches('\'').to_lowercase())
        .filter(|w| !w.is_empty())
        .collect()
}

impl EmbeddingProvider for HashingEmbedder {
    fn id(&self) -> String {
        format!("hashed:fnv1a-v1:{}", self.dimension)
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        if self.dimension == 0 {
            return Err(EmbeddingError::Unavailable(
                "hashing embedder configured with zero dimensions".to_string(),
            ));
        }

        let mut vector = vec![0.0f32; self.dimension];

        for word in words(text) {
            self.add_feature(&mut vector, b'w', &word, WORD_WEIGHT);

            let padded: Vec<char> = format!(" {} ", word).chars().collect();
            for gram in padded.windows(3) {
                let gram: String = gram.iter().collect();
                self.add_feature(&mut vector, b't', &gram, TRIGRAM_WEIGHT);
            }
        }

        let magnitude: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if magnitude > 0.0 {
            for value in &mut vector {
                *value /= magnitude;
            }
        }

        Ok(vector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::cosine_similarity;

    #[test]
    fn test_deterministic_and_normalised() {
        let model = HashingEmbedder::new(256);
        let a = model.embed("You are so stupid").unwrap();
        let b = model.embed("You are so stupid").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 256);

        let norm: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_case_and_punctuation_insensitive() {
        let model = HashingEmbedder::new(256);
        let a = model.embed("Nobody likes you!").unwrap();
        let b = model.embed("nobody likes you").unwrap();
        assert!((cosine_similarity(&a, &b).unwrap() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_overlap_scores_higher_than_unrelated() {
        let model = HashingEmbedder::new(512);
        let exemplar = model.embed("nobody likes you").unwrap();
        let close = model.embed("honestly nobody likes you at all").unwrap();
        let far = model.embed("what time is practice tomorrow").unwrap();
        let close_sim = cosine_similarity(&exemplar, &close).unwrap();
        let far_sim = cosine_similarity(&exemplar, &far).unwrap();
        assert!(close_sim > far_sim);
        assert!(close_sim > 0.5);
    }

    #[test]
    fn test_hangul_words_are_features() {
        let model = HashingEmbedder::new(128);
        let v = model.embed("꺼져 진짜").unwrap();
        assert!(v.iter().any(|x| *x != 0.0));
    }

    #[test]
    fn test_blank_text_is_zero_vector() {
        let model = HashingEmbedder::new(64);
        assert!(model.embed("  ...  ").unwrap().iter().all(|x| *x == 0.0));
    }
}
