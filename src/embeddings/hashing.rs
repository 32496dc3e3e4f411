// Bag-of-words feature hashing embedder.
//
// Fallback for when the sentence model isn't downloaded. Each non-stopword
// word (stemmed) is hashed into one of `dimension` buckets and the resulting
// count vector is L2-normalized. Phrases sharing words end up close; synonyms
// do not. Deterministic across runs and platforms (FNV-1a, no random state).

use anyhow::Result;
use rust_stemmers::{Algorithm, Stemmer};

use super::traits::PhraseEmbedder;
use crate::text::{is_stop_word, words};

pub const DEFAULT_HASH_DIM: usize = 256;

pub struct HashingEmbedder {
    dimension: usize,
    stemmer: Stemmer,
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_HASH_DIM)
    }
}

impl HashingEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
            stemmer: Stemmer::create(Algorithm::English),
        }
    }

    fn embed_one(&self, phrase: &str) -> Vec<f64> {
        let mut vector = vec![0.0_f64; self.dimension];
        for word in words(phrase) {
            if is_stop_word(&word) {
                continue;
            }
            let stem = self.stemmer.stem(&word);
            let bucket = (fnv1a(stem.as_bytes()) % self.dimension as u64) as usize;
            vector[bucket] += 1.0;
        }

        let norm = vector.iter().map(|v| v * v).sum::<f64>().sqrt();
        if norm > f64::EPSILON {
            for v in &mut vector {
                *v /= norm;
            }
        }
        vector
    }
}

impl PhraseEmbedder for HashingEmbedder {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn embed(&self, phrases: &[String]) -> Result<Vec<Vec<f64>>> {
        Ok(phrases.iter().map(|p| self.embed_one(p)).collect())
    }
}

fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf29ce484222325;
    for &b in bytes {
        hash ^= b as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cosine(a: &[f64], b: &[f64]) -> f64 {
        a.iter().zip(b).map(|(x, y)| x * y).sum()
    }

    #[test]
    fn test_dimension_and_norm() {
        let e = HashingEmbedder::new(64);
        let v = e.embed(&["guitar lessons online".to_string()]).unwrap();
        assert_eq!(v[0].len(), 64);
        let norm: f64 = v[0].iter().map(|x| x * x).sum::<f64>().sqrt();
        assert!((norm - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_shared_words_are_closer() {
        let e = HashingEmbedder::default();
        let v = e
            .embed(&[
                "guitar lessons".to_string(),
                "guitar chords".to_string(),
                "pizza delivery".to_string(),
            ])
            .unwrap();
        assert!(cosine(&v[0], &v[1]) > cosine(&v[0], &v[2]));
    }

    #[test]
    fn test_deterministic() {
        let e = HashingEmbedder::default();
        let a = e.embed(&["pizza near me".to_string()]).unwrap();
        let b = e.embed(&["pizza near me".to_string()]).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_stopwords_only_is_zero_vector() {
        let e = HashingEmbedder::new(16);
        let v = e.embed(&["the and of".to_string()]).unwrap();
        assert!(v[0].iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_fnv1a_known_value() {
        assert_eq!(fnv1a(b""), 0xcbf29ce484222325);
        assert_eq!(fnv1a(b"a"), 0xaf63dc4c8601ec8c);
    }
}
