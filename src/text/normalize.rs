// Phrase signatures for duplicate detection.
//
// Two phrases are duplicates when they reduce to the same signature: case,
// word order, punctuation, stopwords and inflection are all ignored. So
// "Buy cheap shoes" and "shoes, cheap, buy" collapse to one entry.
//
// Base forms come from the Snowball English stemmer. It is more aggressive
// than a dictionary lemmatizer ("running" → "run") which only makes the
// duplicate check slightly broader.

use rust_stemmers::{Algorithm, Stemmer};
use unicode_segmentation::UnicodeSegmentation;

use super::is_stop_word;

/// Computes order-insensitive, stopword-free signatures.
pub struct Normalizer {
    stemmer: Stemmer,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Normalizer {
    pub fn new() -> Self {
        Self {
            stemmer: Stemmer::create(Algorithm::English),
        }
    }

    /// Canonical signature of a phrase.
    ///
    /// Whitespace-separated words are sorted before tokenization, then every
    /// token that is purely alphanumeric and not a stopword is stemmed and
    /// joined with single spaces.
    pub fn signature(&self, phrase: &str) -> String {
        let lower = phrase.to_lowercase();
        let mut parts: Vec<&str> = lower.split_whitespace().collect();
        parts.sort_unstable();
        let sorted = parts.join(" ");

        sorted
            .split_word_bounds()
            .filter(|token| is_alphanumeric(token))
            .filter(|token| !is_stop_word(token))
            .map(|token| self.stemmer.stem(token).into_owned())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn is_alphanumeric(token: &str) -> bool {
    !token.is_empty() && token.chars().all(char::is_alphanumeric)
}
