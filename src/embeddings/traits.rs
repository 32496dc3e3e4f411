// Phrase embedder trait.
//
// Like the recognizer trait, this lets the K-means stage run against the
// local ONNX sentence model in production and a deterministic hashing
// embedder when the model is missing or in tests.

use anyhow::Result;

/// Maps phrases to fixed-dimensional vectors in a shared similarity space.
pub trait PhraseEmbedder: Send + Sync {
    /// Length of every vector returned by `embed`.
    fn dimension(&self) -> usize;

    /// Embed a batch of phrases, one vector per phrase, in input order.
    fn embed(&self, phrases: &[String]) -> Result<Vec<Vec<f64>>>;
}
