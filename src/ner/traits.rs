// Entity recognizer trait: the swap point for NER backends.
//
// The default implementation runs a BERT token-classification model through
// ONNX. A dictionary-based gazetteer implements the same trait for offline
// use and tests.

use anyhow::Result;

/// A named-entity span found in a phrase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    /// Surface text exactly as it appears in the phrase.
    pub text: String,
    /// Canonical category tag (see `ner::labels`).
    pub label: String,
}

impl Entity {
    pub fn new(text: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            label: label.into(),
        }
    }
}

/// Trait for detecting named entities in short texts.
pub trait EntityRecognizer: Send + Sync {
    /// Detect entities in a single text.
    fn recognize(&self, text: &str) -> Result<Vec<Entity>>;

    /// Detect entities in many texts, returning results in the same order.
    /// Default implementation calls `recognize` sequentially.
    fn recognize_batch(&self, texts: &[String]) -> Result<Vec<Vec<Entity>>> {
        texts.iter().map(|t| self.recognize(t)).collect()
    }
}
