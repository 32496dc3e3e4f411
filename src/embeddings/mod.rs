// Phrase embeddings: trait, ONNX sentence model, hashing fallback.

pub mod hashing;
pub mod onnx;
pub mod traits;
