// Named-entity recognition: trait, ONNX model backend, dictionary backend.

pub mod gazetteer;
pub mod labels;
pub mod onnx;
pub mod traits;
