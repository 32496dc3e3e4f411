// kwcluster: keyword phrase clustering
//
// This is the library root. Each module corresponds to a stage or a
// supporting subsystem of the clustering pipeline.

pub mod cleaning;
pub mod clustering;
pub mod config;
pub mod embeddings;
pub mod loader;
pub mod models;
pub mod ner;
pub mod output;
pub mod pipeline;
pub mod status;
pub mod text;
