// Local model files: where they live and how to fetch them.

pub mod download;

pub use download::{
    default_model_dir, download_model, embedding_files_present, embedding_model_dir,
    ner_files_present, ner_model_dir,
};
