// System status display: model directory, which models are installed, and
// the effective run settings.

use std::path::Path;

use anyhow::Result;

use crate::config::Config;
use crate::models::{embedding_files_present, embedding_model_dir, ner_files_present, ner_model_dir};

/// Display system status to the terminal.
pub fn show(config: &Config) -> Result<()> {
    println!("Model directory: {}", config.model_dir.display());

    let embed_dir = embedding_model_dir(&config.model_dir);
    if embedding_files_present(&config.model_dir) {
        println!("Embedding model: installed ({})", format_bytes(dir_size(&embed_dir)));
    } else {
        println!("Embedding model: not installed");
        println!("  K-means clustering falls back to word hashing.");
        println!("  Run `kwcluster download-model` to install it.");
    }

    let ner_dir = ner_model_dir(&config.model_dir);
    if ner_files_present(&config.model_dir) {
        println!("NER model: installed ({})", format_bytes(dir_size(&ner_dir)));
    } else {
        println!("NER model: not installed");
        println!("  Entity clustering needs --gazetteer or `kwcluster download-model`.");
    }

    match config.seed {
        Some(seed) => println!("K-means seed: {seed}"),
        None => println!("K-means seed: random per run"),
    }
    println!("Progress poll interval: {} ms", config.poll_ms);

    Ok(())
}

/// Total size of the regular files directly inside `dir`.
fn dir_size(dir: &Path) -> u64 {
    std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .filter_map(|e| e.metadata().ok())
                .filter(|m| m.is_file())
                .map(|m| m.len())
                .sum()
        })
        .unwrap_or(0)
}

fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
