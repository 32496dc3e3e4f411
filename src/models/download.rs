// Model download helper for the ONNX models.
//
// Downloads two models from HuggingFace:
// 1. all-MiniLM-L6-v2: sentence embeddings for K-means clustering (~90MB)
// 2. bert-base-NER: token classification for entity clustering (~430MB)
//
// Files are stored in a platform-appropriate directory
// (~/.local/share/kwcluster/models/ on Linux) so they persist across runs.
// Each model gets its own subdirectory.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

/// One file to fetch: path inside the HF repo, local name, and whether it is
/// large enough to deserve a progress bar.
struct ModelFile {
    remote: &'static str,
    local: &'static str,
    large: bool,
}

/// A downloadable model and the files it needs.
struct ModelSpec {
    title: &'static str,
    base_url: &'static str,
    subdir: &'static str,
    files: &'static [ModelFile],
    size_hint: &'static str,
}

const EMBEDDING_MODEL: ModelSpec = ModelSpec {
    title: "Sentence embedding model (all-MiniLM-L6-v2)",
    base_url: "https://huggingface.co/sentence-transformers/all-MiniLM-L6-v2/resolve/main",
    subdir: "all-MiniLM-L6-v2",
    files: &[
        ModelFile {
            remote: "tokenizer.json",
            local: "tokenizer.json",
            large: false,
        },
        ModelFile {
            remote: "onnx/model.onnx",
            local: "model.onnx",
            large: true,
        },
    ],
    size_hint: "~90 MB",
};

const NER_MODEL: ModelSpec = ModelSpec {
    title: "Named-entity model (bert-base-NER)",
    base_url: "https://huggingface.co/Xenova/bert-base-NER/resolve/main",
    subdir: "bert-base-NER",
    files: &[
        ModelFile {
            remote: "config.json",
            local: "config.json",
            large: false,
        },
        ModelFile {
            remote: "tokenizer.json",
            local: "tokenizer.json",
            large: false,
        },
        ModelFile {
            remote: "onnx/model.onnx",
            local: "model.onnx",
            large: true,
        },
    ],
    size_hint: "~430 MB",
};

/// Returns the default directory for storing model files.
/// Uses the platform data directory: ~/.local/share/kwcluster/models/ on Linux.
pub fn default_model_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("kwcluster")
        .join("models")
}

/// Subdirectory within model_dir for the sentence embedding model.
pub fn embedding_model_dir(base: &Path) -> PathBuf {
    base.join(EMBEDDING_MODEL.subdir)
}

/// Subdirectory within model_dir for the NER model.
pub fn ner_model_dir(base: &Path) -> PathBuf {
    base.join(NER_MODEL.subdir)
}

fn files_present(spec: &ModelSpec, base: &Path) -> bool {
    let dir = base.join(spec.subdir);
    spec.files.iter().all(|f| dir.join(f.local).exists())
}

/// Check whether the embedding model and its tokenizer exist.
pub fn embedding_files_present(base: &Path) -> bool {
    files_present(&EMBEDDING_MODEL, base)
}

/// Check whether the NER model, tokenizer and label config exist.
pub fn ner_files_present(base: &Path) -> bool {
    files_present(&NER_MODEL, base)
}

/// Download both ONNX models.
///
/// Shows progress bars for large files. Skips files that already exist.
/// Creates directories as needed.
pub async fn download_model(base: &Path) -> Result<()> {
    std::fs::create_dir_all(base)
        .with_context(|| format!("Failed to create model directory: {}", base.display()))?;

    for spec in [&EMBEDDING_MODEL, &NER_MODEL] {
        fetch_model(spec, base).await?;
    }
    Ok(())
}

async fn fetch_model(spec: &ModelSpec, base: &Path) -> Result<()> {
    println!("\n{}:", spec.title);

    let dir = base.join(spec.subdir);
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create model directory: {}", dir.display()))?;

    for file in spec.files {
        let dest = dir.join(file.local);
        if dest.exists() {
            info!(file = file.local, model = spec.subdir, "Already exists, skipping");
            println!("  {} (already exists)", file.local);
            continue;
        }

        if file.large {
            println!("  Downloading {} ({})...", file.local, spec.size_hint);
        } else {
            println!("  Downloading {}...", file.local);
        }
        download_file(
            &format!("{}/{}", spec.base_url, file.remote),
            &dest,
            file.large,
        )
        .await?;
    }
    Ok(())
}

/// Download a single file from a URL to a local path.
/// If `show_progress` is true, display a progress bar.
async fn download_file(url: &str, dest: &Path, show_progress: bool) -> Result<()> {
    let client = reqwest::Client::new();
    let mut response = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("Failed to download {}", url))?;

    if !response.status().is_success() {
        anyhow::bail!("Download failed with status {}: {}", response.status(), url);
    }

    let pb = show_progress.then(|| progress_bar(response.content_length()));

    // Stream to memory chunk by chunk so the bar moves, then write once;
    // a partial file is never left behind on failure.
    let mut bytes: Vec<u8> = Vec::new();
    while let Some(chunk) = response
        .chunk()
        .await
        .context("Failed to read response body")?
    {
        bytes.extend_from_slice(&chunk);
        if let Some(ref pb) = pb {
            pb.set_position(bytes.len() as u64);
        }
    }

    std::fs::write(dest, &bytes).with_context(|| format!("Failed to write {}", dest.display()))?;

    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    info!(url, dest = %dest.display(), bytes = bytes.len(), "Downloaded model file");
    Ok(())
}

fn progress_bar(total_size: Option<u64>) -> ProgressBar {
    match total_size {
        Some(size) => {
            let pb = ProgressBar::new(size);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("    [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")
                    .expect("valid template")
                    .progress_chars("=> "),
            );
            pb
        }
        None => {
            let pb = ProgressBar::new_spinner();
            pb.set_style(
                ProgressStyle::default_spinner()
                    .template("    {spinner} {bytes}")
                    .expect("valid template"),
            );
            pb
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_model_dir_is_under_kwcluster() {
        let dir = default_model_dir();
        let path_str = dir.to_string_lossy();
        assert!(
            path_str.contains("kwcluster") && path_str.contains("models"),
            "Expected path containing kwcluster/models, got: {path_str}"
        );
    }

    #[test]
    fn test_model_dirs_are_subdirectories() {
        let base = PathBuf::from("/tmp/test-models");
        assert_eq!(embedding_model_dir(&base), base.join("all-MiniLM-L6-v2"));
        assert_eq!(ner_model_dir(&base), base.join("bert-base-NER"));
    }

    #[test]
    fn test_files_present_false_when_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!embedding_files_present(dir.path()));
        assert!(!ner_files_present(dir.path()));
    }

    #[test]
    fn test_embedding_files_present_true_when_files_exist() {
        let dir = tempfile::tempdir().unwrap();
        let embed_dir = embedding_model_dir(dir.path());
        std::fs::create_dir_all(&embed_dir).unwrap();
        std::fs::write(embed_dir.join("model.onnx"), b"fake").unwrap();
        std::fs::write(embed_dir.join("tokenizer.json"), b"fake").unwrap();

        assert!(embedding_files_present(dir.path()));
        assert!(!ner_files_present(dir.path()));
    }

    #[test]
    fn test_ner_needs_label_config() {
        let dir = tempfile::tempdir().unwrap();
        let ner_dir = ner_model_dir(dir.path());
        std::fs::create_dir_all(&ner_dir).unwrap();
        std::fs::write(ner_dir.join("model.onnx"), b"fake").unwrap();
        std::fs::write(ner_dir.join("tokenizer.json"), b"fake").unwrap();
        assert!(!ner_files_present(dir.path()));

        std::fs::write(ner_dir.join("config.json"), b"{}").unwrap();
        assert!(ner_files_present(dir.path()));
    }
}
