use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::ner::labels::{parse_label_set, EntityLabelSet};

/// Default lower bound for the K-means candidate range.
pub const DEFAULT_MIN_CLUSTERS: usize = 5;
/// Default upper bound for the K-means candidate range.
pub const DEFAULT_MAX_CLUSTERS: usize = 25;
/// Default interval for draining the progress log, in milliseconds.
pub const DEFAULT_POLL_MS: u64 = 100;

/// Process-wide configuration loaded from environment variables.
///
/// The .env file is loaded automatically at startup via dotenvy.
pub struct Config {
    /// Directory holding the downloaded ONNX models
    pub model_dir: PathBuf,
    /// Fixed K-means seed (KWCLUSTER_SEED), used when a run doesn't set one
    pub seed: Option<u64>,
    /// How often the CLI drains progress messages
    pub poll_ms: u64,
}

impl Config {
    /// Load configuration from environment variables. Everything has a default.
    pub fn load() -> Result<Self> {
        let model_dir = env::var("KWCLUSTER_MODEL_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| crate::models::default_model_dir());

        let seed = match env::var("KWCLUSTER_SEED") {
            Ok(raw) if !raw.trim().is_empty() => Some(
                raw.trim()
                    .parse::<u64>()
                    .with_context(|| format!("KWCLUSTER_SEED is not a valid u64: {raw}"))?,
            ),
            _ => None,
        };

        let poll_ms = match env::var("KWCLUSTER_POLL_MS") {
            Ok(raw) if !raw.trim().is_empty() => raw
                .trim()
                .parse::<u64>()
                .with_context(|| format!("KWCLUSTER_POLL_MS is not a valid integer: {raw}"))?
                .max(1),
            _ => DEFAULT_POLL_MS,
        };

        Ok(Self {
            model_dir,
            seed,
            poll_ms,
        })
    }
}

/// Where the phrases for a run come from.
#[derive(Debug, Clone, PartialEq)]
pub enum PhraseSource {
    /// Delimited file; header skipped, first column used.
    File(PathBuf),
    /// Plain text file, one phrase per line.
    TextFile(PathBuf),
    /// Raw lines supplied by the caller.
    Lines(Vec<String>),
}

/// Per-run pipeline configuration.
///
/// Built through `PipelineConfig::new`, which rejects bad cluster bounds and
/// unknown entity labels before anything runs.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub source: PhraseSource,
    pub trash_words: Vec<String>,
    pub entity_labels: EntityLabelSet,
    pub stop_entities: Vec<String>,
    pub user_keys: Vec<String>,
    pub min_clusters: usize,
    pub max_clusters: usize,
    pub seed: Option<u64>,
}

impl PipelineConfig {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        source: PhraseSource,
        trash_words: Vec<String>,
        entity_labels: &[String],
        stop_entities: Vec<String>,
        user_keys: Vec<String>,
        min_clusters: usize,
        max_clusters: usize,
        seed: Option<u64>,
    ) -> Result<Self> {
        if min_clusters == 0 {
            anyhow::bail!("Minimum cluster count must be at least 1");
        }
        if max_clusters < min_clusters {
            anyhow::bail!(
                "Maximum cluster count ({}) is smaller than the minimum ({})",
                max_clusters,
                min_clusters
            );
        }
        if let PhraseSource::File(path) = &source {
            let is_csv = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("csv"));
            if !is_csv {
                anyhow::bail!(
                    "Unsupported phrase source {}: expected a .csv file",
                    path.display()
                );
            }
        }

        Ok(Self {
            source,
            trash_words,
            entity_labels: parse_label_set(entity_labels)?,
            stop_entities,
            user_keys,
            min_clusters,
            max_clusters,
            seed,
        })
    }

    /// In-memory phrases with every optional feature off and default bounds.
    pub fn from_lines(lines: Vec<String>) -> Self {
        Self {
            source: PhraseSource::Lines(lines),
            trash_words: Vec::new(),
            entity_labels: EntityLabelSet::new(),
            stop_entities: Vec::new(),
            user_keys: Vec::new(),
            min_clusters: DEFAULT_MIN_CLUSTERS,
            max_clusters: DEFAULT_MAX_CLUSTERS,
            seed: None,
        }
    }
}

/// Split a comma-separated list, trimming entries and dropping blanks.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
