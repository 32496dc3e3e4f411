// Pipeline orchestrator: threads phrases through every stage in order.
//
//   load → duplicates → trash → entities → user keys → K-means
//
// Each stage reports counts on the progress log before handing its output to
// the next. Cleaning stages shrink the phrase list; clustering stages extend
// the cluster map and pass on whatever they could not place.

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::progress::ProgressLog;
use crate::cleaning::duplicates::DuplicateRemover;
use crate::cleaning::traits::{Cleaned, PhraseCleaner};
use crate::cleaning::trash::TrashFilter;
use crate::clustering::cluster_map::ClusterMap;
use crate::clustering::entity::EntityClusterer;
use crate::clustering::keywords::KeywordClusterer;
use crate::clustering::kmeans::EmbeddingClusterer;
use crate::clustering::traits::{Clustered, PhraseClusterer};
use crate::config::PipelineConfig;
use crate::embeddings::traits::PhraseEmbedder;
use crate::loader::load_phrases;
use crate::ner::traits::EntityRecognizer;

/// Everything a run produced. Only `clusters` is the real artifact; the
/// removed lists are kept so callers can report them.
#[derive(Debug, Clone, Default)]
pub struct PipelineOutcome {
    pub clusters: ClusterMap,
    pub duplicates: Vec<String>,
    pub trash: Vec<String>,
}

/// A configured pipeline run.
pub struct Pipeline {
    config: PipelineConfig,
    recognizer: Option<Arc<dyn EntityRecognizer>>,
    embedder: Arc<dyn PhraseEmbedder>,
    log: ProgressLog,
}

impl Pipeline {
    pub fn new(config: PipelineConfig, embedder: Arc<dyn PhraseEmbedder>) -> Self {
        Self {
            config,
            recognizer: None,
            embedder,
            log: ProgressLog::silent(),
        }
    }

    /// Without a recognizer the entity stage is skipped.
    pub fn with_recognizer(mut self, recognizer: Arc<dyn EntityRecognizer>) -> Self {
        self.recognizer = Some(recognizer);
        self
    }

    pub fn with_log(mut self, log: ProgressLog) -> Self {
        self.log = log;
        self
    }

    /// Load phrases from the configured source and run every stage.
    pub fn run(&self) -> PipelineOutcome {
        let phrases = load_phrases(&self.config.source);
        self.log.send(format!("Loaded {} phrases.", phrases.len()));
        self.run_phrases(phrases)
    }

    /// Run every stage on already-loaded phrases.
    pub fn run_phrases(&self, phrases: Vec<String>) -> PipelineOutcome {
        let deduped = self.remove_duplicates(phrases);
        let cleaned = self.remove_trash(deduped.kept);

        let by_entity = self.cluster_by_entities(cleaned.kept);
        let by_keys = self.cluster_by_keys(by_entity);
        let clusters = self.cluster_by_embeddings(by_keys);

        info!(
            clusters = clusters.len(),
            phrases = clusters.phrase_count(),
            duplicates = deduped.removed.len(),
            trash = cleaned.removed.len(),
            "Pipeline finished"
        );

        PipelineOutcome {
            clusters,
            duplicates: deduped.removed,
            trash: cleaned.removed,
        }
    }

    fn remove_duplicates(&self, phrases: Vec<String>) -> Cleaned {
        self.log.send("Removing duplicate phrases...");
        let stage = DuplicateRemover::new();
        let result = stage.clean(phrases);
        log_cleaned(stage.name(), &result);
        self.log
            .send(format!("Removed {} phrases.", result.removed.len()));
        self.log.send(format!(
            "{} phrases left after removing duplicates.",
            result.kept.len()
        ));
        result
    }

    fn remove_trash(&self, phrases: Vec<String>) -> Cleaned {
        self.log.send("Removing phrases with trash words...");
        let stage = TrashFilter::new(&self.config.trash_words);
        let result = stage.clean(phrases);
        log_cleaned(stage.name(), &result);
        self.log
            .send(format!("Removed {} phrases.", result.removed.len()));
        self.log.send(format!(
            "{} phrases left after removing trash words.",
            result.kept.len()
        ));
        result
    }

    fn cluster_by_entities(&self, phrases: Vec<String>) -> Clustered {
        self.log.send("Clustering by named entities...");

        let result = match &self.recognizer {
            Some(recognizer) => {
                let stage = EntityClusterer::new(
                    Arc::clone(recognizer),
                    self.config.entity_labels.clone(),
                    &self.config.stop_entities,
                );
                let result = stage.cluster(phrases, ClusterMap::new());
                log_clustered(stage.name(), &result);
                result
            }
            None => {
                if self.config.stop_entities.iter().any(|s| !s.trim().is_empty()) {
                    warn!("No entity recognizer available, skipping entity clustering");
                }
                Clustered::passthrough(ClusterMap::new(), phrases)
            }
        };

        self.log
            .send(format!("Created {} clusters.", result.clusters.len()));
        self.log.send(format!(
            "{} phrases left after entity clustering.",
            result.unclustered.len()
        ));
        result
    }

    fn cluster_by_keys(&self, previous: Clustered) -> Clustered {
        self.log.send("Adding user keys to clusters...");
        let stage = KeywordClusterer::new(&self.config.user_keys);
        let result = stage.cluster(previous.unclustered, previous.clusters);
        log_clustered(stage.name(), &result);
        self.log
            .send(format!("Clusters so far: {}.", result.clusters.len()));
        self.log.send(format!(
            "{} phrases left after keyword clustering.",
            result.unclustered.len()
        ));
        result
    }

    fn cluster_by_embeddings(&self, previous: Clustered) -> ClusterMap {
        if previous.unclustered.is_empty() {
            self.log.send("No phrases left for K-means clustering.");
            return previous.clusters;
        }

        self.log.send("Clustering with K-means...");
        let stage = EmbeddingClusterer::new(
            Arc::clone(&self.embedder),
            self.config.min_clusters,
            self.config.max_clusters,
            self.config.seed,
        );
        let result = stage.cluster(previous.unclustered, previous.clusters);
        log_clustered(stage.name(), &result);
        self.log.send(format!(
            "Got {} clusters after K-means clustering.",
            result.clusters.len()
        ));
        result.clusters
    }
}

fn log_cleaned(stage: &str, result: &Cleaned) {
    debug!(
        stage,
        kept = result.kept.len(),
        removed = result.removed.len(),
        "Cleaning stage done"
    );
}

fn log_clustered(stage: &str, result: &Clustered) {
    debug!(
        stage,
        clusters = result.clusters.len(),
        unclustered = result.unclustered.len(),
        "Clustering stage done"
    );
}
