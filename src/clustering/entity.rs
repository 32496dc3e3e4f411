// Entity clustering: group phrases that mention the same named entity.
//
// Buckets are keyed by the entity's surface text exactly as the recognizer
// returned it ("Paris" and "paris" are different buckets). Only buckets with
// 2–39 phrases survive: a single phrase is not a cluster, and an entity that
// shows up in 40+ phrases is too broad to be useful as one.
//
// After filtering, phrases the recognizer missed but that literally contain a
// surviving entity string (case-insensitive) are back-filled into its bucket.

use std::sync::Arc;

use tracing::{debug, error, info};

use super::cluster_map::ClusterMap;
use super::traits::{Clustered, PhraseClusterer};
use crate::ner::labels::EntityLabelSet;
use crate::ner::traits::EntityRecognizer;

/// Smallest bucket kept.
pub const MIN_ENTITY_CLUSTER: usize = 2;
/// Largest bucket kept.
pub const MAX_ENTITY_CLUSTER: usize = 39;

pub struct EntityClusterer {
    recognizer: Arc<dyn EntityRecognizer>,
    labels: EntityLabelSet,
    stop_entities: Vec<String>,
}

impl EntityClusterer {
    /// `stop_entities` are compared against lowercased entity text; blank
    /// entries are dropped.
    pub fn new(
        recognizer: Arc<dyn EntityRecognizer>,
        labels: EntityLabelSet,
        stop_entities: &[String],
    ) -> Self {
        Self {
            recognizer,
            labels,
            stop_entities: stop_entities
                .iter()
                .filter(|s| !s.trim().is_empty())
                .map(|s| s.trim().to_lowercase())
                .collect(),
        }
    }

    /// The stage runs only when both a stop-entity list and at least one
    /// allowed label are configured.
    pub fn is_active(&self) -> bool {
        !self.stop_entities.is_empty() && !self.labels.is_empty()
    }

    fn is_stopped(&self, entity_text: &str) -> bool {
        let lower = entity_text.to_lowercase();
        self.stop_entities.iter().any(|s| *s == lower)
    }

    /// Raw buckets: entity text → phrases mentioning it.
    fn collect_buckets(&self, phrases: &[String]) -> anyhow::Result<ClusterMap> {
        let candidates: Vec<String> = phrases.iter().filter(|p| !p.is_empty()).cloned().collect();
        let detected = self.recognizer.recognize_batch(&candidates)?;

        let mut buckets = ClusterMap::new();
        for (phrase, entities) in candidates.iter().zip(detected) {
            for entity in entities {
                if !self.labels.contains(&entity.label) || self.is_stopped(&entity.text) {
                    continue;
                }
                buckets.push_unique(&entity.text, phrase);
            }
        }
        Ok(buckets)
    }
}

impl PhraseClusterer for EntityClusterer {
    fn name(&self) -> &'static str {
        "entities"
    }

    fn cluster(&self, phrases: Vec<String>, clusters: ClusterMap) -> Clustered {
        if !self.is_active() {
            debug!("Entity clustering disabled (no stop entities or no labels)");
            return Clustered::passthrough(clusters, phrases);
        }

        let mut buckets = match self.collect_buckets(&phrases) {
            Ok(buckets) => buckets,
            Err(e) => {
                error!(error = %e, "Entity recognition failed, skipping entity clustering");
                return Clustered::passthrough(clusters, phrases);
            }
        };

        let raw = buckets.len();
        buckets.retain(|_, members| {
            (MIN_ENTITY_CLUSTER..=MAX_ENTITY_CLUSTER).contains(&members.len())
        });
        info!(raw, kept = buckets.len(), "Filtered entity buckets by size");

        backfill(&mut buckets, &phrases);

        let mut clusters = clusters;
        for (name, members) in buckets.into_entries() {
            for phrase in members {
                clusters.push(&name, phrase);
            }
        }

        let unclustered = clusters.unclustered(&phrases);
        Clustered {
            clusters,
            unclustered,
        }
    }
}

/// Add phrases that contain a bucket's entity text but were not tagged.
fn backfill(buckets: &mut ClusterMap, phrases: &[String]) {
    let orphans = buckets.unclustered(phrases);
    let keys: Vec<(String, String)> = buckets
        .names()
        .map(|name| (name.to_string(), name.to_lowercase()))
        .collect();

    for phrase in &orphans {
        let lower = phrase.to_lowercase();
        for (name, needle) in &keys {
            if lower.contains(needle.as_str()) && buckets.push_unique(name, phrase) {
                debug!(entity = %name, phrase = %phrase, "Back-filled phrase into entity cluster");
            }
        }
    }
}
