// User keyword clustering.
//
// Every phrase containing a user key (case-insensitive) joins the cluster
// named by that key exactly as the user typed it. A phrase matching several
// keys lands in several clusters.

use tracing::debug;

use super::cluster_map::ClusterMap;
use super::traits::{Clustered, PhraseClusterer};

pub struct KeywordClusterer {
    /// (original, lowercased) pairs; blank keys removed.
    keys: Vec<(String, String)>,
}

impl KeywordClusterer {
    pub fn new(keys: &[String]) -> Self {
        Self {
            keys: keys
                .iter()
                .filter(|k| !k.trim().is_empty())
                .map(|k| (k.clone(), k.to_lowercase()))
                .collect(),
        }
    }

    pub fn is_active(&self) -> bool {
        !self.keys.is_empty()
    }
}

impl PhraseClusterer for KeywordClusterer {
    fn name(&self) -> &'static str {
        "keywords"
    }

    fn cluster(&self, phrases: Vec<String>, mut clusters: ClusterMap) -> Clustered {
        if !self.is_active() {
            return Clustered::passthrough(clusters, phrases);
        }

        for phrase in &phrases {
            let lower = phrase.to_lowercase();
            for (key, needle) in &self.keys {
                if lower.contains(needle.as_str()) {
                    clusters.push(key, phrase.clone());
                }
            }
        }
        debug!(keys = self.keys.len(), clusters = clusters.len(), "Matched user keys");

        let unclustered = clusters.unclustered(&phrases);
        Clustered {
            clusters,
            unclustered,
        }
    }
}
