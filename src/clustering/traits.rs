// Phrase clusterer trait: the common interface of the three clustering
// stages (entities, user keys, embeddings).
//
// Every stage takes ownership of the accumulated ClusterMap, extends it, and
// hands it back together with the phrases it could not place.

use super::cluster_map::ClusterMap;

/// Output of a clustering stage.
#[derive(Debug, Clone, Default)]
pub struct Clustered {
    pub clusters: ClusterMap,
    /// Phrases from this stage's input that no cluster contains.
    pub unclustered: Vec<String>,
}

impl Clustered {
    /// The stage did nothing: clusters untouched, all phrases left over.
    pub fn passthrough(clusters: ClusterMap, phrases: Vec<String>) -> Self {
        Self {
            clusters,
            unclustered: phrases,
        }
    }
}

/// A stage that assigns phrases to named clusters.
pub trait PhraseClusterer {
    /// Short stage name used in log events.
    fn name(&self) -> &'static str;

    /// Assign `phrases` to clusters, extending `clusters`.
    fn cluster(&self, phrases: Vec<String>, clusters: ClusterMap) -> Clustered;
}
