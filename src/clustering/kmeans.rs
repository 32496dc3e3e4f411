// Embedding clustering: K-means over sentence embeddings with elbow-based
// K selection.
//
// Every phrase that reaches this stage ends up in a cluster. The number of
// clusters is picked from [min, max] by running K-means for each candidate,
// taking the discrete gradient of the inertia curve, and choosing the first
// K where that gradient peaks. Clusters are then named after their most
// frequent words and merged into the accumulated map.

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::{Context, Result};
use linfa::prelude::*;
use linfa_clustering::KMeans;
use ndarray::{Array1, Array2, ArrayView1};
use rand_xoshiro::rand_core::SeedableRng;
use rand_xoshiro::Xoshiro256Plus;
use tracing::{debug, error, info, warn};

use super::cluster_map::ClusterMap;
use super::naming::cluster_name;
use super::traits::{Clustered, PhraseClusterer};
use crate::embeddings::traits::PhraseEmbedder;

const MAX_ITERATIONS: u64 = 300;
const TOLERANCE: f64 = 1e-4;

pub struct EmbeddingClusterer {
    embedder: Arc<dyn PhraseEmbedder>,
    min_clusters: usize,
    max_clusters: usize,
    seed: Option<u64>,
}

/// Result of the K sweep, kept for logging and tests.
#[derive(Debug, Clone, PartialEq)]
pub struct KSelection {
    pub candidates: Vec<usize>,
    pub inertias: Vec<f64>,
    pub chosen: usize,
}

impl EmbeddingClusterer {
    /// `min_clusters` and `max_clusters` are inclusive; callers validate
    /// `1 <= min <= max` when building the pipeline config.
    pub fn new(
        embedder: Arc<dyn PhraseEmbedder>,
        min_clusters: usize,
        max_clusters: usize,
        seed: Option<u64>,
    ) -> Self {
        Self {
            embedder,
            min_clusters,
            max_clusters,
            seed,
        }
    }

    /// Embed, pick K, assign and name. Returns named groups in the order
    /// their first member appears in `phrases`.
    pub fn assign(&self, phrases: &[String]) -> Result<(KSelection, Vec<(String, Vec<String>)>)> {
        let vectors = self
            .embedder
            .embed(phrases)
            .context("Failed to embed phrases")?;
        let observations = to_matrix(&vectors, self.embedder.dimension())?;

        // k-means++ seeding needs at least k distinct points
        let distinct = count_distinct_rows(&vectors);
        let candidates = candidate_range(self.min_clusters, self.max_clusters, distinct);

        let seed = self.seed.unwrap_or_else(rand::random::<u64>);
        debug!(seed, distinct, "K-means seed");

        let mut inertias = Vec::with_capacity(candidates.len());
        for &k in &candidates {
            let (_, inertia) = fit_kmeans(&observations, k, seed)?;
            debug!(k, inertia, "K-means candidate");
            inertias.push(inertia);
        }

        let chosen = select_k(&candidates, &inertias);
        info!(chosen, candidates = candidates.len(), "Selected cluster count");

        let (labels, _) = fit_kmeans(&observations, chosen, seed)?;
        let groups = group_by_label(phrases, &labels);

        // Two groups can share a name; their members are merged so no phrase
        // from this stage is lost.
        let mut named = ClusterMap::new();
        for (label, members) in groups {
            let name = cluster_name(Some(label), &members);
            for phrase in members {
                named.push(&name, phrase);
            }
        }
        let named = named.into_entries();

        Ok((
            KSelection {
                candidates,
                inertias,
                chosen,
            },
            named,
        ))
    }
}

impl PhraseClusterer for EmbeddingClusterer {
    fn name(&self) -> &'static str {
        "kmeans"
    }

    fn cluster(&self, phrases: Vec<String>, mut clusters: ClusterMap) -> Clustered {
        if phrases.is_empty() {
            return Clustered::passthrough(clusters, phrases);
        }

        let named = match self.assign(&phrases) {
            Ok((_, named)) => named,
            Err(e) => {
                error!(error = %e, "Embedding clustering failed, keeping existing clusters");
                return Clustered::passthrough(clusters, phrases);
            }
        };

        for (name, members) in named {
            if let Some(previous) = clusters.replace(&name, members) {
                warn!(
                    cluster = %name,
                    dropped = previous.len(),
                    "Cluster name collision, existing phrases replaced"
                );
            }
        }

        let unclustered = clusters.unclustered(&phrases);
        Clustered {
            clusters,
            unclustered,
        }
    }
}

/// Candidate K values: `[min, max]` with `max` clamped to `available`
/// and `min` clamped to the clamped `max`.
pub fn candidate_range(min: usize, max: usize, available: usize) -> Vec<usize> {
    let effective_max = max.min(available).max(1);
    let effective_min = min.clamp(1, effective_max);
    (effective_min..=effective_max).collect()
}

/// Discrete gradient: one-sided differences at the ends, central
/// differences inside. Fewer than two points yields zeros.
pub fn gradient(values: &[f64]) -> Vec<f64> {
    let n = values.len();
    if n < 2 {
        return vec![0.0; n];
    }
    (0..n)
        .map(|i| match i {
            0 => values[1] - values[0],
            i if i == n - 1 => values[n - 1] - values[n - 2],
            i => (values[i + 1] - values[i - 1]) / 2.0,
        })
        .collect()
}

/// The candidate at the first index of the maximum gradient.
pub fn select_k(candidates: &[usize], inertias: &[f64]) -> usize {
    match candidates {
        [] => 1,
        [only] => *only,
        _ => {
            let grad = gradient(inertias);
            let mut best = 0;
            for (i, g) in grad.iter().enumerate() {
                if *g > grad[best] {
                    best = i;
                }
            }
            candidates[best]
        }
    }
}

fn to_matrix(vectors: &[Vec<f64>], dimension: usize) -> Result<Array2<f64>> {
    let mut flat = Vec::with_capacity(vectors.len() * dimension);
    for (i, v) in vectors.iter().enumerate() {
        if v.len() != dimension {
            anyhow::bail!(
                "Embedding {} has dimension {}, expected {}",
                i,
                v.len(),
                dimension
            );
        }
        flat.extend_from_slice(v);
    }
    Array2::from_shape_vec((vectors.len(), dimension), flat)
        .context("Failed to build embedding matrix")
}

fn count_distinct_rows(vectors: &[Vec<f64>]) -> usize {
    vectors
        .iter()
        .map(|v| v.iter().map(|x| x.to_bits()).collect::<Vec<u64>>())
        .collect::<HashSet<_>>()
        .len()
}

/// Fit K-means and return (labels, inertia). Inertia is the sum of squared
/// distances from each point to its assigned centroid.
fn fit_kmeans(observations: &Array2<f64>, k: usize, seed: u64) -> Result<(Vec<usize>, f64)> {
    let n = observations.nrows();
    let dataset = DatasetBase::new(observations.clone(), Array1::from_elem(n, ()));

    let model = KMeans::params_with_rng(k, Xoshiro256Plus::seed_from_u64(seed))
        .max_n_iterations(MAX_ITERATIONS)
        .tolerance(TOLERANCE)
        .fit(&dataset)
        .map_err(|e| anyhow::anyhow!("K-means fit failed for k={}: {}", k, e))?;

    let labels: Array1<usize> = model.predict(observations);
    let centroids = model.centroids();

    let inertia = observations
        .outer_iter()
        .zip(labels.iter())
        .map(|(row, &label)| squared_distance(row, centroids.row(label)))
        .sum();

    Ok((labels.to_vec(), inertia))
}

fn squared_distance(a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// Group phrases by label; groups ordered by first appearance.
fn group_by_label(phrases: &[String], labels: &[usize]) -> Vec<(usize, Vec<String>)> {
    let mut groups: Vec<(usize, Vec<String>)> = Vec::new();
    for (phrase, &label) in phrases.iter().zip(labels) {
        match groups.iter_mut().find(|(l, _)| *l == label) {
            Some((_, members)) => members.push(phrase.clone()),
            None => groups.push((label, vec![phrase.clone()])),
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gradient_matches_one_sided_and_central() {
        let g = gradient(&[10.0, 6.0, 4.0, 3.0]);
        assert_eq!(g, vec![-4.0, -3.0, -1.5, -1.0]);
    }

    #[test]
    fn test_gradient_two_points() {
        assert_eq!(gradient(&[5.0, 2.0]), vec![-3.0, -3.0]);
    }

    #[test]
    fn test_select_k_first_max() {
        // gradient [-4, -3, -1.5, -1] peaks at the last index
        assert_eq!(select_k(&[2, 3, 4, 5], &[10.0, 6.0, 4.0, 3.0]), 5);
        // equal gradient: first index wins
        assert_eq!(select_k(&[3, 4], &[5.0, 2.0]), 3);
    }

    #[test]
    fn test_select_k_single_candidate() {
        assert_eq!(select_k(&[7], &[1.0]), 7);
    }

    #[test]
    fn test_candidate_range_clamps() {
        assert_eq!(candidate_range(5, 10, 100), vec![5, 6, 7, 8, 9, 10]);
        assert_eq!(candidate_range(5, 10, 3), vec![3]);
        assert_eq!(candidate_range(2, 4, 3), vec![2, 3]);
        assert_eq!(candidate_range(1, 1, 0), vec![1]);
    }

    #[test]
    fn test_group_by_label_first_appearance_order() {
        let phrases: Vec<String> = ["a", "b", "c", "d"].iter().map(|s| s.to_string()).collect();
        let groups = group_by_label(&phrases, &[1, 0, 1, 2]);
        assert_eq!(
            groups,
            vec![
                (1, vec!["a".to_string(), "c".to_string()]),
                (0, vec!["b".to_string()]),
                (2, vec!["d".to_string()]),
            ]
        );
    }

    #[test]
    fn test_count_distinct_rows() {
        let v = vec![vec![1.0, 0.0], vec![1.0, 0.0], vec![0.0, 1.0]];
        assert_eq!(count_distinct_rows(&v), 2);
    }

    #[test]
    fn test_fit_kmeans_separates_obvious_groups() {
        let data = Array2::from_shape_vec(
            (4, 2),
            vec![0.0, 0.0, 0.1, 0.0, 10.0, 10.0, 10.1, 10.0],
        )
        .unwrap();
        let (labels, inertia) = fit_kmeans(&data, 2, 7).unwrap();
        assert_eq!(labels[0], labels[1]);
        assert_eq!(labels[2], labels[3]);
        assert_ne!(labels[0], labels[2]);
        assert!((inertia - 0.01).abs() < 1e-6);
    }
}
