// Cluster naming from member phrases.

use std::collections::HashMap;

use crate::text::{is_stop_word, words};

/// Reserved name for phrases the clusterer flagged as outliers.
pub const NOISE_CLUSTER_NAME: &str = "No cluster chosen";

/// Number of top words joined into a cluster name.
const NAME_WORDS: usize = 3;

/// Name a cluster after its three most frequent non-stopword words,
/// joined by " / ". Ties keep the word that appeared first.
///
/// `label` is `None` for the noise group. A cluster with no usable words
/// falls back to `Cluster <label>`.
pub fn cluster_name(label: Option<usize>, phrases: &[String]) -> String {
    let Some(label) = label else {
        return NOISE_CLUSTER_NAME.to_string();
    };

    let top = top_words(phrases, NAME_WORDS);
    if top.is_empty() {
        format!("Cluster {label}")
    } else {
        top.join(" / ")
    }
}

/// Most frequent non-stopword words, most common first.
pub fn top_words(phrases: &[String], n: usize) -> Vec<String> {
    // (count, first-seen position) per word
    let mut counts: HashMap<String, (usize, usize)> = HashMap::new();
    let mut position = 0usize;
    for phrase in phrases {
        for word in words(phrase) {
            if is_stop_word(&word) {
                continue;
            }
            counts
                .entry(word)
                .and_modify(|(count, _)| *count += 1)
                .or_insert((1, position));
            position += 1;
        }
    }

    let mut ranked: Vec<(String, usize, usize)> = counts
        .into_iter()
        .map(|(word, (count, first))| (word, count, first))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));
    ranked.into_iter().take(n).map(|(word, _, _)| word).collect()
}
