// ClusterMap: the ordered name → phrases accumulator handed from stage to
// stage.
//
// Insertion order of cluster names is preserved so output reads in the order
// the stages created the clusters (entities first, then user keys, then
// embedding clusters). Names are unique.

use std::collections::{HashMap, HashSet};

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClusterMap {
    entries: Vec<(String, Vec<String>)>,
    index: HashMap<String, usize>,
}

impl ClusterMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of clusters.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.index
            .get(name)
            .map(|&i| self.entries[i].1.as_slice())
    }

    /// Cluster names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(name, phrases)| (name.as_str(), phrases.as_slice()))
    }

    /// Append a phrase to a cluster, creating the cluster if needed.
    pub fn push(&mut self, name: &str, phrase: String) {
        let i = self.slot(name);
        self.entries[i].1.push(phrase);
    }

    /// Append a phrase unless the cluster already holds it.
    /// Returns true when the phrase was added.
    pub fn push_unique(&mut self, name: &str, phrase: &str) -> bool {
        let i = self.slot(name);
        let members = &mut self.entries[i].1;
        if members.iter().any(|p| p == phrase) {
            false
        } else {
            members.push(phrase.to_string());
            true
        }
    }

    /// Set a cluster's phrase list, replacing any existing list under the
    /// same name (last writer wins). The cluster keeps its original position.
    /// Returns the replaced list.
    pub fn replace(&mut self, name: &str, phrases: Vec<String>) -> Option<Vec<String>> {
        match self.index.get(name) {
            Some(&i) => Some(std::mem::replace(&mut self.entries[i].1, phrases)),
            None => {
                self.index.insert(name.to_string(), self.entries.len());
                self.entries.push((name.to_string(), phrases));
                None
            }
        }
    }

    /// Keep only clusters for which `keep` returns true, preserving order.
    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&str, &[String]) -> bool,
    {
        self.entries.retain(|(name, phrases)| keep(name, phrases));
        self.reindex();
    }

    /// Every phrase that belongs to at least one cluster.
    pub fn members(&self) -> HashSet<&str> {
        self.entries
            .iter()
            .flat_map(|(_, phrases)| phrases.iter().map(String::as_str))
            .collect()
    }

    /// Phrases from `phrases` that no cluster contains, in input order.
    pub fn unclustered(&self, phrases: &[String]) -> Vec<String> {
        let members = self.members();
        phrases
            .iter()
            .filter(|p| !members.contains(p.as_str()))
            .cloned()
            .collect()
    }

    /// Total phrase slots across all clusters (a phrase in two clusters
    /// counts twice).
    pub fn phrase_count(&self) -> usize {
        self.entries.iter().map(|(_, phrases)| phrases.len()).sum()
    }

    pub fn into_entries(self) -> Vec<(String, Vec<String>)> {
        self.entries
    }

    fn slot(&mut self, name: &str) -> usize {
        if let Some(&i) = self.index.get(name) {
            return i;
        }
        let i = self.entries.len();
        self.entries.push((name.to_string(), Vec::new()));
        self.index.insert(name.to_string(), i);
        i
    }

    fn reindex(&mut self) {
        self.index = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, (name, _))| (name.clone(), i))
            .collect();
    }
}

impl FromIterator<(String, Vec<String>)> for ClusterMap {
    fn from_iter<I: IntoIterator<Item = (String, Vec<String>)>>(iter: I) -> Self {
        let mut map = ClusterMap::new();
        for (name, phrases) in iter {
            map.replace(&name, phrases);
        }
        map
    }
}

impl Serialize for ClusterMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, phrases) in &self.entries {
            map.serialize_entry(name, phrases)?;
        }
        map.end()
    }
}
