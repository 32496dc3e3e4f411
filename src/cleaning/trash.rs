// Trash-word filter.
//
// Drops every phrase that contains one of the configured trash substrings.
// Matching is literal and case-sensitive. Blank entries are ignored, and a
// list with no usable entries disables the filter entirely instead of
// matching everything.

use tracing::debug;

use super::traits::{Cleaned, PhraseCleaner};

/// Removes phrases containing any trash substring.
pub struct TrashFilter {
    trash_words: Vec<String>,
}

impl TrashFilter {
    pub fn new(trash_words: &[String]) -> Self {
        Self {
            trash_words: trash_words
                .iter()
                .filter(|w| !w.trim().is_empty())
                .cloned()
                .collect(),
        }
    }

    /// False when there is nothing to filter by.
    pub fn is_active(&self) -> bool {
        !self.trash_words.is_empty()
    }

    fn is_trash(&self, phrase: &str) -> bool {
        self.trash_words.iter().any(|w| phrase.contains(w.as_str()))
    }
}

impl PhraseCleaner for TrashFilter {
    fn name(&self) -> &'static str {
        "trash"
    }

    fn clean(&self, phrases: Vec<String>) -> Cleaned {
        if !self.is_active() {
            debug!("No trash words configured, skipping filter");
            return Cleaned::unchanged(phrases);
        }

        let (removed, kept): (Vec<String>, Vec<String>) =
            phrases.into_iter().partition(|p| self.is_trash(p));

        Cleaned { kept, removed }
    }
}
