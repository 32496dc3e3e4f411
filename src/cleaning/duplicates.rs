// Near-duplicate removal.
//
// The first phrase with a given signature survives; later phrases that
// normalize to the same signature are reported as removed.

use std::collections::HashSet;

use tracing::debug;

use super::traits::{Cleaned, PhraseCleaner};
use crate::text::normalize::Normalizer;

/// Removes phrases whose signature was already seen.
#[derive(Default)]
pub struct DuplicateRemover {
    normalizer: Normalizer,
}

impl DuplicateRemover {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PhraseCleaner for DuplicateRemover {
    fn name(&self) -> &'static str {
        "duplicates"
    }

    fn clean(&self, phrases: Vec<String>) -> Cleaned {
        let mut seen: HashSet<String> = HashSet::with_capacity(phrases.len());
        let mut result = Cleaned::default();

        for phrase in phrases {
            let signature = self.normalizer.signature(&phrase);
            if seen.insert(signature) {
                result.kept.push(phrase);
            } else {
                result.removed.push(phrase);
            }
        }

        debug!(
            kept = result.kept.len(),
            removed = result.removed.len(),
            "Duplicate check finished"
        );

        result
    }
}
