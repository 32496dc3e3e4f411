// Rule-based entity recognizer backed by a fixed dictionary.
//
// Each entry maps an entity string to a category tag. Matching is
// case-insensitive on Unicode word boundaries, and the returned entity text is
// the span as written in the phrase, so "visit paris" yields "paris" while
// "visit Paris" yields "Paris".
//
// File format: one `text<TAB>LABEL` entry per line; blank lines and lines
// starting with `#` are ignored.

use std::path::Path;

use anyhow::{Context, Result};
use regex::Regex;
use tracing::debug;

use super::labels::canonical_label;
use super::traits::{Entity, EntityRecognizer};

struct Pattern {
    regex: Regex,
    label: String,
}

/// Dictionary-driven entity recognizer.
pub struct Gazetteer {
    patterns: Vec<Pattern>,
}

impl Gazetteer {
    /// Build from `(text, tag)` pairs. Unknown tags are rejected.
    pub fn new<I, S, L>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, L)>,
        S: AsRef<str>,
        L: AsRef<str>,
    {
        let mut patterns = Vec::new();
        for (text, tag) in entries {
            let text = text.as_ref().trim();
            if text.is_empty() {
                continue;
            }
            let label = canonical_label(tag.as_ref())
                .with_context(|| format!("Unknown entity label '{}' for '{}'", tag.as_ref(), text))?;
            let regex = Regex::new(&format!(r"(?i)\b{}\b", regex::escape(text)))
                .with_context(|| format!("Invalid gazetteer entry '{}'", text))?;
            patterns.push(Pattern { regex, label });
        }
        Ok(Self { patterns })
    }

    /// Load entries from a tab-separated file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read gazetteer {}", path.display()))?;

        let mut entries = Vec::new();
        for (line_no, line) in content.lines().enumerate() {
            let line = line.trim_end();
            if line.trim().is_empty() || line.trim_start().starts_with('#') {
                continue;
            }
            let Some((text, tag)) = line.split_once('\t') else {
                anyhow::bail!(
                    "{}:{}: expected `text<TAB>LABEL`, got {:?}",
                    path.display(),
                    line_no + 1,
                    line
                );
            };
            entries.push((text.to_string(), tag.to_string()));
        }

        let gazetteer = Self::new(entries)?;
        debug!(
            entries = gazetteer.len(),
            "Loaded gazetteer from {}",
            path.display()
        );
        Ok(gazetteer)
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

impl EntityRecognizer for Gazetteer {
    fn recognize(&self, text: &str) -> Result<Vec<Entity>> {
        // (start, end, label) for every match of every entry
        let mut spans: Vec<(usize, usize, &str)> = Vec::new();
        for pattern in &self.patterns {
            for m in pattern.regex.find_iter(text) {
                spans.push((m.start(), m.end(), pattern.label.as_str()));
            }
        }

        // Leftmost first, longest first at the same start; overlaps dropped.
        spans.sort_by(|a, b| a.0.cmp(&b.0).then(b.1.cmp(&a.1)));

        let mut entities = Vec::new();
        let mut last_end = 0;
        for (start, end, label) in spans {
            if start < last_end {
                continue;
            }
            entities.push(Entity::new(&text[start..end], label));
            last_end = end;
        }
        Ok(entities)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gazetteer() -> Gazetteer {
        Gazetteer::new([
            ("Paris", "GPE"),
            ("New York", "GPE"),
            ("York", "GPE"),
            ("Nike", "ORG"),
        ])
        .unwrap()
    }

    #[test]
    fn test_surface_text_preserved() {
        let g = gazetteer();
        assert_eq!(
            g.recognize("visit paris").unwrap(),
            vec![Entity::new("paris", "GPE")]
        );
        assert_eq!(
            g.recognize("visit Paris").unwrap(),
            vec![Entity::new("Paris", "GPE")]
        );
    }

    #[test]
    fn test_word_boundaries() {
        let g = gazetteer();
        assert!(g.recognize("parisian cafe").unwrap().is_empty());
    }

    #[test]
    fn test_longest_match_wins() {
        let g = gazetteer();
        assert_eq!(
            g.recognize("hotels in New York").unwrap(),
            vec![Entity::new("New York", "GPE")]
        );
    }

    #[test]
    fn test_multiple_entities_in_order() {
        let g = gazetteer();
        let found = g.recognize("nike store paris").unwrap();
        assert_eq!(
            found,
            vec![Entity::new("nike", "ORG"), Entity::new("paris", "GPE")]
        );
    }

    #[test]
    fn test_non_ascii_entries() {
        let g = Gazetteer::new([("Café", "FAC"), ("Zürich", "GPE")]).unwrap();
        assert_eq!(
            g.recognize("best Café paris").unwrap(),
            vec![Entity::new("Café", "FAC")]
        );
        assert_eq!(
            g.recognize("hotels ZÜRICH").unwrap(),
            vec![Entity::new("ZÜRICH", "GPE")]
        );
        assert!(g.recognize("cafés nearby").unwrap().is_empty());
    }

    #[test]
    fn test_unknown_label_rejected() {
        assert!(Gazetteer::new([("Paris", "CITYISH")]).is_err());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("entities.tsv");
        std::fs::write(&path, "# places\nParis\tGPE\n\nAdidas\tORG\n").unwrap();
        let g = Gazetteer::from_file(&path).unwrap();
        assert_eq!(g.len(), 2);
    }

    #[test]
    fn test_from_file_bad_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("entities.tsv");
        std::fs::write(&path, "Paris GPE\n").unwrap();
        assert!(Gazetteer::from_file(&path).is_err());
    }
}
