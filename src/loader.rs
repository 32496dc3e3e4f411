// Phrase loading from a CSV file, a plain text file, or in-memory lines.
//
// Loading never aborts a run: an unreadable file is logged and produces an
// empty phrase list, and every stage after this one treats empty input as a
// pass-through.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::{error, warn};

use crate::config::PhraseSource;

/// Resolve a phrase source into the raw phrase list.
pub fn load_phrases(source: &PhraseSource) -> Vec<String> {
    match source {
        PhraseSource::Lines(lines) => lines.clone(),
        PhraseSource::File(path) => or_empty(path, read_csv(path)),
        PhraseSource::TextFile(path) => or_empty(path, read_lines(path)),
    }
}

fn or_empty(path: &Path, loaded: Result<Vec<String>>) -> Vec<String> {
    loaded.unwrap_or_else(|e| {
        error!(path = %path.display(), error = %e, "Failed to load phrases");
        Vec::new()
    })
}

/// First column of every data row. The header row is skipped, blank cells
/// are dropped, and rows that fail to parse are logged and skipped.
pub fn read_csv(path: &Path) -> Result<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;

    let mut phrases = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = match record {
            Ok(r) => r,
            Err(e) => {
                warn!(row = row + 1, error = %e, "Skipping unreadable CSV row");
                continue;
            }
        };
        match record.get(0) {
            Some(cell) if !cell.trim().is_empty() => phrases.push(cell.to_string()),
            Some(_) => {}
            None => warn!(row = row + 1, "Skipping CSV row without a first column"),
        }
    }
    Ok(phrases)
}

/// Non-blank lines of a plain text file, one phrase per line.
pub fn read_lines(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(content
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(String::from)
        .collect())
}
