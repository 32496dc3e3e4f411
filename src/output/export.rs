// Cluster map export. The file extension picks the format:
//
//   .txt   "name (N phrases):" headers with indented members
//   .csv   flat Group,Phrase rows
//   .json  object of name → phrase list, insertion order kept

use std::fmt::Write as _;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use crate::clustering::cluster_map::ClusterMap;

/// Supported export formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Text,
    Csv,
    Json,
}

impl ExportFormat {
    /// Format for a path's extension (case-insensitive).
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some("txt") => Ok(Self::Text),
            Some("csv") => Ok(Self::Csv),
            Some("json") => Ok(Self::Json),
            Some(other) => anyhow::bail!("Unknown file extension: .{other}"),
            None => anyhow::bail!("Output path has no extension: {}", path.display()),
        }
    }
}

/// Write `clusters` to `path` in the format its extension names.
pub fn save(clusters: &ClusterMap, path: &Path) -> Result<()> {
    let format = ExportFormat::from_path(path)?;
    let content = match format {
        ExportFormat::Text => render_text(clusters),
        ExportFormat::Csv => render_csv(clusters)?,
        ExportFormat::Json => {
            serde_json::to_string_pretty(clusters).context("Failed to serialize clusters")?
        }
    };

    std::fs::write(path, content)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    info!(path = %path.display(), clusters = clusters.len(), "Saved clusters");
    Ok(())
}

pub fn render_text(clusters: &ClusterMap) -> String {
    let mut out = String::new();
    for (name, phrases) in clusters.iter() {
        // Writing into a String cannot fail.
        let _ = writeln!(out, "\n{} ({} phrases):", name, phrases.len());
        for phrase in phrases {
            let _ = writeln!(out, "  - {}", phrase);
        }
    }
    out
}

pub fn render_csv(clusters: &ClusterMap) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["Group", "Phrase"])?;
    for (name, phrases) in clusters.iter() {
        for phrase in phrases {
            writer.write_record([name, phrase.as_str()])?;
        }
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to flush CSV writer: {}", e))?;
    String::from_utf8(bytes).context("CSV output is not valid UTF-8")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ClusterMap {
        let mut map = ClusterMap::new();
        map.push("Paris", "visit Paris".to_string());
        map.push("Paris", "hotels, Paris".to_string());
        map.push("apple", "apple pie".to_string());
        map
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(ExportFormat::from_path(Path::new("a.TXT")).unwrap(), ExportFormat::Text);
        assert_eq!(ExportFormat::from_path(Path::new("a.csv")).unwrap(), ExportFormat::Csv);
        assert_eq!(ExportFormat::from_path(Path::new("a.json")).unwrap(), ExportFormat::Json);
        assert!(ExportFormat::from_path(Path::new("a.xlsx")).is_err());
        assert!(ExportFormat::from_path(Path::new("noext")).is_err());
    }

    #[test]
    fn test_text_layout() {
        let text = render_text(&sample());
        assert_eq!(
            text,
            "\nParis (2 phrases):\n  - visit Paris\n  - hotels, Paris\n\napple (1 phrases):\n  - apple pie\n"
        );
    }

    #[test]
    fn test_csv_quotes_commas() {
        let csv = render_csv(&sample()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "Group,Phrase");
        assert_eq!(lines[1], "Paris,visit Paris");
        assert_eq!(lines[2], "Paris,\"hotels, Paris\"");
        assert_eq!(lines[3], "apple,apple pie");
    }

    #[test]
    fn test_json_keeps_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        save(&sample(), &path).unwrap();
        let json = std::fs::read_to_string(&path).unwrap();
        let paris = json.find("\"Paris\"").unwrap();
        let apple = json.find("\"apple\"").unwrap();
        assert!(paris < apple);
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["apple"][0], "apple pie");
    }

    #[test]
    fn test_unknown_extension_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.xlsx");
        assert!(save(&sample(), &path).is_err());
        assert!(!path.exists());
    }
}
