// Entity category tags.
//
// Tags follow the OntoNotes scheme (PERSON, ORG, GPE, ...). Models trained on
// CoNLL emit short tags (PER, LOC, ORG, MISC) which are folded into the same
// vocabulary so one allow-list works for either model.

use std::collections::BTreeSet;

/// Every tag the pipeline understands, after alias folding.
pub const KNOWN_LABELS: [&str; 19] = [
    "PERSON",
    "NORP",
    "FAC",
    "ORG",
    "GPE",
    "LOC",
    "PRODUCT",
    "EVENT",
    "WORK_OF_ART",
    "LAW",
    "LANGUAGE",
    "DATE",
    "TIME",
    "PERCENT",
    "MONEY",
    "QUANTITY",
    "ORDINAL",
    "CARDINAL",
    "MISC",
];

/// Allowed entity categories for cluster seeding.
pub type EntityLabelSet = BTreeSet<String>;

/// Canonical form of a tag, or None if it is not a known category.
pub fn canonical_label(tag: &str) -> Option<String> {
    let upper = tag.trim().to_uppercase();
    let folded = match upper.as_str() {
        "PER" => "PERSON",
        "ORGANIZATION" | "ORGANISATION" => "ORG",
        "LOCATION" => "LOC",
        other => other,
    };
    KNOWN_LABELS
        .iter()
        .find(|known| **known == folded)
        .map(|known| known.to_string())
}

/// Parse a list of user-supplied tags into a label set.
///
/// Blank entries are skipped; an unknown tag is a configuration error.
pub fn parse_label_set(tags: &[String]) -> anyhow::Result<EntityLabelSet> {
    let mut set = EntityLabelSet::new();
    for tag in tags.iter().filter(|t| !t.trim().is_empty()) {
        match canonical_label(tag) {
            Some(label) => {
                set.insert(label);
            }
            None => anyhow::bail!(
                "Unknown entity label '{}'. Expected one of: {}",
                tag.trim(),
                KNOWN_LABELS.join(", ")
            ),
        }
    }
    Ok(set)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aliases_fold() {
        assert_eq!(canonical_label("per").as_deref(), Some("PERSON"));
        assert_eq!(canonical_label("Location").as_deref(), Some("LOC"));
        assert_eq!(canonical_label(" gpe ").as_deref(), Some("GPE"));
    }

    #[test]
    fn test_unknown_label() {
        assert!(canonical_label("SPACESHIP").is_none());
    }

    #[test]
    fn test_parse_label_set_skips_blanks() {
        let tags = vec!["PERSON".to_string(), " ".to_string(), "org".to_string()];
        let set = parse_label_set(&tags).unwrap();
        assert_eq!(set.len(), 2);
        assert!(set.contains("ORG"));
    }

    #[test]
    fn test_parse_label_set_rejects_unknown() {
        let tags = vec!["PERSON".to_string(), "WIZARD".to_string()];
        assert!(parse_label_set(&tags).is_err());
    }
}
