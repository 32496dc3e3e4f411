// Colored terminal output for cluster maps and run summaries.
//
// This module handles all terminal-specific formatting. The main.rs display
// functions delegate here.

use colored::Colorize;

use super::truncate_chars;
use crate::clustering::cluster_map::ClusterMap;
use crate::clustering::naming::NOISE_CLUSTER_NAME;
use crate::pipeline::PipelineOutcome;

/// Members shown per cluster before the list is cut off.
const MEMBERS_SHOWN: usize = 5;
const NAME_WIDTH: usize = 48;

/// Display the cluster map: one header line per cluster, a few members each.
pub fn display_clusters(clusters: &ClusterMap) {
    if clusters.is_empty() {
        println!("No clusters to show.");
        return;
    }

    println!(
        "\n{}",
        format!(
            "=== Clusters ({} groups, {} phrases) ===",
            clusters.len(),
            clusters.phrase_count()
        )
        .bold()
    );
    println!();

    for (name, phrases) in clusters.iter() {
        let label = truncate_chars(name, NAME_WIDTH);
        let label = if name == NOISE_CLUSTER_NAME {
            label.dimmed()
        } else {
            label.cyan().bold()
        };
        println!("  {} {}", label, format!("({} phrases)", phrases.len()).dimmed());

        for phrase in phrases.iter().take(MEMBERS_SHOWN) {
            println!("    - {}", phrase);
        }
        if phrases.len() > MEMBERS_SHOWN {
            println!(
                "    {}",
                format!("... and {} more", phrases.len() - MEMBERS_SHOWN).dimmed()
            );
        }
    }
    println!();
}

/// Display what the cleaning stages removed, then the clusters.
pub fn display_outcome(outcome: &PipelineOutcome) {
    if !outcome.duplicates.is_empty() {
        println!(
            "  {} {} duplicate phrases removed",
            "~".yellow(),
            outcome.duplicates.len()
        );
    }
    if !outcome.trash.is_empty() {
        println!(
            "  {} {} phrases removed by trash words",
            "!".bright_red(),
            outcome.trash.len()
        );
    }
    display_clusters(&outcome.clusters);
}

/// Print one progress message as it is drained from the pipeline.
pub fn display_progress(message: &str) {
    println!("{} {}", "›".dimmed(), message);
}
