// Composition tests: the full pipeline from raw phrases to cluster map.
//
// These exercise the data flow across stages:
//   load -> duplicates -> trash -> entities -> keys -> K-means -> export
// with the gazetteer recognizer and hashing embedder, so no model files or
// network calls are involved. Export tests write into temp directories.

use std::collections::HashSet;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use kwcluster::clustering::cluster_map::ClusterMap;
use kwcluster::config::{split_list, PhraseSource, PipelineConfig};
use kwcluster::embeddings::hashing::HashingEmbedder;
use kwcluster::ner::gazetteer::Gazetteer;
use kwcluster::output::export;
use kwcluster::pipeline::{spawn_pipeline, Pipeline, ProgressLog};

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn gazetteer() -> Arc<Gazetteer> {
    Arc::new(
        Gazetteer::new([
            ("Paris", "GPE"),
            ("Rome", "GPE"),
            ("Nike", "ORG"),
            ("Adidas", "ORG"),
        ])
        .unwrap(),
    )
}

fn config(
    lines: &[&str],
    trash: &str,
    stop_entities: &str,
    keys: &str,
    labels: &str,
    bounds: (usize, usize),
) -> PipelineConfig {
    PipelineConfig::new(
        PhraseSource::Lines(strings(lines)),
        split_list(trash),
        &split_list(labels),
        split_list(stop_entities),
        split_list(keys),
        bounds.0,
        bounds.1,
        Some(7),
    )
    .unwrap()
}

fn pipeline(config: PipelineConfig) -> Pipeline {
    Pipeline::new(config, Arc::new(HashingEmbedder::default())).with_recognizer(gazetteer())
}

fn all_members(clusters: &ClusterMap) -> HashSet<String> {
    clusters.members().into_iter().map(String::from).collect()
}

// ============================================================
// End-to-end scenarios
// ============================================================

#[test]
fn stop_entity_keeps_phrase_out_of_entity_clusters() {
    let cfg = config(
        &["buy cheap shoes", "buy cheap shoes", "visit Paris"],
        "",
        "paris",
        "",
        "GPE,LOC",
        (1, 2),
    );
    let outcome = pipeline(cfg).run();

    assert_eq!(outcome.duplicates, strings(&["buy cheap shoes"]));
    assert!(!outcome.clusters.contains_key("Paris"));
    // Still clustered, just by K-means instead
    assert!(all_members(&outcome.clusters).contains("visit Paris"));
}

#[test]
fn stages_compose_and_cover_every_surviving_phrase() {
    let lines = [
        "hotels Paris",
        "flights Paris",
        "Paris hotels",
        "Nike running shoes",
        "Nike air max",
        "apple pie recipe",
        "apple crumble",
        "free porn",
        "guitar lessons",
        "guitar chords",
        "pizza delivery",
        "pizza near",
    ];
    let cfg = config(&lines, "porn", "london", "apple", "GPE,ORG", (2, 4));
    let outcome = pipeline(cfg).run();

    assert_eq!(outcome.duplicates, strings(&["Paris hotels"]));
    assert_eq!(outcome.trash, strings(&["free porn"]));

    let names: Vec<&str> = outcome.clusters.names().collect();
    assert_eq!(&names[..3], &["Paris", "Nike", "apple"]);
    assert_eq!(
        outcome.clusters.get("Paris").unwrap(),
        ["hotels Paris", "flights Paris"]
    );
    assert_eq!(
        outcome.clusters.get("apple").unwrap(),
        ["apple pie recipe", "apple crumble"]
    );

    let surviving: HashSet<String> = lines
        .iter()
        .map(|s| s.to_string())
        .filter(|p| !outcome.duplicates.contains(p) && !outcome.trash.contains(p))
        .collect();
    assert_eq!(all_members(&outcome.clusters), surviving);
}

#[test]
fn seeded_runs_produce_same_clusters() {
    let lines = [
        "guitar lessons",
        "guitar chords",
        "pizza delivery",
        "pizza recipe",
        "running shoes",
        "trail running",
    ];
    let first = pipeline(config(&lines, "", "", "", "", (2, 4))).run();
    let second = pipeline(config(&lines, "", "", "", "", (2, 4))).run();

    let names = |m: &ClusterMap| m.names().map(String::from).collect::<Vec<_>>();
    assert_eq!(names(&first.clusters), names(&second.clusters));
    assert_eq!(first.clusters, second.clusters);
}

#[test]
fn empty_input_produces_empty_map() {
    let outcome = pipeline(config(&[], "x", "x", "x", "GPE", (5, 10))).run();
    assert!(outcome.clusters.is_empty());
    assert!(outcome.duplicates.is_empty());
    assert!(outcome.trash.is_empty());
}

#[test]
fn csv_source_feeds_pipeline() {
    let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    writeln!(file, "Keyword,Volume").unwrap();
    writeln!(file, "apple pie,10").unwrap();
    writeln!(file, ",3").unwrap();
    writeln!(file, "apple tart,5").unwrap();

    let cfg = PipelineConfig::new(
        PhraseSource::File(file.path().to_path_buf()),
        Vec::new(),
        &[],
        Vec::new(),
        strings(&["apple"]),
        1,
        2,
        None,
    )
    .unwrap();

    let (log, mut rx) = ProgressLog::channel();
    let outcome = pipeline(cfg).with_log(log).run();

    assert_eq!(rx.try_recv().unwrap(), "Loaded 2 phrases.");
    assert_eq!(
        outcome.clusters.get("apple").unwrap(),
        ["apple pie", "apple tart"]
    );
}

#[test]
fn missing_csv_runs_as_empty() {
    let cfg = PipelineConfig::new(
        PhraseSource::File("/no/such/dir/phrases.csv".into()),
        Vec::new(),
        &[],
        Vec::new(),
        Vec::new(),
        1,
        2,
        None,
    )
    .unwrap();
    let outcome = pipeline(cfg).run();
    assert!(outcome.clusters.is_empty());
}

#[test]
fn missing_text_file_runs_as_empty() {
    let cfg = PipelineConfig::new(
        PhraseSource::TextFile("/no/such/dir/phrases.txt".into()),
        Vec::new(),
        &[],
        Vec::new(),
        Vec::new(),
        1,
        2,
        None,
    )
    .unwrap();
    let (log, mut rx) = ProgressLog::channel();
    let outcome = pipeline(cfg).with_log(log).run();

    assert_eq!(rx.try_recv().unwrap(), "Loaded 0 phrases.");
    assert!(outcome.clusters.is_empty());
}

// ============================================================
// Background worker
// ============================================================

#[tokio::test]
async fn worker_streams_progress_in_stage_order() {
    let cfg = config(
        &["hotels Paris", "flights Paris", "guitar lessons", "pizza delivery"],
        "",
        "london",
        "",
        "GPE",
        (1, 2),
    );
    let handle = spawn_pipeline(pipeline(cfg));

    let mut messages = Vec::new();
    let outcome = handle
        .wait(Duration::from_millis(10), |m| messages.push(m))
        .await
        .unwrap();

    let position = |needle: &str| {
        messages
            .iter()
            .position(|m| m == needle)
            .unwrap_or_else(|| panic!("missing message: {needle}"))
    };
    assert!(position("Loaded 4 phrases.") < position("Removing duplicate phrases..."));
    assert!(
        position("Removing phrases with trash words...")
            < position("Clustering by named entities...")
    );
    assert!(position("Clustering by named entities...") < position("Adding user keys to clusters..."));
    assert!(position("Adding user keys to clusters...") < position("Clustering with K-means..."));

    assert_eq!(
        outcome.clusters.get("Paris").unwrap(),
        ["hotels Paris", "flights Paris"]
    );
}

// ============================================================
// Pipeline -> export
// ============================================================

#[test]
fn pipeline_result_exports_in_every_format() {
    let cfg = config(
        &["apple pie", "apple tart", "banana bread"],
        "",
        "",
        "apple,banana",
        "",
        (1, 1),
    );
    let outcome = pipeline(cfg).run();
    let dir = tempfile::tempdir().unwrap();

    let txt = dir.path().join("clusters.txt");
    export::save(&outcome.clusters, &txt).unwrap();
    let text = std::fs::read_to_string(&txt).unwrap();
    assert!(text.contains("apple (2 phrases):\n  - apple pie\n  - apple tart\n"));

    let csv = dir.path().join("clusters.csv");
    export::save(&outcome.clusters, &csv).unwrap();
    let rows = std::fs::read_to_string(&csv).unwrap();
    assert!(rows.starts_with("Group,Phrase\n"));
    assert!(rows.contains("banana,banana bread"));

    let json = dir.path().join("clusters.json");
    export::save(&outcome.clusters, &json).unwrap();
    let value: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&json).unwrap()).unwrap();
    assert_eq!(value["banana"][0], "banana bread");
}
