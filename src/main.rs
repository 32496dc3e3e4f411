use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::{info, warn};

use kwcluster::config::{
    split_list, Config, PhraseSource, PipelineConfig, DEFAULT_MAX_CLUSTERS, DEFAULT_MIN_CLUSTERS,
};
use kwcluster::embeddings::hashing::HashingEmbedder;
use kwcluster::embeddings::onnx::SentenceEmbedder;
use kwcluster::embeddings::traits::PhraseEmbedder;
use kwcluster::ner::gazetteer::Gazetteer;
use kwcluster::ner::onnx::OnnxEntityRecognizer;
use kwcluster::ner::traits::EntityRecognizer;
use kwcluster::pipeline::{spawn_pipeline, Pipeline};

/// Entity categories allowed by default.
const DEFAULT_ENTITY_LABELS: &str =
    "EVENT,FAC,GPE,LANGUAGE,LOC,MONEY,ORG,PERSON,PRODUCT,QUANTITY,WORK_OF_ART";

/// kwcluster: group keyword phrases into named clusters.
///
/// Removes duplicates and unwanted phrases, then clusters what is left by
/// named entities, by your own keys, and finally by meaning.
#[derive(Parser)]
#[command(name = "kwcluster", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the clustering pipeline
    Cluster {
        /// CSV file with phrases in the first column (header row skipped)
        #[arg(long, conflicts_with = "phrases", required_unless_present = "phrases")]
        input: Option<PathBuf>,

        /// Plain text file with one phrase per line
        #[arg(long)]
        phrases: Option<PathBuf>,

        /// Comma-separated substrings; phrases containing any are dropped
        #[arg(long, default_value = "")]
        trash: String,

        /// Comma-separated entities that must not seed a cluster
        #[arg(long, default_value = "")]
        stop_entities: String,

        /// Comma-separated keys; each becomes a cluster of matching phrases
        #[arg(long, default_value = "")]
        keys: String,

        /// Comma-separated entity labels allowed to seed clusters
        #[arg(long, default_value = DEFAULT_ENTITY_LABELS)]
        entities: String,

        /// Tab-separated `text<TAB>LABEL` dictionary used instead of the NER model
        #[arg(long)]
        gazetteer: Option<PathBuf>,

        /// Smallest cluster count tried by K-means
        #[arg(long, default_value_t = DEFAULT_MIN_CLUSTERS)]
        min_clusters: usize,

        /// Largest cluster count tried by K-means
        #[arg(long, default_value_t = DEFAULT_MAX_CLUSTERS)]
        max_clusters: usize,

        /// Fixed K-means seed for reproducible runs
        #[arg(long)]
        seed: Option<u64>,

        /// Save the clusters to a .txt, .csv or .json file
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Download the ONNX embedding and NER models (~520 MB)
    DownloadModel,

    /// Show installed models and settings
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    // Set up structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("kwcluster=info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Cluster {
            input,
            phrases,
            trash,
            stop_entities,
            keys,
            entities,
            gazetteer,
            min_clusters,
            max_clusters,
            seed,
            output,
        } => {
            let config = Config::load()?;

            let source = match (input, phrases) {
                (Some(path), _) => PhraseSource::File(path),
                (None, Some(path)) => PhraseSource::TextFile(path),
                (None, None) => anyhow::bail!("Pass --input <csv> or --phrases <txt>"),
            };

            // Validate before loading any model
            let pipeline_config = PipelineConfig::new(
                source,
                split_list(&trash),
                &split_list(&entities),
                split_list(&stop_entities),
                split_list(&keys),
                min_clusters,
                max_clusters,
                seed.or(config.seed),
            )?;

            let recognizer = load_recognizer(&config, gazetteer.as_deref())?;
            let embedder = load_embedder(&config);

            let mut pipeline = Pipeline::new(pipeline_config, embedder);
            if let Some(recognizer) = recognizer {
                pipeline = pipeline.with_recognizer(recognizer);
            }

            let handle = spawn_pipeline(pipeline);
            let outcome = handle
                .wait(Duration::from_millis(config.poll_ms), |message| {
                    kwcluster::output::terminal::display_progress(&message)
                })
                .await?;

            kwcluster::output::terminal::display_outcome(&outcome);

            if let Some(path) = output {
                if outcome.clusters.is_empty() {
                    println!("No clusters to save.");
                } else {
                    kwcluster::output::export::save(&outcome.clusters, &path)?;
                    println!("Clusters saved to: {}", path.display().to_string().bold());
                }
            }
        }

        Commands::DownloadModel => {
            let config = Config::load()?;
            let model_dir = &config.model_dir;

            println!("Downloading ONNX models...");
            println!("  Destination: {}", model_dir.display());

            kwcluster::models::download_model(model_dir).await?;

            println!("\n{}", "Models downloaded successfully.".bold());
            println!("You can now run `kwcluster cluster --input phrases.csv`.");
        }

        Commands::Status => {
            let config = Config::load()?;
            kwcluster::status::show(&config)?;
        }
    }

    Ok(())
}

/// Gazetteer if one was given, else the ONNX NER model if installed.
fn load_recognizer(
    config: &Config,
    gazetteer: Option<&std::path::Path>,
) -> Result<Option<Arc<dyn EntityRecognizer>>> {
    if let Some(path) = gazetteer {
        let g = Gazetteer::from_file(path)?;
        info!(entries = g.len(), "Using gazetteer entity recognizer");
        return Ok(Some(Arc::new(g)));
    }

    if !kwcluster::models::ner_files_present(&config.model_dir) {
        info!("NER model not installed, entity clustering needs --gazetteer");
        return Ok(None);
    }

    let ner_dir = kwcluster::models::ner_model_dir(&config.model_dir);
    match OnnxEntityRecognizer::load(&ner_dir) {
        Ok(r) => Ok(Some(Arc::new(r))),
        Err(e) => {
            warn!(error = %e, "Failed to load NER model, skipping entity clustering");
            Ok(None)
        }
    }
}

/// ONNX sentence embedder if installed, else word hashing.
fn load_embedder(config: &Config) -> Arc<dyn PhraseEmbedder> {
    if kwcluster::models::embedding_files_present(&config.model_dir) {
        let embed_dir = kwcluster::models::embedding_model_dir(&config.model_dir);
        match SentenceEmbedder::load(&embed_dir) {
            Ok(e) => return Arc::new(e),
            Err(e) => warn!(error = %e, "Failed to load embedding model"),
        }
    } else {
        warn!("Embedding model not installed. Run `kwcluster download-model` for better clusters");
    }
    warn!("Falling back to word-hashing embeddings");
    Arc::new(HashingEmbedder::default())
}
