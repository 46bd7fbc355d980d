use clap::{Parser, Subcommand};
use ran_log_triage::{
    config::Config,
    ml::{FeatureExtractor, ModelTrainer, ScoringEngine},
    models::{FeatureMap, LogEvent},
    store::ArtifactStore,
};
use serde_json::json;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "ran-log-triage")]
#[command(about = "Anomaly triage for protocol-stack event logs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train a model and publish it as the active artifact
    Train {
        /// Historical feature table (JSON); synthetic fallback when omitted
        #[arg(short, long)]
        data: Option<PathBuf>,

        /// Override the configured model directory
        #[arg(long)]
        model_dir: Option<PathBuf>,

        /// Override the configured active-model path
        #[arg(long)]
        active_path: Option<PathBuf>,

        /// Override the configured model name
        #[arg(long)]
        name: Option<String>,
    },

    /// Score a log against the active model
    Score {
        /// JSON file with an array of {level, code, message} events
        #[arg(short, long, conflicts_with = "features")]
        events: Option<PathBuf>,

        /// JSON file with a feature-name -> number map (pre-extracted)
        #[arg(short, long)]
        features: Option<PathBuf>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load().unwrap_or_else(|e| {
        eprintln!("Failed to load configuration: {}", e);
        eprintln!("Using default configuration");
        default_config()
    });

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new(&config.observability.log_level)
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Train {
            data,
            model_dir,
            active_path,
            name,
        } => {
            let mut artifacts = config.artifacts.clone();
            if let Some(dir) = model_dir {
                artifacts.model_dir = dir;
            }
            if let Some(path) = active_path {
                artifacts.active_model_path = path;
            }
            if let Some(name) = name {
                artifacts.model_name = name;
            }

            tracing::info!("🚀 Starting training run");

            let trainer = ModelTrainer::new(config.trainer.clone());
            let model = trainer.train_from_source(data.as_deref())?;

            let store = ArtifactStore::from_config(&artifacts);
            let saved = store.save(&model)?;

            tracing::info!(version = %saved.version, "✅ Training run complete");

            println!(
                "{}",
                json!({
                    "artifact": saved.bundle_path,
                    "version": saved.version,
                })
            );
        }

        Commands::Score { events, features } => {
            let feature_map: FeatureMap = match (events, features) {
                (Some(path), _) => {
                    let raw = std::fs::read_to_string(&path)?;
                    let events: Vec<LogEvent> = serde_json::from_str(&raw)?;
                    FeatureExtractor::extract(&events)
                }
                (None, Some(path)) => {
                    let raw = std::fs::read_to_string(&path)?;
                    serde_json::from_str(&raw)?
                }
                (None, None) => {
                    return Err("score requires --events or --features".into());
                }
            };

            let store = ArtifactStore::from_config(&config.artifacts);
            let engine = ScoringEngine::new(store, config.scoring);

            let report = engine.triage(&feature_map)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}

fn default_config() -> Config {
    Config {
        artifacts: ran_log_triage::config::ArtifactConfig::default(),
        trainer: ran_log_triage::config::TrainerConfig::default(),
        scoring: ran_log_triage::config::ScoringConfig::default(),
        observability: ran_log_triage::config::ObservabilityConfig::default(),
    }
}
