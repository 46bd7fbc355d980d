use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Artifact storage configuration
    pub artifacts: ArtifactConfig,

    /// Trainer configuration
    #[serde(default)]
    pub trainer: TrainerConfig,

    /// Scoring configuration
    #[serde(default)]
    pub scoring: ScoringConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Config {
    /// Load configuration from file and environment
    pub fn load() -> Result<Self, config::ConfigError> {
        let config_path =
            std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config/default.toml".to_string());

        config::Config::builder()
            // Start with compiled-in default values
            .add_source(config::File::from_str(
                include_str!("../config/default.toml"),
                config::FileFormat::Toml,
            ))
            // Override with config file if it exists
            .add_source(config::File::with_name(&config_path).required(false))
            // Override with environment variables (prefix: RAN_TRIAGE)
            .add_source(
                config::Environment::with_prefix("RAN_TRIAGE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}

/// Where model bundles live; all paths are injected, never derived globally.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactConfig {
    /// Directory receiving versioned model bundles and metadata
    #[serde(default = "default_model_dir")]
    pub model_dir: PathBuf,

    /// Path of the mutable active-model bundle
    #[serde(default = "default_active_model_path")]
    pub active_model_path: PathBuf,

    /// Logical model name used in bundle file names and metadata
    #[serde(default = "default_model_name")]
    pub model_name: String,
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self {
            model_dir: default_model_dir(),
            active_model_path: default_active_model_path(),
            model_name: default_model_name(),
        }
    }
}

/// Ensemble hyperparameters. The defaults are fixed design parameters carried
/// from the calibrated deployment, not values to re-derive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainerConfig {
    /// Number of isolation trees in the ensemble
    #[serde(default = "default_n_trees")]
    pub n_trees: usize,

    /// Expected fraction of anomalous rows in the training data
    #[serde(default = "default_contamination")]
    pub contamination: f64,

    /// Seed for subsampling and split selection
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Per-tree subsample cap
    #[serde(default = "default_sample_size")]
    pub sample_size: usize,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            n_trees: default_n_trees(),
            contamination: default_contamination(),
            seed: default_seed(),
            sample_size: default_sample_size(),
        }
    }
}

/// Confidence calibration: an affine rescale of the anomaly score.
/// `confidence = clamp((score - floor) / span, 0, 1)`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Anomaly score at or below which confidence is 0
    #[serde(default = "default_confidence_floor")]
    pub confidence_floor: f64,

    /// Score span over which confidence rises linearly to 1
    #[serde(default = "default_confidence_span")]
    pub confidence_span: f64,
}

impl ScoringConfig {
    /// Map an anomaly score to a confidence in [0, 1].
    pub fn confidence(&self, anomaly_score: f64) -> f64 {
        ((anomaly_score - self.confidence_floor) / self.confidence_span).clamp(0.0, 1.0)
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            confidence_floor: default_confidence_floor(),
            confidence_span: default_confidence_span(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Default tracing filter when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_model_dir() -> PathBuf {
    PathBuf::from("./data/models")
}

fn default_active_model_path() -> PathBuf {
    PathBuf::from("./data/models/active.model")
}

fn default_model_name() -> String {
    "ran_anomaly".to_string()
}

fn default_n_trees() -> usize {
    200
}

fn default_contamination() -> f64 {
    0.08
}

fn default_seed() -> u64 {
    42
}

fn default_sample_size() -> usize {
    256
}

fn default_confidence_floor() -> f64 {
    0.1
}

fn default_confidence_span() -> f64 {
    0.5
}

fn default_log_level() -> String {
    "ran_log_triage=info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trainer_defaults() {
        let config = TrainerConfig::default();
        assert_eq!(config.n_trees, 200);
        assert_eq!(config.contamination, 0.08);
        assert_eq!(config.seed, 42);
        assert_eq!(config.sample_size, 256);
    }

    #[test]
    fn test_confidence_calibration_boundaries() {
        let scoring = ScoringConfig::default();

        assert_eq!(scoring.confidence(0.1), 0.0);
        assert_eq!(scoring.confidence(0.6), 1.0);
        assert_eq!(scoring.confidence(2.0), 1.0);
        assert_eq!(scoring.confidence(-1.0), 0.0);
        assert!((scoring.confidence(0.35) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_embedded_defaults_deserialize() {
        let config: Config = config::Config::builder()
            .add_source(config::File::from_str(
                include_str!("../config/default.toml"),
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.artifacts.model_name, "ran_anomaly");
        assert_eq!(config.trainer.n_trees, 200);
        assert_eq!(config.scoring.confidence_floor, 0.1);
    }
}
