/// Anomaly-detection pipeline
///
/// This module provides the triage core:
/// - Deterministic feature extraction from protocol-stack events
/// - Isolation-forest training over historical feature tables
/// - Online scoring against the active model artifact
/// - Rule-based diagnostic recommendations
pub mod features;
pub mod forest;
pub mod recommend;
pub mod scoring;
pub mod trainer;

pub use features::FeatureExtractor;
pub use forest::IsolationForest;
pub use recommend::RecommendationEngine;
pub use scoring::{score_artifact, vectorize, ModelRegistry, ScoringEngine};
pub use trainer::{ModelTrainer, TrainedModel, TrainingTable};
