use crate::config::ScoringConfig;
use crate::error::Result;
use crate::ml::recommend::RecommendationEngine;
use crate::models::{AnomalyVerdict, FeatureMap, TriageReport};
use crate::store::{ArtifactStore, ModelArtifact};
use once_cell::sync::OnceCell;
use std::sync::Arc;
use tracing::{debug, info};

/// Owns the optional loaded artifact behind an acquire-once guard: storage is
/// read exactly once per process lifetime, and concurrent first callers are
/// serialized through the cell. The loaded bundle is immutable and shared
/// read-only afterwards.
pub struct ModelRegistry {
    store: ArtifactStore,
    loaded: OnceCell<Arc<ModelArtifact>>,
}

impl ModelRegistry {
    pub fn new(store: ArtifactStore) -> Self {
        Self {
            store,
            loaded: OnceCell::new(),
        }
    }

    /// The resident artifact, loading it on first call.
    pub fn get(&self) -> Result<Arc<ModelArtifact>> {
        self.loaded
            .get_or_try_init(|| {
                info!(
                    path = %self.store.active_path().display(),
                    "Loading active model artifact"
                );
                self.store.load_active().map(Arc::new)
            })
            .cloned()
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.get().is_some()
    }
}

/// Online scoring path: vectorize an incoming feature map against the
/// resident model's schema and compute the anomaly verdict.
pub struct ScoringEngine {
    registry: ModelRegistry,
    calibration: ScoringConfig,
}

impl ScoringEngine {
    pub fn new(store: ArtifactStore, calibration: ScoringConfig) -> Self {
        Self {
            registry: ModelRegistry::new(store),
            calibration,
        }
    }

    /// Score a feature map against the active model.
    pub fn score(&self, features: &FeatureMap) -> Result<AnomalyVerdict> {
        let artifact = self.registry.get()?;
        let verdict = score_artifact(&artifact, &self.calibration, features);

        debug!(
            is_anomaly = verdict.is_anomaly,
            anomaly_score = verdict.anomaly_score,
            confidence = verdict.confidence,
            "Scored feature map"
        );

        Ok(verdict)
    }

    /// Score plus recommendations in one call.
    pub fn triage(&self, features: &FeatureMap) -> Result<TriageReport> {
        Ok(TriageReport {
            verdict: self.score(features)?,
            recommendations: RecommendationEngine::recommend(features),
        })
    }
}

/// Verdict for a feature map against a specific artifact. Shared by the
/// engine and the offline save/load equivalence checks.
pub fn score_artifact(
    artifact: &ModelArtifact,
    calibration: &ScoringConfig,
    features: &FeatureMap,
) -> AnomalyVerdict {
    let vector = vectorize(&artifact.schema, features);
    let decision = artifact.forest.decision_function(&vector);

    let anomaly_score = -decision;
    AnomalyVerdict {
        is_anomaly: decision < 0.0,
        anomaly_score,
        confidence: calibration.confidence(anomaly_score),
    }
}

/// Dense vector in schema order. Missing or non-numeric keys default to 0.0;
/// keys outside the schema are ignored.
pub fn vectorize(schema: &[String], features: &FeatureMap) -> Vec<f64> {
    schema
        .iter()
        .map(|name| features.number(name).unwrap_or(0.0))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TrainerConfig;
    use crate::ml::trainer::{ModelTrainer, TrainingTable};
    use crate::models::feature_names;
    use std::fs;

    fn saved_store(dir: &std::path::Path) -> ArtifactStore {
        let store = ArtifactStore::new(
            dir.join("models"),
            dir.join("models/active.model"),
            "ran_anomaly",
        );
        let trainer = ModelTrainer::new(TrainerConfig::default());
        let model = trainer.train(&TrainingTable::synthetic(42)).unwrap();
        store.save(&model).unwrap();
        store
    }

    fn normal_features() -> FeatureMap {
        let mut features = FeatureMap::new();
        features.insert(feature_names::NUM_EVENTS, 10.0);
        features.insert(feature_names::NUM_ERRORS, 0.0);
        features.insert(feature_names::NUM_WARNINGS, 1.0);
        features.insert(feature_names::HAS_AUTH_FAILURE, 0.0);
        features.insert(feature_names::HAS_TIMER_TIMEOUT, 0.0);
        features.insert(feature_names::HAS_RRC_RECONFIG, 0.0);
        features
    }

    #[test]
    fn test_vectorize_follows_schema_order() {
        let schema = vec!["b".to_string(), "a".to_string()];
        let mut features = FeatureMap::new();
        features.insert("a", 1.0);
        features.insert("b", 2.0);
        features.insert("ignored", 9.0);

        assert_eq!(vectorize(&schema, &features), vec![2.0, 1.0]);
    }

    #[test]
    fn test_missing_keys_substitute_zero() {
        let dir = tempfile::tempdir().unwrap();
        let engine = ScoringEngine::new(saved_store(dir.path()), ScoringConfig::default());

        // Only two of six schema keys present.
        let mut sparse = FeatureMap::new();
        sparse.insert(feature_names::NUM_EVENTS, 10.0);
        sparse.insert(feature_names::NUM_WARNINGS, 1.0);

        // Same call with the remaining keys explicitly zero.
        let mut explicit = sparse.clone();
        explicit.insert(feature_names::NUM_ERRORS, 0.0);
        explicit.insert(feature_names::HAS_AUTH_FAILURE, 0.0);
        explicit.insert(feature_names::HAS_TIMER_TIMEOUT, 0.0);
        explicit.insert(feature_names::HAS_RRC_RECONFIG, 0.0);

        assert_eq!(
            engine.score(&sparse).unwrap(),
            engine.score(&explicit).unwrap()
        );
    }

    #[test]
    fn test_non_numeric_values_are_treated_as_absent() {
        let schema = vec![feature_names::NUM_ERRORS.to_string()];
        let mut features = FeatureMap::new();
        features.insert(feature_names::NUM_ERRORS, "three");

        assert_eq!(vectorize(&schema, &features), vec![0.0]);
    }

    #[test]
    fn test_registry_loads_exactly_once() {
        let dir = tempfile::tempdir().unwrap();
        let registry = ModelRegistry::new(saved_store(dir.path()));

        assert!(!registry.is_loaded());
        let first = registry.get().unwrap();
        assert!(registry.is_loaded());

        // Subsequent calls hand out the same resident artifact.
        let second = registry.get().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_scoring_without_artifact_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(
            dir.path().join("models"),
            dir.path().join("models/active.model"),
            "ran_anomaly",
        );
        let engine = ScoringEngine::new(store, ScoringConfig::default());

        let err = engine.score(&normal_features()).unwrap_err();
        assert!(matches!(err, crate::error::AppError::ArtifactNotFound(_)));
    }

    #[test]
    fn test_artifact_stays_resident_after_first_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = saved_store(dir.path());
        let active = store.active_path().to_path_buf();
        let engine = ScoringEngine::new(store, ScoringConfig::default());

        let first = engine.score(&normal_features()).unwrap();

        // Removing the bundle after the first call must not affect serving.
        fs::remove_file(&active).unwrap();
        let second = engine.score(&normal_features()).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_verdict_is_internally_consistent() {
        let dir = tempfile::tempdir().unwrap();
        let engine = ScoringEngine::new(saved_store(dir.path()), ScoringConfig::default());

        let mut anomalous = FeatureMap::new();
        anomalous.insert(feature_names::NUM_EVENTS, 55.0);
        anomalous.insert(feature_names::NUM_ERRORS, 14.0);
        anomalous.insert(feature_names::NUM_WARNINGS, 7.0);
        anomalous.insert(feature_names::HAS_AUTH_FAILURE, 1.0);
        anomalous.insert(feature_names::HAS_TIMER_TIMEOUT, 1.0);
        anomalous.insert(feature_names::HAS_RRC_RECONFIG, 1.0);

        let verdict = engine.score(&anomalous).unwrap();
        assert_eq!(verdict.is_anomaly, verdict.anomaly_score > 0.0);
        assert!((0.0..=1.0).contains(&verdict.confidence));
    }

    #[test]
    fn test_triage_attaches_recommendations() {
        let dir = tempfile::tempdir().unwrap();
        let engine = ScoringEngine::new(saved_store(dir.path()), ScoringConfig::default());

        let mut features = normal_features();
        features.insert(feature_names::HAS_AUTH_FAILURE, 1.0);
        features.insert(feature_names::NUM_ERRORS, 6.0);

        let report = engine.triage(&features).unwrap();
        assert_eq!(report.recommendations.len(), 2);
    }
}
