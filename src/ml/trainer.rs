use crate::config::TrainerConfig;
use crate::error::{AppError, Result};
use crate::ml::forest::IsolationForest;
use crate::models::{feature_names, FeatureSchema};
use ndarray::Array2;
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

/// A trained ensemble together with the feature order it expects.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainedModel {
    pub forest: IsolationForest,

    /// Column order of the training table; position i of every scoring
    /// vector corresponds to schema[i] for the lifetime of this model.
    pub schema: FeatureSchema,
}

/// Rectangular table of historical feature vectors.
///
/// The wire format is JSON `{"columns": [...], "rows": [[...], ...]}`;
/// column order is significant, it becomes the model schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<f64>>,
}

impl TrainingTable {
    /// Load and validate a table from a JSON file. Any read, parse, or shape
    /// problem is a `DataLoad` error; the caller never falls back silently.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|e| {
            AppError::DataLoad(format!("cannot read {}: {}", path.display(), e))
        })?;
        let table: TrainingTable = serde_json::from_str(&raw).map_err(|e| {
            AppError::DataLoad(format!("cannot parse {}: {}", path.display(), e))
        })?;
        table.validate()?;
        Ok(table)
    }

    /// Deterministic fallback dataset: a tight "normal" population plus a
    /// smaller, higher-variance "anomalous" population (8% of rows, matching
    /// the default contamination).
    pub fn synthetic(seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut rows = Vec::with_capacity(200);

        // Healthy attach/session logs: few events, rarely a single error.
        for _ in 0..184 {
            rows.push(vec![
                rng.gen_range(6..=18) as f64,
                rng.gen_range(0..=1) as f64,
                rng.gen_range(0..=2) as f64,
                0.0,
                0.0,
                0.0,
            ]);
        }

        // Degraded sessions: long logs, error bursts, failure flags raised.
        for _ in 0..16 {
            rows.push(vec![
                rng.gen_range(20..=60) as f64,
                rng.gen_range(6..=15) as f64,
                rng.gen_range(2..=8) as f64,
                if rng.gen_bool(0.6) { 1.0 } else { 0.0 },
                if rng.gen_bool(0.5) { 1.0 } else { 0.0 },
                if rng.gen_bool(0.4) { 1.0 } else { 0.0 },
            ]);
        }

        Self {
            columns: feature_names::NUMERIC.iter().map(|s| s.to_string()).collect(),
            rows,
        }
    }

    /// Check the table is rectangular, non-empty, and numeric.
    pub fn validate(&self) -> Result<()> {
        if self.columns.is_empty() {
            return Err(AppError::DataLoad("table has no columns".to_string()));
        }
        if self.rows.is_empty() {
            return Err(AppError::DataLoad("table has no rows".to_string()));
        }

        for (i, row) in self.rows.iter().enumerate() {
            if row.len() != self.columns.len() {
                return Err(AppError::DataLoad(format!(
                    "row {} has {} values, expected {}",
                    i,
                    row.len(),
                    self.columns.len()
                )));
            }
            if let Some(v) = row.iter().find(|v| !v.is_finite()) {
                return Err(AppError::DataLoad(format!(
                    "row {} contains a non-finite value: {}",
                    i, v
                )));
            }
        }

        Ok(())
    }

    /// Dense matrix view of the rows (samples x features).
    pub fn to_matrix(&self) -> Result<Array2<f64>> {
        let flat: Vec<f64> = self.rows.iter().flatten().copied().collect();
        Array2::from_shape_vec((self.rows.len(), self.columns.len()), flat)
            .map_err(|e| AppError::Internal(format!("table shape mismatch: {}", e)))
    }
}

/// Offline batch trainer. Runs synchronously to completion.
pub struct ModelTrainer {
    config: TrainerConfig,
}

impl ModelTrainer {
    pub fn new(config: TrainerConfig) -> Self {
        Self { config }
    }

    /// Fit the ensemble on a validated table. The table's column order
    /// becomes the model schema.
    pub fn train(&self, table: &TrainingTable) -> Result<TrainedModel> {
        table.validate()?;

        info!(
            rows = table.rows.len(),
            features = table.columns.len(),
            n_trees = self.config.n_trees,
            "Training isolation ensemble"
        );

        let matrix = table.to_matrix()?;
        let forest = IsolationForest::fit(&self.config, &matrix)?;

        Ok(TrainedModel {
            forest,
            schema: table.columns.clone(),
        })
    }

    /// Train from an optional historical data source. The synthetic fallback
    /// is used only when no source is supplied at all; a supplied source
    /// that fails to load is terminal for the run.
    pub fn train_from_source(&self, source: Option<&Path>) -> Result<TrainedModel> {
        let table = match source {
            Some(path) => {
                info!(path = %path.display(), "Loading historical feature table");
                TrainingTable::from_json_file(path)?
            }
            None => {
                info!("No training data supplied, generating synthetic baseline");
                TrainingTable::synthetic(self.config.seed)
            }
        };

        self.train(&table)
    }
}
