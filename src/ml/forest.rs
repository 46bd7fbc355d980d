use crate::config::TrainerConfig;
use crate::error::{AppError, Result};
use ndarray::Array2;
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Isolation forest anomaly ensemble (Liu et al. 2008).
///
/// Scoring follows the usual two-level convention: `score_samples` is the
/// negated depth score (larger = more normal), and the decision function
/// subtracts an offset fixed at fit time so that the expected anomaly
/// fraction of the training data lands below zero. A sample is an outlier
/// iff its decision value is negative.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IsolationForest {
    trees: Vec<IsolationTree>,

    /// Subsample size actually used per tree
    subsample_size: usize,

    /// Number of features the ensemble was fitted on
    n_features: usize,

    /// Contamination quantile of the training `score_samples`
    offset: f64,
}

impl IsolationForest {
    /// Fit an ensemble on a feature matrix (rows = samples, columns =
    /// features). Deterministic for a fixed config and input.
    pub fn fit(config: &TrainerConfig, data: &Array2<f64>) -> Result<Self> {
        let n_samples = data.nrows();
        let n_features = data.ncols();

        if n_samples == 0 || n_features == 0 {
            return Err(AppError::Internal(
                "cannot fit isolation forest on an empty matrix".to_string(),
            ));
        }
        if config.n_trees == 0 {
            return Err(AppError::Internal(
                "isolation forest needs at least one tree".to_string(),
            ));
        }
        if !(0.0..=0.5).contains(&config.contamination) || config.contamination == 0.0 {
            return Err(AppError::Internal(format!(
                "contamination must be in (0, 0.5], got {}",
                config.contamination
            )));
        }

        let subsample_size = config.sample_size.clamp(1, n_samples);
        let max_depth = ((subsample_size as f64).log2().ceil() as usize).max(1);
        let mut rng = StdRng::seed_from_u64(config.seed);

        let mut trees = Vec::with_capacity(config.n_trees);
        for _ in 0..config.n_trees {
            let indices: Vec<usize> = (0..subsample_size)
                .map(|_| rng.gen_range(0..n_samples))
                .collect();
            trees.push(IsolationTree::build(data, &indices, 0, max_depth, &mut rng));
        }

        let mut forest = Self {
            trees,
            subsample_size,
            n_features,
            offset: 0.0,
        };

        // Fix the decision threshold at the contamination quantile of the
        // training scores.
        let mut training_scores: Vec<f64> = (0..n_samples)
            .map(|i| {
                let row: Vec<f64> = data.row(i).to_vec();
                forest.score_samples(&row)
            })
            .collect();
        training_scores.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        forest.offset = percentile(&training_scores, 100.0 * config.contamination);

        Ok(forest)
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Depth-based anomaly score in (0, 1]; higher = more anomalous.
    fn depth_score(&self, point: &[f64]) -> f64 {
        let c_n = average_path_length(self.subsample_size as f64);
        if c_n <= 0.0 {
            return 1.0;
        }

        let mean_path: f64 = self
            .trees
            .iter()
            .map(|tree| tree.path_length(point, 0.0))
            .sum::<f64>()
            / self.trees.len() as f64;

        2.0_f64.powf(-mean_path / c_n)
    }

    /// Negated depth score; larger = more normal.
    pub fn score_samples(&self, point: &[f64]) -> f64 {
        -self.depth_score(point)
    }

    /// Continuous decision value; negative = outlier.
    pub fn decision_function(&self, point: &[f64]) -> f64 {
        self.score_samples(point) - self.offset
    }

    /// Binary outlier label.
    pub fn is_outlier(&self, point: &[f64]) -> bool {
        self.decision_function(point) < 0.0
    }
}

/// A single isolation tree node.
#[derive(Debug, Clone, Serialize, Deserialize)]
enum IsolationTree {
    Split {
        feature: usize,
        threshold: f64,
        left: Box<IsolationTree>,
        right: Box<IsolationTree>,
    },
    Leaf {
        size: usize,
    },
}

impl IsolationTree {
    fn build(
        data: &Array2<f64>,
        indices: &[usize],
        depth: usize,
        max_depth: usize,
        rng: &mut StdRng,
    ) -> Self {
        if indices.len() <= 1 || depth >= max_depth {
            return IsolationTree::Leaf {
                size: indices.len(),
            };
        }

        let feature = rng.gen_range(0..data.ncols());

        let mut min_val = f64::INFINITY;
        let mut max_val = f64::NEG_INFINITY;
        for &i in indices {
            let v = data[[i, feature]];
            min_val = min_val.min(v);
            max_val = max_val.max(v);
        }

        if (max_val - min_val).abs() < f64::EPSILON {
            return IsolationTree::Leaf {
                size: indices.len(),
            };
        }

        let threshold = rng.gen_range(min_val..max_val);

        let (left, right): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .copied()
            .partition(|&i| data[[i, feature]] < threshold);

        if left.is_empty() || right.is_empty() {
            return IsolationTree::Leaf {
                size: indices.len(),
            };
        }

        IsolationTree::Split {
            feature,
            threshold,
            left: Box::new(Self::build(data, &left, depth + 1, max_depth, rng)),
            right: Box::new(Self::build(data, &right, depth + 1, max_depth, rng)),
        }
    }

    fn path_length(&self, point: &[f64], depth: f64) -> f64 {
        match self {
            IsolationTree::Leaf { size } => depth + average_path_length(*size as f64),
            IsolationTree::Split {
                feature,
                threshold,
                left,
                right,
            } => {
                let value = point.get(*feature).copied().unwrap_or(0.0);
                if value < *threshold {
                    left.path_length(point, depth + 1.0)
                } else {
                    right.path_length(point, depth + 1.0)
                }
            }
        }
    }
}

/// Average path length of an unsuccessful BST search over n nodes.
fn average_path_length(n: f64) -> f64 {
    if n <= 1.0 {
        return 0.0;
    }
    2.0 * (n.ln() + 0.5772156649) - (2.0 * (n - 1.0) / n)
}

/// Linear-interpolation percentile over sorted data.
fn percentile(sorted_data: &[f64], percentile: f64) -> f64 {
    if sorted_data.is_empty() {
        return 0.0;
    }

    let index = (percentile / 100.0) * (sorted_data.len() - 1) as f64;
    let lower = index.floor() as usize;
    let upper = index.ceil() as usize;

    if lower == upper {
        sorted_data[lower]
    } else {
        let weight = index - lower as f64;
        sorted_data[lower] * (1.0 - weight) + sorted_data[upper] * weight
    }
}
