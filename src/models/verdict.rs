use serde::{Deserialize, Serialize};

/// Anomaly verdict for one scoring call. Derived, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyVerdict {
    /// Outlier label from the ensemble
    pub is_anomaly: bool,

    /// Sign-flipped decision-function value; larger = more anomalous
    pub anomaly_score: f64,

    /// Calibrated confidence in [0, 1]
    pub confidence: f64,
}

/// A single diagnostic recommendation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    /// Diagnostic text
    #[serde(rename = "recommendation")]
    pub text: String,

    /// Rule confidence in [0, 1]
    pub confidence: f64,
}

impl Recommendation {
    pub fn new(text: impl Into<String>, confidence: f64) -> Self {
        Self {
            text: text.into(),
            confidence,
        }
    }
}

/// Combined scoring output: verdict plus zero or more recommendations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriageReport {
    #[serde(flatten)]
    pub verdict: AnomalyVerdict,

    pub recommendations: Vec<Recommendation>,
}
