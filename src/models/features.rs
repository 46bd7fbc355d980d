use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Canonical feature names emitted by the extractor and consumed by the
/// recommendation rules and the synthetic training table.
pub mod feature_names {
    pub const NUM_EVENTS: &str = "num_events";
    pub const NUM_ERRORS: &str = "num_errors";
    pub const NUM_WARNINGS: &str = "num_warnings";
    pub const HAS_AUTH_FAILURE: &str = "has_auth_failure";
    pub const HAS_TIMER_TIMEOUT: &str = "has_timer_timeout";
    pub const HAS_RRC_RECONFIG: &str = "has_rrc_reconfig";
    pub const FIRST_ERROR_CODE: &str = "first_error_code";

    /// The numeric columns, in the order the synthetic fallback table uses.
    pub const NUMERIC: [&str; 6] = [
        NUM_EVENTS,
        NUM_ERRORS,
        NUM_WARNINGS,
        HAS_AUTH_FAILURE,
        HAS_TIMER_TIMEOUT,
        HAS_RRC_RECONFIG,
    ];
}

/// Ordered feature names fixed at training time; position i of every scoring
/// vector corresponds to schema[i].
pub type FeatureSchema = Vec<String>;

/// A feature value: numeric for counters and flags, textual for
/// `first_error_code`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Number(f64),
    Text(String),
}

impl FeatureValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FeatureValue::Number(n) => Some(*n),
            FeatureValue::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FeatureValue::Number(_) => None,
            FeatureValue::Text(s) => Some(s),
        }
    }
}

impl From<f64> for FeatureValue {
    fn from(value: f64) -> Self {
        FeatureValue::Number(value)
    }
}

impl From<usize> for FeatureValue {
    fn from(value: usize) -> Self {
        FeatureValue::Number(value as f64)
    }
}

impl From<&str> for FeatureValue {
    fn from(value: &str) -> Self {
        FeatureValue::Text(value.to_string())
    }
}

impl From<String> for FeatureValue {
    fn from(value: String) -> Self {
        FeatureValue::Text(value)
    }
}

/// Mapping from feature name to value.
///
/// Scoring tolerates schema drift: missing schema keys vectorize as 0.0 and
/// keys outside the schema are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureMap {
    values: HashMap<String, FeatureValue>,
}

impl FeatureMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<FeatureValue>) {
        self.values.insert(name.into(), value.into());
    }

    /// Numeric value for a feature, if present and numeric.
    pub fn number(&self, name: &str) -> Option<f64> {
        self.values.get(name).and_then(FeatureValue::as_number)
    }

    /// Textual value for a feature, if present and textual.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.values.get(name).and_then(FeatureValue::as_text)
    }

    /// Raise a binary flag to 1. Idempotent.
    pub fn set_flag(&mut self, name: &str) {
        self.values
            .insert(name.to_string(), FeatureValue::Number(1.0));
    }

    /// Whether a binary flag is raised.
    pub fn flag_set(&self, name: &str) -> bool {
        self.number(name) == Some(1.0)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FeatureValue)> {
        self.values.iter()
    }
}

impl FromIterator<(String, FeatureValue)> for FeatureMap {
    fn from_iter<T: IntoIterator<Item = (String, FeatureValue)>>(iter: T) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}
