/// Domain data model
///
/// Transient protocol-stack events, the feature vocabulary extracted from
/// them, and the derived triage outputs.
pub mod event;
pub mod features;
pub mod verdict;

pub use event::LogEvent;
pub use features::{feature_names, FeatureMap, FeatureSchema, FeatureValue};
pub use verdict::{AnomalyVerdict, Recommendation, TriageReport};
