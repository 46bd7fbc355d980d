use crate::models::features::feature_names::{HAS_AUTH_FAILURE, HAS_TIMER_TIMEOUT, NUM_ERRORS};
use crate::models::{FeatureMap, Recommendation};

/// Condition over a feature map, evaluated without any model state.
enum Condition {
    /// Binary flag equals 1
    FlagSet(&'static str),
    /// Counter strictly above a threshold
    CountAbove(&'static str, f64),
}

impl Condition {
    fn matches(&self, features: &FeatureMap) -> bool {
        match self {
            Condition::FlagSet(name) => features.flag_set(name),
            Condition::CountAbove(name, threshold) => {
                features.number(name).is_some_and(|v| v > *threshold)
            }
        }
    }
}

struct Rule {
    condition: Condition,
    text: &'static str,
    confidence: f64,
}

/// Ordered, non-exclusive rule list: every matching rule fires, in
/// definition order.
const RULES: &[Rule] = &[
    Rule {
        condition: Condition::FlagSet(HAS_AUTH_FAILURE),
        text: "Verify UE credentials/keys and network auth settings.",
        confidence: 0.8,
    },
    Rule {
        condition: Condition::FlagSet(HAS_TIMER_TIMEOUT),
        text: "Increase specific protocol timers and check paging/coverage.",
        confidence: 0.7,
    },
    Rule {
        condition: Condition::CountAbove(NUM_ERRORS, 5.0),
        text: "Review recent error messages; try rerun with verbose logging.",
        confidence: 0.6,
    },
];

/// Stateless mapping from feature conditions to diagnostic text.
pub struct RecommendationEngine;

impl RecommendationEngine {
    pub fn recommend(features: &FeatureMap) -> Vec<Recommendation> {
        RULES
            .iter()
            .filter(|rule| rule.condition.matches(features))
            .map(|rule| Recommendation::new(rule.text, rule.confidence))
            .collect()
    }
}
