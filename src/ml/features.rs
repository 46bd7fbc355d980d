use crate::models::features::feature_names::{
    FIRST_ERROR_CODE, HAS_AUTH_FAILURE, HAS_RRC_RECONFIG, HAS_TIMER_TIMEOUT, NUM_ERRORS,
    NUM_EVENTS, NUM_WARNINGS,
};
use crate::models::{FeatureMap, LogEvent};
use once_cell::sync::Lazy;
use regex::Regex;

/// Categorical mapping from protocol event codes to semantic tags. The
/// authentication-failure code additionally raises its flag; the other codes
/// only contribute to `first_error_code`.
struct CodeTag {
    code: &'static str,
    tag: &'static str,
    flag: Option<&'static str>,
}

const CODE_TAGS: &[CodeTag] = &[
    CodeTag {
        code: "AUTH_FAILURE",
        tag: "auth_failure",
        flag: Some(HAS_AUTH_FAILURE),
    },
    CodeTag {
        code: "T310_EXPIRY",
        tag: "timer_timeout",
        flag: None,
    },
    CodeTag {
        code: "RRC_RECONFIG_FAILURE",
        tag: "rrc_reconfig",
        flag: None,
    },
    CodeTag {
        code: "RACH_FAILURE",
        tag: "rach_failure",
        flag: None,
    },
    CodeTag {
        code: "RLF_DETECTED",
        tag: "radio_link_failure",
        flag: None,
    },
];

/// Ordered free-text rules over the event message. Each rule sets exactly one
/// flag; rules are independent, so several may match the same event.
struct MessageRule {
    pattern: &'static str,
    flag: &'static str,
}

const MESSAGE_RULES: &[MessageRule] = &[
    MessageRule {
        pattern: r"timer.*(expir|timeout)|\bt3\d{2}\b",
        flag: HAS_TIMER_TIMEOUT,
    },
    MessageRule {
        pattern: r"auth(entication)?\s*fail",
        flag: HAS_AUTH_FAILURE,
    },
    MessageRule {
        pattern: r"rrc.*reconfig",
        flag: HAS_RRC_RECONFIG,
    },
];

static COMPILED_RULES: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    MESSAGE_RULES
        .iter()
        .map(|rule| {
            let re = Regex::new(&format!("(?i){}", rule.pattern))
                .expect("message rule pattern is valid");
            (re, rule.flag)
        })
        .collect()
});

/// Deterministic, total transformation from an ordered event list to the
/// fixed feature vocabulary. Never fails; an empty input yields all-zero
/// counters and flags.
pub struct FeatureExtractor;

impl FeatureExtractor {
    pub fn extract(events: &[LogEvent]) -> FeatureMap {
        let mut map = FeatureMap::new();
        map.insert(NUM_EVENTS, events.len());
        map.insert(HAS_AUTH_FAILURE, 0.0);
        map.insert(HAS_TIMER_TIMEOUT, 0.0);
        map.insert(HAS_RRC_RECONFIG, 0.0);

        let mut num_errors = 0usize;
        let mut num_warnings = 0usize;
        let mut first_error_code: Option<&'static str> = None;

        for event in events {
            if event.is_error() {
                num_errors += 1;
            } else if event.is_warning() {
                num_warnings += 1;
            }

            if let Some(entry) = CODE_TAGS.iter().find(|t| t.code == event.code) {
                if let Some(flag) = entry.flag {
                    map.set_flag(flag);
                }
                if first_error_code.is_none() && event.is_error() {
                    first_error_code = Some(entry.tag);
                }
            }

            for (re, flag) in COMPILED_RULES.iter() {
                if re.is_match(&event.message) {
                    map.set_flag(flag);
                }
            }
        }

        map.insert(NUM_ERRORS, num_errors);
        map.insert(NUM_WARNINGS, num_warnings);
        map.insert(FIRST_ERROR_CODE, first_error_code.unwrap_or("none"));

        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input_yields_zero_features() {
        let map = FeatureExtractor::extract(&[]);

        assert_eq!(map.number(NUM_EVENTS), Some(0.0));
        assert_eq!(map.number(NUM_ERRORS), Some(0.0));
        assert_eq!(map.number(NUM_WARNINGS), Some(0.0));
        assert_eq!(map.number(HAS_AUTH_FAILURE), Some(0.0));
        assert_eq!(map.number(HAS_TIMER_TIMEOUT), Some(0.0));
        assert_eq!(map.number(HAS_RRC_RECONFIG), Some(0.0));
        assert_eq!(map.text(FIRST_ERROR_CODE), Some("none"));
    }

    #[test]
    fn test_auth_failure_code_raises_flag_and_first_error() {
        let events = vec![LogEvent::new("error", "AUTH_FAILURE", "")];
        let map = FeatureExtractor::extract(&events);

        assert_eq!(map.number(NUM_ERRORS), Some(1.0));
        assert_eq!(map.number(HAS_AUTH_FAILURE), Some(1.0));
        assert_eq!(map.text(FIRST_ERROR_CODE), Some("auth_failure"));
    }

    #[test]
    fn test_first_error_code_takes_first_tabled_error() {
        let events = vec![
            // Warning-level tabled code does not claim first_error_code.
            LogEvent::new("warn", "T310_EXPIRY", ""),
            LogEvent::new("error", "RRC_RECONFIG_FAILURE", ""),
            LogEvent::new("error", "AUTH_FAILURE", ""),
        ];
        let map = FeatureExtractor::extract(&events);

        assert_eq!(map.text(FIRST_ERROR_CODE), Some("rrc_reconfig"));
        assert_eq!(map.number(NUM_ERRORS), Some(2.0));
        assert_eq!(map.number(NUM_WARNINGS), Some(1.0));
    }

    #[test]
    fn test_untabled_error_code_leaves_first_error_none() {
        let events = vec![LogEvent::new("error", "UNKNOWN_CODE", "")];
        let map = FeatureExtractor::extract(&events);

        assert_eq!(map.number(NUM_ERRORS), Some(1.0));
        assert_eq!(map.text(FIRST_ERROR_CODE), Some("none"));
    }

    #[test]
    fn test_message_rules_match_case_insensitively() {
        let events = vec![
            LogEvent::new("info", "X", "Timer T310 EXPIRED while waiting"),
            LogEvent::new("info", "X", "Authentication FAILURE from MME"),
            LogEvent::new("info", "X", "RRC connection reconfiguration rejected"),
        ];
        let map = FeatureExtractor::extract(&events);

        assert_eq!(map.number(HAS_TIMER_TIMEOUT), Some(1.0));
        assert_eq!(map.number(HAS_AUTH_FAILURE), Some(1.0));
        assert_eq!(map.number(HAS_RRC_RECONFIG), Some(1.0));
    }

    #[test]
    fn test_multiple_rules_may_match_one_event() {
        let events = vec![LogEvent::new(
            "error",
            "X",
            "t310 timeout during rrc reconfiguration",
        )];
        let map = FeatureExtractor::extract(&events);

        assert_eq!(map.number(HAS_TIMER_TIMEOUT), Some(1.0));
        assert_eq!(map.number(HAS_RRC_RECONFIG), Some(1.0));
        assert_eq!(map.number(HAS_AUTH_FAILURE), Some(0.0));
    }

    #[test]
    fn test_repeated_matches_stay_at_one() {
        let events = vec![
            LogEvent::new("error", "AUTH_FAILURE", "authentication failed"),
            LogEvent::new("error", "AUTH_FAILURE", "authentication failed again"),
        ];
        let map = FeatureExtractor::extract(&events);

        assert_eq!(map.number(HAS_AUTH_FAILURE), Some(1.0));
        assert_eq!(map.number(NUM_ERRORS), Some(2.0));
    }

    #[test]
    fn test_extraction_is_deterministic() {
        let events = vec![
            LogEvent::new("error", "AUTH_FAILURE", "auth fail"),
            LogEvent::new("warn", "X", "timer t301 expired"),
        ];

        assert_eq!(
            FeatureExtractor::extract(&events),
            FeatureExtractor::extract(&events)
        );
    }
}
