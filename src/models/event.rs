use serde::{Deserialize, Serialize};

/// A single protocol-stack event from a network element log.
///
/// Events are transient: they are supplied per extraction call and never
/// persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEvent {
    /// Severity level as logged by the stack ("ERROR", "warn", ...)
    pub level: String,

    /// Protocol event code ("AUTH_FAILURE", "RRC_RECONFIG_FAILURE", ...)
    pub code: String,

    /// Free-text message accompanying the event
    pub message: String,
}

impl LogEvent {
    pub fn new(
        level: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            level: level.into(),
            code: code.into(),
            message: message.into(),
        }
    }

    /// Level comparison is case-insensitive throughout the pipeline.
    pub fn level_lower(&self) -> String {
        self.level.to_lowercase()
    }

    pub fn is_error(&self) -> bool {
        self.level_lower() == "error"
    }

    pub fn is_warning(&self) -> bool {
        matches!(self.level_lower().as_str(), "warn" | "warning")
    }
}
