//! Event listener configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

const fn default_log_transitions() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct EventsConfig {
    /// Directory for the JSONL event sink. Empty disables the sink.
    #[serde(default)]
    pub jsonl_dir: String,

    /// Log every transition through `tracing`.
    #[serde(default = "default_log_transitions")]
    pub log_transitions: bool,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            jsonl_dir: String::new(),
            log_transitions: default_log_transitions(),
        }
    }
}

impl EventsConfig {
    #[must_use]
    pub fn jsonl_path(&self) -> Option<PathBuf> {
        (!self.jsonl_dir.is_empty()).then(|| PathBuf::from(&self.jsonl_dir))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sink_disabled_by_default() {
        let config = EventsConfig::default();
        assert_eq!(config.jsonl_path(), None);
        assert!(config.log_transitions);
    }
}
