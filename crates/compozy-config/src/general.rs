//! General application configuration.

use serde::{Deserialize, Serialize};

/// Default result limit.
const fn default_limit() -> u32 {
    20
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct GeneralConfig {
    /// Default result limit for list commands.
    #[serde(default = "default_limit")]
    pub default_limit: u32,

    /// Actor recorded on transitions when `--actor` is not given.
    #[serde(default)]
    pub default_actor: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            default_limit: default_limit(),
            default_actor: String::new(),
        }
    }
}

impl GeneralConfig {
    #[must_use]
    pub fn actor(&self) -> Option<&str> {
        Some(self.default_actor.as_str()).filter(|a| !a.is_empty())
    }
}
