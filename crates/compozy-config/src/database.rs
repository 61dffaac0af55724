//! Database location.

use serde::{Deserialize, Serialize};

use crate::ConfigError;

fn default_path() -> String {
    ".compozy/compozy.db".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// Local database file, or `:memory:`.
    #[serde(default = "default_path")]
    pub path: String,

    /// Remote libSQL URL. When set, `path` is ignored.
    #[serde(default)]
    pub url: String,

    /// Auth token for the remote database.
    #[serde(default)]
    pub auth_token: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_path(),
            url: String::new(),
            auth_token: String::new(),
        }
    }
}

impl DatabaseConfig {
    #[must_use]
    pub fn is_remote(&self) -> bool {
        !self.url.is_empty()
    }

    #[must_use]
    pub fn is_in_memory(&self) -> bool {
        !self.is_remote() && self.path == ":memory:"
    }

    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` for an unsupported URL scheme or an
    /// empty local path.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.is_remote() {
            let supported = ["libsql://", "http://", "https://", "ws://", "wss://"];
            if !supported.iter().any(|s| self.url.starts_with(s)) {
                return Err(ConfigError::InvalidValue {
                    field: "database.url".into(),
                    reason: format!("unsupported scheme in '{}'", self.url),
                });
            }
        } else if self.path.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "database.path".into(),
                reason: "must not be empty".into(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_local_file() {
        let config = DatabaseConfig::default();
        assert!(!config.is_remote());
        assert!(!config.is_in_memory());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn remote_url_scheme_is_checked() {
        let mut config = DatabaseConfig {
            url: "libsql://compozy.example.io".into(),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
        config.url = "ftp://nope".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn empty_path_rejected() {
        let config = DatabaseConfig {
            path: "  ".into(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
