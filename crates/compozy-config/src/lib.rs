//! # compozy-config
//!
//! Layered configuration loading for Compozy using figment.
//!
//! Configuration sources (in priority order, highest wins):
//! 1. Environment variables (`COMPOZY_*` prefix, `__` as separator)
//! 2. Project-level `.compozy/config.toml`
//! 3. User-level `~/.config/compozy/config.toml`
//! 4. Built-in defaults
//!
//! Figment maps `COMPOZY_DATABASE__PATH` -> `database.path`,
//! `COMPOZY_EVENTS__JSONL_DIR` -> `events.jsonl_dir`, etc.
//!
//! ```no_run
//! use compozy_config::CompozyConfig;
//!
//! let config = CompozyConfig::load_with_dotenv().expect("config");
//! if config.database.is_remote() {
//!     println!("remote: {}", config.database.url);
//! }
//! ```

mod database;
mod error;
mod events;
mod general;

pub use database::DatabaseConfig;
pub use error::ConfigError;
pub use events::EventsConfig;
pub use general::GeneralConfig;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct CompozyConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub events: EventsConfig,
    #[serde(default)]
    pub general: GeneralConfig,
}

impl CompozyConfig {
    /// Load configuration from TOML files and environment variables, then
    /// validate it.
    ///
    /// Does not read `.env`; see [`Self::load_with_dotenv`].
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if extraction or validation fails.
    pub fn load() -> Result<Self, ConfigError> {
        let config: Self = Self::figment().extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Load `.env` from the current directory first, then [`Self::load`].
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if extraction or validation fails.
    pub fn load_with_dotenv() -> Result<Self, ConfigError> {
        // A missing .env is fine.
        let _ = dotenvy::dotenv();
        Self::load()
    }

    /// Build the figment provider chain.
    ///
    /// Public so callers can merge extra providers on top (e.g. CLI flags).
    #[must_use]
    pub fn figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                figment = figment.merge(Toml::file(global_path));
            }
        }

        let local_path = PathBuf::from(".compozy/config.toml");
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        figment.merge(Env::prefixed("COMPOZY_").split("__"))
    }

    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` for the first invalid field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.database.validate()?;
        if self.general.default_limit == 0 {
            return Err(ConfigError::InvalidValue {
                field: "general.default_limit".into(),
                reason: "must be at least 1".into(),
            });
        }
        Ok(())
    }

    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("compozy").join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = CompozyConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.general.default_limit, 20);
        assert!(config.events.log_transitions);
    }

    #[test]
    fn zero_limit_is_rejected() {
        let mut config = CompozyConfig::default();
        config.general.default_limit = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("general.default_limit"));
    }
}
