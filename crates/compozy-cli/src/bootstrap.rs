use anyhow::Context;
use compozy_config::CompozyConfig;

use crate::cli::GlobalFlags;

/// Load `.env`, then layered config, then apply `--db`.
pub fn load_config(flags: &GlobalFlags) -> anyhow::Result<CompozyConfig> {
    load_dotenv()?;

    let mut config: CompozyConfig = CompozyConfig::figment()
        .extract()
        .context("failed to read compozy configuration")?;
    if let Some(path) = &flags.db {
        config.database.path.clone_from(path);
        config.database.url.clear();
        config.database.auth_token.clear();
    }
    config.validate().map_err(anyhow::Error::from)?;
    Ok(config)
}

fn load_dotenv() -> anyhow::Result<()> {
    let cwd = std::env::current_dir().context("failed to determine current directory")?;
    let env_path = cwd.join(".env");
    if env_path.exists() {
        dotenvy::from_path(&env_path)
            .with_context(|| format!("failed to load dotenv file at {}", env_path.display()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::cli::GlobalFlags;

    use super::load_config;

    #[test]
    fn db_flag_overrides_path_and_disables_remote() {
        let flags = GlobalFlags {
            db: Some(":memory:".to_string()),
            ..GlobalFlags::default()
        };
        let config = load_config(&flags).expect("config should load");
        assert_eq!(config.database.path, ":memory:");
        assert!(!config.database.is_remote());
    }
}
