//! TOML layering tests. `figment::Jail` sandboxes the working directory and
//! environment for each test.

use figment::{
    Figment, Jail,
    providers::{Format, Serialized, Toml},
};
use compozy_config::CompozyConfig;

#[test]
fn loads_all_sections_from_toml() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "config.toml",
            r#"
[database]
path = "/var/lib/compozy/state.db"

[events]
jsonl_dir = "/var/log/compozy"
log_transitions = false

[general]
default_limit = 50
default_actor = "ops-bot"
"#,
        )?;

        let config: CompozyConfig = Figment::from(Serialized::defaults(CompozyConfig::default()))
            .merge(Toml::file("config.toml"))
            .extract()?;

        assert_eq!(config.database.path, "/var/lib/compozy/state.db");
        assert_eq!(
            config.events.jsonl_path().as_deref(),
            Some(std::path::Path::new("/var/log/compozy"))
        );
        assert!(!config.events.log_transitions);
        assert_eq!(config.general.default_limit, 50);
        assert_eq!(config.general.actor(), Some("ops-bot"));
        Ok(())
    });
}

#[test]
fn project_local_file_is_picked_up() {
    Jail::expect_with(|jail| {
        jail.create_dir(".compozy")?;
        jail.create_file(
            ".compozy/config.toml",
            r#"
[database]
url = "libsql://compozy-dev.example.io"
auth_token = "tok"
"#,
        )?;

        let config = CompozyConfig::load().expect("config loads");
        assert!(config.database.is_remote());
        assert_eq!(config.database.auth_token, "tok");
        // Untouched sections keep defaults.
        assert_eq!(config.general.default_limit, 20);
        Ok(())
    });
}

#[test]
fn partial_section_keeps_field_defaults() {
    Jail::expect_with(|jail| {
        jail.create_file("config.toml", "[events]\njsonl_dir = \"events\"\n")?;
        let config: CompozyConfig = Figment::from(Serialized::defaults(CompozyConfig::default()))
            .merge(Toml::file("config.toml"))
            .extract()?;
        assert!(config.events.log_transitions);
        assert_eq!(config.database.path, ".compozy/compozy.db");
        Ok(())
    });
}
