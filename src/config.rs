//! Database settings.
//!
//! [`DatabaseConfig::load()`] reads the `[database]` section from
//! `config/config.toml` and lets `DBRECORD__DATABASE__*` environment
//! variables override it.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

const CONFIG_FILE: &str = "config/config.toml";
const ENV_PREFIX: &str = "DBRECORD";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_url")]
    pub url: String,
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

fn default_db_url() -> String {
    "sqlite::memory:".to_string()
}

fn default_busy_timeout_ms() -> u64 {
    5000
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_db_url(),
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

impl DatabaseConfig {
    pub fn from_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// Load the database configuration from `config/config.toml`, falling back to env vars.
    ///
    /// A missing `[database]` section yields the defaults.
    ///
    /// # Errors
    ///
    /// [`ConfigError`] when neither source can be read or the section is malformed.
    pub fn load() -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .add_source(File::with_name(CONFIG_FILE).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

        let settings = match builder.build() {
            Ok(cfg) => cfg,
            Err(err) => {
                if std::path::Path::new(CONFIG_FILE).exists() {
                    emit!(warn, "failed to load {CONFIG_FILE}, falling back to env: {err}");
                }
                Config::builder()
                    .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
                    .build()
                    .map_err(|env_err| {
                        ConfigError::Message(format!(
                            "Failed to load configuration from file and env: {err}, then env-only error: {env_err}"
                        ))
                    })?
            }
        };

        Self::from_settings(&settings)
    }

    fn from_settings(settings: &Config) -> Result<Self, ConfigError> {
        match settings.get::<DatabaseConfig>("database") {
            Ok(config) => Ok(config),
            Err(ConfigError::NotFound(_)) => Ok(Self::default()),
            Err(e) => Err(ConfigError::Message(format!(
                "Database configuration could not be loaded from file or environment: {e}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    fn parse(toml: &str) -> Result<DatabaseConfig, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?;
        DatabaseConfig::from_settings(&settings)
    }

    #[test]
    fn test_defaults() {
        let config = DatabaseConfig::default();
        assert_eq!(config.url, "sqlite::memory:");
        assert_eq!(config.busy_timeout_ms, 5000);
    }

    #[test]
    fn test_missing_section_uses_defaults() {
        assert_eq!(parse("").unwrap(), DatabaseConfig::default());
    }

    #[test]
    fn test_section_overrides() {
        let config = parse(
            r#"
            [database]
            url = "sqlite:/tmp/contacts.db"
            "#,
        )
        .unwrap();
        assert_eq!(config.url, "sqlite:/tmp/contacts.db");
        assert_eq!(config.busy_timeout_ms, 5000);
    }

    #[test]
    fn test_malformed_section() {
        assert!(parse("[database]\nbusy_timeout_ms = \"soon\"").is_err());
    }

    #[test]
    fn test_from_url() {
        let config = DatabaseConfig::from_url("postgres://localhost/app");
        assert_eq!(config.url, "postgres://localhost/app");
        assert_eq!(config.busy_timeout_ms, 5000);
    }
}
