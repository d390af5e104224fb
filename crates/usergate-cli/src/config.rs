//! Application configuration.
//!
//! Values come from `usergate.toml` (or `--config`), overridden by
//! `USERGATE__`-prefixed environment variables, e.g.
//! `USERGATE__DATABASE__URL=postgres://...`.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use usergate_auth::OAuthConfig;
use usergate_auth::types::GrantType;
use usergate_auth_postgres::{PostgresConfig, SeedClient};

pub const DEFAULT_CONFIG_PATH: &str = "usergate.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub logging: LoggingConfig,
    pub database: PostgresConfig,
    pub oauth: OAuthConfig,
    pub seed: SeedConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".into()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Reference data inserted on a fresh database.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeedConfig {
    #[serde(default)]
    pub clients: Vec<SeedClient>,
}

impl AppConfig {
    pub fn validate(&self) -> Result<()> {
        if self.database.url.trim().is_empty() {
            anyhow::bail!("database.url must not be empty");
        }
        if self.database.pool_size == 0 {
            anyhow::bail!("database.pool_size must be > 0");
        }
        self.oauth.validate()?;

        for client in &self.seed.clients {
            client.validate()?;
        }
        Ok(())
    }

    /// Settings that are valid but probably unintended, for logging once
    /// tracing is up.
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        let machine_clients = self
            .seed
            .clients
            .iter()
            .filter(|c| c.grants.contains(&GrantType::ClientCredentials))
            .count();
        if machine_clients > 0 && self.oauth.client_credentials_user_id.is_none() {
            warnings.push(format!(
                "{machine_clients} seed client(s) hold client_credentials but \
                 oauth.client_credentials_user_id is unset; their tokens will be stored without a user"
            ));
        }
        warnings
    }
}

pub mod loader {
    use super::{AppConfig, DEFAULT_CONFIG_PATH};
    use anyhow::{Context, Result};
    use config::{Config, Environment, File};
    use std::path::PathBuf;

    pub fn load_config(path: Option<&str>) -> Result<AppConfig> {
        let mut builder = Config::builder();
        match path {
            Some(p) => {
                let pathbuf = PathBuf::from(p);
                if !pathbuf.exists() {
                    anyhow::bail!("config file not found: {p}");
                }
                builder = builder.add_source(File::from(pathbuf));
            }
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_PATH);
                if default_path.exists() {
                    builder = builder.add_source(File::from(default_path));
                }
            }
        }
        builder = builder.add_source(
            Environment::with_prefix("USERGATE")
                .try_parsing(true)
                .separator("__"),
        );
        let merged: AppConfig = builder
            .build()
            .context("config build error")?
            .try_deserialize()
            .context("config deserialize error")?;
        merged.validate()?;
        Ok(merged)
    }

    /// Parses configuration from a TOML string without environment overrides.
    #[cfg(test)]
    pub fn load_config_from_str(toml: &str) -> Result<AppConfig> {
        let merged: AppConfig = Config::builder()
            .add_source(File::from_str(toml, config::FileFormat::Toml))
            .build()
            .context("config build error")?
            .try_deserialize()
            .context("config deserialize error")?;
        merged.validate()?;
        Ok(merged)
    }
}

/// Loads `.env` from the working directory, if present.
pub fn load_dotenv() -> Result<Option<PathBuf>> {
    match dotenvy::dotenv() {
        Ok(path) => Ok(Some(path)),
        Err(e) if e.not_found() => Ok(None),
        Err(e) => Err(e).context("failed to load .env"),
    }
}

#[cfg(test)]
mod tests {
    use super::loader::load_config_from_str;
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_defaults() {
        let config = load_config_from_str("").unwrap();
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.database.pool_size, 10);
        assert_eq!(config.oauth.client_credentials_user_id, Some(1));
        assert!(config.seed.clients.is_empty());
    }

    #[test]
    fn test_full_file() {
        let config = load_config_from_str(
            r#"
            [logging]
            level = "debug"

            [database]
            url = "postgres://app:secret@db/usergate"
            pool_size = 4

            [oauth]
            access_token_lifetime = "30m"
            refresh_token_lifetime = "7d"

            [[seed.clients]]
            client_id = "b921b25ebe3ee70c6b1"
            client_secret = "web-secret"
            grants = ["password", "refresh_token"]

            [[seed.clients]]
            client_id = "b921b25ebe3ee70c6b2"
            client_secret = "machine-secret"
            grants = ["client_credentials"]
            "#,
        )
        .unwrap();

        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.database.pool_size, 4);
        assert_eq!(config.oauth.access_token_lifetime, Duration::from_secs(1800));
        assert_eq!(config.oauth.refresh_token_lifetime, Duration::from_secs(604_800));
        assert_eq!(config.seed.clients.len(), 2);
        assert_eq!(
            config.seed.clients[0].grants,
            vec![GrantType::Password, GrantType::RefreshToken]
        );
    }

    #[test]
    fn test_rejects_blank_seed_secret() {
        let result = load_config_from_str(
            r#"
            [[seed.clients]]
            client_id = "app"
            client_secret = ""
            grants = ["password"]
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_unknown_grant() {
        let result = load_config_from_str(
            r#"
            [[seed.clients]]
            client_id = "app"
            client_secret = "s"
            grants = ["implicit"]
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_warns_on_userless_client_credentials() {
        let toml = r#"
            [[seed.clients]]
            client_id = "b921b25ebe3ee70c6b2"
            client_secret = "machine-secret"
            grants = ["client_credentials"]
            "#;
        assert!(load_config_from_str(toml).unwrap().warnings().is_empty());

        let mut config = load_config_from_str(toml).unwrap();
        config.oauth.client_credentials_user_id = None;
        let warnings = config.warnings();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("client_credentials_user_id"));
    }

    #[test]
    fn test_rejects_empty_database_url() {
        let result = load_config_from_str(
            r#"
            [database]
            url = ""
            "#,
        );
        assert!(result.is_err());
    }
}
