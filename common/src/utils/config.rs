use std::{fmt, str::FromStr, time::Duration};

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Deployment environment a seed run writes into.
#[derive(Clone, Copy, Deserialize, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SeedTarget {
    #[default]
    Emulator,
    Production,
}

impl SeedTarget {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Emulator => "emulator",
            Self::Production => "production",
        }
    }

    /// Production writes must be confirmed before any connection is made.
    pub fn requires_confirmation(self) -> bool {
        matches!(self, Self::Production)
    }

    /// Smaller batches in production keep a failed commit's blast radius small.
    pub fn default_batch_size(self) -> usize {
        match self {
            Self::Emulator => 50,
            Self::Production => 25,
        }
    }

    pub fn chunk_delay(self) -> Duration {
        match self {
            Self::Emulator => Duration::from_millis(100),
            Self::Production => Duration::from_millis(1_000),
        }
    }

    pub fn commit_timeout(self) -> Duration {
        match self {
            Self::Emulator => Duration::from_secs(10),
            Self::Production => Duration::from_secs(30),
        }
    }

    pub fn connection(self, config: &AppConfig) -> Connection {
        match self {
            Self::Emulator => Connection {
                address: config.emulator_address.clone(),
                username: config.emulator_username.clone(),
                password: config.emulator_password.clone(),
                namespace: config.surrealdb_namespace.clone(),
                database: config.surrealdb_database.clone(),
            },
            Self::Production => Connection {
                address: config.surrealdb_address.clone(),
                username: config.surrealdb_username.clone(),
                password: config.surrealdb_password.clone(),
                namespace: config.surrealdb_namespace.clone(),
                database: config.surrealdb_database.clone(),
            },
        }
    }
}

impl fmt::Display for SeedTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SeedTarget {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "emulator" | "local" => Ok(Self::Emulator),
            "production" | "prod" => Ok(Self::Production),
            other => Err(format!(
                "unknown target '{other}', expected 'emulator' or 'production'"
            )),
        }
    }
}

/// Connection parameters resolved for one target.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Connection {
    pub address: String,
    pub username: String,
    pub password: String,
    pub namespace: String,
    pub database: String,
}

#[derive(Clone, Deserialize, Debug)]
pub struct AppConfig {
    #[serde(default)]
    pub surrealdb_address: String,
    #[serde(default = "default_credential")]
    pub surrealdb_username: String,
    #[serde(default = "default_credential")]
    pub surrealdb_password: String,
    #[serde(default = "default_namespace")]
    pub surrealdb_namespace: String,
    #[serde(default = "default_database")]
    pub surrealdb_database: String,
    #[serde(default = "default_emulator_address")]
    pub emulator_address: String,
    #[serde(default = "default_credential")]
    pub emulator_username: String,
    #[serde(default = "default_credential")]
    pub emulator_password: String,
    #[serde(default = "default_content_dir")]
    pub content_dir: String,
    /// Overrides the bundle's `seedVersion` when set.
    #[serde(default)]
    pub seed_version: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            surrealdb_address: String::new(),
            surrealdb_username: default_credential(),
            surrealdb_password: default_credential(),
            surrealdb_namespace: default_namespace(),
            surrealdb_database: default_database(),
            emulator_address: default_emulator_address(),
            emulator_username: default_credential(),
            emulator_password: default_credential(),
            content_dir: default_content_dir(),
            seed_version: None,
        }
    }
}

fn default_credential() -> String {
    "root".to_string()
}

fn default_namespace() -> String {
    "site".to_string()
}

fn default_database() -> String {
    "content".to_string()
}

fn default_emulator_address() -> String {
    "ws://127.0.0.1:8000".to_string()
}

fn default_content_dir() -> String {
    "./content".to_string()
}

pub fn get_config() -> Result<AppConfig, ConfigError> {
    let config = Config::builder()
        .add_source(File::with_name("config").required(false))
        .add_source(Environment::default())
        .build()?;

    config.try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_parses_aliases() {
        assert_eq!("emulator".parse::<SeedTarget>(), Ok(SeedTarget::Emulator));
        assert_eq!("PROD".parse::<SeedTarget>(), Ok(SeedTarget::Production));
        assert!("staging".parse::<SeedTarget>().is_err());
    }

    #[test]
    fn production_policy_is_stricter_than_emulator() {
        let emulator = SeedTarget::Emulator;
        let production = SeedTarget::Production;

        assert!(production.requires_confirmation());
        assert!(!emulator.requires_confirmation());
        assert!(production.default_batch_size() < emulator.default_batch_size());
        assert!(production.chunk_delay() > emulator.chunk_delay());
    }

    #[test]
    fn connection_follows_target() {
        let config = AppConfig {
            surrealdb_address: "wss://db.example.com".into(),
            surrealdb_username: "admin".into(),
            ..Default::default()
        };

        let production = SeedTarget::Production.connection(&config);
        assert_eq!(production.address, "wss://db.example.com");
        assert_eq!(production.username, "admin");

        let emulator = SeedTarget::Emulator.connection(&config);
        assert_eq!(emulator.address, "ws://127.0.0.1:8000");
        assert_eq!(emulator.username, "root");
        assert_eq!(emulator.namespace, production.namespace);
    }
}
