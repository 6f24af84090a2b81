//! Application configuration.
//!
//! Loaded from YAML files and environment variables, highest priority last:
//! 1. Defaults
//! 2. `config.yaml` in the working directory (optional)
//! 3. File passed on the command line, then the file named by `DDBGATE_CONFIG`
//! 4. `DDBGATE__*` variables (`__` separates nesting levels)
//! 5. `PORT` and `AWS_PROFILE`

mod store;

pub use store::{StoreConfig, StoreType};

use serde::Deserialize;
use tracing::warn;

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = "config.yaml";
/// Environment variable for configuration file path.
pub const CONFIG_ENV_VAR: &str = "DDBGATE_CONFIG";
/// Prefix for configuration environment variables.
pub const CONFIG_ENV_PREFIX: &str = "DDBGATE";
/// Environment variable for logging configuration.
pub const LOG_ENV_VAR: &str = "DDBGATE_LOG";
/// Environment variable for the listen port.
pub const PORT_ENV_VAR: &str = "PORT";
/// Environment variable selecting the AWS credential profile.
pub const AWS_PROFILE_ENV_VAR: &str = "AWS_PROFILE";

/// Main application configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP listener configuration.
    pub server: ServerConfig,
    /// Store backend configuration.
    pub store: StoreConfig,
    /// YAML catalog definition; the built-in catalog is used when unset.
    pub catalog_path: Option<String>,
}

/// HTTP listener configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load config: {0}")]
    Load(#[from] ::config::ConfigError),
}

impl Config {
    /// Load configuration from files and environment.
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        use ::config::{Config as ConfigLib, Environment, File, FileFormat};

        let mut builder = ConfigLib::builder()
            .add_source(File::new(DEFAULT_CONFIG_FILE, FileFormat::Yaml).required(false));

        if let Some(config_path) = path {
            builder = builder.add_source(File::new(config_path, FileFormat::Yaml).required(true));
        }

        if let Ok(config_path) = std::env::var(CONFIG_ENV_VAR) {
            builder = builder.add_source(File::new(&config_path, FileFormat::Yaml).required(true));
        }

        let config = builder
            .add_source(
                Environment::with_prefix(CONFIG_ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut config: Config = config.try_deserialize()?;
        config.apply_env_overrides(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// Apply the legacy `PORT` / `AWS_PROFILE` variables.
    fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(port) = lookup(PORT_ENV_VAR).filter(|p| !p.is_empty()) {
            match port.parse() {
                Ok(p) => self.server.port = p,
                Err(_) => warn!(value = %port, "Ignoring invalid {}", PORT_ENV_VAR),
            }
        }

        if let Some(profile) = lookup(AWS_PROFILE_ENV_VAR).filter(|p| !p.is_empty()) {
            self.store.profile = profile;
        }
    }

    /// Create config for testing: in-memory store, ephemeral port.
    pub fn for_test() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
            },
            store: StoreConfig {
                store_type: StoreType::Memory,
                ..StoreConfig::default()
            },
            catalog_path: None,
        }
    }
}
