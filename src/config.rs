use crate::errors::{Error, Result};
use log::{error, info, LevelFilter};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const DEFAULT_CONFIG_PATH: &str = "config/config.toml";

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    pub database: MongoDbConfig,
    pub logger: LoggerConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MongoDbConfig {
    pub uri: String,
    pub database: String,
    pub connection_timeout_ms: u64,
    pub max_pool_size: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LoggerConfig {
    pub service_name: String,
    pub environment: String,
    pub log_level: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: MongoDbConfig {
                uri: "mongodb://localhost:27017".to_string(),
                database: "mongo-facade".to_string(),
                connection_timeout_ms: 5000,
                max_pool_size: Some(10),
            },
            logger: LoggerConfig {
                service_name: "mongo-facade".to_string(),
                environment: "development".to_string(),
                log_level: "info".to_string(),
                enabled: true,
            },
        }
    }
}

impl MongoDbConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.uri.is_empty() {
            return Err(Error::Config("MongoDB URI not configured".to_string()));
        }

        if self.database.is_empty() {
            return Err(Error::Config(
                "MongoDB database name not configured".to_string(),
            ));
        }

        Ok(())
    }
}

impl LoggerConfig {
    /// Level filter for `env_logger`; a command-line value wins over the file
    pub fn level_filter(&self, cli_level: Option<&str>) -> LevelFilter {
        let level = cli_level.unwrap_or(self.log_level.as_str());
        match level.to_lowercase().as_str() {
            "off" => LevelFilter::Off,
            "error" => LevelFilter::Error,
            "warn" => LevelFilter::Warn,
            "info" => LevelFilter::Info,
            "debug" => LevelFilter::Debug,
            "trace" => LevelFilter::Trace,
            _ => LevelFilter::Info,
        }
    }
}

impl Config {
    pub fn load() -> Self {
        Self::load_or_env(DEFAULT_CONFIG_PATH)
    }

    /// Load from `path`, falling back to environment variables or defaults
    pub fn load_or_env<P: AsRef<Path>>(path: P) -> Self {
        info!("Loading config from {}", path.as_ref().display());
        match Self::load_from_file(path) {
            Ok(config) => {
                info!("Config loaded from file");
                config
            }
            Err(e) => {
                error!("Failed to load config from file: {}", e);
                info!("Falling back to environment variables or defaults");
                Self::from_env()
            }
        }
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    pub fn from_env() -> Self {
        let mut config = Config::default();

        if let Ok(uri) = std::env::var("MONGODB_URI") {
            config.database.uri = uri;
        }

        if let Ok(db_name) = std::env::var("MONGODB_DATABASE") {
            config.database.database = db_name;
        }

        if let Ok(timeout) = std::env::var("MONGODB_CONNECT_TIMEOUT_MS") {
            if let Ok(timeout_ms) = timeout.parse::<u64>() {
                config.database.connection_timeout_ms = timeout_ms;
            }
        }

        if let Ok(pool_size) = std::env::var("MONGODB_MAX_POOL_SIZE") {
            if let Ok(size) = pool_size.parse::<u32>() {
                config.database.max_pool_size = Some(size);
            }
        }

        if let Ok(service_name) = std::env::var("SERVICE_NAME") {
            config.logger.service_name = service_name;
        }

        if let Ok(environment) = std::env::var("APP_ENV") {
            config.logger.environment = environment;
        }

        if let Ok(log_level) = std::env::var("RUST_LOG") {
            config.logger.log_level = log_level;
        }

        config
    }
}
