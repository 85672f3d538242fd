use mongodb::error::Error as MongoError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while setting the facade up.
///
/// CRUD calls never produce this type: they hand back the driver's own
/// `mongodb::error::Error` untouched.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config file: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Database error: {0}")]
    Database(#[from] MongoError),
}
