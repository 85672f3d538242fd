pub mod config;
pub mod database;
pub mod errors;
pub mod logger;

pub use database::{BulkOperation, MongoDbClient};
pub use logger::LoggerClient;

#[cfg(test)]
mod test_support;
