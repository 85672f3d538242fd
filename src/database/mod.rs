// MongoDB modules
pub mod bulk;
pub mod mongodb;

// Re-export commonly used types
pub use self::bulk::BulkOperation;
pub use self::mongodb::MongoDbClient;
