use crate::config::MongoDbConfig;
use crate::errors::Result;
use crate::logger::{Level, LoggerClient};
use bson::{doc, Bson, Document};
use futures::TryStreamExt;
use log::{error, info, warn};
use mongodb::{
    error::Result as MongoResult,
    options::{ClientOptions, FindOneOptions, FindOptions, ServerApi, ServerApiVersion},
    results::{DeleteResult, InsertManyResult, InsertOneResult, SummaryBulkWriteResult, UpdateResult},
    Client, Collection, Cursor, Database,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;

use super::bulk::{bind_to_namespace, BulkOperation};

/// Logged, timed pass-through over a MongoDB database.
///
/// Every method forwards to the driver and hands its result back untouched;
/// the only additions are a timer around the call and a debug line
/// describing what happened.
#[derive(Debug, Clone)]
pub struct MongoDbClient {
    client: Client,
    database: Database,
    database_name: String,
    logger: Arc<LoggerClient>,
}

impl MongoDbClient {
    pub fn new(client: Client, database_name: &str, logger: Arc<LoggerClient>) -> Self {
        let database = client.database(database_name);
        Self {
            client,
            database,
            database_name: database_name.to_string(),
            logger,
        }
    }

    /// Build the driver client from configuration
    pub async fn init(config: &MongoDbConfig, logger: Arc<LoggerClient>) -> Result<Self> {
        config.validate()?;

        info!(
            "Creating MongoDB client for database {}",
            config.database
        );

        let mut client_options = ClientOptions::parse(&config.uri).await?;

        client_options.connect_timeout = Some(Duration::from_millis(config.connection_timeout_ms));
        client_options.max_pool_size = config.max_pool_size;
        client_options.app_name = Some(logger.service_name().to_string());

        // Pin the stable API v1
        let server_api = ServerApi::builder().version(ServerApiVersion::V1).build();
        client_options.server_api = Some(server_api);

        let client = Client::with_options(client_options)?;

        Ok(Self::new(client, &config.database, logger))
    }

    pub fn logger(&self) -> &LoggerClient {
        &self.logger
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Get database reference
    pub fn database(&self) -> Database {
        self.database.clone()
    }

    pub fn database_name(&self) -> &str {
        &self.database_name
    }

    /// Get a collection with the given name
    pub fn collection<T: Send + Sync>(&self, name: &str) -> Collection<T> {
        self.database.collection(name)
    }

    /// Force server selection and the handshake; the driver otherwise
    /// connects lazily on the first operation.
    pub async fn connect(&self) -> MongoResult<()> {
        const LABEL: &str = "connect mongodb server";
        self.logger.time(LABEL);
        self.logger
            .debug("Connecting the client to the mongodb server", None);

        let result = self.database.run_command(doc! { "ping": 1 }).await;
        match &result {
            Ok(_) => self
                .logger
                .debug("Connected successfully to mongodb server", None),
            Err(e) => error!("Failed to connect to MongoDB: {}", e),
        }

        self.logger.time_end(LABEL);
        result.map(|_| ())
    }

    pub async fn close(&self) -> MongoResult<()> {
        const LABEL: &str = "close mongodb server";
        self.logger.time(LABEL);
        self.logger
            .debug("Closing the client to the mongodb server", None);

        self.client.clone().shutdown().await;

        self.logger
            .debug("Closed successfully to mongodb server", None);
        self.logger.time_end(LABEL);
        Ok(())
    }

    pub async fn insert_one<T>(&self, collection_name: &str, doc: &T) -> MongoResult<InsertOneResult>
    where
        T: Serialize + Send + Sync,
    {
        const LABEL: &str = "insert document";
        self.logger.time(LABEL);

        let collection = self.collection::<T>(collection_name);
        let result = collection.insert_one(doc).await;
        match &result {
            Ok(inserted) => self.debug_with(
                &insert_one_message(&inserted.inserted_id),
                || document_data(collection_name, doc),
            ),
            Err(e) => self.log_failure(LABEL, collection_name, e),
        }

        self.logger.time_end(LABEL);
        result
    }

    pub async fn insert_many<T>(
        &self,
        collection_name: &str,
        docs: &[T],
    ) -> MongoResult<InsertManyResult>
    where
        T: Serialize + Send + Sync,
    {
        const LABEL: &str = "insert many documents";
        self.logger.time(LABEL);

        let collection = self.collection::<T>(collection_name);
        let result = collection.insert_many(docs).await;
        match &result {
            Ok(inserted) => self.debug_with(
                &inserted_message(inserted.inserted_ids.len() as i64),
                || {
                    json!({
                        "collection": collection_name,
                        "documents": to_log_value(docs),
                    })
                },
            ),
            Err(e) => self.log_failure(LABEL, collection_name, e),
        }

        self.logger.time_end(LABEL);
        result
    }

    /// Run `operations` against one collection through the driver's bulk write
    pub async fn bulk_write(
        &self,
        collection_name: &str,
        operations: Vec<BulkOperation>,
    ) -> MongoResult<SummaryBulkWriteResult> {
        const LABEL: &str = "bulk write documents";
        self.logger.time(LABEL);

        let data = self
            .logger
            .enabled_for(Level::Debug)
            .then(|| json!({ "collection": collection_name, "operations": to_log_value(&operations) }));

        let namespace = self.collection::<Document>(collection_name).namespace();
        let models = bind_to_namespace(operations, &namespace);
        let result = self.client.bulk_write(models).await;
        match &result {
            Ok(summary) => self.logger.debug(
                &inserted_message(summary.inserted_count),
                data,
            ),
            Err(e) => self.log_failure(LABEL, collection_name, e),
        }

        self.logger.time_end(LABEL);
        result
    }

    pub async fn find_one<T>(
        &self,
        collection_name: &str,
        filter: Document,
        options: Option<FindOneOptions>,
    ) -> MongoResult<Option<T>>
    where
        T: DeserializeOwned + Send + Sync,
    {
        const LABEL: &str = "find a document";
        self.logger.time(LABEL);

        let collection = self.collection::<T>(collection_name);
        self.debug_with("find a document", || query_data(collection_name, &filter, None));
        let result = collection.find_one(filter).with_options(options).await;
        if let Err(e) = &result {
            self.log_failure(LABEL, collection_name, e);
        }

        self.logger.time_end(LABEL);
        result
    }

    /// Open a cursor over the matching documents
    pub async fn find<T>(
        &self,
        collection_name: &str,
        filter: Document,
        options: Option<FindOptions>,
    ) -> MongoResult<Cursor<T>>
    where
        T: Send + Sync,
    {
        const LABEL: &str = "find documents";
        self.logger.time(LABEL);

        let collection = self.collection::<T>(collection_name);
        self.debug_with("find documents", || query_data(collection_name, &filter, None));
        let result = collection.find(filter).with_options(options).await;
        if let Err(e) = &result {
            self.log_failure(LABEL, collection_name, e);
        }

        self.logger.time_end(LABEL);
        result
    }

    /// Same as [`find`](Self::find), but drains the cursor
    pub async fn find_all<T>(
        &self,
        collection_name: &str,
        filter: Document,
        options: Option<FindOptions>,
    ) -> MongoResult<Vec<T>>
    where
        T: DeserializeOwned + Unpin + Send + Sync,
    {
        let mut cursor = self.find::<T>(collection_name, filter, options).await?;
        let mut documents = Vec::new();

        while let Some(document) = cursor.try_next().await? {
            documents.push(document);
        }

        Ok(documents)
    }

    pub async fn update_one(
        &self,
        collection_name: &str,
        filter: Document,
        update: Document,
    ) -> MongoResult<UpdateResult> {
        const LABEL: &str = "update a document";
        self.logger.time(LABEL);

        let data = self
            .logger
            .enabled_for(Level::Debug)
            .then(|| query_data(collection_name, &filter, Some(&update)));

        let collection = self.collection::<Document>(collection_name);
        let result = collection.update_one(filter, update).await;
        match &result {
            Ok(updated) => self.logger.debug(
                &update_one_message(updated.matched_count, updated.modified_count),
                data,
            ),
            Err(e) => self.log_failure(LABEL, collection_name, e),
        }

        self.logger.time_end(LABEL);
        result
    }

    pub async fn update_many(
        &self,
        collection_name: &str,
        filter: Document,
        update: Document,
    ) -> MongoResult<UpdateResult> {
        const LABEL: &str = "update documents";
        self.logger.time(LABEL);

        let data = self
            .logger
            .enabled_for(Level::Debug)
            .then(|| query_data(collection_name, &filter, Some(&update)));

        let collection = self.collection::<Document>(collection_name);
        let result = collection.update_many(filter, update).await;
        match &result {
            Ok(updated) => self
                .logger
                .debug(&update_many_message(updated.modified_count), data),
            Err(e) => self.log_failure(LABEL, collection_name, e),
        }

        self.logger.time_end(LABEL);
        result
    }

    pub async fn delete_one(
        &self,
        collection_name: &str,
        filter: Document,
    ) -> MongoResult<DeleteResult> {
        const LABEL: &str = "delete a document";
        self.logger.time(LABEL);

        let data = self
            .logger
            .enabled_for(Level::Debug)
            .then(|| query_data(collection_name, &filter, None));

        let collection = self.collection::<Document>(collection_name);
        let result = collection.delete_one(filter).await;
        match &result {
            Ok(deleted) => self.logger.debug(delete_one_message(deleted.deleted_count), data),
            Err(e) => self.log_failure(LABEL, collection_name, e),
        }

        self.logger.time_end(LABEL);
        result
    }

    pub async fn delete_many(
        &self,
        collection_name: &str,
        filter: Document,
    ) -> MongoResult<DeleteResult> {
        const LABEL: &str = "delete documents";
        self.logger.time(LABEL);

        let data = self
            .logger
            .enabled_for(Level::Debug)
            .then(|| query_data(collection_name, &filter, None));

        let collection = self.collection::<Document>(collection_name);
        let result = collection.delete_many(filter).await;
        match &result {
            Ok(deleted) => self
                .logger
                .debug(&delete_many_message(deleted.deleted_count), data),
            Err(e) => self.log_failure(LABEL, collection_name, e),
        }

        self.logger.time_end(LABEL);
        result
    }

    /// Emit a debug line, building its payload only when it would be written
    fn debug_with<F>(&self, message: &str, data: F)
    where
        F: FnOnce() -> Value,
    {
        if self.logger.enabled_for(Level::Debug) {
            self.logger.debug(message, Some(data()));
        }
    }

    fn log_failure(&self, operation: &str, collection_name: &str, err: &impl Display) {
        self.logger.error(
            &format!("{} failed", operation),
            Some(json!({ "collection": collection_name, "error": err.to_string() })),
        );
    }
}

fn insert_one_message(inserted_id: &Bson) -> String {
    format!("A document was inserted with the _id: {}", inserted_id)
}

fn inserted_message(inserted_count: i64) -> String {
    format!("{} documents were inserted", inserted_count)
}

fn update_one_message(matched_count: u64, modified_count: u64) -> String {
    format!(
        "{} document(s) matched the filter, updated {} document(s)",
        matched_count, modified_count
    )
}

fn update_many_message(modified_count: u64) -> String {
    format!("Updated {} documents", modified_count)
}

fn delete_many_message(deleted_count: u64) -> String {
    format!("Deleted {} documents", deleted_count)
}

fn delete_one_message(deleted_count: u64) -> &'static str {
    if deleted_count == 1 {
        "Successfully deleted one document."
    } else {
        "No documents matched the query. Deleted 0 documents."
    }
}

fn to_log_value<T: Serialize + ?Sized>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or_else(|e| {
        warn!("Failed to render log payload: {}", e);
        Value::Null
    })
}

/// The document's own fields plus the collection it went to
fn document_data<T: Serialize + ?Sized>(collection_name: &str, doc: &T) -> Value {
    let mut data = match to_log_value(doc) {
        Value::Object(fields) => fields,
        Value::Null => Map::new(),
        other => {
            let mut fields = Map::new();
            fields.insert("document".to_string(), other);
            fields
        }
    };
    data.insert(
        "collection".to_string(),
        Value::String(collection_name.to_string()),
    );
    Value::Object(data)
}

fn query_data(collection_name: &str, filter: &Document, update: Option<&Document>) -> Value {
    let mut data = json!({
        "collection": collection_name,
        "query": to_log_value(filter),
    });
    if let Some(update) = update {
        data["update"] = to_log_value(update);
    }
    data
}
