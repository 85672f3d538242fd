use anyhow::Result;
use bson::{doc, Document};
use clap::Parser;
use env_logger::Env;
use log::info;
use std::sync::Arc;
use uuid::Uuid;

use mongo_facade::config::{Config, DEFAULT_CONFIG_PATH};
use mongo_facade::{BulkOperation, LoggerClient, MongoDbClient};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Overrides `log_level` from the config file
    #[arg(long)]
    log_level: Option<String>,

    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: String,

    /// Run an insert/find/update/delete round trip after connecting
    #[arg(long)]
    demo: bool,

    #[arg(long, default_value = "movies")]
    collection: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Parse command line arguments, load config and setup logging
    let args = Args::parse();
    let config = Config::load_or_env(&args.config);
    let log_level = config.logger.level_filter(args.log_level.as_deref());
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level.to_string())).init();
    info!("Configuration loaded: {:?}", config);

    let logger = Arc::new(LoggerClient::from_config(&config.logger));
    let client = MongoDbClient::init(&config.database, logger).await?;

    client.connect().await?;

    if args.demo {
        run_demo(&client, &args.collection).await?;
    }

    client.close().await?;
    Ok(())
}

async fn run_demo(client: &MongoDbClient, collection: &str) -> Result<()> {
    let id = Uuid::new_v4().to_string();
    let movie = doc! {
        "_id": &id,
        "title": "any",
        "plot": "any",
        "type": "movie",
        "year": 100,
        "imdb": { "id": 1, "rating": 10, "votes": 100 },
    };

    client.insert_one(collection, &movie).await?;

    let found = client
        .find_one::<Document>(collection, doc! { "_id": &id }, None)
        .await?;
    info!("Found movie: {:?}", found);

    client
        .update_one(
            collection,
            doc! { "_id": &id },
            doc! { "$set": { "title": "any_updated", "type": "series" } },
        )
        .await?;

    let extra_id = Uuid::new_v4().to_string();
    let summary = client
        .bulk_write(
            collection,
            vec![
                BulkOperation::insert_one(doc! { "_id": &extra_id, "title": "bulk" }),
                BulkOperation::delete_one(doc! { "_id": &extra_id }),
            ],
        )
        .await?;
    info!(
        "Bulk write inserted {} and deleted {} documents",
        summary.inserted_count, summary.deleted_count
    );

    let remaining = client
        .find_all::<Document>(collection, doc! { "_id": &id }, None)
        .await?;
    info!("{} matching movie(s) before cleanup", remaining.len());

    client.delete_one(collection, doc! { "_id": &id }).await?;
    Ok(())
}
