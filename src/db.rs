use mongodb::bson::{doc, Document};
use mongodb::options::IndexOptions;
use mongodb::{Client, Database, IndexModel};

use crate::config::AppConfig;
use crate::models::{BOOTCAMPS, COURSES, REVIEWS, USERS};

pub async fn init_db(config: &AppConfig) -> Result<Database, mongodb::error::Error> {
    let client = Client::with_uri_str(&config.mongodb_uri).await?;

    // Ping the database to verify connection
    client
        .database("admin")
        .run_command(doc! {"ping": 1})
        .await?;

    log::info!("Successfully connected to MongoDB");

    Ok(client.database(&config.database_name))
}

/// Unique partial index capping non-admin publishers at one bootcamp
pub const SINGLE_PUBLISH_INDEX: &str = "bootcamps_single_publish";

/// Create the indexes the API relies on for uniqueness and geo queries
pub async fn ensure_indexes(db: &Database) -> Result<(), mongodb::error::Error> {
    let unique = || IndexOptions::builder().unique(true).build();

    let bootcamps = db.collection::<Document>(BOOTCAMPS);
    bootcamps
        .create_indexes([
            IndexModel::builder()
                .keys(doc! { "name": 1 })
                .options(unique())
                .build(),
            IndexModel::builder().keys(doc! { "slug": 1 }).build(),
            IndexModel::builder()
                .keys(doc! { "location": "2dsphere" })
                .build(),
            IndexModel::builder()
                .keys(doc! { "exclusive_owner": 1 })
                .options(
                    IndexOptions::builder()
                        .name(SINGLE_PUBLISH_INDEX.to_string())
                        .unique(true)
                        .partial_filter_expression(doc! { "exclusive_owner": { "$exists": true } })
                        .build(),
                )
                .build(),
        ])
        .await?;

    db.collection::<Document>(COURSES)
        .create_index(IndexModel::builder().keys(doc! { "bootcamp": 1 }).build())
        .await?;

    db.collection::<Document>(REVIEWS)
        .create_index(
            IndexModel::builder()
                .keys(doc! { "bootcamp": 1, "user": 1 })
                .options(unique())
                .build(),
        )
        .await?;

    db.collection::<Document>(USERS)
        .create_index(
            IndexModel::builder()
                .keys(doc! { "email": 1 })
                .options(unique())
                .build(),
        )
        .await?;

    log::info!("Database indexes ensured");
    Ok(())
}
