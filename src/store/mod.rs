// src/store/mod.rs
//
// Document-store abstraction. `MongoStore` is the production backend; the
// `memory` module provides the same interface over process memory for tests
// and dry runs. One store is created per run and dropped at run end.

pub mod memory;

use crate::config::AppConfig;
use crate::error::Result;
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{doc, Document};
use mongodb::options::{ClientOptions, FindOptions, IndexOptions, ReplaceOptions};
use mongodb::{Client, Database, IndexModel};
use std::time::Duration;
use tracing::info;

pub use memory::MemoryStore;

/// Bounded timeout applied to server selection and connection establishment
/// so no store call blocks indefinitely.
const STORE_TIMEOUT: Duration = Duration::from_secs(10);

/// Outcome of an upsert keyed by natural key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upserted {
    Inserted,
    Replaced,
}

/// The store surface the loaders and maintenance utilities depend on.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Verifies connectivity.
    async fn ping(&self) -> Result<()>;

    /// Insert-or-replace keyed by the natural-key filter. Repeated calls
    /// with the same key never duplicate.
    async fn upsert(&self, collection: &str, key: Document, doc: Document) -> Result<Upserted>;

    /// Reads every document of a collection, optionally projected.
    async fn find_all(&self, collection: &str, projection: Option<Document>)
        -> Result<Vec<Document>>;

    /// Removes every document from a collection; returns the deleted count.
    async fn delete_all(&self, collection: &str) -> Result<u64>;

    /// Drops a collection entirely.
    async fn drop_collection(&self, collection: &str) -> Result<()>;

    /// Creates a unique index over the given fields if it does not exist.
    async fn ensure_unique_index(&self, collection: &str, fields: &[&str]) -> Result<()>;
}

/// MongoDB-backed store.
pub struct MongoStore {
    db: Database,
}

impl MongoStore {
    /// Builds a client from the configured connection string. Connection
    /// establishment is lazy; `ping` (or the first operation) surfaces an
    /// unreachable server.
    pub async fn connect(cfg: &AppConfig) -> Result<Self> {
        let mut options = ClientOptions::parse(&cfg.mongo_uri).await?;
        options.app_name = Some("StaySeeder".to_string());
        options.server_selection_timeout = Some(STORE_TIMEOUT);
        options.connect_timeout = Some(STORE_TIMEOUT);
        let client = Client::with_options(options)?;
        info!(database = %cfg.database, "store client created");
        Ok(MongoStore {
            db: client.database(&cfg.database),
        })
    }
}

#[async_trait]
impl DocumentStore for MongoStore {
    async fn ping(&self) -> Result<()> {
        self.db.run_command(doc! { "ping": 1 }, None).await?;
        Ok(())
    }

    async fn upsert(&self, collection: &str, key: Document, doc: Document) -> Result<Upserted> {
        let options = ReplaceOptions::builder().upsert(true).build();
        let result = self
            .db
            .collection::<Document>(collection)
            .replace_one(key, doc, options)
            .await?;
        if result.upserted_id.is_some() {
            Ok(Upserted::Inserted)
        } else {
            Ok(Upserted::Replaced)
        }
    }

    async fn find_all(
        &self,
        collection: &str,
        projection: Option<Document>,
    ) -> Result<Vec<Document>> {
        let options = FindOptions::builder().projection(projection).build();
        let cursor = self
            .db
            .collection::<Document>(collection)
            .find(doc! {}, options)
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn delete_all(&self, collection: &str) -> Result<u64> {
        let result = self
            .db
            .collection::<Document>(collection)
            .delete_many(doc! {}, None)
            .await?;
        Ok(result.deleted_count)
    }

    async fn drop_collection(&self, collection: &str) -> Result<()> {
        self.db.collection::<Document>(collection).drop(None).await?;
        Ok(())
    }

    async fn ensure_unique_index(&self, collection: &str, fields: &[&str]) -> Result<()> {
        let mut keys = Document::new();
        for field in fields {
            keys.insert(*field, 1);
        }
        let options = IndexOptions::builder()
            .unique(true)
            .name(format!("{}_natural_key", fields.join("_")))
            .build();
        let model = IndexModel::builder().keys(keys).options(options).build();
        self.db
            .collection::<Document>(collection)
            .create_index(model, None)
            .await?;
        Ok(())
    }
}
