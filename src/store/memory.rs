// src/store/memory.rs

use crate::error::Result;
use crate::store::{DocumentStore, Upserted};
use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;
use mongodb::bson::{Bson, Document};
use std::collections::{HashMap, HashSet};
use tokio::sync::Mutex;

/// In-memory implementation of [`DocumentStore`] with the same upsert
/// semantics as the Mongo backend: filter by natural-key subset match,
/// preserve `_id` on replace, generate an `ObjectId` on insert. Backs the
/// integration tests; no persistence.
#[derive(Default)]
pub struct MemoryStore {
    collections: Mutex<HashMap<String, Vec<Document>>>,
    indexes: Mutex<HashMap<String, HashSet<String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents currently held in a collection.
    pub async fn count(&self, collection: &str) -> usize {
        self.collections
            .lock()
            .await
            .get(collection)
            .map(Vec::len)
            .unwrap_or(0)
    }

    /// Names of the unique indexes created on a collection.
    pub async fn index_names(&self, collection: &str) -> Vec<String> {
        self.indexes
            .lock()
            .await
            .get(collection)
            .map(|set| {
                let mut names: Vec<String> = set.iter().cloned().collect();
                names.sort();
                names
            })
            .unwrap_or_default()
    }
}

/// Exact subset match: every filter field must equal the document's field.
fn matches(doc: &Document, filter: &Document) -> bool {
    filter.iter().all(|(key, value)| doc.get(key) == Some(value))
}

fn project(doc: &Document, projection: &Document) -> Document {
    let mut out = Document::new();
    if let Some(id) = doc.get("_id") {
        out.insert("_id", id.clone());
    }
    for (key, _) in projection.iter() {
        if key == "_id" {
            continue;
        }
        if let Some(value) = doc.get(key) {
            out.insert(key, value.clone());
        }
    }
    out
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn upsert(&self, collection: &str, key: Document, mut doc: Document) -> Result<Upserted> {
        let mut collections = self.collections.lock().await;
        let docs = collections.entry(collection.to_string()).or_default();
        if let Some(existing) = docs.iter_mut().find(|d| matches(d, &key)) {
            // Replace-on-upsert keeps the original internal id.
            if let Some(id) = existing.get("_id") {
                doc.insert("_id", id.clone());
            }
            *existing = doc;
            Ok(Upserted::Replaced)
        } else {
            if !doc.contains_key("_id") {
                doc.insert("_id", Bson::ObjectId(ObjectId::new()));
            }
            docs.push(doc);
            Ok(Upserted::Inserted)
        }
    }

    async fn find_all(
        &self,
        collection: &str,
        projection: Option<Document>,
    ) -> Result<Vec<Document>> {
        let collections = self.collections.lock().await;
        let docs = collections.get(collection).cloned().unwrap_or_default();
        Ok(match projection {
            Some(fields) => docs.iter().map(|d| project(d, &fields)).collect(),
            None => docs,
        })
    }

    async fn delete_all(&self, collection: &str) -> Result<u64> {
        let mut collections = self.collections.lock().await;
        match collections.get_mut(collection) {
            Some(docs) => {
                let deleted = docs.len() as u64;
                docs.clear();
                Ok(deleted)
            }
            None => Ok(0),
        }
    }

    async fn drop_collection(&self, collection: &str) -> Result<()> {
        self.collections.lock().await.remove(collection);
        self.indexes.lock().await.remove(collection);
        Ok(())
    }

    async fn ensure_unique_index(&self, collection: &str, fields: &[&str]) -> Result<()> {
        self.indexes
            .lock()
            .await
            .entry(collection.to_string())
            .or_default()
            .insert(format!("{}_natural_key", fields.join("_")));
        Ok(())
    }
}
