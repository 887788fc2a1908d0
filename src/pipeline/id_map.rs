// src/pipeline/id_map.rs

use crate::error::Result;
use crate::store::DocumentStore;
use mongodb::bson::oid::ObjectId;
use mongodb::bson::{Bson, Document};
use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;

/// In-memory mapping from external platform identifiers to internal
/// document ids, built by scanning a parent collection once per dependent
/// loader run. Rebuilding at stage start makes intra-run parent insertions
/// visible to the children loaded afterwards.
pub struct IdMapper {
    collection: String,
    map: HashMap<String, ObjectId>,
}

impl IdMapper {
    /// Scans `collection`, indexing `_id` by the external-id field.
    pub async fn load(
        store: &dyn DocumentStore,
        collection: &str,
        external_field: &str,
    ) -> Result<Self> {
        let mut projection = Document::new();
        projection.insert("_id", 1);
        projection.insert(external_field, 1);
        let docs = store.find_all(collection, Some(projection)).await?;

        let mut map = HashMap::new();
        for doc in &docs {
            let id = match doc.get("_id") {
                Some(Bson::ObjectId(id)) => *id,
                _ => continue,
            };
            if let Some(key) = doc.get(external_field).and_then(bson_key) {
                map.insert(key, id);
            }
        }
        debug!(collection, entries = map.len(), "id map loaded");
        Ok(IdMapper {
            collection: collection.to_string(),
            map,
        })
    }

    /// `resolve(external_id) -> internal_id | NotFound`.
    pub fn resolve(&self, external_id: &str) -> Option<ObjectId> {
        self.map.get(external_id).copied()
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// Canonical string rendering of an external-id value stored in BSON.
/// Integers render in decimal so `"100"` and `100` resolve identically.
fn bson_key(value: &Bson) -> Option<String> {
    match value {
        Bson::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Bson::Int32(i) => Some(i.to_string()),
        Bson::Int64(i) => Some(i.to_string()),
        Bson::Double(d) if d.fract() == 0.0 => Some((*d as i64).to_string()),
        _ => None,
    }
}

/// Canonical string rendering of an external-id value in a raw JSON row,
/// matching [`bson_key`] so lookups line up across representations.
pub fn external_key(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => n
            .as_i64()
            .map(|i| i.to_string())
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| (f as i64).to_string())),
        _ => None,
    }
}
