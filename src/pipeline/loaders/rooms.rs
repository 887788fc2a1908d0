// src/pipeline/loaders/rooms.rs

use crate::data_model::{collections, LoaderStats, Occupancy, Room};
use crate::error::Result;
use crate::pipeline::id_map::{external_key, IdMapper};
use crate::pipeline::loaders::{
    entity_outcome, reject_reason, run_rows, FieldError, LoaderContext, RowLoader, RowOutcome,
};
use crate::pipeline::parse::{date_field, field, int_field, str_field};
use crate::pipeline::readers::read_records;
use crate::pipeline::vocab::{occupancy_from_label, AccommodationLevel};
use async_trait::async_trait;
use mongodb::bson::doc;
use serde_json::Value;
use std::path::Path;

const ROOM_ID_KEYS: &[&str] = &["uniqueRoomId", "unique_room_id"];
const ROOM_NAME_KEYS: &[&str] = &["roomName", "room_name"];
const PARENT_KEYS: &[&str] = &["PropertyId", "property_id", "booking_id"];
const ROOM_SIZE_KEYS: &[&str] = &["roomSize", "room_size"];
const ADULTS_KEYS: &[&str] = &["OccupancyAdult", "adults"];
const CHILDREN_KEYS: &[&str] = &["OccupancyKid", "children"];
const BEDS_KEYS: &[&str] = &["numLetti", "beds"];
const BED_DESC_KEYS: &[&str] = &["BedDesc", "bed_desc"];
const LEVEL_KEYS: &[&str] = &["MainType", "SubType", "room_type"];
const QUANTITY_KEYS: &[&str] = &["Quantity", "quantity"];
const DATE_KEYS: &[&str] = &["FullDateSearch", "date_search"];

/// Loads room inventory. Natural key: `unique_room_id`. Each row references
/// its parent property by external id; an unresolvable parent rejects the
/// row to the orphan channel rather than inserting a dangling reference.
pub struct RoomLoader {
    properties: IdMapper,
}

impl RoomLoader {
    pub async fn new(ctx: &LoaderContext<'_>) -> Result<Self> {
        let properties = IdMapper::load(ctx.store, collections::PROPERTIES, "booking_id").await?;
        Ok(RoomLoader { properties })
    }

    pub async fn run(ctx: &LoaderContext<'_>, path: &Path) -> Result<LoaderStats> {
        let rows = read_records(path)?;
        let mut loader = RoomLoader::new(ctx).await?;
        run_rows(&mut loader, ctx, &rows).await
    }
}

#[async_trait]
impl RowLoader for RoomLoader {
    fn entity(&self) -> &'static str {
        "room"
    }

    fn collection(&self) -> &'static str {
        collections::ROOMS
    }

    async fn map_row(&mut self, record: &Value) -> RowOutcome {
        let mut errors = Vec::new();
        let unique_room_id = str_field(record, ROOM_ID_KEYS);
        if unique_room_id.is_none() {
            errors.push(FieldError::missing("unique_room_id"));
        }
        let room_name = str_field(record, ROOM_NAME_KEYS);
        if room_name.is_none() {
            errors.push(FieldError::missing("room_name"));
        }
        let parent_key = field(record, PARENT_KEYS).and_then(external_key);
        if parent_key.is_none() {
            errors.push(FieldError::missing("property_id"));
        }
        if !errors.is_empty() {
            return RowOutcome::Invalid {
                reason: reject_reason(&errors),
            };
        }
        let (unique_room_id, room_name, parent_key) =
            match (unique_room_id, room_name, parent_key) {
                (Some(i), Some(n), Some(p)) => (i, n, p),
                _ => unreachable!("required fields validated"),
            };

        let Some(property_id) = self.properties.resolve(&parent_key) else {
            return RowOutcome::Orphan {
                external_id: parent_key,
                parent: "property",
            };
        };

        let level_label = str_field(record, LEVEL_KEYS).unwrap_or_else(|| room_name.clone());
        let adults =
            int_field(record, ADULTS_KEYS).or_else(|| occupancy_from_label(&level_label));
        let room = Room {
            unique_room_id: unique_room_id.clone(),
            room_name,
            property_id,
            level: AccommodationLevel::from_label(&level_label),
            occupancy: Occupancy {
                adults,
                children: int_field(record, CHILDREN_KEYS),
                beds: int_field(record, BEDS_KEYS),
            },
            room_size: int_field(record, ROOM_SIZE_KEYS),
            bed_desc: str_field(record, BED_DESC_KEYS),
            quantity: int_field(record, QUANTITY_KEYS),
            date_search: date_field(record, DATE_KEYS),
        };
        let key = doc! { "unique_room_id": &unique_room_id };
        entity_outcome(key, &room, unique_room_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rejects::RejectSink;
    use crate::store::{DocumentStore, MemoryStore};
    use serde_json::json;
    use tempfile::tempdir;

    async fn store_with_property(booking_id: i64) -> MemoryStore {
        let store = MemoryStore::new();
        store
            .upsert(
                collections::PROPERTIES,
                doc! { "booking_id": booking_id },
                doc! { "booking_id": booking_id, "name": "Hotel Test" },
            )
            .await
            .expect("seed property");
        store
    }

    #[tokio::test]
    async fn test_room_resolves_parent_and_occupancy() {
        let store = store_with_property(100).await;
        let dir = tempdir().expect("tempdir");
        let rejects = RejectSink::open(dir.path()).expect("sink");
        let ctx = LoaderContext {
            store: &store,
            rejects: &rejects,
            batch_size: 10,
        };
        let mut loader = RoomLoader::new(&ctx).await.expect("loader");
        let rows = vec![json!({
            "uniqueRoomId": "100-12",
            "roomName": "Camera Matrimoniale",
            "PropertyId": 100,
            "Quantity": "3",
        })];
        let stats = run_rows(&mut loader, &ctx, &rows).await.expect("run");
        assert_eq!(stats.inserted, 1);

        let docs = store.find_all(collections::ROOMS, None).await.expect("find");
        let doc = &docs[0];
        assert_eq!(doc.get_str("level").expect("level"), "rooms");
        let occupancy = doc.get_document("occupancy").expect("occupancy");
        // No numeric capacity in the row: the label supplies it.
        assert_eq!(occupancy.get_i64("adults").expect("adults"), 2);
        assert!(doc.get_object_id("property_id").is_ok());
    }

    #[tokio::test]
    async fn test_orphan_room_rejected_not_inserted() {
        let store = store_with_property(100).await;
        let dir = tempdir().expect("tempdir");
        let rejects = RejectSink::open(dir.path()).expect("sink");
        let ctx = LoaderContext {
            store: &store,
            rejects: &rejects,
            batch_size: 10,
        };
        let mut loader = RoomLoader::new(&ctx).await.expect("loader");
        let rows = vec![json!({
            "uniqueRoomId": "999-1",
            "roomName": "Camera Fantasma",
            "PropertyId": 999,
        })];
        let stats = run_rows(&mut loader, &ctx, &rows).await.expect("run");
        assert_eq!(stats.rejected, 1);
        assert_eq!(store.count(collections::ROOMS).await, 0);
    }
}
