// src/pipeline/loaders/properties.rs

use crate::data_model::{collections, LoaderStats, Property};
use crate::error::Result;
use crate::pipeline::id_map::{external_key, IdMapper};
use crate::pipeline::loaders::{
    entity_outcome, reject_reason, run_rows, FieldError, LoaderContext, RowLoader, RowOutcome,
};
use crate::pipeline::parse::{field, float_field, int_field, str_field};
use crate::pipeline::readers::read_records;
use crate::pipeline::translate::CityTranslator;
use crate::pipeline::vocab::{AccommodationTier, PropertyCategory};
use async_trait::async_trait;
use mongodb::bson::doc;
use serde_json::Value;
use std::path::Path;
use tracing::debug;

const NAME_KEYS: &[&str] = &["Nome", "name"];
const BOOKING_ID_KEYS: &[&str] = &["id", "booking_id"];
const CITY_KEYS: &[&str] = &["Città", "city", "Destination"];
const TYPE_KEYS: &[&str] = &["Tipologia", "type_structure", "type"];
const STARS_KEYS: &[&str] = &["Stelle", "stars"];
const ADDRESS_KEYS: &[&str] = &["Indirizzo", "address"];
const DISTANCE_KEYS: &[&str] = &["DistanzaCentro", "distance_centre"];
const LAT_KEYS: &[&str] = &["LAT", "latitude"];
const LNG_KEYS: &[&str] = &["LNG", "longitude"];
const CIR_KEYS: &[&str] = &["Cir", "cir_cin"];
const ZONE_KEYS: &[&str] = &["Zona", "zone"];
const ROOMS_NUM_KEYS: &[&str] = &["numCamere", "rooms_num"];
const BEDS_NUM_KEYS: &[&str] = &["numLetti", "beds_num"];
const AMENITIES_KEYS: &[&str] = &["numServizi", "amenities_count"];
const URL_KEYS: &[&str] = &["url"];

/// Loads property listings. Natural key: `booking_id`. The city name is
/// translated and referenced into `Cities` when present there; an unknown
/// city keeps the row (with a diagnostic) since the city reference is
/// descriptive, not a hard foreign key.
pub struct PropertyLoader<'a> {
    translator: &'a mut CityTranslator,
    cities: IdMapper,
    source_locale: String,
}

impl<'a> PropertyLoader<'a> {
    pub async fn new(
        ctx: &LoaderContext<'_>,
        translator: &'a mut CityTranslator,
        source_locale: &str,
    ) -> Result<PropertyLoader<'a>> {
        let cities = IdMapper::load(ctx.store, collections::CITIES, "city").await?;
        Ok(PropertyLoader {
            translator,
            cities,
            source_locale: source_locale.to_string(),
        })
    }

    pub async fn run(
        ctx: &LoaderContext<'_>,
        path: &Path,
        translator: &'a mut CityTranslator,
        source_locale: &str,
    ) -> Result<LoaderStats> {
        let rows = read_records(path)?;
        let mut loader = PropertyLoader::new(ctx, translator, source_locale).await?;
        run_rows(&mut loader, ctx, &rows).await
    }
}

#[async_trait]
impl RowLoader for PropertyLoader<'_> {
    fn entity(&self) -> &'static str {
        "property"
    }

    fn collection(&self) -> &'static str {
        collections::PROPERTIES
    }

    async fn map_row(&mut self, record: &Value) -> RowOutcome {
        let mut errors = Vec::new();
        let name = str_field(record, NAME_KEYS);
        if name.is_none() {
            errors.push(FieldError::missing("name"));
        }
        let booking_id = field(record, BOOKING_ID_KEYS).and_then(external_key);
        if booking_id.is_none() {
            errors.push(FieldError::missing("booking_id"));
        }
        let city_raw = str_field(record, CITY_KEYS);
        if city_raw.is_none() {
            errors.push(FieldError::missing("city"));
        }
        if !errors.is_empty() {
            return RowOutcome::Invalid {
                reason: reject_reason(&errors),
            };
        }
        // Presence checked above.
        let (name, booking_id, city_raw) = match (name, booking_id, city_raw) {
            (Some(n), Some(b), Some(c)) => (n, b, c),
            _ => unreachable!("required fields validated"),
        };

        let city = self.translator.translate(&city_raw, &self.source_locale).await;
        let city_id = self.cities.resolve(&city);
        if city_id.is_none() {
            debug!(
                stage = "property",
                record = %booking_id,
                city = %city,
                "city not found in Cities, reference left unset"
            );
        }

        let type_label = str_field(record, TYPE_KEYS);
        let stars = int_field(record, STARS_KEYS);
        let amenities = int_field(record, AMENITIES_KEYS);

        let property = Property {
            booking_id: booking_id.clone(),
            name,
            city,
            city_id,
            address: str_field(record, ADDRESS_KEYS),
            zone: str_field(record, ZONE_KEYS),
            latitude: float_field(record, LAT_KEYS),
            longitude: float_field(record, LNG_KEYS),
            distance_centre: float_field(record, DISTANCE_KEYS),
            stars,
            category: type_label
                .as_deref()
                .map(PropertyCategory::from_label)
                .unwrap_or(PropertyCategory::Other),
            tier: AccommodationTier::classify(type_label.as_deref(), stars, amenities),
            rooms_num: int_field(record, ROOMS_NUM_KEYS),
            beds_num: int_field(record, BEDS_NUM_KEYS),
            cir_cin: str_field(record, CIR_KEYS),
            url: str_field(record, URL_KEYS),
        };
        let key = doc! { "booking_id": &booking_id };
        entity_outcome(key, &property, booking_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rejects::RejectSink;
    use crate::store::{DocumentStore, MemoryStore};
    use serde_json::json;
    use tempfile::tempdir;

    async fn run_over(rows: Vec<Value>) -> (MemoryStore, LoaderStats) {
        let store = MemoryStore::new();
        let dir = tempdir().expect("tempdir");
        let rejects = RejectSink::open(dir.path()).expect("sink");
        let ctx = LoaderContext {
            store: &store,
            rejects: &rejects,
            batch_size: 10,
        };
        let mut translator = CityTranslator::new("it", None);
        let mut loader = PropertyLoader::new(&ctx, &mut translator, "en")
            .await
            .expect("loader");
        let stats = run_rows(&mut loader, &ctx, &rows).await.expect("run");
        (store, stats)
    }

    #[tokio::test]
    async fn test_property_normalization() {
        let (store, stats) = run_over(vec![json!({
            "Nome": "Grand Hotel Duomo",
            "id": 100,
            "Città": "Milan",
            "Tipologia": "Hotel",
            "Stelle": "5",
            "DistanzaCentro": "150 m dal centro",
            "LAT": "45,4642",
        })])
        .await;
        assert_eq!(stats.inserted, 1);

        let docs = store
            .find_all(collections::PROPERTIES, None)
            .await
            .expect("find");
        let doc = &docs[0];
        assert_eq!(doc.get_str("city").expect("city"), "Milano");
        assert_eq!(doc.get_str("category").expect("category"), "hotel");
        // No tier keyword in the label, so the 5-star rating decides.
        assert_eq!(doc.get_str("tier").expect("tier"), "luxury");
        assert_eq!(doc.get_f64("distance_centre").expect("distance"), 150.0);
        assert_eq!(doc.get_f64("latitude").expect("lat"), 45.4642);
        // No Cities loaded: the reference stays unset, the row still loads.
        assert!(doc.get("city_id").is_none());
    }

    #[tokio::test]
    async fn test_missing_required_fields_rejected() {
        let (store, stats) = run_over(vec![
            json!({"Città": "Rome", "id": 7}),
            json!({"Nome": "Senza Id", "Città": "Rome"}),
        ])
        .await;
        assert_eq!(stats.rejected, 2);
        assert_eq!(store.count(collections::PROPERTIES).await, 0);
    }

    #[tokio::test]
    async fn test_unrecognized_type_gets_unknown_tier_not_dropped() {
        let (store, stats) = run_over(vec![json!({
            "Nome": "Struttura Misteriosa",
            "id": 8,
            "Città": "Bari",
            "Tipologia": "igloo",
        })])
        .await;
        assert_eq!(stats.inserted, 1);
        let docs = store
            .find_all(collections::PROPERTIES, None)
            .await
            .expect("find");
        assert_eq!(docs[0].get_str("tier").expect("tier"), "unknown");
        assert_eq!(docs[0].get_str("category").expect("category"), "other");
    }
}
