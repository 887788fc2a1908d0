// src/pipeline/loaders/rates.rs

use crate::data_model::{collections, LoaderStats, RateSnapshot};
use crate::error::Result;
use crate::pipeline::id_map::{external_key, IdMapper};
use crate::pipeline::loaders::{
    entity_outcome, reject_reason, run_rows, FieldError, LoaderContext, RowLoader, RowOutcome,
};
use crate::pipeline::parse::{date_field, field, float_field, int_field, str_field};
use crate::pipeline::readers::read_records;
use crate::pipeline::vocab::AccommodationLevel;
use async_trait::async_trait;
use mongodb::bson::{doc, to_bson};
use serde_json::Value;
use std::path::Path;

const PARENT_KEYS: &[&str] = &["PropertyId", "property_id", "booking_id"];
const DATE_KEYS: &[&str] = &["DateSearch", "FullDateSearch", "date_search"];
const PRICE_TOT_KEYS: &[&str] = &["PriceTot", "price_total"];
const PRICE_NIGHT_KEYS: &[&str] = &["PriceNight", "price_night"];
const CHECK_IN_KEYS: &[&str] = &["CheckIn", "check_in"];
const CHECK_OUT_KEYS: &[&str] = &["CheckOut", "check_out"];
const CURRENCY_KEYS: &[&str] = &["Valuta", "currency"];
const IS_OFFER_KEYS: &[&str] = &["IsOffer", "is_offer"];
const DISCOUNT_KEYS: &[&str] = &["OfferDiscountPercent", "offer_discount_percent"];
const POLICY_KEYS: &[&str] = &["CancellationPolicy", "cancellation_policy"];
const TREATMENT_KEYS: &[&str] = &["Treatment", "treatment"];
const LEVEL_KEYS: &[&str] = &["AccomodationLevel", "AccomodationType", "level"];
const ROOMS_LEFT_KEYS: &[&str] = &["RoomsBARLeft", "rooms_left"];

/// Default currency for the Italian market scrapes.
const DEFAULT_CURRENCY: &str = "EUR";

/// Loads best-available-rate snapshots. Natural key: (`property_id`,
/// `date_search`), so re-ingesting the same search day replaces instead of
/// duplicating.
pub struct RateLoader {
    properties: IdMapper,
}

impl RateLoader {
    pub async fn new(ctx: &LoaderContext<'_>) -> Result<Self> {
        let properties = IdMapper::load(ctx.store, collections::PROPERTIES, "booking_id").await?;
        Ok(RateLoader { properties })
    }

    pub async fn run(ctx: &LoaderContext<'_>, path: &Path) -> Result<LoaderStats> {
        let rows = read_records(path)?;
        let mut loader = RateLoader::new(ctx).await?;
        run_rows(&mut loader, ctx, &rows).await
    }
}

fn bool_field(record: &Value, keys: &[&str]) -> bool {
    match field(record, keys) {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => {
            matches!(s.trim().to_lowercase().as_str(), "true" | "yes" | "si" | "sì" | "1")
        }
        Some(Value::Number(n)) => n.as_i64() == Some(1),
        _ => false,
    }
}

#[async_trait]
impl RowLoader for RateLoader {
    fn entity(&self) -> &'static str {
        "rate_snapshot"
    }

    fn collection(&self) -> &'static str {
        collections::RATE_SNAPSHOTS
    }

    async fn map_row(&mut self, record: &Value) -> RowOutcome {
        let mut errors = Vec::new();
        let parent_key = field(record, PARENT_KEYS).and_then(external_key);
        if parent_key.is_none() {
            errors.push(FieldError::missing("property_id"));
        }
        let date_search = date_field(record, DATE_KEYS);
        if date_search.is_none() {
            errors.push(FieldError::missing("date_search"));
        }
        let price_total = float_field(record, PRICE_TOT_KEYS);
        match price_total {
            None => errors.push(FieldError::missing("price_total")),
            Some(p) if p <= 0.0 => {
                errors.push(FieldError::new("price_total", "price must be positive"))
            }
            Some(_) => {}
        }
        if !errors.is_empty() {
            return RowOutcome::Invalid {
                reason: reject_reason(&errors),
            };
        }
        let (parent_key, date_search, price_total) = match (parent_key, date_search, price_total) {
            (Some(p), Some(d), Some(t)) => (p, d, t),
            _ => unreachable!("required fields validated"),
        };

        let Some(property_id) = self.properties.resolve(&parent_key) else {
            return RowOutcome::Orphan {
                external_id: parent_key,
                parent: "property",
            };
        };

        let snapshot = RateSnapshot {
            property_id,
            date_search,
            price_total,
            currency: str_field(record, CURRENCY_KEYS)
                .map(|c| c.to_uppercase())
                .unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
            price_night: float_field(record, PRICE_NIGHT_KEYS),
            check_in: date_field(record, CHECK_IN_KEYS),
            check_out: date_field(record, CHECK_OUT_KEYS),
            is_offer: bool_field(record, IS_OFFER_KEYS),
            offer_discount_percent: float_field(record, DISCOUNT_KEYS),
            cancellation_policy: str_field(record, POLICY_KEYS),
            treatment: str_field(record, TREATMENT_KEYS),
            level: str_field(record, LEVEL_KEYS)
                .as_deref()
                .map(AccommodationLevel::from_label)
                .unwrap_or(AccommodationLevel::Other),
            rooms_left: int_field(record, ROOMS_LEFT_KEYS),
        };
        let date_bson = match to_bson(&date_search) {
            Ok(b) => b,
            Err(e) => {
                return RowOutcome::Invalid {
                    reason: format!("date_search encoding failed: {}", e),
                }
            }
        };
        let key = doc! { "property_id": property_id, "date_search": date_bson };
        let id = format!("{}@{}", parent_key, date_search.format("%Y-%m-%d"));
        entity_outcome(key, &snapshot, id)
    }
}
