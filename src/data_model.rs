// src/data_model.rs
//
// Entity documents, one per normalized collection, plus the run counters
// the loaders return. Optional fields are skipped on serialization so the
// stored documents stay sparse.

use crate::pipeline::vocab::{AccommodationLevel, AccommodationTier, PropertyCategory};
use chrono::NaiveDateTime;
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// Collection names, one per entity.
pub mod collections {
    pub const CITIES: &str = "Cities";
    pub const PROPERTIES: &str = "Properties";
    pub const ROOMS: &str = "Rooms";
    pub const RATE_SNAPSHOTS: &str = "RateSnapshots";
    pub const REVIEWS: &str = "Reviews";
    pub const REPUTATION_KPI: &str = "ReputationKpi";
}

/// City metadata. Natural key: original name + country; the translated
/// name is data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct City {
    pub city: String,
    pub city_original: String,
    pub country: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
}

/// Property listing. Natural key: `booking_id` (the external platform id,
/// kept in its canonical string rendering so numeric and alphanumeric ids
/// coexist).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Property {
    pub booking_id: String,
    pub name: String,
    pub city: String,
    /// Reference into `Cities`; absent when the city is not loaded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city_id: Option<ObjectId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_centre: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stars: Option<i64>,
    pub category: PropertyCategory,
    /// Never absent: unresolvable input classifies as `unknown`.
    pub tier: AccommodationTier,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rooms_num: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub beds_num: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cir_cin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Structured room capacity.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Occupancy {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub adults: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub beds: Option<i64>,
}

/// Room inventory unit. Natural key: `unique_room_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
    pub unique_room_id: String,
    pub room_name: String,
    pub property_id: ObjectId,
    pub level: AccommodationLevel,
    pub occupancy: Occupancy,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room_size: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bed_desc: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_search: Option<NaiveDateTime>,
}

/// Best-available-rate snapshot. Natural key: (`property_id`, `date_search`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateSnapshot {
    pub property_id: ObjectId,
    pub date_search: NaiveDateTime,
    pub price_total: f64,
    pub currency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_night: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check_in: Option<NaiveDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check_out: Option<NaiveDateTime>,
    pub is_offer: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offer_discount_percent: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancellation_policy: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub treatment: Option<String>,
    pub level: AccommodationLevel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rooms_left: Option<i64>,
}

/// Guest review. Natural key: `review_id`. Vote is bounded to 1.0..=10.0 at
/// validation time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    pub review_id: String,
    pub property_id: ObjectId,
    pub vote: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub positive: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub negative: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviewer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nationality: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub length_of_stay: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub staying_date: Option<NaiveDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub traveller_type: Option<String>,
}

/// Per-property reputation aggregate, recomputed from the stored reviews on
/// every run. Natural key: `property_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReputationKpi {
    pub property_id: ObjectId,
    pub review_count: i64,
    pub mean_vote: f64,
    /// Bayesian-weighted mean: prior is the run-global mean with weight 10,
    /// so low-volume properties regress towards the overall average.
    pub weighted_vote: f64,
    pub computed_at: NaiveDateTime,
}

/// Run-level counters for one entity loader. Threaded through explicitly
/// and returned per invocation, never kept as module state.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LoaderStats {
    pub inserted: u64,
    pub replaced: u64,
    pub skipped: u64,
    pub rejected: u64,
    /// Rows whose store write failed.
    pub failed_rows: u64,
    /// Batches containing at least one failed write.
    pub failed_batches: u64,
}

impl LoaderStats {
    /// Rows that reached the store (insert or replace-on-upsert).
    pub fn upserted(&self) -> u64 {
        self.inserted + self.replaced
    }

    pub fn degraded(&self) -> bool {
        self.failed_batches > 0
    }
}

/// Per-stage result inside a [`RunSummary`].
#[derive(Debug, Clone, Serialize)]
pub struct StageSummary {
    pub entity: String,
    pub stats: LoaderStats,
}

/// Final per-entity summary of an orchestrated run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub stages: Vec<StageSummary>,
}

impl RunSummary {
    pub fn push(&mut self, entity: &str, stats: LoaderStats) {
        self.stages.push(StageSummary {
            entity: entity.to_string(),
            stats,
        });
    }

    pub fn stage(&self, entity: &str) -> Option<&LoaderStats> {
        self.stages
            .iter()
            .find(|s| s.entity == entity)
            .map(|s| &s.stats)
    }

    /// True when any stage had failed batches.
    pub fn degraded(&self) -> bool {
        self.stages.iter().any(|s| s.stats.degraded())
    }
}
