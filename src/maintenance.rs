// src/maintenance.rs
//
// Store maintenance: pre-flight connectivity/index checks and the
// collection purge used to reset state between test runs.

use crate::data_model::collections;
use crate::error::{EtlError, Result};
use crate::store::DocumentStore;
use tracing::info;

/// Natural-key definition for one collection.
pub struct CollectionSpec {
    pub name: &'static str,
    pub natural_key: &'static [&'static str],
}

/// Every managed collection with its natural key. Unique indexes over these
/// keys make upsert-by-natural-key safe and idempotent.
pub const COLLECTIONS: &[CollectionSpec] = &[
    CollectionSpec {
        name: collections::CITIES,
        natural_key: &["city_original", "country"],
    },
    CollectionSpec {
        name: collections::PROPERTIES,
        natural_key: &["booking_id"],
    },
    CollectionSpec {
        name: collections::ROOMS,
        natural_key: &["unique_room_id"],
    },
    CollectionSpec {
        name: collections::RATE_SNAPSHOTS,
        natural_key: &["property_id", "date_search"],
    },
    CollectionSpec {
        name: collections::REVIEWS,
        natural_key: &["review_id"],
    },
    CollectionSpec {
        name: collections::REPUTATION_KPI,
        natural_key: &["property_id"],
    },
];

/// Verifies connectivity and creates the unique natural-key indexes.
/// Idempotent: existing indexes are left alone.
pub async fn preflight(store: &dyn DocumentStore) -> Result<()> {
    store.ping().await?;
    for spec in COLLECTIONS {
        store.ensure_unique_index(spec.name, spec.natural_key).await?;
        info!(collection = spec.name, key = ?spec.natural_key, "natural-key index ensured");
    }
    Ok(())
}

/// Removes all documents from the named collections (optionally dropping
/// them). Only managed collection names are accepted, so a typo cannot
/// purge an unrelated collection. Returns the total deleted count.
pub async fn purge(store: &dyn DocumentStore, names: &[String], drop: bool) -> Result<u64> {
    for name in names {
        if !COLLECTIONS.iter().any(|spec| spec.name == name) {
            return Err(EtlError::Config(format!(
                "unknown collection '{}'; managed collections: {}",
                name,
                COLLECTIONS
                    .iter()
                    .map(|s| s.name)
                    .collect::<Vec<_>>()
                    .join(", ")
            )));
        }
    }
    let mut total = 0;
    for name in names {
        let deleted = store.delete_all(name).await?;
        total += deleted;
        if drop {
            store.drop_collection(name).await?;
        }
        info!(collection = %name, deleted, dropped = drop, "collection purged");
    }
    Ok(total)
}
