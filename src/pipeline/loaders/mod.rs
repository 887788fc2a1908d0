// src/pipeline/loaders/mod.rs
//
// Shared per-entity loading machinery: every loader maps one raw row to a
// `RowOutcome`, and `run_rows` drives batching, upserts, reject routing,
// counters and the per-outcome diagnostic events.

pub mod cities;
pub mod properties;
pub mod rates;
pub mod reputation;
pub mod reviews;
pub mod rooms;

use crate::data_model::LoaderStats;
use crate::error::{EtlError, Result};
use crate::rejects::RejectSink;
use crate::store::{DocumentStore, Upserted};
use async_trait::async_trait;
use mongodb::bson::Document;
use serde_json::Value;
use std::fmt;
use tracing::{debug, info, warn};

pub use cities::CityLoader;
pub use properties::PropertyLoader;
pub use rates::RateLoader;
pub use reputation::ReputationLoader;
pub use reviews::ReviewLoader;
pub use rooms::RoomLoader;

/// Consecutive completely-failed batches tolerated before an entity's
/// loader escalates to a fatal store error.
const MAX_DEAD_BATCHES: u32 = 3;

/// Shared collaborators handed to every loader invocation.
pub struct LoaderContext<'a> {
    pub store: &'a dyn DocumentStore,
    pub rejects: &'a RejectSink,
    pub batch_size: usize,
}

/// A single field-level validation failure.
pub struct FieldError {
    pub field: &'static str,
    pub reason: String,
}

impl FieldError {
    pub fn missing(field: &'static str) -> Self {
        FieldError {
            field,
            reason: "required field missing".to_string(),
        }
    }

    pub fn new(field: &'static str, reason: impl Into<String>) -> Self {
        FieldError {
            field,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.reason)
    }
}

/// Joins field errors into a single reject reason.
pub fn reject_reason(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(FieldError::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Encodes a schema-valid entity for upsert; a BSON encoding failure
/// demotes the row to a validation reject instead of aborting the batch.
pub(crate) fn entity_outcome<T: serde::Serialize>(
    key: Document,
    entity: &T,
    id: String,
) -> RowOutcome {
    match mongodb::bson::to_document(entity) {
        Ok(doc) => RowOutcome::Upsert { key, doc, id },
        Err(e) => RowOutcome::Invalid {
            reason: format!("document encoding failed: {}", e),
        },
    }
}

/// Outcome of mapping one raw row, decided before any store write.
pub enum RowOutcome {
    /// Schema-valid entity, ready to upsert keyed by its natural key.
    Upsert {
        key: Document,
        doc: Document,
        /// Record identifier used in diagnostics.
        id: String,
    },
    /// Row rejected by parsing/validation; routed to the validation channel.
    Invalid { reason: String },
    /// Foreign key did not resolve; routed to the orphan channel.
    Orphan {
        external_id: String,
        parent: &'static str,
    },
    /// Row intentionally not loaded (not an error).
    Skip { reason: String },
}

/// One entity's raw-row mapping. Mapping is pure apart from the city
/// translator's per-run cache.
#[async_trait]
pub trait RowLoader: Send {
    fn entity(&self) -> &'static str;
    fn collection(&self) -> &'static str;
    async fn map_row(&mut self, record: &Value) -> RowOutcome;
}

/// A row with no usable content: an empty object, or every value null or
/// blank. CSV exports carry trailing all-empty lines; those are noise, not
/// validation failures.
fn blank_row(record: &Value) -> bool {
    match record.as_object() {
        Some(map) => map.values().all(|value| match value {
            Value::Null => true,
            Value::String(s) => s.trim().is_empty(),
            _ => false,
        }),
        None => false,
    }
}

/// Drives one loader over all rows: fixed-size batches, row-independent
/// upserts, reject routing and counters. Blank rows are skipped before
/// mapping. A store failure marks the batch failed but never blocks sibling
/// rows; an entity whose batches keep dying escalates to a fatal
/// `StoreDegraded`.
pub async fn run_rows(
    loader: &mut dyn RowLoader,
    ctx: &LoaderContext<'_>,
    rows: &[Value],
) -> Result<LoaderStats> {
    let entity = loader.entity();
    let mut stats = LoaderStats::default();
    let mut consecutive_dead = 0u32;
    let mut total_batches = 0u64;
    let mut dead_batches = 0u64;

    for batch in rows.chunks(ctx.batch_size.max(1)) {
        total_batches += 1;
        let mut attempted = 0u64;
        let mut failed = 0u64;
        for record in batch {
            let outcome = if blank_row(record) {
                RowOutcome::Skip {
                    reason: "blank row".to_string(),
                }
            } else {
                loader.map_row(record).await
            };
            match outcome {
                RowOutcome::Upsert { key, doc, id } => {
                    attempted += 1;
                    match ctx.store.upsert(loader.collection(), key, doc).await {
                        Ok(Upserted::Inserted) => {
                            stats.inserted += 1;
                            debug!(stage = entity, record = %id, "inserted");
                        }
                        Ok(Upserted::Replaced) => {
                            stats.replaced += 1;
                            debug!(stage = entity, record = %id, "replaced");
                        }
                        Err(e) => {
                            failed += 1;
                            stats.failed_rows += 1;
                            warn!(stage = entity, record = %id, error = %e, "store write failed");
                        }
                    }
                }
                RowOutcome::Invalid { reason } => {
                    stats.rejected += 1;
                    ctx.rejects.validation(entity, record, &reason).await?;
                    warn!(stage = entity, reason = %reason, "row rejected");
                }
                RowOutcome::Orphan {
                    external_id,
                    parent,
                } => {
                    stats.rejected += 1;
                    ctx.rejects.orphan(entity, &external_id, parent).await?;
                    warn!(
                        stage = entity,
                        record = %external_id,
                        parent,
                        "orphaned foreign key"
                    );
                }
                RowOutcome::Skip { reason } => {
                    stats.skipped += 1;
                    debug!(stage = entity, reason = %reason, "row skipped");
                }
            }
        }
        if failed > 0 {
            stats.failed_batches += 1;
            warn!(stage = entity, failed, attempted, "batch degraded");
        }
        // A batch is dead when every attempted write failed; sustained dead
        // batches mean the store is effectively down for this entity.
        if attempted > 0 && failed == attempted {
            dead_batches += 1;
            consecutive_dead += 1;
            if consecutive_dead >= MAX_DEAD_BATCHES {
                return Err(EtlError::StoreDegraded(format!(
                    "{}: {} consecutive batches failed entirely",
                    entity, consecutive_dead
                )));
            }
        } else {
            consecutive_dead = 0;
        }
    }

    if total_batches > 0 && dead_batches == total_batches && stats.failed_rows > 0 {
        return Err(EtlError::StoreDegraded(format!(
            "{}: every batch failed entirely ({} rows)",
            entity, stats.failed_rows
        )));
    }

    info!(
        stage = entity,
        inserted = stats.inserted,
        replaced = stats.replaced,
        skipped = stats.skipped,
        rejected = stats.rejected,
        "stage complete"
    );
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_blank_row_detection() {
        assert!(blank_row(&json!({})));
        assert!(blank_row(&json!({"Nome": "", "Stelle": "  ", "Città": null})));
        assert!(!blank_row(&json!({"Nome": "Hotel Uno", "Stelle": ""})));
        assert!(!blank_row(&json!({"Stelle": 0})));
        assert!(!blank_row(&json!("not an object")));
    }
}
