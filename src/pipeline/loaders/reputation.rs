// src/pipeline/loaders/reputation.rs

use crate::data_model::{collections, LoaderStats, ReputationKpi};
use crate::error::{EtlError, Result};
use crate::pipeline::loaders::LoaderContext;
use crate::store::Upserted;
use mongodb::bson::oid::ObjectId;
use mongodb::bson::{doc, to_document, Bson};
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Prior weight of the run-global mean in the Bayesian-weighted score. Low
/// review counts regress towards the overall average instead of letting a
/// single 10 dominate.
const PRIOR_WEIGHT: f64 = 10.0;

/// Recomputes one reputation aggregate per property from the stored
/// reviews. Unlike the row loaders it has no raw input: each run reads the
/// `Reviews` collection back and overwrites the per-property KPI documents.
/// Properties with zero reviews produce no document.
pub struct ReputationLoader;

impl ReputationLoader {
    pub async fn run(ctx: &LoaderContext<'_>) -> Result<LoaderStats> {
        let reviews = ctx
            .store
            .find_all(
                collections::REVIEWS,
                Some(doc! { "property_id": 1, "vote": 1 }),
            )
            .await?;

        let mut votes_by_property: HashMap<ObjectId, Vec<f64>> = HashMap::new();
        let mut vote_sum = 0.0;
        let mut vote_count = 0u64;
        for review in &reviews {
            let property_id = match review.get("property_id") {
                Some(Bson::ObjectId(id)) => *id,
                _ => continue,
            };
            let vote = match review.get("vote") {
                Some(Bson::Double(v)) => *v,
                Some(Bson::Int32(v)) => f64::from(*v),
                Some(Bson::Int64(v)) => *v as f64,
                _ => continue,
            };
            votes_by_property.entry(property_id).or_default().push(vote);
            vote_sum += vote;
            vote_count += 1;
        }

        let mut stats = LoaderStats::default();
        if votes_by_property.is_empty() {
            info!(stage = "reputation_kpi", "no reviews stored, nothing to aggregate");
            return Ok(stats);
        }
        let global_mean = vote_sum / vote_count as f64;
        let computed_at = chrono::Utc::now().naive_utc();

        let total = votes_by_property.len() as u64;
        for (property_id, votes) in votes_by_property {
            let count = votes.len() as i64;
            let sum: f64 = votes.iter().sum();
            let mean = sum / count as f64;
            let kpi = ReputationKpi {
                property_id,
                review_count: count,
                mean_vote: mean,
                weighted_vote: (global_mean * PRIOR_WEIGHT + sum) / (PRIOR_WEIGHT + count as f64),
                computed_at,
            };
            let key = doc! { "property_id": property_id };
            match ctx
                .store
                .upsert(collections::REPUTATION_KPI, key, to_document(&kpi)?)
                .await
            {
                Ok(Upserted::Inserted) => {
                    stats.inserted += 1;
                    debug!(stage = "reputation_kpi", record = %property_id, "inserted");
                }
                Ok(Upserted::Replaced) => {
                    stats.replaced += 1;
                    debug!(stage = "reputation_kpi", record = %property_id, "replaced");
                }
                Err(e) => {
                    stats.failed_rows += 1;
                    warn!(stage = "reputation_kpi", record = %property_id, error = %e, "store write failed");
                }
            }
        }
        if stats.failed_rows > 0 {
            stats.failed_batches = 1;
            if stats.failed_rows == total {
                return Err(EtlError::StoreDegraded(format!(
                    "reputation_kpi: every aggregate write failed ({} properties)",
                    total
                )));
            }
        }
        info!(
            stage = "reputation_kpi",
            inserted = stats.inserted,
            replaced = stats.replaced,
            "stage complete"
        );
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rejects::RejectSink;
    use crate::store::{DocumentStore, MemoryStore};
    use tempfile::tempdir;

    async fn seed_review(store: &MemoryStore, review_id: &str, property_id: ObjectId, vote: f64) {
        store
            .upsert(
                collections::REVIEWS,
                doc! { "review_id": review_id },
                doc! { "review_id": review_id, "property_id": property_id, "vote": vote },
            )
            .await
            .expect("seed review");
    }

    #[tokio::test]
    async fn test_kpi_count_matches_reviews_and_zero_review_property_skipped() {
        let store = MemoryStore::new();
        let with_reviews = ObjectId::new();
        // A second property exists but has no reviews: no KPI document.
        let _without_reviews = ObjectId::new();
        seed_review(&store, "rv-1", with_reviews, 8.0).await;
        seed_review(&store, "rv-2", with_reviews, 6.0).await;

        let dir = tempdir().expect("tempdir");
        let rejects = RejectSink::open(dir.path()).expect("sink");
        let ctx = LoaderContext {
            store: &store,
            rejects: &rejects,
            batch_size: 10,
        };
        let stats = ReputationLoader::run(&ctx).await.expect("run");
        assert_eq!(stats.inserted, 1);

        let kpis = store
            .find_all(collections::REPUTATION_KPI, None)
            .await
            .expect("find");
        assert_eq!(kpis.len(), 1);
        let kpi = &kpis[0];
        assert_eq!(kpi.get_i64("review_count").expect("count"), 2);
        assert_eq!(kpi.get_f64("mean_vote").expect("mean"), 7.0);
        // Global mean is also 7.0 here, so the weighted score collapses to it.
        assert_eq!(kpi.get_f64("weighted_vote").expect("weighted"), 7.0);
    }

    #[tokio::test]
    async fn test_rerun_replaces_aggregates() {
        let store = MemoryStore::new();
        let property = ObjectId::new();
        seed_review(&store, "rv-1", property, 9.0).await;

        let dir = tempdir().expect("tempdir");
        let rejects = RejectSink::open(dir.path()).expect("sink");
        let ctx = LoaderContext {
            store: &store,
            rejects: &rejects,
            batch_size: 10,
        };
        let first = ReputationLoader::run(&ctx).await.expect("first run");
        assert_eq!(first.inserted, 1);

        seed_review(&store, "rv-2", property, 5.0).await;
        let second = ReputationLoader::run(&ctx).await.expect("second run");
        assert_eq!(second.replaced, 1);

        let kpis = store
            .find_all(collections::REPUTATION_KPI, None)
            .await
            .expect("find");
        assert_eq!(kpis.len(), 1);
        assert_eq!(kpis[0].get_i64("review_count").expect("count"), 2);
    }
}
