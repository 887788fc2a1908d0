// src/pipeline/loaders/reviews.rs

use crate::data_model::{collections, LoaderStats, Review};
use crate::error::Result;
use crate::pipeline::id_map::{external_key, IdMapper};
use crate::pipeline::loaders::{
    entity_outcome, reject_reason, run_rows, FieldError, LoaderContext, RowLoader, RowOutcome,
};
use crate::pipeline::parse::{date_field, field, float_field, int_field, str_field};
use crate::pipeline::readers::read_records;
use async_trait::async_trait;
use mongodb::bson::doc;
use serde_json::Value;
use std::path::Path;

const REVIEW_ID_KEYS: &[&str] = &["review_id", "ReviewId", "IdRecensione", "id"];
const PARENT_KEYS: &[&str] = &["PropertyId", "property_id", "booking_id"];
const VOTE_KEYS: &[&str] = &["Voto", "Vote", "vote"];
const TITLE_KEYS: &[&str] = &["Titolo Recensione", "TitleReview", "title"];
const POSITIVE_KEYS: &[&str] = &["Commento Positivo", "Positive", "positive"];
const NEGATIVE_KEYS: &[&str] = &["Commento Negativo", "Negative", "negative"];
const REVIEWER_KEYS: &[&str] = &["Nome", "NameReviewer", "reviewer"];
const NATIONALITY_KEYS: &[&str] = &["Nazionalità", "Nationality", "nationality"];
const ROOM_TYPE_KEYS: &[&str] = &["Tipologia Camera", "TypeRoom", "room_type"];
const LOS_KEYS: &[&str] = &["Durata Soggiorno", "LOS", "length_of_stay"];
const STAYING_DATE_KEYS: &[&str] = &["Data", "StayingDate", "staying_date"];
const TRAVELLER_KEYS: &[&str] = &["Tipologia Cliente", "TypeClient", "traveller_type"];

/// Valid review score range on the platform.
const VOTE_MIN: f64 = 1.0;
const VOTE_MAX: f64 = 10.0;

/// Loads guest reviews. Natural key: the external `review_id`, which also
/// deduplicates re-ingested exports.
pub struct ReviewLoader {
    properties: IdMapper,
}

impl ReviewLoader {
    pub async fn new(ctx: &LoaderContext<'_>) -> Result<Self> {
        let properties = IdMapper::load(ctx.store, collections::PROPERTIES, "booking_id").await?;
        Ok(ReviewLoader { properties })
    }

    pub async fn run(ctx: &LoaderContext<'_>, path: &Path) -> Result<LoaderStats> {
        let rows = read_records(path)?;
        let mut loader = ReviewLoader::new(ctx).await?;
        run_rows(&mut loader, ctx, &rows).await
    }
}

#[async_trait]
impl RowLoader for ReviewLoader {
    fn entity(&self) -> &'static str {
        "review"
    }

    fn collection(&self) -> &'static str {
        collections::REVIEWS
    }

    async fn map_row(&mut self, record: &Value) -> RowOutcome {
        let mut errors = Vec::new();
        let review_id = field(record, REVIEW_ID_KEYS).and_then(external_key);
        if review_id.is_none() {
            errors.push(FieldError::missing("review_id"));
        }
        let parent_key = field(record, PARENT_KEYS).and_then(external_key);
        if parent_key.is_none() {
            errors.push(FieldError::missing("property_id"));
        }
        let vote = float_field(record, VOTE_KEYS);
        match vote {
            None => errors.push(FieldError::missing("vote")),
            Some(v) if !(VOTE_MIN..=VOTE_MAX).contains(&v) => {
                errors.push(FieldError::new("vote", "rating out of bounds"))
            }
            Some(_) => {}
        }
        if !errors.is_empty() {
            return RowOutcome::Invalid {
                reason: reject_reason(&errors),
            };
        }
        let (review_id, parent_key, vote) = match (review_id, parent_key, vote) {
            (Some(r), Some(p), Some(v)) => (r, p, v),
            _ => unreachable!("required fields validated"),
        };

        let Some(property_id) = self.properties.resolve(&parent_key) else {
            return RowOutcome::Orphan {
                external_id: parent_key,
                parent: "property",
            };
        };

        let review = Review {
            review_id: review_id.clone(),
            property_id,
            vote,
            title: str_field(record, TITLE_KEYS),
            positive: str_field(record, POSITIVE_KEYS),
            negative: str_field(record, NEGATIVE_KEYS),
            reviewer: str_field(record, REVIEWER_KEYS),
            nationality: str_field(record, NATIONALITY_KEYS),
            room_type: str_field(record, ROOM_TYPE_KEYS),
            length_of_stay: int_field(record, LOS_KEYS),
            staying_date: date_field(record, STAYING_DATE_KEYS),
            traveller_type: str_field(record, TRAVELLER_KEYS),
        };
        let key = doc! { "review_id": &review_id };
        entity_outcome(key, &review, review_id)
    }
}
