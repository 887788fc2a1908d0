// src/pipeline/loaders/cities.rs

use crate::data_model::{collections, City, LoaderStats};
use crate::error::Result;
use crate::pipeline::loaders::{
    entity_outcome, reject_reason, run_rows, FieldError, LoaderContext, RowLoader, RowOutcome,
};
use crate::pipeline::parse::str_field;
use crate::pipeline::readers::read_records;
use crate::pipeline::translate::CityTranslator;
use async_trait::async_trait;
use mongodb::bson::doc;
use serde_json::Value;
use std::path::Path;

const NAME_KEYS: &[&str] = &["City", "Città", "city", "name"];
const COUNTRY_KEYS: &[&str] = &["Country", "Paese", "country"];
const LOCALE_KEYS: &[&str] = &["locale", "Locale", "lang"];

/// Default country disambiguator for rows without one; the raw exports are
/// Italian market scrapes.
const DEFAULT_COUNTRY: &str = "IT";

/// Loads city metadata, translating names into the configured target
/// language. Natural key: the original (untranslated) name + country, so
/// distinct source names stay distinct even when they translate to the
/// same target name; the translated name is data.
pub struct CityLoader<'a> {
    translator: &'a mut CityTranslator,
    source_locale: String,
}

impl<'a> CityLoader<'a> {
    pub fn new(translator: &'a mut CityTranslator, source_locale: &str) -> Self {
        CityLoader {
            translator,
            source_locale: source_locale.to_string(),
        }
    }

    pub async fn run(
        ctx: &LoaderContext<'_>,
        path: &Path,
        translator: &'a mut CityTranslator,
        source_locale: &str,
    ) -> Result<LoaderStats> {
        let rows = read_records(path)?;
        let mut loader = CityLoader::new(translator, source_locale);
        run_rows(&mut loader, ctx, &rows).await
    }
}

#[async_trait]
impl RowLoader for CityLoader<'_> {
    fn entity(&self) -> &'static str {
        "city"
    }

    fn collection(&self) -> &'static str {
        collections::CITIES
    }

    async fn map_row(&mut self, record: &Value) -> RowOutcome {
        let Some(original) = str_field(record, NAME_KEYS) else {
            return RowOutcome::Invalid {
                reason: reject_reason(&[FieldError::missing("city")]),
            };
        };
        let locale = str_field(record, LOCALE_KEYS)
            .map(|l| l.to_lowercase())
            .unwrap_or_else(|| self.source_locale.clone());
        let country = str_field(record, COUNTRY_KEYS)
            .map(|c| c.to_uppercase())
            .unwrap_or_else(|| DEFAULT_COUNTRY.to_string());

        let translated = self.translator.translate(&original, &locale).await;
        let city = City {
            city: translated.clone(),
            city_original: original,
            country: country.clone(),
            locale: Some(locale),
        };
        let key = doc! { "city_original": &city.city_original, "country": &country };
        entity_outcome(key, &city, translated)
    }
}
