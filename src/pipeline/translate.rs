// src/pipeline/translate.rs
//
// City-name translation: static dictionary first, then an optional external
// endpoint, then the original name unchanged. Never fails the enclosing row.

use once_cell::sync::Lazy;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};

/// English to Italian city names seen in the raw exports. The scrapes label
/// destinations in English while the analytics collections are Italian.
static EN_TO_IT: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("Milan", "Milano"),
        ("Rome", "Roma"),
        ("Florence", "Firenze"),
        ("Venice", "Venezia"),
        ("Naples", "Napoli"),
        ("Turin", "Torino"),
        ("Genoa", "Genova"),
        ("Bologna", "Bologna"),
        ("Palermo", "Palermo"),
        ("Bari", "Bari"),
    ])
});

const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Deserialize)]
struct TranslationResponse {
    translation: String,
}

/// Translates city names into the configured target language.
///
/// Lookup order: static dictionary, per-run cache, external endpoint (if
/// configured). When nothing resolves the original name is returned
/// unchanged with a low-severity diagnostic. The cache is keyed by
/// `(name, source locale)` so each name is resolved at most once per run.
pub struct CityTranslator {
    target: String,
    endpoint: Option<String>,
    http: reqwest::Client,
    cache: HashMap<(String, String), String>,
}

impl CityTranslator {
    pub fn new(target: &str, endpoint: Option<&str>) -> Self {
        CityTranslator {
            target: target.to_string(),
            endpoint: endpoint.map(str::to_string),
            http: reqwest::Client::new(),
            cache: HashMap::new(),
        }
    }

    /// Returns the translated name, or the original name when no source
    /// resolves it.
    pub async fn translate(&mut self, name: &str, source_locale: &str) -> String {
        if source_locale == self.target {
            return name.to_string();
        }
        if source_locale == "en" && self.target == "it" {
            if let Some(translated) = EN_TO_IT.get(name) {
                return (*translated).to_string();
            }
        }
        let key = (name.to_string(), source_locale.to_string());
        if let Some(cached) = self.cache.get(&key) {
            return cached.clone();
        }
        let resolved = match &self.endpoint {
            Some(endpoint) => self.call_endpoint(endpoint, name, source_locale).await,
            None => None,
        };
        let translated = match resolved {
            Some(value) => value,
            None => {
                debug!(
                    city = name,
                    locale = source_locale,
                    target = %self.target,
                    "city name left untranslated"
                );
                name.to_string()
            }
        };
        self.cache.insert(key, translated.clone());
        translated
    }

    async fn call_endpoint(&self, endpoint: &str, name: &str, source_locale: &str) -> Option<String> {
        let request = self
            .http
            .get(endpoint)
            .timeout(HTTP_TIMEOUT)
            .query(&[("q", name), ("source", source_locale), ("target", &self.target)]);
        match request.send().await {
            Ok(response) if response.status().is_success() => {
                match response.json::<TranslationResponse>().await {
                    Ok(body) if !body.translation.trim().is_empty() => {
                        Some(body.translation.trim().to_string())
                    }
                    Ok(_) => None,
                    Err(e) => {
                        warn!(city = name, error = %e, "translation endpoint returned invalid body");
                        None
                    }
                }
            }
            Ok(response) => {
                warn!(city = name, status = %response.status(), "translation endpoint error");
                None
            }
            Err(e) => {
                warn!(city = name, error = %e, "translation endpoint unreachable");
                None
            }
        }
    }
}
