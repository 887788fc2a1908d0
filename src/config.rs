// src/config.rs
use crate::error::{EtlError, Result};
use std::path::PathBuf;

/// Default number of rows submitted to the store per batch.
pub const DEFAULT_BATCH_SIZE: usize = 500;

/// Default target language for city-name translation.
pub const DEFAULT_TARGET_LANG: &str = "it";

/// Default source locale assumed for raw city names.
pub const DEFAULT_SOURCE_LOCALE: &str = "en";

/// Run configuration, read from the environment (with `.env` support in the
/// binary). A missing required variable is fatal before any I/O happens.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// MongoDB connection string (`MONGO_URI`).
    pub mongo_uri: String,
    /// Target database name (`MONGO_DB`).
    pub database: String,
    /// Rows per bulk upsert batch (`MONGO_BATCH_SIZE`, default 500).
    pub batch_size: usize,
    /// Language code city names are translated into (`TARGET_LANG`, default "it").
    pub target_language: String,
    /// Locale assumed for untranslated city names (`SOURCE_LOCALE`, default "en").
    pub source_locale: String,
    /// Optional external translation endpoint (`TRANSLATE_ENDPOINT`).
    pub translate_endpoint: Option<String>,
    /// Directory the reject channels are written to (`REJECT_DIR`, default "rejects").
    pub reject_dir: PathBuf,
}

impl AppConfig {
    /// Builds the configuration from process environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable lookup.
    /// Split out from [`AppConfig::from_env`] so tests do not have to mutate
    /// the process environment.
    pub fn from_lookup<F>(get: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| -> Result<String> {
            get(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| EtlError::Config(format!("required variable {} is not set", key)))
        };

        let mongo_uri = required("MONGO_URI")?;
        let database = required("MONGO_DB")?;

        let batch_size = match get("MONGO_BATCH_SIZE") {
            None => DEFAULT_BATCH_SIZE,
            Some(raw) => {
                let parsed: usize = raw.trim().parse().map_err(|_| {
                    EtlError::Config(format!("MONGO_BATCH_SIZE must be a positive integer, got '{}'", raw))
                })?;
                if parsed == 0 {
                    return Err(EtlError::Config(
                        "MONGO_BATCH_SIZE must be greater than 0".to_string(),
                    ));
                }
                parsed
            }
        };

        let target_language = get("TARGET_LANG")
            .map(|v| v.trim().to_lowercase())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_TARGET_LANG.to_string());

        let source_locale = get("SOURCE_LOCALE")
            .map(|v| v.trim().to_lowercase())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_SOURCE_LOCALE.to_string());

        let translate_endpoint = get("TRANSLATE_ENDPOINT")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());

        let reject_dir = get("REJECT_DIR")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("rejects"));

        Ok(AppConfig {
            mongo_uri,
            database,
            batch_size,
            target_language,
            source_locale,
            translate_endpoint,
            reject_dir,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn load(pairs: &[(&str, &str)]) -> Result<AppConfig> {
        let map = vars(pairs);
        AppConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let cfg = load(&[("MONGO_URI", "mongodb://localhost:27017"), ("MONGO_DB", "hospitality")])
            .expect("minimal config should load");
        assert_eq!(cfg.batch_size, DEFAULT_BATCH_SIZE);
        assert_eq!(cfg.target_language, "it");
        assert_eq!(cfg.source_locale, "en");
        assert!(cfg.translate_endpoint.is_none());
        assert_eq!(cfg.reject_dir, PathBuf::from("rejects"));
    }

    #[test]
    fn test_missing_uri_is_config_error() {
        let result = load(&[("MONGO_DB", "hospitality")]);
        match result {
            Err(EtlError::Config(msg)) => assert!(msg.contains("MONGO_URI")),
            other => panic!("expected Config error, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_database_is_config_error() {
        let result = load(&[("MONGO_URI", "mongodb://localhost:27017")]);
        match result {
            Err(EtlError::Config(msg)) => assert!(msg.contains("MONGO_DB")),
            other => panic!("expected Config error, got {:?}", other),
        }
    }

    #[test]
    fn test_blank_required_value_is_config_error() {
        let result = load(&[("MONGO_URI", "   "), ("MONGO_DB", "hospitality")]);
        assert!(matches!(result, Err(EtlError::Config(_))));
    }

    #[test]
    fn test_batch_size_override() {
        let cfg = load(&[
            ("MONGO_URI", "mongodb://localhost:27017"),
            ("MONGO_DB", "hospitality"),
            ("MONGO_BATCH_SIZE", "2"),
        ])
        .expect("config should load");
        assert_eq!(cfg.batch_size, 2);
    }

    #[test]
    fn test_invalid_batch_size() {
        let result = load(&[
            ("MONGO_URI", "mongodb://localhost:27017"),
            ("MONGO_DB", "hospitality"),
            ("MONGO_BATCH_SIZE", "many"),
        ]);
        assert!(matches!(result, Err(EtlError::Config(_))));
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let result = load(&[
            ("MONGO_URI", "mongodb://localhost:27017"),
            ("MONGO_DB", "hospitality"),
            ("MONGO_BATCH_SIZE", "0"),
        ]);
        match result {
            Err(EtlError::Config(msg)) => assert!(msg.contains("greater than 0")),
            other => panic!("expected Config error, got {:?}", other),
        }
    }

    #[test]
    fn test_target_language_normalized() {
        let cfg = load(&[
            ("MONGO_URI", "mongodb://localhost:27017"),
            ("MONGO_DB", "hospitality"),
            ("TARGET_LANG", " IT "),
        ])
        .expect("config should load");
        assert_eq!(cfg.target_language, "it");
    }
}
