use thiserror::Error;

/// Custom Result type for this crate.
pub type Result<T> = std::result::Result<T, EtlError>;

/// The error type for loader and maintenance operations.
///
/// Row-level problems (parse failures, validation rejects, orphaned foreign
/// keys) are not errors: they travel through the reject channels and the
/// run counters. Only conditions that should abort a run, or an entire
/// entity stage, surface here.
#[derive(Error, Debug)]
pub enum EtlError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    #[error("store error: {source}")]
    Store {
        #[from]
        source: mongodb::error::Error,
    },

    /// Sustained store failures across an entity's batches.
    #[error("store degraded: {0}")]
    StoreDegraded(String),

    #[error("input file error: {0}")]
    Input(String),

    #[error("CSV error: {source}")]
    Csv {
        #[from]
        source: csv::Error,
    },

    #[error("serialization error: {source}")]
    Serialization {
        #[from]
        source: serde_json::Error,
    },

    #[error("BSON encoding error: {source}")]
    Bson {
        #[from]
        source: mongodb::bson::ser::Error,
    },
}
