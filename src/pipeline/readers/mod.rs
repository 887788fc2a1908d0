// src/pipeline/readers/mod.rs

pub mod csv_reader;
pub mod json_reader;

use crate::error::{EtlError, Result};
use serde_json::Value;
use std::path::Path;

pub use csv_reader::CsvReader;
pub use json_reader::JsonReader;

/// A raw-row source: one file per entity type, yielding one JSON object per
/// row. CSV values stay strings; the primitive parsers handle typing.
pub trait RecordReader {
    fn read_records(&mut self) -> Result<Vec<Value>>;
}

/// Picks a reader by file extension and reads the whole file.
pub fn read_records(path: &Path) -> Result<Vec<Value>> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();
    match extension.as_str() {
        "json" | "jsonl" | "ndjson" => JsonReader::new(path).read_records(),
        "csv" => CsvReader::new(path).read_records(),
        other => Err(EtlError::Input(format!(
            "unsupported input format '{}' for {}",
            other,
            path.display()
        ))),
    }
}
