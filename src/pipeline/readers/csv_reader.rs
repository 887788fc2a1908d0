// src/pipeline/readers/csv_reader.rs

use crate::error::{EtlError, Result};
use crate::pipeline::readers::RecordReader;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// Reads a headered, comma-delimited file into JSON object rows. Every
/// value is kept as a string; the primitive parsers own the typing and
/// treat the empty string as missing.
pub struct CsvReader {
    path: PathBuf,
}

impl CsvReader {
    pub fn new(path: &Path) -> Self {
        CsvReader {
            path: path.to_path_buf(),
        }
    }
}

impl RecordReader for CsvReader {
    fn read_records(&mut self) -> Result<Vec<Value>> {
        let mut reader = csv::Reader::from_path(&self.path).map_err(|e| {
            EtlError::Input(format!("cannot read {}: {}", self.path.display(), e))
        })?;
        let headers = reader.headers()?.clone();
        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            let mut row = Map::new();
            for (header, value) in headers.iter().zip(record.iter()) {
                row.insert(header.to_string(), Value::String(value.to_string()));
            }
            rows.push(Value::Object(row));
        }
        Ok(rows)
    }
}
