// src/pipeline/readers/json_reader.rs

use crate::error::{EtlError, Result};
use crate::pipeline::readers::RecordReader;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// Reads a raw input file containing either a top-level JSON array of
/// objects or newline-delimited JSON.
pub struct JsonReader {
    path: PathBuf,
}

impl JsonReader {
    pub fn new(path: &Path) -> Self {
        JsonReader {
            path: path.to_path_buf(),
        }
    }
}

impl RecordReader for JsonReader {
    fn read_records(&mut self) -> Result<Vec<Value>> {
        let contents = fs::read_to_string(&self.path).map_err(|e| {
            EtlError::Input(format!("cannot read {}: {}", self.path.display(), e))
        })?;
        let trimmed = contents.trim_start();
        if trimmed.starts_with('[') {
            let rows: Vec<Value> = serde_json::from_str(trimmed).map_err(|e| {
                EtlError::Input(format!("invalid JSON array in {}: {}", self.path.display(), e))
            })?;
            return Ok(rows);
        }
        let mut rows = Vec::new();
        for (number, line) in contents.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let row: Value = serde_json::from_str(line).map_err(|e| {
                EtlError::Input(format!(
                    "invalid JSON on line {} of {}: {}",
                    number + 1,
                    self.path.display(),
                    e
                ))
            })?;
            rows.push(row);
        }
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn temp_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("temp file");
        write!(file, "{}", contents).expect("write");
        file
    }

    #[test]
    fn test_reads_json_array() {
        let file = temp_file(r#"[{"Nome": "Hotel Uno"}, {"Nome": "Hotel Due"}]"#);
        let rows = JsonReader::new(file.path()).read_records().expect("read");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["Nome"], "Hotel Uno");
    }

    #[test]
    fn test_reads_ndjson_skipping_blank_lines() {
        let file = temp_file("{\"id\": 1}\n\n{\"id\": 2}\n");
        let rows = JsonReader::new(file.path()).read_records().expect("read");
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn test_invalid_json_is_input_error() {
        let file = temp_file("{not json}");
        let result = JsonReader::new(file.path()).read_records();
        assert!(matches!(result, Err(EtlError::Input(_))));
    }

    #[test]
    fn test_missing_file_is_input_error() {
        let result = JsonReader::new(Path::new("no_such_file.json")).read_records();
        assert!(matches!(result, Err(EtlError::Input(_))));
    }
}
