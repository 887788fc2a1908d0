// src/rejects.rs
//
// Append-only reject channels, separate from the primary store: one file for
// validation/parse rejects (original row preserved verbatim plus the
// reason), one for orphaned foreign keys (external id + parent type).

use crate::error::Result;
use serde_json::{json, Value};
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

pub const VALIDATION_FILE: &str = "validation_rejects.jsonl";
pub const ORPHAN_FILE: &str = "orphan_rejects.jsonl";

pub struct RejectSink {
    dir: PathBuf,
    validation: Mutex<File>,
    orphans: Mutex<File>,
}

impl RejectSink {
    /// Opens (creating if needed) both reject files in append mode.
    pub fn open(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)?;
        let open = |name: &str| -> std::io::Result<File> {
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(dir.join(name))
        };
        Ok(RejectSink {
            dir: dir.to_path_buf(),
            validation: Mutex::new(open(VALIDATION_FILE)?),
            orphans: Mutex::new(open(ORPHAN_FILE)?),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Records a validation/parse reject. The original row is written back
    /// verbatim as JSON so rejected input can be inspected or replayed.
    pub async fn validation(&self, entity: &str, row: &Value, reason: &str) -> Result<()> {
        let line = json!({ "entity": entity, "reason": reason, "row": row });
        let mut file = self.validation.lock().await;
        writeln!(file, "{}", line)?;
        Ok(())
    }

    /// Records an orphaned-foreign-key reject.
    pub async fn orphan(&self, entity: &str, external_id: &str, parent: &str) -> Result<()> {
        let line = json!({
            "entity": entity,
            "external_id": external_id,
            "parent": parent,
            "reason": "orphaned foreign key",
        });
        let mut file = self.orphans.lock().await;
        writeln!(file, "{}", line)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_rejects_are_appended_with_verbatim_row() {
        let dir = tempdir().expect("tempdir");
        let sink = RejectSink::open(dir.path()).expect("open sink");

        let row = json!({"Nome": "Hotel Senza Voto", "Voto": "15"});
        sink.validation("review", &row, "vote: rating out of bounds")
            .await
            .expect("write validation reject");
        sink.orphan("room", "P999", "property")
            .await
            .expect("write orphan reject");

        let validation = fs::read_to_string(dir.path().join(VALIDATION_FILE)).expect("read");
        let lines: Vec<&str> = validation.lines().collect();
        assert_eq!(lines.len(), 1);
        let entry: Value = serde_json::from_str(lines[0]).expect("valid JSON line");
        assert_eq!(entry["row"], row);
        assert_eq!(entry["reason"], "vote: rating out of bounds");

        let orphans = fs::read_to_string(dir.path().join(ORPHAN_FILE)).expect("read");
        let entry: Value = serde_json::from_str(orphans.lines().next().expect("one line"))
            .expect("valid JSON line");
        assert_eq!(entry["external_id"], "P999");
        assert_eq!(entry["parent"], "property");
        assert_eq!(entry["reason"], "orphaned foreign key");
    }

    #[tokio::test]
    async fn test_reopening_appends() {
        let dir = tempdir().expect("tempdir");
        {
            let sink = RejectSink::open(dir.path()).expect("open sink");
            sink.validation("city", &json!({"City": ""}), "city: required field missing")
                .await
                .expect("write");
        }
        let sink = RejectSink::open(dir.path()).expect("reopen sink");
        sink.validation("city", &json!({"City": "  "}), "city: required field missing")
            .await
            .expect("write");
        let contents = fs::read_to_string(dir.path().join(VALIDATION_FILE)).expect("read");
        assert_eq!(contents.lines().count(), 2);
    }
}
