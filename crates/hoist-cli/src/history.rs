//! Upload history log
//!
//! A JSON-lines file under the config home, one entry per successful upload.
//! History is a convenience; failures to record never fail the upload.

use std::fs::OpenOptions;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const HISTORY_FILE: &str = "history.jsonl";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub timestamp: DateTime<Utc>,
    pub path: String,
    pub uploader: String,
    pub url: String,
}

impl HistoryEntry {
    pub fn now(path: impl Into<String>, uploader: impl Into<String>, url: impl Into<String>) -> Self {
        HistoryEntry {
            timestamp: Utc::now(),
            path: path.into(),
            uploader: uploader.into(),
            url: url.into(),
        }
    }
}

/// Append one entry to the history file, creating it if needed.
pub fn append(home: &Path, entry: &HistoryEntry) -> anyhow::Result<()> {
    std::fs::create_dir_all(home)?;
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(home.join(HISTORY_FILE))?;
    let line = serde_json::to_string(entry)?;
    writeln!(file, "{line}")?;
    Ok(())
}

/// Read all history entries, oldest first. A missing file is an empty
/// history; unparseable lines are skipped.
pub fn read(home: &Path) -> anyhow::Result<Vec<HistoryEntry>> {
    let path = home.join(HISTORY_FILE);
    if !path.is_file() {
        return Ok(Vec::new());
    }
    let reader = BufReader::new(std::fs::File::open(path)?);
    let mut entries = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str(&line) {
            Ok(entry) => entries.push(entry),
            Err(err) => tracing::warn!(error = %err, "Skipping malformed history line"),
        }
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_then_read_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        append(
            dir.path(),
            &HistoryEntry::now("/pics/a.png", "bucket", "https://x/a.png"),
        )
        .unwrap();
        append(
            dir.path(),
            &HistoryEntry::now("/pics/b.png", "github", "https://x/b.png"),
        )
        .unwrap();

        let entries = read(dir.path()).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].url, "https://x/a.png");
        assert_eq!(entries[1].uploader, "github");
    }

    #[test]
    fn missing_file_is_empty_history() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read(dir.path()).unwrap().is_empty());
    }

    #[test]
    fn malformed_lines_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        append(
            dir.path(),
            &HistoryEntry::now("/pics/a.png", "bucket", "https://x/a.png"),
        )
        .unwrap();
        let path = dir.path().join(HISTORY_FILE);
        let mut contents = std::fs::read_to_string(&path).unwrap();
        contents.push_str("not json\n");
        std::fs::write(&path, contents).unwrap();

        let entries = read(dir.path()).unwrap();
        assert_eq!(entries.len(), 1);
    }
}
