use super::reconciler::ChangeDetail;
use crate::context::PhaseTotals;
use crate::error::FleetError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use tracing::debug;

/// One run in the history log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRecord {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub dry_run: bool,
    pub phases: HashMap<String, PhaseTotals>,
    pub changes: Vec<ChangeDetail>,
}

/// Append-only JSON log of reconciliation runs, capped to the N most recent
/// entries. Written atomically via a temp file so a crash never truncates
/// the log.
pub struct HistoryStore {
    path: PathBuf,
    cap: usize,
}

impl HistoryStore {
    pub fn new(path: impl Into<PathBuf>, cap: usize) -> Self {
        Self {
            path: path.into(),
            cap: cap.max(1),
        }
    }

    pub fn append(&self, record: &RunRecord) -> Result<(), FleetError> {
        let mut records = self.load()?;
        records.push(record.clone());
        if records.len() > self.cap {
            let drop = records.len() - self.cap;
            records.drain(..drop);
        }

        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(&records)?)?;
        fs::rename(&tmp, &self.path)?;
        debug!(path = %self.path.display(), entries = records.len(), "history written");
        Ok(())
    }

    pub fn load(&self) -> Result<Vec<RunRecord>, FleetError> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(err) => Err(FleetError::IoError(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn record(id: &str) -> RunRecord {
        RunRecord {
            run_id: id.to_string(),
            started_at: Utc::now(),
            dry_run: true,
            phases: HashMap::new(),
            changes: Vec::new(),
        }
    }

    #[test]
    fn appends_and_reads_back() {
        let dir = tempdir().unwrap();
        let store = HistoryStore::new(dir.path().join("history.json"), 10);
        store.append(&record("a")).unwrap();
        store.append(&record("b")).unwrap();
        let records = store.load().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].run_id, "a");
        assert_eq!(records[1].run_id, "b");
    }

    #[test]
    fn cap_drops_oldest_entries() {
        let dir = tempdir().unwrap();
        let store = HistoryStore::new(dir.path().join("history.json"), 2);
        for id in ["a", "b", "c"] {
            store.append(&record(id)).unwrap();
        }
        let records = store.load().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].run_id, "b");
        assert_eq!(records[1].run_id, "c");
    }

    #[test]
    fn missing_file_reads_as_empty() {
        let dir = tempdir().unwrap();
        let store = HistoryStore::new(dir.path().join("nope.json"), 5);
        assert!(store.load().unwrap().is_empty());
    }
}
