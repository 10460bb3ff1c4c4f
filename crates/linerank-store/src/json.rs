//! History persisted as a JSON object keyed by encoded task id.
//!
//! ```json
//! { "doc1___1___2": { "labeled": ["less"], "labeled_at": "2026-01-05T10:00:00Z" } }
//! ```
//!
//! Key order is judgment order and is preserved on read and write.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use linerank_core::{ComparisonRecord, History, OrderedMap, TaskId};
use serde_json::{Map, Value};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::{HistoryStore, StoreError};

const LABELED_AT: &str = "labeled_at";

pub struct JsonHistoryStore {
    path: PathBuf,
    result_key: String,
}

impl JsonHistoryStore {
    pub fn new(path: impl Into<PathBuf>, result_key: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            result_key: result_key.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the file as an empty object if it does not exist yet.
    pub fn ensure_exists(&self) -> Result<(), StoreError> {
        if self.path.exists() {
            return Ok(());
        }
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
        }
        self.write_atomic("{}")?;
        info!(path = %self.path.display(), "created empty history file");
        Ok(())
    }

    fn decode_record(&self, key: &str, value: Value) -> Result<ComparisonRecord, StoreError> {
        let malformed = |reason: &str| StoreError::MalformedRecord {
            key: key.to_string(),
            reason: reason.to_string(),
        };

        let Value::Object(mut fields) = value else {
            return Err(malformed("record is not an object"));
        };

        let labels = match fields.remove(&self.result_key) {
            Some(Value::Array(items)) => items
                .into_iter()
                .map(|item| match item {
                    Value::String(s) => Ok(s),
                    _ => Err(malformed("labels must be strings")),
                })
                .collect::<Result<Vec<_>, _>>()?,
            Some(Value::String(s)) => vec![s],
            Some(_) => return Err(malformed("labels must be a list of strings")),
            None => {
                return Err(malformed(&format!(
                    "missing result key {:?}",
                    self.result_key
                )));
            }
        };
        let mut record = ComparisonRecord::new(labels).ok_or_else(|| malformed("no labels"))?;

        match fields.remove(LABELED_AT) {
            None | Some(Value::Null) => {}
            Some(Value::String(s)) => {
                let at = DateTime::parse_from_rfc3339(&s)
                    .map_err(|e| malformed(&format!("bad timestamp: {e}")))?;
                record = record.with_timestamp(at.with_timezone(&Utc));
            }
            Some(_) => return Err(malformed("timestamp must be a string")),
        }

        Ok(record)
    }

    fn encode_record(&self, record: &ComparisonRecord) -> Value {
        let mut fields = Map::new();
        fields.insert(
            self.result_key.clone(),
            Value::Array(
                record
                    .labels()
                    .iter()
                    .map(|l| Value::String(l.clone()))
                    .collect(),
            ),
        );
        if let Some(at) = record.labeled_at {
            fields.insert(LABELED_AT.to_string(), Value::String(at.to_rfc3339()));
        }
        Value::Object(fields)
    }

    /// Sidecar file that writers lock. The history file itself is replaced on
    /// every save, so a lock held on it would not outlive the rename.
    fn lock_path(&self) -> PathBuf {
        let mut name = self.path.clone().into_os_string();
        name.push(".lock");
        PathBuf::from(name)
    }

    /// Write to a sibling temp file, then rename over the target so readers
    /// never observe a partial file.
    fn write_atomic(&self, contents: &str) -> Result<(), StoreError> {
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir).map_err(|e| StoreError::io(dir, e))?;
        tmp.write_all(contents.as_bytes())
            .map_err(|e| StoreError::io(tmp.path(), e))?;
        tmp.persist(&self.path)
            .map_err(|e| StoreError::io(&self.path, e.error))?;
        Ok(())
    }
}

impl HistoryStore for JsonHistoryStore {
    fn load(&self) -> Result<History, StoreError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no history file, starting empty");
                return Ok(History::new());
            }
            Err(e) => return Err(StoreError::io(&self.path, e)),
        };

        let map: OrderedMap<Value> =
            serde_json::from_str(&raw).map_err(|e| StoreError::json(&self.path, e))?;

        let mut history = History::new();
        for (key, value) in map.into_inner() {
            let task = TaskId::decode(&key)?;
            let record = self.decode_record(&key, value)?;
            history.push(task, record);
        }

        info!(path = %self.path.display(), records = history.len(), "loaded history");
        Ok(history)
    }

    fn save(&self, history: &History) -> Result<(), StoreError> {
        let map = OrderedMap(
            history
                .iter()
                .map(|e| (e.task.encode(), self.encode_record(&e.record)))
                .collect(),
        );
        let json = serde_json::to_string_pretty(&map).map_err(|e| StoreError::json(&self.path, e))?;
        self.write_atomic(&json)?;
        debug!(path = %self.path.display(), records = history.len(), "saved history");
        Ok(())
    }

    /// Reload, change, and save while holding an exclusive lock on the
    /// sidecar file, so writers in other processes wait their turn instead
    /// of overwriting each other's records.
    fn update<R>(
        &self,
        change: impl FnOnce(&mut History) -> R,
    ) -> Result<(History, R), StoreError> {
        let lock_path = self.lock_path();
        let lock = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)
            .map_err(|e| StoreError::io(&lock_path, e))?;
        lock.lock().map_err(|e| StoreError::io(&lock_path, e))?;

        let mut history = self.load()?;
        let out = change(&mut history);
        self.save(&history)?;

        // Released when `lock` is dropped.
        Ok((history, out))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use linerank_core::TaskIdError;

    fn id(key: &str) -> TaskId {
        TaskId::decode(key).unwrap()
    }

    fn store_in(dir: &tempfile::TempDir) -> JsonHistoryStore {
        JsonHistoryStore::new(dir.path().join("labeled_tasks.json"), "labeled")
    }

    #[test]
    fn missing_file_is_empty_history() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        assert!(store.load().unwrap().is_empty());
        assert!(!store.path().exists());
    }

    #[test]
    fn ensure_exists_writes_empty_object() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonHistoryStore::new(dir.path().join("out/labels.json"), "labeled");
        store.ensure_exists().unwrap();
        assert_eq!(std::fs::read_to_string(store.path()).unwrap(), "{}");
        // Second call leaves existing content alone.
        let mut h = History::new();
        h.push(id("d___1___2"), ComparisonRecord::single("less"));
        store.save(&h).unwrap();
        store.ensure_exists().unwrap();
        assert_eq!(store.load().unwrap().len(), 1);
    }

    #[test]
    fn save_then_load_keeps_order_and_timestamps() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let at = Utc.with_ymd_and_hms(2026, 3, 1, 12, 30, 0).unwrap();

        let mut h = History::new();
        h.push(id("doc2___3___4"), ComparisonRecord::single("greater"));
        h.push(
            id("doc1___1___2"),
            ComparisonRecord::new(vec!["less".into(), "other".into()])
                .unwrap()
                .with_timestamp(at),
        );
        h.push(id("doc2___2___4"), ComparisonRecord::single("less"));
        store.save(&h).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded, h);
        let keys: Vec<String> = loaded.iter().map(|e| e.task.encode()).collect();
        assert_eq!(keys, vec!["doc2___3___4", "doc1___1___2", "doc2___2___4"]);
        assert_eq!(loaded.get(&id("doc1___1___2")).unwrap().labeled_at, Some(at));
    }

    #[test]
    fn reads_file_order_not_sorted_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        std::fs::write(
            store.path(),
            r#"{"d___3___4": {"labeled": ["less"]}, "d___1___2": {"labeled": ["less"]}}"#,
        )
        .unwrap();
        let h = store.load().unwrap();
        assert_eq!(h.last().unwrap().task, id("d___1___2"));
    }

    #[test]
    fn custom_result_key() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonHistoryStore::new(dir.path().join("h.json"), "answers");
        let mut h = History::new();
        h.push(id("d___1___2"), ComparisonRecord::single("equal"));
        store.save(&h).unwrap();

        let raw = std::fs::read_to_string(store.path()).unwrap();
        let value: Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["d___1___2"]["answers"][0], "equal");

        let other_key = JsonHistoryStore::new(store.path(), "labeled");
        assert!(matches!(
            other_key.load().unwrap_err(),
            StoreError::MalformedRecord { .. }
        ));
    }

    #[test]
    fn malformed_key_fails_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        std::fs::write(store.path(), r#"{"no-separators": {"labeled": ["less"]}}"#).unwrap();
        match store.load().unwrap_err() {
            StoreError::MalformedKey(TaskIdError::Malformed { key }) => {
                assert_eq!(key, "no-separators")
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn empty_label_list_fails_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        std::fs::write(store.path(), r#"{"d___1___2": {"labeled": []}}"#).unwrap();
        match store.load().unwrap_err() {
            StoreError::MalformedRecord { key, .. } => assert_eq!(key, "d___1___2"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn bare_string_label_is_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        std::fs::write(store.path(), r#"{"d___1___2": {"labeled": "greater"}}"#).unwrap();
        let h = store.load().unwrap();
        assert_eq!(h.get(&id("d___1___2")).unwrap().effective(), "greater");
    }

    #[test]
    fn update_rereads_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let first = store_in(&dir);
        let second = store_in(&dir);

        let mut h = History::new();
        h.push(id("d___1___2"), ComparisonRecord::single("less"));
        first.save(&h).unwrap();

        // `second` never loaded before, yet keeps what `first` wrote.
        let (saved, had_it) = second
            .update(|h| {
                let had_it = h.contains(&id("d___1___2"));
                h.push(id("d___2___3"), ComparisonRecord::single("less"));
                had_it
            })
            .unwrap();
        assert!(had_it);
        assert_eq!(saved.len(), 2);
        assert_eq!(first.load().unwrap(), saved);
        assert!(dir.path().join("labeled_tasks.json.lock").exists());
    }

    #[test]
    fn concurrent_updates_from_separate_handles_all_land() {
        let dir = tempfile::tempdir().unwrap();
        std::thread::scope(|s| {
            for t in 0..4 {
                let store = store_in(&dir);
                s.spawn(move || {
                    for i in (t * 10)..(t * 10 + 10) {
                        let task = TaskId::new("d", i.to_string(), (i + 1).to_string()).unwrap();
                        store
                            .update(|h| h.push(task, ComparisonRecord::single("less")))
                            .unwrap();
                    }
                });
            }
        });
        assert_eq!(store_in(&dir).load().unwrap().len(), 40);
    }

    #[test]
    fn bad_timestamp_fails_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        std::fs::write(
            store.path(),
            r#"{"d___1___2": {"labeled": ["less"], "labeled_at": "yesterday"}}"#,
        )
        .unwrap();
        assert!(matches!(
            store.load().unwrap_err(),
            StoreError::MalformedRecord { .. }
        ));
    }
}
