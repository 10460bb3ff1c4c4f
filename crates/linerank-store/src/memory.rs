use std::sync::Mutex;

use linerank_core::History;

use crate::{HistoryStore, StoreError};

/// In-process history, for tests and for embedding without a file.
#[derive(Default)]
pub struct MemoryHistoryStore {
    history: Mutex<History>,
}

impl MemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_history(history: History) -> Self {
        Self {
            history: Mutex::new(history),
        }
    }
}

impl HistoryStore for MemoryHistoryStore {
    fn load(&self) -> Result<History, StoreError> {
        let history = self
            .history
            .lock()
            .map_err(|e| StoreError::Poisoned(e.to_string()))?;
        Ok(history.clone())
    }

    fn save(&self, history: &History) -> Result<(), StoreError> {
        let mut slot = self
            .history
            .lock()
            .map_err(|e| StoreError::Poisoned(e.to_string()))?;
        *slot = history.clone();
        Ok(())
    }

    fn update<R>(
        &self,
        change: impl FnOnce(&mut History) -> R,
    ) -> Result<(History, R), StoreError> {
        let mut slot = self
            .history
            .lock()
            .map_err(|e| StoreError::Poisoned(e.to_string()))?;
        let out = change(&mut slot);
        Ok((slot.clone(), out))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use linerank_core::{ComparisonRecord, TaskId};

    #[test]
    fn save_replaces_contents() {
        let store = MemoryHistoryStore::new();
        assert!(store.load().unwrap().is_empty());

        let mut h = History::new();
        h.push(TaskId::decode("d___1___2").unwrap(), ComparisonRecord::single("less"));
        store.save(&h).unwrap();
        assert_eq!(store.load().unwrap(), h);

        store.save(&History::new()).unwrap();
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn update_applies_in_place() {
        let store = MemoryHistoryStore::new();
        let task = TaskId::decode("d___1___2").unwrap();
        let (saved, removed) = store
            .update(|h| {
                h.push(task.clone(), ComparisonRecord::single("less"));
                h.remove(&TaskId::decode("d___2___3").unwrap())
            })
            .unwrap();
        assert!(removed.is_none());
        assert_eq!(saved.len(), 1);
        assert_eq!(store.load().unwrap(), saved);
    }
}
