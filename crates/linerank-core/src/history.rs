//! Ordered log of completed comparisons.
//!
//! Order is significant: the scheduler reconstructs its cursor from the most
//! recent record of a document and walks backward from there, so the log is
//! a vector, never a hash map.

use chrono::{DateTime, Utc};

use crate::task_id::TaskId;

/// Persisted outcome of one comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComparisonRecord {
    labels: Vec<String>,
    pub labeled_at: Option<DateTime<Utc>>,
}

impl ComparisonRecord {
    /// `None` when `labels` is empty; a record always has an outcome.
    pub fn new(labels: Vec<String>) -> Option<Self> {
        if labels.is_empty() {
            return None;
        }
        Some(Self {
            labels,
            labeled_at: None,
        })
    }

    pub fn single(label: impl Into<String>) -> Self {
        Self {
            labels: vec![label.into()],
            labeled_at: None,
        }
    }

    pub fn with_timestamp(mut self, at: DateTime<Utc>) -> Self {
        self.labeled_at = Some(at);
        self
    }

    /// The label the scheduler acts on: the last one chosen.
    pub fn effective(&self) -> &str {
        // Non-empty by construction.
        self.labels.last().map(String::as_str).unwrap_or_default()
    }

    /// The first chosen label, used when comparing annotators.
    pub fn primary(&self) -> &str {
        self.labels.first().map(String::as_str).unwrap_or_default()
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub task: TaskId,
    pub record: ComparisonRecord,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct History {
    entries: Vec<HistoryEntry>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a judgment. A key that is already present is moved to the end,
    /// so the most recent entry is always the last one judged.
    pub fn push(&mut self, task: TaskId, record: ComparisonRecord) {
        self.remove(&task);
        self.entries.push(HistoryEntry { task, record });
    }

    pub fn remove(&mut self, task: &TaskId) -> Option<ComparisonRecord> {
        let pos = self.entries.iter().position(|e| &e.task == task)?;
        Some(self.entries.remove(pos).record)
    }

    pub fn get(&self, task: &TaskId) -> Option<&ComparisonRecord> {
        self.entries
            .iter()
            .find(|e| &e.task == task)
            .map(|e| &e.record)
    }

    pub fn contains(&self, task: &TaskId) -> bool {
        self.get(task).is_some()
    }

    pub fn last(&self) -> Option<&HistoryEntry> {
        self.entries.last()
    }

    pub fn iter(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries belonging to one document, oldest first.
    ///
    /// Scoping compares the decoded document name exactly, so `doc1` never
    /// picks up records of `doc10`.
    pub fn for_document(&self, doc_name: &str) -> Vec<&HistoryEntry> {
        self.entries
            .iter()
            .filter(|e| e.task.doc_name() == doc_name)
            .collect()
    }
}

impl FromIterator<(TaskId, ComparisonRecord)> for History {
    fn from_iter<I: IntoIterator<Item = (TaskId, ComparisonRecord)>>(iter: I) -> Self {
        let mut history = History::new();
        for (task, record) in iter {
            history.push(task, record);
        }
        history
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(doc: &str, a: &str, b: &str) -> TaskId {
        TaskId::new(doc, a, b).unwrap()
    }

    #[test]
    fn empty_record_is_rejected() {
        assert!(ComparisonRecord::new(vec![]).is_none());
    }

    #[test]
    fn effective_label_is_last() {
        let rec = ComparisonRecord::new(vec!["less".into(), "other".into()]).unwrap();
        assert_eq!(rec.effective(), "other");
        assert_eq!(rec.primary(), "less");
    }

    #[test]
    fn push_preserves_append_order() {
        let mut h = History::new();
        h.push(id("d", "1", "2"), ComparisonRecord::single("less"));
        h.push(id("d", "2", "3"), ComparisonRecord::single("greater"));
        h.push(id("d", "1", "3"), ComparisonRecord::single("less"));
        let keys: Vec<String> = h.iter().map(|e| e.task.encode()).collect();
        assert_eq!(keys, vec!["d___1___2", "d___2___3", "d___1___3"]);
        assert_eq!(h.last().unwrap().task, id("d", "1", "3"));
    }

    #[test]
    fn resubmission_moves_to_end() {
        let mut h = History::new();
        h.push(id("d", "1", "2"), ComparisonRecord::single("less"));
        h.push(id("d", "2", "3"), ComparisonRecord::single("less"));
        h.push(id("d", "1", "2"), ComparisonRecord::single("equal"));
        assert_eq!(h.len(), 2);
        let last = h.last().unwrap();
        assert_eq!(last.task, id("d", "1", "2"));
        assert_eq!(last.record.effective(), "equal");
    }

    #[test]
    fn remove_missing_is_none() {
        let mut h = History::new();
        h.push(id("d", "1", "2"), ComparisonRecord::single("less"));
        assert!(h.remove(&id("d", "2", "3")).is_none());
        assert_eq!(h.len(), 1);
        assert!(h.remove(&id("d", "1", "2")).is_some());
        assert!(h.is_empty());
    }

    #[test]
    fn document_scope_is_exact() {
        let h: History = [
            (id("doc1", "1", "2"), ComparisonRecord::single("less")),
            (id("doc10", "1", "2"), ComparisonRecord::single("less")),
            (id("doc1", "2", "3"), ComparisonRecord::single("less")),
        ]
        .into_iter()
        .collect();
        let scoped: Vec<String> = h
            .for_document("doc1")
            .iter()
            .map(|e| e.task.encode())
            .collect();
        assert_eq!(scoped, vec!["doc1___1___2", "doc1___2___3"]);
    }
}
