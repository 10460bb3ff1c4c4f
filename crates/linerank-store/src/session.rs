//! One labelling job: config, documents, and the history they are judged into.
//!
//! Every operation works on the stored history, not on a copy taken when the
//! session was opened. Writes go through [`HistoryStore::update`], which
//! reloads and saves as one step, so judgments recorded by other sessions on
//! the same file (other threads or other `linerank` processes) are kept.
//! Within one session the same lock also orders readers against writers.

use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use linerank_core::{
    ComparisonRecord, Config, DocumentSet, History, LabelScheme, ScheduledTask, Scheduler, TaskId,
};
use tracing::{info, warn};

use crate::documents::load_documents;
use crate::json::JsonHistoryStore;
use crate::{HistoryStore, StoreError};

pub struct Session<S> {
    config: Config,
    scheme: LabelScheme,
    documents: DocumentSet,
    store: S,
    history: Mutex<History>,
}

impl Session<JsonHistoryStore> {
    /// Load the documents and the history file named by `config`, creating an
    /// empty history file if there is none.
    pub fn open(config: Config) -> Result<Self, StoreError> {
        let documents = load_documents(&config.input_path)?;
        let store = JsonHistoryStore::new(&config.output_path, &config.result_key);
        store.ensure_exists()?;
        Self::new(config, documents, store)
    }
}

impl<S: HistoryStore> Session<S> {
    pub fn new(config: Config, documents: DocumentSet, store: S) -> Result<Self, StoreError> {
        let scheme = config.validate()?;
        let history = store.load()?;
        info!(
            title = %config.title,
            documents = documents.len(),
            records = history.len(),
            "session opened"
        );
        Ok(Self {
            config,
            scheme,
            documents,
            store,
            history: Mutex::new(history),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn scheme(&self) -> &LabelScheme {
        &self.scheme
    }

    pub fn documents(&self) -> &DocumentSet {
        &self.documents
    }

    /// The next comparison across all documents, or `None` when every
    /// document has been fully ordered.
    pub fn next_task(&self) -> Result<Option<ScheduledTask>, StoreError> {
        let history = self.refresh()?;
        let scheduler = Scheduler::from_config(&self.config, &self.scheme);
        Ok(scheduler.next_in_set(&self.documents, &history)?)
    }

    /// Record the annotator's labels for `task` and persist the history.
    ///
    /// The in-memory history only changes once the store has accepted the
    /// new state.
    pub fn submit(&self, task: &TaskId, labels: Vec<String>) -> Result<ComparisonRecord, StoreError> {
        if labels.len() > 1 && !self.config.multiclass {
            return Err(StoreError::TooManyLabels {
                count: labels.len(),
            });
        }
        if let Some(unknown) = labels.iter().find(|l| !self.scheme.contains(l)) {
            return Err(StoreError::UnknownLabel(unknown.clone()));
        }
        let doc_name = task.doc_name();
        if self.documents.line(doc_name, task.first_uid()).is_none()
            || self.documents.line(doc_name, task.second_uid()).is_none()
        {
            return Err(StoreError::UnknownTask(task.clone()));
        }
        let record = ComparisonRecord::new(labels)
            .ok_or(StoreError::NoLabels)?
            .with_timestamp(Utc::now());

        let mut history = self.lock()?;
        let (saved, replaced) = self.store.update(|h| {
            let replaced = h.contains(task);
            h.push(task.clone(), record.clone());
            replaced
        })?;
        if replaced {
            warn!(task = %task, "overwrote existing judgment");
        }
        *history = saved;

        info!(task = %task, label = record.effective(), records = history.len(), "submitted");
        Ok(record)
    }

    /// Remove the judgment for `task` so it is scheduled again. Returns the
    /// removed record; a key that is not in the history is a no-op.
    pub fn restore(&self, task: &TaskId) -> Result<Option<ComparisonRecord>, StoreError> {
        let mut history = self.lock()?;
        let (saved, removed) = self.store.update(|h| h.remove(task))?;
        *history = saved;
        let Some(removed) = removed else {
            info!(task = %task, "nothing to restore");
            return Ok(None);
        };

        info!(task = %task, records = history.len(), "restored");
        Ok(Some(removed))
    }

    /// Most recently judged task, the one an undo would restore.
    pub fn last_task_id(&self) -> Result<Option<TaskId>, StoreError> {
        Ok(self.refresh()?.last().map(|e| e.task.clone()))
    }

    pub fn history(&self) -> Result<History, StoreError> {
        Ok(self.refresh()?.clone())
    }

    /// Reload the stored history and keep it as the current state.
    fn refresh(&self) -> Result<MutexGuard<'_, History>, StoreError> {
        let mut history = self.lock()?;
        *history = self.store.load()?;
        Ok(history)
    }

    fn lock(&self) -> Result<MutexGuard<'_, History>, StoreError> {
        self.history
            .lock()
            .map_err(|e| StoreError::Poisoned(e.to_string()))
    }
}
