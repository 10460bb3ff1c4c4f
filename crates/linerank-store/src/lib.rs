//! Storage layer: JSON history files, document loading, and the annotation
//! session that serializes every read-modify-write of the history.

mod documents;
mod error;
mod json;
mod memory;
mod session;

pub use documents::load_documents;
pub use error::StoreError;
pub use json::JsonHistoryStore;
pub use memory::MemoryHistoryStore;
pub use session::Session;

use linerank_core::History;

/// Durable home of a labelling history.
pub trait HistoryStore {
    fn load(&self) -> Result<History, StoreError>;
    fn save(&self, history: &History) -> Result<(), StoreError>;

    /// Reload the stored history, apply `change`, and save the result as one
    /// step. Returns the saved history and whatever `change` returned.
    ///
    /// Stores that can be shared between processes override this to exclude
    /// other writers for the whole step; the default only chains the calls.
    fn update<R>(
        &self,
        change: impl FnOnce(&mut History) -> R,
    ) -> Result<(History, R), StoreError> {
        let mut history = self.load()?;
        let out = change(&mut history);
        self.save(&history)?;
        Ok((history, out))
    }
}
