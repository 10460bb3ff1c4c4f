use std::path::Path;

use linerank_core::DocumentSet;
use tracing::info;

use crate::StoreError;

/// Read the task file: a JSON object of document id to document, in file order.
pub fn load_documents(path: &Path) -> Result<DocumentSet, StoreError> {
    let raw = std::fs::read_to_string(path).map_err(|e| StoreError::io(path, e))?;
    let documents = DocumentSet::from_json(&raw).map_err(|e| StoreError::json(path, e))?;
    let eligible = documents.eligible().count();
    info!(
        path = %path.display(),
        documents = documents.len(),
        eligible,
        "loaded documents"
    );
    Ok(documents)
}
