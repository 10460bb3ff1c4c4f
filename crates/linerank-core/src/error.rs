use thiserror::Error;

use crate::task_id::TaskId;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaskIdError {
    #[error("document name must not be empty")]
    EmptyDocument,

    #[error("invalid line uid {uid:?}: {reason}")]
    InvalidUid { uid: String, reason: &'static str },

    #[error("malformed task id {key:?}")]
    Malformed { key: String },
}

/// Data-integrity faults found while reconstructing a document's chain.
///
/// All of these abort the scheduling call for the affected document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    #[error("stale history: task {task} references line {uid:?} not present in the document")]
    StaleHistory { task: TaskId, uid: String },

    #[error("document {doc_name:?} has {lines} line(s), at least 2 are required")]
    TooFewLines { doc_name: String, lines: usize },

    #[error(transparent)]
    TaskId(#[from] TaskIdError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),

    #[error("labels are not unique: {0:?} appears more than once")]
    DuplicateLabel(String),

    #[error("{role} label {label:?} is not one of the configured labels")]
    UnknownRoleLabel { role: &'static str, label: String },

    #[error("label {label:?} is given both the {first} and the {second} role")]
    SharedRoleLabel {
        label: String,
        first: &'static str,
        second: &'static str,
    },

    #[error("config parse error: {0}")]
    Parse(String),
}
