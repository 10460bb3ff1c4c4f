use std::path::PathBuf;

use linerank_core::{ConfigError, ScheduleError, TaskId, TaskIdError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("cannot access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("malformed history key: {0}")]
    MalformedKey(#[from] TaskIdError),

    #[error("malformed history record {key:?}: {reason}")]
    MalformedRecord { key: String, reason: String },

    #[error("task {0} does not refer to lines of a loaded document")]
    UnknownTask(TaskId),

    #[error("label {0:?} is not configured")]
    UnknownLabel(String),

    #[error("no labels submitted")]
    NoLabels,

    #[error("{count} labels submitted but multiclass labelling is disabled")]
    TooManyLabels { count: usize },

    #[error("history lock poisoned: {0}")]
    Poisoned(String),

    #[error(transparent)]
    Schedule(#[from] ScheduleError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::Json {
            path: path.into(),
            source,
        }
    }
}
