pub mod agreement;
pub mod config;
pub mod document;
pub mod error;
pub mod history;
pub mod label;
pub mod ordered;
pub mod scheduler;
pub mod task_id;

pub use agreement::AgreementReport;
pub use config::{Config, Sampling};
pub use document::{BoundingBox, Category, Document, DocumentSet, Line};
pub use error::{ConfigError, ScheduleError, TaskIdError};
pub use history::{ComparisonRecord, History, HistoryEntry};
pub use label::{LabelOption, LabelRoles, LabelScheme, Outcome};
pub use ordered::OrderedMap;
pub use scheduler::{LineView, ScheduledTask, Scheduler, TaskPayload};
pub use task_id::TaskId;
