//! Labelling job configuration, read from a JSON file.
//!
//! Only `labels` is required. Every other key falls back to a default, and a
//! warning names each key that was defaulted.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ConfigError;
use crate::label::{LabelOption, LabelRoles, LabelScheme};

/// Order in which documents are offered for labelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sampling {
    /// Input file order.
    #[default]
    Sequential,
    /// A stable order derived from each document id.
    Shuffle,
    /// Same ordering as `Shuffle`; kept as a separate name for existing configs.
    Random,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub title: String,
    #[serde(default = "default_input_path")]
    pub input_path: PathBuf,
    #[serde(default = "default_output_path")]
    pub output_path: PathBuf,
    #[serde(default)]
    pub labels: Vec<LabelOption>,
    #[serde(default)]
    pub roles: LabelRoles,
    /// Proposed label when none can be derived from line categories.
    #[serde(default = "default_label")]
    pub default_label: String,
    /// Shown above the per-task instruction.
    #[serde(default)]
    pub instruction: String,
    #[serde(default)]
    pub multiclass: bool,
    #[serde(default)]
    pub confirm_required: bool,
    /// Field of a history record that holds its label list.
    #[serde(default = "default_result_key")]
    pub result_key: String,
    #[serde(default)]
    pub sampling: Sampling,
}

fn default_input_path() -> PathBuf {
    PathBuf::from("tasks.json")
}

fn default_output_path() -> PathBuf {
    PathBuf::from("labeled_tasks.json")
}

fn default_label() -> String {
    "equal".to_string()
}

fn default_result_key() -> String {
    "labeled".to_string()
}

/// Optional keys and the default reported when they are absent.
const DEFAULTED_KEYS: &[(&str, &str)] = &[
    ("title", ""),
    ("input_path", "tasks.json"),
    ("output_path", "labeled_tasks.json"),
    ("roles", "less/equal/greater/other"),
    ("default_label", "equal"),
    ("instruction", ""),
    ("multiclass", "false"),
    ("confirm_required", "false"),
    ("result_key", "labeled"),
    ("sampling", "sequential"),
];

/// Optional keys absent from `obj`, with the default each one takes.
fn defaulted_keys(
    obj: &serde_json::Map<String, serde_json::Value>,
) -> impl Iterator<Item = (&'static str, &'static str)> + '_ {
    DEFAULTED_KEYS
        .iter()
        .copied()
        .filter(|(key, _)| !obj.contains_key(*key))
}

impl Config {
    /// Config with the given labels and defaults everywhere else.
    pub fn with_labels(labels: Vec<LabelOption>) -> Self {
        Self {
            title: String::new(),
            input_path: default_input_path(),
            output_path: default_output_path(),
            labels,
            roles: LabelRoles::default(),
            default_label: default_label(),
            instruction: String::new(),
            multiclass: false,
            confirm_required: false,
            result_key: default_result_key(),
            sampling: Sampling::default(),
        }
    }

    /// Parse and validate a JSON config.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let value: serde_json::Value =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        let obj = value
            .as_object()
            .ok_or_else(|| ConfigError::Parse("config must be a JSON object".into()))?;

        if !obj.contains_key("labels") {
            return Err(ConfigError::Missing("labels"));
        }
        for (key, default) in defaulted_keys(obj) {
            warn!(key, default, "config key is not set, using default");
        }

        let config: Config =
            serde_json::from_value(value).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints and build the label scheme.
    pub fn validate(&self) -> Result<LabelScheme, ConfigError> {
        if self.result_key.is_empty() {
            return Err(ConfigError::Missing("result_key"));
        }
        let scheme = LabelScheme::new(self.labels.clone(), self.roles.clone())?;
        if !scheme.contains(&self.default_label) {
            return Err(ConfigError::UnknownRoleLabel {
                role: "default",
                label: self.default_label.clone(),
            });
        }
        Ok(scheme)
    }

    pub fn label_scheme(&self) -> Result<LabelScheme, ConfigError> {
        self.validate()
    }
}
