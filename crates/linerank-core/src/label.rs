//! The closed vocabulary of labels an annotator can choose from.
//!
//! Label strings are configuration, not constants: [`LabelRoles`] says which
//! configured labels mean "less", "equal", "greater" and "indeterminate", and
//! the scheduler only ever reasons in terms of [`Outcome`].

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// One selectable label with its presentation hints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelOption {
    pub label: String,
    /// CSS colour for the label button, e.g. `"#e74c3c"` or `"red"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Button caption; the label itself when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
}

impl LabelOption {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            color: None,
            html: None,
        }
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    pub fn caption(&self) -> &str {
        self.html.as_deref().unwrap_or(&self.label)
    }
}

/// Which configured labels carry ordering meaning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelRoles {
    pub less: String,
    pub equal: String,
    pub greater: String,
    /// The indeterminate label; `None` when the vocabulary has no such label.
    pub other: Option<String>,
}

impl Default for LabelRoles {
    fn default() -> Self {
        Self {
            less: "less".to_string(),
            equal: "equal".to_string(),
            greater: "greater".to_string(),
            other: Some("other".to_string()),
        }
    }
}

/// Ordering meaning of a recorded label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Less,
    Equal,
    Greater,
    /// The pair cannot be meaningfully compared.
    Other,
    /// A configured label without an ordering role.
    Unrecognized,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Less => "less",
            Self::Equal => "equal",
            Self::Greater => "greater",
            Self::Other => "other",
            Self::Unrecognized => "unrecognized",
        }
    }
}

/// Validated label vocabulary plus role mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelScheme {
    options: Vec<LabelOption>,
    roles: LabelRoles,
}

impl LabelScheme {
    pub fn new(options: Vec<LabelOption>, roles: LabelRoles) -> Result<Self, ConfigError> {
        if options.is_empty() {
            return Err(ConfigError::Missing("labels"));
        }

        let mut seen = HashSet::new();
        for opt in &options {
            if opt.label.is_empty() {
                return Err(ConfigError::Missing("label"));
            }
            if !seen.insert(opt.label.as_str()) {
                return Err(ConfigError::DuplicateLabel(opt.label.clone()));
            }
        }

        let role_labels = [
            ("less", Some(&roles.less)),
            ("equal", Some(&roles.equal)),
            ("greater", Some(&roles.greater)),
            ("other", roles.other.as_ref()),
        ];
        let mut assigned: Vec<(&str, &'static str)> = Vec::with_capacity(role_labels.len());
        for (role, label) in role_labels {
            let Some(label) = label else { continue };
            if !seen.contains(label.as_str()) {
                return Err(ConfigError::UnknownRoleLabel {
                    role,
                    label: label.clone(),
                });
            }
            if let Some((_, first)) = assigned.iter().find(|(l, _)| *l == label.as_str()) {
                return Err(ConfigError::SharedRoleLabel {
                    label: label.clone(),
                    first: *first,
                    second: role,
                });
            }
            assigned.push((label.as_str(), role));
        }

        Ok(Self { options, roles })
    }

    /// The four-label vocabulary with default role names.
    pub fn standard() -> Self {
        let options = vec![
            LabelOption::new("less").with_color("#3498db"),
            LabelOption::new("equal").with_color("#2ecc71"),
            LabelOption::new("greater").with_color("#e74c3c"),
            LabelOption::new("other").with_color("#95a5a6"),
        ];
        Self {
            options,
            roles: LabelRoles::default(),
        }
    }

    pub fn outcome(&self, label: &str) -> Outcome {
        if label == self.roles.less {
            Outcome::Less
        } else if label == self.roles.equal {
            Outcome::Equal
        } else if label == self.roles.greater {
            Outcome::Greater
        } else if self.roles.other.as_deref() == Some(label) {
            Outcome::Other
        } else {
            Outcome::Unrecognized
        }
    }

    /// The configured label string for an ordering outcome.
    pub fn label_for(&self, outcome: Outcome) -> Option<&str> {
        match outcome {
            Outcome::Less => Some(&self.roles.less),
            Outcome::Equal => Some(&self.roles.equal),
            Outcome::Greater => Some(&self.roles.greater),
            Outcome::Other => self.roles.other.as_deref(),
            Outcome::Unrecognized => None,
        }
    }

    pub fn contains(&self, label: &str) -> bool {
        self.option(label).is_some()
    }

    pub fn option(&self, label: &str) -> Option<&LabelOption> {
        self.options.iter().find(|o| o.label == label)
    }

    pub fn color_for(&self, label: &str) -> Option<&str> {
        self.option(label).and_then(|o| o.color.as_deref())
    }

    pub fn options(&self) -> &[LabelOption] {
        &self.options
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.options.iter().map(|o| o.label.as_str())
    }

    pub fn roles(&self) -> &LabelRoles {
        &self.roles
    }
}
