//! Structured comparison keys and their string encoding.
//!
//! A comparison is identified by `(document, first line uid, second line uid)`.
//! On disk the three parts are joined with [`SEPARATOR`]:
//!
//! ```text
//! doc1.pdf___12___13
//! ```
//!
//! Decoding splits from the right, so a document name may contain the
//! separator. Uids may not: a uid must be non-empty, must not contain `___`
//! and must not begin or end with `_` (a boundary underscore would run into
//! the separator and the split point would be ambiguous).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::TaskIdError;

/// Joins the three parts of an encoded task id.
pub const SEPARATOR: &str = "___";

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId {
    doc_name: String,
    first_uid: String,
    second_uid: String,
}

impl TaskId {
    /// Build a key, rejecting any part that would make the encoding ambiguous.
    pub fn new(
        doc_name: impl Into<String>,
        first_uid: impl Into<String>,
        second_uid: impl Into<String>,
    ) -> Result<Self, TaskIdError> {
        let doc_name = doc_name.into();
        let first_uid = first_uid.into();
        let second_uid = second_uid.into();

        if doc_name.is_empty() {
            return Err(TaskIdError::EmptyDocument);
        }
        validate_uid(&first_uid)?;
        validate_uid(&second_uid)?;

        Ok(Self {
            doc_name,
            first_uid,
            second_uid,
        })
    }

    /// Parse an encoded key back into its parts.
    pub fn decode(key: &str) -> Result<Self, TaskIdError> {
        let malformed = || TaskIdError::Malformed {
            key: key.to_string(),
        };

        let mut parts = key.rsplitn(3, SEPARATOR);
        let second = parts.next().ok_or_else(malformed)?;
        let first = parts.next().ok_or_else(malformed)?;
        let doc = parts.next().ok_or_else(malformed)?;

        Self::new(doc, first, second).map_err(|_| malformed())
    }

    pub fn encode(&self) -> String {
        format!(
            "{}{SEPARATOR}{}{SEPARATOR}{}",
            self.doc_name, self.first_uid, self.second_uid
        )
    }

    pub fn doc_name(&self) -> &str {
        &self.doc_name
    }

    pub fn first_uid(&self) -> &str {
        &self.first_uid
    }

    pub fn second_uid(&self) -> &str {
        &self.second_uid
    }
}

fn validate_uid(uid: &str) -> Result<(), TaskIdError> {
    let reason = if uid.is_empty() {
        "uid is empty"
    } else if uid.contains(SEPARATOR) {
        "uid contains the task id separator"
    } else if uid.starts_with('_') || uid.ends_with('_') {
        "uid starts or ends with an underscore"
    } else {
        return Ok(());
    };
    Err(TaskIdError::InvalidUid {
        uid: uid.to_string(),
        reason,
    })
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl FromStr for TaskId {
    type Err = TaskIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(s)
    }
}

impl Serialize for TaskId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.encode())
    }
}

impl<'de> Deserialize<'de> for TaskId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let key = String::deserialize(deserializer)?;
        Self::decode(&key).map_err(serde::de::Error::custom)
    }
}
