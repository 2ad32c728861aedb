use serde::{Deserialize, Serialize};

use forgetrack_core::ValueObject;

use crate::WorkflowError;

/// A single ticket status label (e.g. `IN_PROGRESS`).
///
/// Labels are non-empty and restricted to upper-case ASCII letters, digits,
/// `_` and `-`. Comparison is exact: `todo` and `TODO` are different labels,
/// and `todo` is not a valid label at all.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StatusLabel(String);

impl StatusLabel {
    pub fn parse(raw: impl Into<String>) -> Result<Self, WorkflowError> {
        let raw = raw.into();
        if raw.is_empty() {
            return Err(WorkflowError::validation("status label cannot be empty"));
        }
        if let Some(bad) = raw.chars().find(|c| !is_label_char(*c)) {
            return Err(WorkflowError::validation(format!(
                "status label '{raw}' contains invalid character '{bad}' (allowed: A-Z, 0-9, '_', '-')"
            )));
        }
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn is_label_char(c: char) -> bool {
    c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_' || c == '-'
}

impl ValueObject for StatusLabel {}

impl core::fmt::Display for StatusLabel {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for StatusLabel {
    type Error = WorkflowError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<StatusLabel> for String {
    fn from(value: StatusLabel) -> Self {
        value.0
    }
}

impl PartialEq<str> for StatusLabel {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}
