//! Error type shared by every syscan crate.

use std::collections::BTreeMap;
use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Payload of a [`SyscanError`]: a stable code, a message and the location
/// of the problem (dataset, file, point, column).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Machine readable code, e.g. `width-mismatch`.
    pub code: String,
    /// Diagnostic for humans.
    pub message: String,
    /// Where the error happened.
    #[serde(default)]
    pub context: BTreeMap<String, String>,
    /// How to fix it, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ErrorInfo {
    /// Payload without context.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            context: BTreeMap::new(),
            hint: None,
        }
    }

    /// Adds or replaces a context entry.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Shorthand for the `point` context entry.
    pub fn at_point(self, point: usize) -> Self {
        self.with_context("point", point.to_string())
    }

    /// Sets the remediation hint.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        let mut entries = self.context.iter();
        if let Some((key, value)) = entries.next() {
            write!(f, " ({key}={value}")?;
            for (key, value) in entries {
                write!(f, " {key}={value}")?;
            }
            write!(f, ")")?;
        }
        match &self.hint {
            Some(hint) => write!(f, "; hint: {hint}"),
            None => Ok(()),
        }
    }
}

/// Error raised while ingesting a dataset. Every family abandons the dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "family", content = "detail")]
pub enum SyscanError {
    /// Missing or unreadable raw input.
    #[error("input: {0}")]
    Input(ErrorInfo),
    /// Unparseable numbers, range violations, shape mismatches.
    #[error("format: {0}")]
    Format(ErrorInfo),
    /// The covariance admits no artificial systematics.
    #[error("decomposition: {0}")]
    Decomposition(ErrorInfo),
    /// Broken table invariant (width, duality, missing slot).
    #[error("table: {0}")]
    Table(ErrorInfo),
    /// Unknown dataset or invalid configuration.
    #[error("config: {0}")]
    Config(ErrorInfo),
    /// Serialization or output failure.
    #[error("serde: {0}")]
    Serde(ErrorInfo),
}

impl SyscanError {
    fn parts(&mut self) -> &mut ErrorInfo {
        match self {
            SyscanError::Input(info)
            | SyscanError::Format(info)
            | SyscanError::Decomposition(info)
            | SyscanError::Table(info)
            | SyscanError::Config(info)
            | SyscanError::Serde(info) => info,
        }
    }

    /// The payload, whatever the family.
    pub fn info(&self) -> &ErrorInfo {
        match self {
            SyscanError::Input(info)
            | SyscanError::Format(info)
            | SyscanError::Decomposition(info)
            | SyscanError::Table(info)
            | SyscanError::Config(info)
            | SyscanError::Serde(info) => info,
        }
    }

    /// Records the dataset unless a nested call already did.
    pub fn in_dataset(mut self, dataset: &str) -> Self {
        self.parts()
            .context
            .entry("dataset".to_string())
            .or_insert_with(|| dataset.to_string());
        self
    }
}
