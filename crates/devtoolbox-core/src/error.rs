//! Error types shared by the core transforms and services.
//!
//! All of them are local and recoverable: the caller shows the message next
//! to the failing input and the user edits it.

use std::fmt;

use serde::Serialize;

/// The input format a [`ConvertError`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Format {
    Base64,
    Json,
    Yaml,
    HtmlEntities,
    Html,
    Image,
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Format::Base64 => "Base64",
            Format::Json => "JSON",
            Format::Yaml => "YAML",
            Format::HtmlEntities => "HTML entities",
            Format::Html => "HTML",
            Format::Image => "image",
        };
        f.write_str(name)
    }
}

/// Failure of a whole-input conversion. No partial output accompanies it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConvertError {
    #[error("invalid {format}: {message}")]
    Parse { format: Format, message: String },

    #[error("{0} input must not be empty")]
    EmptyInput(Format),
}

impl ConvertError {
    pub fn parse(format: Format, message: impl fmt::Display) -> Self {
        ConvertError::Parse {
            format,
            message: message.to_string(),
        }
    }

    pub fn format(&self) -> Format {
        match self {
            ConvertError::Parse { format, .. } | ConvertError::EmptyInput(format) => *format,
        }
    }
}

/// A regex pattern (or flag string) the engine refused to compile.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid regular expression: {message}")]
pub struct RegexCompileError {
    /// The engine's own message.
    pub message: String,
}

/// Rejected [`GenerationRequest`](crate::lorem::GenerationRequest).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoremError {
    #[error("invalid generation request: {field} {reason}")]
    InvalidRequest { field: &'static str, reason: String },
}

/// Failure converting a timestamp or date string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimestampError {
    #[error("timestamp {0} is out of the representable range")]
    OutOfRange(i64),

    #[error("unrecognized date: {0}")]
    Unparseable(String),
}

/// Errors raised by the account-backed services (bookmarks, feedback).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ServiceError {
    /// A required field was empty. Checked before any collaborator call.
    #[error("{0} is required")]
    UserInputMissing(&'static str),

    /// The document store or auth provider failed or is not configured.
    #[error("collaborator unavailable: {0}")]
    CollaboratorUnavailable(String),
}
