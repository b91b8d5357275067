//! Core error types for FBM

use std::fmt;
use thiserror::Error;

/// Result type alias using `CoreError`
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors raised while building domain values
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Field name does not name a mutable user field
    #[error("Unknown user field: {0}")]
    UnknownField(String),

    /// Field value could not be interpreted
    #[error("Invalid value for {field}: {reason}")]
    InvalidValue {
        /// Field name
        field: String,
        /// Why the value was rejected
        reason: String,
    },
}

impl CoreError {
    /// Create an invalid value error
    pub fn invalid_value(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Classification of persistence failures
///
/// Only `Configuration` is allowed to abort a caller; every other kind is
/// reported through logging and collapsed into a sentinel result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Missing or unusable endpoint/credential settings
    Configuration,
    /// Handshake, transport or remote-side failure
    ConnectionFault,
    /// No row matched
    NotFound,
    /// Anything else, e.g. a row that could not be mapped
    UnexpectedFault,
}

impl ErrorKind {
    /// Label used in log fields
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Configuration => "configuration",
            ErrorKind::ConnectionFault => "connection_fault",
            ErrorKind::NotFound => "not_found",
            ErrorKind::UnexpectedFault => "unexpected_fault",
        }
    }

    /// Whether the failure must abort startup rather than be swallowed
    pub fn is_fatal(&self) -> bool {
        matches!(self, ErrorKind::Configuration)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_configuration_is_fatal() {
        assert!(ErrorKind::Configuration.is_fatal());
        assert!(!ErrorKind::ConnectionFault.is_fatal());
        assert!(!ErrorKind::NotFound.is_fatal());
        assert!(!ErrorKind::UnexpectedFault.is_fatal());
    }

    #[test]
    fn kinds_render_as_log_labels() {
        assert_eq!(ErrorKind::ConnectionFault.to_string(), "connection_fault");
        assert_eq!(
            CoreError::invalid_value("age", "not a number").to_string(),
            "Invalid value for age: not a number"
        );
    }
}
