//! Error types for the persistence gateway.

use crate::mapper::MappingError;
use fbm_core::{ErrorKind, UserId};
use thiserror::Error;

/// Errors that can occur while talking to the remote backend.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Endpoint or credential settings are missing or unusable
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Backend is offline or unreachable
    #[error("Backend unreachable: {0}")]
    Unreachable(String),

    /// Backend returned an error response
    #[error("Backend error ({status}): {message}")]
    Remote { status: u16, message: String },

    /// Response body was not the expected JSON shape
    #[error("Failed to parse response: {0}")]
    Protocol(String),

    /// No row matched the requested ID
    #[error("User not found: {id}")]
    NotFound { id: UserId },

    /// A row could not be translated into a user
    #[error(transparent)]
    Mapping(#[from] MappingError),

    /// Anything else
    #[error("Unexpected fault: {0}")]
    Unexpected(String),
}

impl GatewayError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            GatewayError::Config(_) => ErrorKind::Configuration,
            GatewayError::Request(_)
            | GatewayError::Unreachable(_)
            | GatewayError::Remote { .. }
            | GatewayError::Protocol(_) => ErrorKind::ConnectionFault,
            GatewayError::NotFound { .. } => ErrorKind::NotFound,
            GatewayError::Mapping(_) | GatewayError::Unexpected(_) => ErrorKind::UnexpectedFault,
        }
    }

    /// Wrap an error from `RequestBuilder::send`.
    pub(crate) fn from_send(e: reqwest::Error) -> Self {
        if e.is_connect() || e.is_timeout() {
            GatewayError::Unreachable(e.to_string())
        } else {
            GatewayError::Request(e)
        }
    }
}

impl From<config::ConfigError> for GatewayError {
    fn from(err: config::ConfigError) -> Self {
        GatewayError::Config(err.to_string())
    }
}

/// Result type for gateway operations.
pub type Result<T> = std::result::Result<T, GatewayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_follow_the_taxonomy() {
        assert_eq!(
            GatewayError::Config("x".into()).kind(),
            ErrorKind::Configuration
        );
        assert_eq!(
            GatewayError::Unreachable("x".into()).kind(),
            ErrorKind::ConnectionFault
        );
        assert_eq!(
            GatewayError::Remote {
                status: 500,
                message: String::new()
            }
            .kind(),
            ErrorKind::ConnectionFault
        );
        assert_eq!(
            GatewayError::Protocol("x".into()).kind(),
            ErrorKind::ConnectionFault
        );
        assert_eq!(GatewayError::NotFound { id: 7 }.kind(), ErrorKind::NotFound);
        assert_eq!(
            GatewayError::Mapping(MappingError::NotAnObject).kind(),
            ErrorKind::UnexpectedFault
        );
        assert!(GatewayError::Config("x".into()).kind().is_fatal());
        assert!(!GatewayError::NotFound { id: 7 }.kind().is_fatal());
    }

    #[test]
    fn not_found_message_names_the_id() {
        assert_eq!(
            GatewayError::NotFound { id: 42 }.to_string(),
            "User not found: 42"
        );
    }
}
