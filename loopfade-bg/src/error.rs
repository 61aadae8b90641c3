//! Error types for loopfade-bg
//!
//! Connection failures and command failures are separate types: a
//! [`ConnectionError`] aborts startup, while a [`CommandError`] is logged by the
//! crossfade executor and the cycle carries on.

use std::time::Duration;
use thiserror::Error;

/// Main error type for loopfade-bg
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration file loading or validation errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Control channel could not be established
    #[error("Connection error: {0}")]
    Connection(#[from] ConnectionError),

    /// A single control command failed
    #[error("Command error: {0}")]
    Command(#[from] CommandError),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<loopfade_common::Error> for Error {
    fn from(err: loopfade_common::Error) -> Self {
        match err {
            loopfade_common::Error::Io(e) => Error::Io(e),
            loopfade_common::Error::Config(msg) | loopfade_common::Error::InvalidInput(msg) => {
                Error::Config(msg)
            }
        }
    }
}

/// Failure to open or authenticate the control session
#[derive(Error, Debug)]
pub enum ConnectionError {
    /// No response within the connect timeout
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// WebSocket transport failure
    #[error("transport failure: {0}")]
    Transport(String),

    /// Server sent something other than the expected handshake frame
    #[error("handshake failed: {0}")]
    Handshake(String),

    /// Server requires a password but none was configured
    #[error("server requires authentication but no password is configured")]
    PasswordRequired,

    /// Server closed the session during the handshake
    #[error("connection closed by server{}", .0.as_ref().map(|r| format!(": {}", r)).unwrap_or_default())]
    Closed(Option<String>),
}

/// Failure of one set-media / set-opacity / scene command
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CommandError {
    /// Server processed the request and reported failure
    #[error("{request_type} rejected (code {code}){}", .comment.as_ref().map(|c| format!(": {}", c)).unwrap_or_default())]
    Rejected {
        request_type: String,
        code: u32,
        comment: Option<String>,
    },

    /// No response within the request timeout
    #[error("{request_type} timed out after {timeout:?}")]
    Timeout {
        request_type: String,
        timeout: Duration,
    },

    /// Transport failed while sending or awaiting the response
    #[error("transport failure: {0}")]
    Transport(String),

    /// Response could not be decoded
    #[error("protocol error: {0}")]
    Protocol(String),
}

/// Convenience Result type using loopfade-bg Error
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejected_display_includes_comment() {
        let err = CommandError::Rejected {
            request_type: "SetInputSettings".to_string(),
            code: 600,
            comment: Some("No source was found".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "SetInputSettings rejected (code 600): No source was found"
        );
    }

    #[test]
    fn test_rejected_display_without_comment() {
        let err = CommandError::Rejected {
            request_type: "SetSourceFilterSettings".to_string(),
            code: 601,
            comment: None,
        };
        assert_eq!(err.to_string(), "SetSourceFilterSettings rejected (code 601)");
    }

    #[test]
    fn test_common_config_error_maps_to_config() {
        let err: Error = loopfade_common::Error::Config("bad".to_string()).into();
        assert!(matches!(err, Error::Config(msg) if msg == "bad"));
    }

    #[test]
    fn test_closed_display() {
        assert_eq!(
            ConnectionError::Closed(None).to_string(),
            "connection closed by server"
        );
        assert_eq!(
            ConnectionError::Closed(Some("Authentication failed.".to_string())).to_string(),
            "connection closed by server: Authentication failed."
        );
    }
}
