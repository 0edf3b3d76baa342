/*!
 * Error types for apistore
 */

use apistore_http::HttpSetupError;
use apistore_interface::{DecodeError, TransportError};
use std::io;
use thiserror::Error;

use crate::outcome::Outcome;

/// Result of one executor call
pub type ApiResult<T> = std::result::Result<Outcome<T>, ApiError>;

/// Classified failure of one executor call
#[derive(Error, Debug)]
pub enum ApiError {
    /// Gate reported the network unreachable; nothing was dispatched
    #[error("Network connection is unavailable")]
    ConnectionUnavailable,

    /// Network, protocol or status failure reported by the transport
    #[error("Transport failure: {0}")]
    Transport(#[from] TransportError),

    /// Payload did not match the expected response type
    #[error("Decoding failure: {0}")]
    Decoding(#[from] DecodeError),

    /// `cancel()` won the race against completion
    #[error("Request was cancelled")]
    Cancelled,
}

impl ApiError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ApiError::Cancelled)
    }

    /// Whether the failure stems from missing connectivity rather than the server
    pub fn is_connectivity(&self) -> bool {
        matches!(
            self,
            ApiError::ConnectionUnavailable | ApiError::Transport(TransportError::Connect(_))
        )
    }

    /// Check if this error is transient (temporary, worth retrying by the caller)
    pub fn is_transient(&self) -> bool {
        match self {
            ApiError::ConnectionUnavailable => true,
            ApiError::Transport(e) => e.is_transient(),
            ApiError::Decoding(_) | ApiError::Cancelled => false,
        }
    }

    /// HTTP status behind the failure, if the server answered
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Transport(e) => e.status(),
            _ => None,
        }
    }
}

/// Failures while loading configuration or wiring collaborators
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to initialize logging: {0}")]
    Logging(String),

    #[error("Failed to build HTTP transport: {0}")]
    Transport(#[from] HttpSetupError),
}
