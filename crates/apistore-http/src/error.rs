//! Error types for the apistore-http crate

use apistore_interface::TransportError;
use thiserror::Error;

/// Failures while building an `HttpTransport`
#[derive(Error, Debug)]
pub enum HttpSetupError {
    #[error("HttpTransport must be created inside a tokio runtime")]
    NoRuntime,

    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("Invalid base URL {url}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("Invalid default header {name}: {reason}")]
    InvalidHeader { name: String, reason: String },
}

/// Classify a reqwest failure, keeping it as the source
pub(crate) fn classify(err: reqwest::Error) -> TransportError {
    if err.is_builder() {
        TransportError::InvalidRequest(err.to_string())
    } else if err.is_timeout() {
        TransportError::Timeout(Box::new(err))
    } else if err.is_connect() {
        TransportError::Connect(Box::new(err))
    } else {
        TransportError::Protocol(Box::new(err))
    }
}
