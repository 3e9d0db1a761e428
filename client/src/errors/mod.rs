//! Client-wide error types.
//!
//! Ordinary HTTP-level failures never become errors: the request pipeline
//! turns them into [`ApiResult`](crate::api::common::ApiResult) values. The
//! variants here cover what cannot be expressed as a result envelope.

use thiserror::Error;

/// Errors raised by the session client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// A success response whose body does not match the expected shape.
    #[error("Decode error: {message}")]
    Decode { message: String },

    /// The caller cancelled the operation.
    #[error("Operation cancelled")]
    Cancelled,

    /// The session store could not be read or written.
    #[error("Session store error: {message}")]
    Store { message: String },

    /// Local input validation failed before anything was sent.
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// A request body could not be serialized.
    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    #[error("Configuration error: {source}")]
    Config {
        #[from]
        source: anyhow::Error,
    },
}

pub type ClientResult<T> = Result<T, ClientError>;

impl ClientError {
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    pub fn store(message: impl Into<String>) -> Self {
        Self::Store {
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }
}

/// Failure to obtain any response from the server.
#[derive(Debug, Clone, Error)]
#[error("Transport error: {0}")]
pub struct TransportError(pub String);
