//! Error types for the coverage client.

use thiserror::Error;

pub type DdsResult<T> = Result<T, DdsError>;

#[derive(Error, Debug)]
pub enum DdsError {
    /// Transport failure (connection, TLS, timeout, body read)
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status
    #[error("{url} returned {status}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },

    /// The response body is not what the endpoint promises
    #[error("Invalid response from {url}: {reason}")]
    InvalidResponse { url: String, reason: String },

    /// Invalid client configuration
    #[error("Invalid configuration: {0}")]
    Config(String),
}
