//! Transport-level errors.

use thiserror::Error;

/// Why an HTTP exchange produced no response.
///
/// Status codes are not errors at this layer; the delivery executor
/// classifies them.
#[derive(Debug, Error)]
pub enum HttpError {
    /// Network connection failed.
    ///
    /// DNS resolution failures, refused or reset connections, and
    /// failures while reading the response body.
    #[error("Connection error: {0}")]
    Connection(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The receiver did not answer within the deadline.
    #[error("Request timed out")]
    Timeout,

    /// The request could not be built from the target URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}
