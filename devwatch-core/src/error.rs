//! Error types for devwatch

use thiserror::Error;

/// Result type alias for devwatch operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for devwatch operations
#[derive(Error, Debug)]
pub enum Error {
    /// The HTTP call itself exceeded the request timeout
    #[error("Request timed out: {0}")]
    RequestTimeout(String),

    /// The server could not be reached
    #[error("Connection failed: {0}")]
    Connection(String),

    /// Server answered with a non-success status
    #[error("API returned status {status}: {body}")]
    Api { status: u16, body: String },

    /// Response body did not have the expected shape
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Chat message could not be delivered
    #[error("Message delivery failed: {0}")]
    Delivery(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

/// How the poll loop reacts to a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Retry immediately with the same cursor
    RequestTimeout,
    /// Wait the short backoff, then retry with the same cursor
    ConnectionFailure,
    /// Wait the long backoff, then retry with the same cursor
    Unexpected,
}

impl Error {
    /// Classify this error for the poll loop's retry policy
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            Error::RequestTimeout(_) => FailureKind::RequestTimeout,
            Error::Connection(_) => FailureKind::ConnectionFailure,
            _ => FailureKind::Unexpected,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_kind_classification() {
        assert_eq!(
            Error::RequestTimeout("read".into()).failure_kind(),
            FailureKind::RequestTimeout
        );
        assert_eq!(
            Error::Connection("refused".into()).failure_kind(),
            FailureKind::ConnectionFailure
        );
        assert_eq!(
            Error::MalformedResponse("no status".into()).failure_kind(),
            FailureKind::Unexpected
        );
        assert_eq!(
            Error::Delivery("chat not found".into()).failure_kind(),
            FailureKind::Unexpected
        );
        assert_eq!(
            Error::Api {
                status: 502,
                body: String::new()
            }
            .failure_kind(),
            FailureKind::Unexpected
        );
    }
}
