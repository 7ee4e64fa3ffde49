//! Error types for ipsync
//!
//! Every error is terminal for a run: nothing here is retried. The external
//! scheduler that invokes the binary is expected to try again later.

use thiserror::Error;

/// Result type alias for ipsync operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for ipsync
#[derive(Error, Debug)]
pub enum Error {
    /// Missing or invalid credentials, unreadable or unparseable config file
    #[error("Configuration error: {0}")]
    Config(String),

    /// Transport failure on any HTTP call
    #[error("Network error: {0}")]
    Network(String),

    /// Non-success HTTP status where one is not tolerated
    #[error("HTTP error: {0}")]
    Http(String),

    /// Malformed JSON envelope or inner backend string
    #[error("Decode error: {0}")]
    Decode(String),

    /// No site matches the configured domain
    #[error("Not found: {0}")]
    NotFound(String),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a network error
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    /// Create an HTTP status error
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }

    /// Create a decode error
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Create a "not found" error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Whether this error came from configuration loading
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_errors_become_decode_errors() {
        let err: Error = serde_json::from_str::<Vec<u32>>("not json")
            .unwrap_err()
            .into();
        assert!(matches!(err, Error::Decode(_)));
    }

    #[test]
    fn only_config_errors_report_is_config() {
        assert!(Error::config("missing key").is_config());
        assert!(!Error::network("connection refused").is_config());
        assert!(!Error::not_found("example.com").is_config());
    }
}
