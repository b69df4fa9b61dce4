//! HTTP request execution error types.

use thiserror::Error;

/// Errors that can occur while sending a request.
#[derive(Debug, Error)]
pub enum RequestError {
    /// Connection failures, DNS errors and other network-level issues.
    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out")]
    Timeout,

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// Certificate validation and handshake failures.
    #[error("TLS/SSL error: {0}")]
    Tls(String),

    /// The request could not be constructed from its parts.
    #[error("request build error: {0}")]
    Build(String),

    #[error("unknown HTTP client {0:?}")]
    UnknownClient(String),
}

impl From<reqwest::Error> for RequestError {
    fn from(err: reqwest::Error) -> Self {
        let message = err.to_string();
        if err.is_timeout() {
            RequestError::Timeout
        } else if err.is_builder() {
            RequestError::Build(message)
        } else if message.contains("certificate") || message.contains("TLS") || message.contains("SSL") {
            RequestError::Tls(message)
        } else {
            RequestError::Network(message)
        }
    }
}

impl From<url::ParseError> for RequestError {
    fn from(err: url::ParseError) -> Self {
        RequestError::InvalidUrl(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let network_err = RequestError::Network("connection refused".to_string());
        assert_eq!(network_err.to_string(), "network error: connection refused");

        assert_eq!(RequestError::Timeout.to_string(), "request timed out");

        let client_err = RequestError::UnknownClient("admin".to_string());
        assert_eq!(client_err.to_string(), "unknown HTTP client \"admin\"");
    }

    #[test]
    fn test_url_error_conversion() {
        let err: RequestError = url::Url::parse("not a url").unwrap_err().into();
        assert!(matches!(err, RequestError::InvalidUrl(_)));
    }
}
