use docchat_types::fallback;
use thiserror::Error;

/// Everything that can go wrong between sending a query and reading its reply
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("network failure: {0}")]
    Network(String),

    #[error("server answered with status {0}")]
    Status(u16),

    #[error("request timed out")]
    Timeout,

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("socket closed while a reply was pending")]
    SocketClosed,

    #[error("socket unavailable: {0}")]
    SocketUnavailable(String),
}

impl TransportError {
    /// The reply shown to the reader in place of an answer
    pub fn fallback_text(&self) -> &'static str {
        match self {
            TransportError::Network(_) => fallback::NETWORK_FAILURE,
            TransportError::Status(_) => fallback::SERVER_ERROR,
            TransportError::Timeout => fallback::TIMEOUT,
            TransportError::Malformed(_) => fallback::MALFORMED_RESPONSE,
            TransportError::SocketClosed => fallback::SOCKET_CLOSED,
            TransportError::SocketUnavailable(_) => fallback::SOCKET_UNAVAILABLE,
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            TransportError::Malformed(e.to_string())
        } else if let Some(status) = e.status() {
            TransportError::Status(status.as_u16())
        } else {
            TransportError::Network(e.to_string())
        }
    }
}

/// Local storage failures
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage backend error: {0}")]
    Backend(String),

    #[error("corrupt record under {key}: {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("no chat endpoint configured")]
    MissingEndpoint,

    #[error("endpoint {endpoint} is not usable for the {transport} transport")]
    SchemeMismatch { endpoint: String, transport: String },

    #[error("database name must not be empty")]
    EmptyDatabaseName,

    #[error("no socket connector available on this platform")]
    MissingConnector,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_socket_closure_reads_as_unreachable() {
        assert_eq!(
            TransportError::SocketClosed.fallback_text(),
            "Sorry, the server could not be reached."
        );
    }

    #[test]
    fn test_timeout_fallback() {
        assert_eq!(TransportError::Timeout.fallback_text(), fallback::TIMEOUT);
        assert_eq!(TransportError::Timeout.to_string(), "request timed out");
    }
}
