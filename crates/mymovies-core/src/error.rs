//! Error types for remote operations and sync

use thiserror::Error;

use crate::storage::StoreError;

/// Errors from the search API or the remote document store
#[derive(Debug, Error)]
pub enum NetworkError {
    /// Transport failure (connect, timeout, TLS, ...)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-2xx status
    #[error("{method} {url} failed with status {status}")]
    Status {
        method: &'static str,
        url: String,
        status: u16,
    },

    /// The response body was not the expected JSON
    #[error("Failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    /// A configured URL could not be parsed
    #[error("Invalid URL '{url}': {details}")]
    InvalidUrl { url: String, details: String },

    /// No remote store is configured
    #[error("Remote store is not configured")]
    Offline,
}

impl NetworkError {
    /// Create a status error
    pub fn status(method: &'static str, url: impl Into<String>, status: u16) -> Self {
        Self::Status {
            method,
            url: url.into(),
            status,
        }
    }

    /// HTTP status if the server answered
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// True when the failure is only the absence of a remote store
    pub fn is_offline(&self) -> bool {
        matches!(self, Self::Offline)
    }
}

/// Errors from a pull
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Failed to fetch remote snapshot: {0}")]
    Network(#[from] NetworkError),

    #[error("Failed to merge remote snapshot: {0}")]
    Store(#[from] StoreError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_display() {
        let err = NetworkError::status("PUT", "https://movies.example.com/abc.json", 401);
        let msg = err.to_string();
        assert!(msg.contains("PUT"));
        assert!(msg.contains("401"));
        assert_eq!(err.status_code(), Some(401));
    }

    #[test]
    fn test_offline() {
        assert!(NetworkError::Offline.is_offline());
        assert!(NetworkError::Offline.status_code().is_none());
        assert!(!NetworkError::status("GET", "x", 500).is_offline());
    }

    #[test]
    fn test_sync_error_wraps_sources() {
        let err: SyncError = NetworkError::Offline.into();
        assert!(matches!(err, SyncError::Network(NetworkError::Offline)));

        let err: SyncError = StoreError::NotFound(uuid::Uuid::nil()).into();
        assert!(err.to_string().starts_with("Failed to merge"));
    }
}
