//! Error types for fetching and playback.

use thiserror::Error;

/// Errors produced by a video source while fetching the URL record.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Connectivity probe reported the network as unavailable.
    #[error("No internet connection available")]
    ConnectivityUnavailable,

    /// TCP connection to the endpoint could not be established.
    #[error("Connection to {url} failed: {reason}")]
    Connect {
        /// Endpoint that was requested
        url: String,
        /// Underlying transport failure
        reason: String,
    },

    /// Request did not complete within the configured timeout.
    #[error("Request to {url} timed out")]
    Timeout {
        /// Endpoint that was requested
        url: String,
    },

    /// Endpoint answered with a non-2xx status.
    #[error("HTTP {status} from {url}")]
    Status {
        /// Endpoint that was requested
        url: String,
        /// Status code returned by the server
        status: u16,
    },

    /// Response body was not the expected JSON record.
    #[error("Malformed response body: {reason}")]
    Decode {
        /// Parser failure description
        reason: String,
    },

    /// Any other request failure.
    #[error("{reason}")]
    Request {
        /// Failure description
        reason: String,
    },
}

impl FetchError {
    /// Maps a `reqwest` failure into the matching variant.
    pub fn from_reqwest(url: &str, error: reqwest::Error) -> Self {
        if error.is_timeout() {
            FetchError::Timeout {
                url: url.to_string(),
            }
        } else if error.is_connect() {
            FetchError::Connect {
                url: url.to_string(),
                reason: error.to_string(),
            }
        } else if error.is_decode() {
            FetchError::Decode {
                reason: error.to_string(),
            }
        } else if let Some(status) = error.status() {
            FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            }
        } else {
            FetchError::Request {
                reason: error.to_string(),
            }
        }
    }

    /// Checks if the failure means the network could not be reached at all.
    ///
    /// A passing probe does not guarantee the request itself reaches the
    /// server, so connect and timeout failures count here too.
    pub fn is_connectivity(&self) -> bool {
        matches!(
            self,
            FetchError::ConnectivityUnavailable
                | FetchError::Connect { .. }
                | FetchError::Timeout { .. }
        )
    }
}

/// Errors produced by playback sinks.
#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("No media source set")]
    NoSource,

    #[error("Player already released")]
    Released,

    #[error("Failed to start player '{command}': {reason}")]
    Spawn { command: String, reason: String },

    #[error("Player IPC failed: {reason}")]
    Ipc { reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connectivity_classification() {
        assert!(FetchError::ConnectivityUnavailable.is_connectivity());
        assert!(
            FetchError::Timeout {
                url: "http://localhost/video_url.json".to_string()
            }
            .is_connectivity()
        );
        assert!(
            FetchError::Connect {
                url: "http://localhost/video_url.json".to_string(),
                reason: "refused".to_string(),
            }
            .is_connectivity()
        );
        assert!(
            !FetchError::Status {
                url: "http://localhost/video_url.json".to_string(),
                status: 404,
            }
            .is_connectivity()
        );
        assert!(
            !FetchError::Decode {
                reason: "expected value".to_string()
            }
            .is_connectivity()
        );
    }

    #[test]
    fn test_status_message() {
        let error = FetchError::Status {
            url: "http://cdn.test/video_url.json".to_string(),
            status: 503,
        };
        assert_eq!(error.to_string(), "HTTP 503 from http://cdn.test/video_url.json");
    }
}
