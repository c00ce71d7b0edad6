//! Vidloop Core - fetch a video URL and hand it to a looping player
//!
//! This crate holds the whole pipeline: the remote fetch adapter, the
//! repository that turns transport failures into user-facing outcomes, the
//! use case, the presenter that publishes UI state, and the playback session
//! that drives an external player.

pub mod app;
pub mod config;
pub mod domain;
pub mod errors;
pub mod playback;
pub mod presenter;
pub mod remote;
pub mod repository;
pub mod screen;
pub mod tracing_setup;
pub mod usecase;

// Re-export main types for convenient access
pub use config::VidloopConfig;
pub use domain::{FetchOutcome, UiState, Video, VideoRecord};
pub use errors::{FetchError, PlaybackError};
pub use playback::{HostSignal, PlaybackSession, PlaybackSink, RecordingSink};
pub use presenter::VideoPresenter;
pub use repository::{RemoteVideoRepository, VideoRepository};
pub use screen::{Notifier, VideoScreen};
pub use usecase::GetVideoUrl;

/// Top-level errors surfaced by Vidloop operations.
///
/// Fetch failures normally stop at the repository boundary and become
/// [`FetchOutcome::Error`]; this type covers setup and playback problems
/// plus the case where a caller wants a terminal fetch error as a value.
#[derive(Debug, thiserror::Error)]
pub enum VidloopError {
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Playback error: {0}")]
    Playback(#[from] PlaybackError),

    #[error("Configuration error: {reason}")]
    Configuration { reason: String },

    #[error("Video unavailable: {message}")]
    VideoUnavailable { message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl VidloopError {
    /// Returns a short message suitable for showing to the user.
    pub fn user_message(&self) -> String {
        match self {
            VidloopError::Fetch(e) if e.is_connectivity() => {
                repository::NO_CONNECTION_MESSAGE.to_string()
            }
            VidloopError::Fetch(_) => "Could not load the video".to_string(),
            VidloopError::Playback(PlaybackError::Spawn { command, .. }) => {
                format!("Could not start player '{command}'")
            }
            VidloopError::Playback(_) => "Playback error occurred".to_string(),
            VidloopError::Configuration { reason } => format!("Invalid configuration: {reason}"),
            VidloopError::VideoUnavailable { message } => message.clone(),
            VidloopError::Io(_) => "I/O error occurred".to_string(),
        }
    }

    /// Checks if this error comes from invalid user input or settings.
    pub fn is_user_error(&self) -> bool {
        matches!(self, VidloopError::Configuration { .. })
    }
}

pub type Result<T> = std::result::Result<T, VidloopError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_for_connectivity_failure() {
        let error = VidloopError::from(FetchError::ConnectivityUnavailable);
        assert_eq!(error.user_message(), "No internet connection available.");
        assert!(!error.is_user_error());
    }

    #[test]
    fn test_configuration_is_user_error() {
        let error = VidloopError::Configuration {
            reason: "bad url".to_string(),
        };
        assert!(error.is_user_error());
        assert_eq!(error.user_message(), "Invalid configuration: bad url");
    }
}
