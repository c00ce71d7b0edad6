//! Video record, fetch outcome and UI state types.

use serde::Deserialize;

/// A playable video, identified only by its URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Video {
    pub url: String,
}

impl Video {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

/// Wire record returned by the endpoint: `{"url": "<string>"}`.
///
/// Unknown fields are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct VideoRecord {
    pub url: String,
}

impl VideoRecord {
    /// Converts the wire record into the domain value.
    pub fn into_domain(self) -> Video {
        Video { url: self.url }
    }
}

/// Outcome of a single fetch attempt, already converted for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome<T> {
    Success(T),
    Error { message: String },
}

impl<T> FetchOutcome<T> {
    pub fn error(message: impl Into<String>) -> Self {
        FetchOutcome::Error {
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, FetchOutcome::Success(_))
    }
}

/// State published by the presenter.
///
/// Starts as `Loading` and moves once to one of the terminal variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiState {
    Loading,
    Success(Video),
    Error(String),
}

impl UiState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, UiState::Loading)
    }
}

impl From<FetchOutcome<Video>> for UiState {
    fn from(outcome: FetchOutcome<Video>) -> Self {
        match outcome {
            FetchOutcome::Success(video) => UiState::Success(video),
            FetchOutcome::Error { message } => UiState::Error(message),
        }
    }
}

impl std::fmt::Display for UiState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UiState::Loading => write!(f, "loading"),
            UiState::Success(video) => write!(f, "success({})", video.url),
            UiState::Error(message) => write!(f, "error({message})"),
        }
    }
}
