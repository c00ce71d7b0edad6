//! Repository converting fetch failures into displayable outcomes.
//!
//! This is the only place where errors are classified: connectivity-class
//! failures get a fixed message, everything else is reported as unexpected.
//! Nothing above this layer sees a `FetchError`.

use async_trait::async_trait;

use crate::domain::{FetchOutcome, Video};
use crate::errors::FetchError;
use crate::remote::VideoSource;

/// Message shown for any connectivity-class failure.
pub const NO_CONNECTION_MESSAGE: &str = "No internet connection available.";

/// Fallback used when a failure carries no message.
pub const UNKNOWN_ERROR: &str = "Unknown error";

/// Repository for the video URL.
#[async_trait]
pub trait VideoRepository: Send + Sync + std::fmt::Debug {
    /// Fetches the video URL, never failing: errors become `FetchOutcome::Error`.
    async fn fetch_video_url(&self) -> FetchOutcome<Video>;
}

/// Repository backed by a remote [`VideoSource`].
#[derive(Debug)]
pub struct RemoteVideoRepository {
    source: Box<dyn VideoSource>,
}

impl RemoteVideoRepository {
    pub fn new(source: Box<dyn VideoSource>) -> Self {
        Self { source }
    }
}

#[async_trait]
impl VideoRepository for RemoteVideoRepository {
    async fn fetch_video_url(&self) -> FetchOutcome<Video> {
        match self.source.fetch_video().await {
            Ok(record) => {
                let video = record.into_domain();
                tracing::info!("Fetched video URL: {}", video.url);
                FetchOutcome::Success(video)
            }
            Err(e) => {
                tracing::debug!("Video URL fetch failed: {e:?}");
                FetchOutcome::error(error_message(&e))
            }
        }
    }
}

/// Turns a fetch failure into the message shown to the user.
pub fn error_message(error: &FetchError) -> String {
    if error.is_connectivity() {
        return NO_CONNECTION_MESSAGE.to_string();
    }

    let detail = error.to_string();
    let detail = if detail.trim().is_empty() {
        UNKNOWN_ERROR
    } else {
        detail.as_str()
    };
    format!("Unexpected error: {detail}")
}
