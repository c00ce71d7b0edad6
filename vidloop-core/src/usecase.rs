//! Use case for retrieving the video to play.

use std::sync::Arc;

use crate::domain::{FetchOutcome, Video};
use crate::repository::VideoRepository;

/// Gets the video URL from the repository.
#[derive(Debug, Clone)]
pub struct GetVideoUrl {
    repository: Arc<dyn VideoRepository>,
}

impl GetVideoUrl {
    pub fn new(repository: Arc<dyn VideoRepository>) -> Self {
        Self { repository }
    }

    pub async fn invoke(&self) -> FetchOutcome<Video> {
        self.repository.fetch_video_url().await
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;

    #[derive(Debug)]
    struct FixedRepository(FetchOutcome<Video>);

    #[async_trait]
    impl VideoRepository for FixedRepository {
        async fn fetch_video_url(&self) -> FetchOutcome<Video> {
            self.0.clone()
        }
    }

    #[tokio::test]
    async fn test_repeated_invocations_are_equal() {
        let use_case = GetVideoUrl::new(Arc::new(FixedRepository(FetchOutcome::Success(
            Video::new("https://example.com/a.mp4"),
        ))));

        let first = use_case.invoke().await;
        let second = use_case.invoke().await;
        assert_eq!(first, second);
        assert!(first.is_success());
    }

    #[tokio::test]
    async fn test_errors_pass_through() {
        let use_case = GetVideoUrl::new(Arc::new(FixedRepository(FetchOutcome::error(
            "No internet connection available.",
        ))));

        assert_eq!(
            use_case.invoke().await,
            FetchOutcome::error("No internet connection available.")
        );
    }
}
