//! Presenter holding the observable UI state.
//!
//! The state starts as [`UiState::Loading`]. Launching spawns exactly one
//! fetch task; that task owns the only writer and drops it right after
//! publishing the terminal state, so observers see at most one transition
//! followed by channel closure. Dropping the presenter aborts a fetch that
//! is still in flight.

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::domain::UiState;
use crate::usecase::GetVideoUrl;

pub struct VideoPresenter {
    state: watch::Receiver<UiState>,
    task: JoinHandle<()>,
}

impl VideoPresenter {
    /// Publishes `Loading` and starts the single fetch.
    ///
    /// Must be called from within a tokio runtime.
    pub fn launch(use_case: GetVideoUrl) -> Self {
        let (writer, state) = watch::channel(UiState::Loading);

        let task = tokio::spawn(async move {
            let terminal = UiState::from(use_case.invoke().await);
            tracing::debug!("Presenter state: loading -> {terminal}");
            writer.send_replace(terminal);
        });

        Self { state, task }
    }

    /// Returns a receiver that observes the loading and terminal states.
    pub fn subscribe(&self) -> watch::Receiver<UiState> {
        self.state.clone()
    }

    /// Current state.
    pub fn state(&self) -> UiState {
        self.state.borrow().clone()
    }

    /// Checks if the terminal state has been published.
    pub fn is_settled(&self) -> bool {
        self.state.borrow().is_terminal()
    }
}

impl std::fmt::Debug for VideoPresenter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VideoPresenter")
            .field("state", &*self.state.borrow())
            .field("finished", &self.task.is_finished())
            .finish()
    }
}

impl Drop for VideoPresenter {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use tokio::sync::Notify;

    use super::*;
    use crate::domain::{FetchOutcome, Video};
    use crate::repository::VideoRepository;

    /// Repository that blocks until released and counts invocations.
    #[derive(Debug)]
    struct GatedRepository {
        gate: Arc<Notify>,
        calls: Arc<AtomicUsize>,
        outcome: FetchOutcome<Video>,
    }

    #[async_trait]
    impl VideoRepository for GatedRepository {
        async fn fetch_video_url(&self) -> FetchOutcome<Video> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.gate.notified().await;
            self.outcome.clone()
        }
    }

    fn gated(outcome: FetchOutcome<Video>) -> (GetVideoUrl, Arc<Notify>, Arc<AtomicUsize>) {
        let gate = Arc::new(Notify::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let repository = GatedRepository {
            gate: gate.clone(),
            calls: calls.clone(),
            outcome,
        };
        (GetVideoUrl::new(Arc::new(repository)), gate, calls)
    }

    #[tokio::test]
    async fn test_loading_then_success_then_closed() {
        let video = Video::new("https://example.com/a.mp4");
        let (use_case, gate, calls) = gated(FetchOutcome::Success(video.clone()));

        let presenter = VideoPresenter::launch(use_case);
        let mut observer = presenter.subscribe();

        assert_eq!(*observer.borrow_and_update(), UiState::Loading);
        assert!(!presenter.is_settled());

        gate.notify_one();
        observer.changed().await.unwrap();
        assert_eq!(*observer.borrow_and_update(), UiState::Success(video.clone()));

        // Writer is gone after the terminal state: no third emission.
        assert!(observer.changed().await.is_err());
        assert_eq!(presenter.state(), UiState::Success(video));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_loading_then_error() {
        let (use_case, gate, _calls) =
            gated(FetchOutcome::error("No internet connection available."));

        let presenter = VideoPresenter::launch(use_case);
        let mut observer = presenter.subscribe();
        assert_eq!(*observer.borrow_and_update(), UiState::Loading);

        gate.notify_one();
        observer.changed().await.unwrap();
        assert_eq!(
            *observer.borrow_and_update(),
            UiState::Error("No internet connection available.".to_string())
        );
        assert!(observer.changed().await.is_err());
        assert!(presenter.is_settled());
    }

    #[tokio::test]
    async fn test_late_subscriber_sees_terminal_state() {
        let (use_case, gate, _calls) = gated(FetchOutcome::Success(Video::new("https://v/1")));
        gate.notify_one();

        let presenter = VideoPresenter::launch(use_case);
        let mut early = presenter.subscribe();
        early.changed().await.unwrap();

        let late = presenter.subscribe();
        assert_eq!(*late.borrow(), UiState::Success(Video::new("https://v/1")));
    }

    #[tokio::test]
    async fn test_drop_aborts_pending_fetch() {
        let (use_case, _gate, calls) = gated(FetchOutcome::Success(Video::new("https://v/1")));

        let presenter = VideoPresenter::launch(use_case);
        let mut observer = presenter.subscribe();
        tokio::task::yield_now().await;

        drop(presenter);

        // Aborted task drops the writer without publishing a terminal state.
        assert!(observer.changed().await.is_err());
        assert_eq!(*observer.borrow(), UiState::Loading);
        assert!(calls.load(Ordering::SeqCst) <= 1);
    }
}
