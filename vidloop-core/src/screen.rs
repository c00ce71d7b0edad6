//! The consuming view: renders presenter state into the playback session.

use crate::domain::UiState;
use crate::errors::PlaybackError;
use crate::playback::{HostSignal, PlaybackSession, PlaybackSink};
use crate::presenter::VideoPresenter;
use crate::usecase::GetVideoUrl;

/// User-facing feedback for loading and errors.
pub trait Notifier: Send + Sync {
    /// Shows or hides the progress indicator.
    fn progress(&self, visible: bool);

    /// Shows a transient error message.
    fn error(&self, message: &str);
}

/// Screen binding one presenter to one playback session.
///
/// The player is configured before the fetch starts, matching the order in
/// which a host builds its player view and then requests content.
#[derive(Debug)]
pub struct VideoScreen<S, N> {
    presenter: VideoPresenter,
    session: PlaybackSession<S>,
    notifier: N,
}

impl<S: PlaybackSink, N: Notifier> VideoScreen<S, N> {
    /// Prepares the player and launches the fetch.
    ///
    /// # Errors
    /// Propagates the sink failure from preparing loop playback.
    pub async fn open(use_case: GetVideoUrl, sink: S, notifier: N) -> Result<Self, PlaybackError> {
        let mut session = PlaybackSession::new(sink);
        session.prepare().await?;

        Ok(Self {
            presenter: VideoPresenter::launch(use_case),
            session,
            notifier,
        })
    }

    /// Renders states until the terminal one and returns it.
    ///
    /// # Errors
    /// Propagates sink failures when starting playback.
    pub async fn run(&mut self) -> Result<UiState, PlaybackError> {
        let mut observer = self.presenter.subscribe();

        loop {
            let state = observer.borrow_and_update().clone();
            self.render(&state).await?;

            if state.is_terminal() {
                return Ok(state);
            }

            if observer.changed().await.is_err() {
                // Writer dropped without a terminal state: the fetch was aborted.
                let state = self.presenter.state();
                if state.is_terminal() {
                    self.render(&state).await?;
                }
                return Ok(state);
            }
        }
    }

    /// Forwards a host signal to the playback session.
    ///
    /// # Errors
    /// Propagates sink failures.
    pub async fn handle_signal(&mut self, signal: HostSignal) -> Result<(), PlaybackError> {
        self.session.handle(signal).await
    }

    /// Tears the screen down: releases the player and abandons the fetch.
    ///
    /// # Errors
    /// Propagates the sink's release failure.
    pub async fn close(mut self) -> Result<PlaybackSession<S>, PlaybackError> {
        self.session.release().await?;
        Ok(self.session)
    }

    pub fn session(&self) -> &PlaybackSession<S> {
        &self.session
    }

    pub fn state(&self) -> UiState {
        self.presenter.state()
    }

    async fn render(&mut self, state: &UiState) -> Result<(), PlaybackError> {
        match state {
            UiState::Loading => {
                self.notifier.progress(true);
                Ok(())
            }
            UiState::Success(video) => {
                self.notifier.progress(false);
                self.session.play_url(&video.url).await
            }
            UiState::Error(message) => {
                self.notifier.progress(false);
                self.notifier.error(message);
                Ok(())
            }
        }
    }
}
