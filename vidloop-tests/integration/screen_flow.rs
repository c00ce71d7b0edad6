//! Presenter and screen driven by the real fetch pipeline.

use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use parking_lot::Mutex;
use vidloop_core::playback::{AspectRatio, RecordingSink, RepeatMode, SinkCall, WindowMode};
use vidloop_core::repository::NO_CONNECTION_MESSAGE;
use vidloop_core::{
    HostSignal, Notifier, PlaybackSink, UiState, Video, VideoPresenter, VideoScreen,
};

use crate::fixture::{FixedProbe, serve, serve_with_delay, use_case};

const VIDEO_URL: &str = "https://example.com/loop.mp4";

#[derive(Debug, Clone, Default)]
struct CapturingNotifier {
    events: Arc<Mutex<Vec<String>>>,
}

impl CapturingNotifier {
    fn events(&self) -> Vec<String> {
        self.events.lock().clone()
    }
}

impl Notifier for CapturingNotifier {
    fn progress(&self, visible: bool) {
        self.events.lock().push(format!("progress:{visible}"));
    }

    fn error(&self, message: &str) {
        self.events.lock().push(format!("error:{message}"));
    }
}

fn body() -> String {
    format!(r#"{{"url":"{VIDEO_URL}"}}"#)
}

#[tokio::test]
async fn test_presenter_emits_loading_then_success_once() {
    let endpoint =
        serve_with_delay("", StatusCode::OK, &body(), Duration::from_millis(150)).await;

    let presenter = VideoPresenter::launch(use_case(&endpoint.base_url, FixedProbe(true)));
    let mut observer = presenter.subscribe();

    let mut seen = vec![observer.borrow_and_update().clone()];
    while observer.changed().await.is_ok() {
        seen.push(observer.borrow_and_update().clone());
    }

    assert_eq!(
        seen,
        vec![UiState::Loading, UiState::Success(Video::new(VIDEO_URL))]
    );
    assert!(presenter.is_settled());
    assert_eq!(endpoint.hits(), 1);
}

#[tokio::test]
async fn test_screen_plays_on_loop_and_handles_host_signals() {
    let endpoint = serve("", StatusCode::OK, &body()).await;
    let notifier = CapturingNotifier::default();

    let mut screen = VideoScreen::open(
        use_case(&endpoint.base_url, FixedProbe(true)),
        RecordingSink::new(),
        notifier.clone(),
    )
    .await
    .unwrap();

    let state = screen.run().await.unwrap();
    assert_eq!(state, UiState::Success(Video::new(VIDEO_URL)));

    // Leaving while playing enters PiP; backgrounding in PiP keeps playing.
    screen.handle_signal(HostSignal::UserLeave).await.unwrap();
    assert!(!screen.session().controls_visible());
    screen.handle_signal(HostSignal::Background).await.unwrap();
    assert!(screen.session().sink().is_playing());

    screen.handle_signal(HostSignal::Foreground).await.unwrap();
    assert!(screen.session().controls_visible());

    screen.handle_signal(HostSignal::Pause).await.unwrap();
    screen.handle_signal(HostSignal::Play).await.unwrap();

    let session = screen.close().await.unwrap();
    assert_eq!(
        session.sink().calls(),
        &[
            SinkCall::Repeat(RepeatMode::All),
            SinkCall::SetSource(VIDEO_URL.to_string()),
            SinkCall::Start,
            SinkCall::Window(WindowMode::PictureInPicture {
                aspect: AspectRatio::WIDESCREEN
            }),
            SinkCall::Window(WindowMode::Full),
            SinkCall::Pause,
            SinkCall::Resume,
            SinkCall::Release,
        ]
    );
    let events = notifier.events();
    assert_eq!(events.last().map(String::as_str), Some("progress:false"));
    assert!(!events.iter().any(|e| e.starts_with("error:")));
}

#[tokio::test]
async fn test_http_error_keeps_player_idle() {
    let endpoint = serve("", StatusCode::SERVICE_UNAVAILABLE, "down").await;
    let notifier = CapturingNotifier::default();

    let mut screen = VideoScreen::open(
        use_case(&endpoint.base_url, FixedProbe(true)),
        RecordingSink::new(),
        notifier.clone(),
    )
    .await
    .unwrap();

    let message = match screen.run().await.unwrap() {
        UiState::Error(message) => message,
        other => panic!("expected error state, got {other:?}"),
    };
    assert!(message.starts_with("Unexpected error: HTTP 503"), "{message}");

    // Leaving without playback only pauses.
    screen.handle_signal(HostSignal::UserLeave).await.unwrap();
    assert!(screen.session().controls_visible());

    let session = screen.close().await.unwrap();
    assert_eq!(
        session.sink().calls(),
        &[
            SinkCall::Repeat(RepeatMode::All),
            SinkCall::Pause,
            SinkCall::Release,
        ]
    );
    assert_eq!(
        notifier.events().last().map(String::as_str),
        Some(format!("error:{message}").as_str())
    );
}

#[tokio::test]
async fn test_offline_screen_shows_no_connection() {
    let endpoint = serve("", StatusCode::OK, &body()).await;

    let mut screen = VideoScreen::open(
        use_case(&endpoint.base_url, FixedProbe(false)),
        RecordingSink::new(),
        CapturingNotifier::default(),
    )
    .await
    .unwrap();

    assert_eq!(
        screen.run().await.unwrap(),
        UiState::Error(NO_CONNECTION_MESSAGE.to_string())
    );
    assert_eq!(endpoint.hits(), 0);
    assert!(screen.session().sink().source().is_none());
}
