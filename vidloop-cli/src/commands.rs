//! CLI command implementations

use clap::Subcommand;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use vidloop_core::app::video_use_case;
use vidloop_core::playback::{HostSignal, PlaybackSession, PlaybackSink, RecordingSink};
use vidloop_core::{FetchOutcome, GetVideoUrl, Notifier, Result, UiState, VideoScreen};
use vidloop_core::{VidloopConfig, VidloopError};

/// Available CLI commands
#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Fetch the video URL and play it on loop
    Play {
        /// Log player calls instead of starting a real player
        #[arg(long)]
        dry_run: bool,
    },
    /// Fetch the video URL and print it
    Fetch,
}

impl Default for Commands {
    fn default() -> Self {
        Commands::Play { dry_run: false }
    }
}

/// Handle the CLI command
///
/// # Errors
/// - `VidloopError::Configuration` - Invalid configuration
/// - `VidloopError::VideoUnavailable` - `fetch` could not get the URL
/// - `VidloopError::Playback` - Player failed to start or respond
pub async fn handle_command(command: Commands, config: VidloopConfig) -> Result<()> {
    let use_case = video_use_case(&config)?;

    match command {
        Commands::Fetch => fetch(use_case).await,
        Commands::Play { dry_run: true } => play(use_case, RecordingSink::new()).await,
        Commands::Play { dry_run: false } => play_external(use_case, config).await,
    }
}

/// Prints the URL, or fails with the user-facing message.
///
/// # Errors
/// - `VidloopError::VideoUnavailable` - Fetch ended in the error outcome
pub async fn fetch(use_case: GetVideoUrl) -> Result<()> {
    match use_case.invoke().await {
        FetchOutcome::Success(video) => {
            println!("{}", video.url);
            Ok(())
        }
        FetchOutcome::Error { message } => Err(VidloopError::VideoUnavailable { message }),
    }
}

#[cfg(unix)]
async fn play_external(use_case: GetVideoUrl, config: VidloopConfig) -> Result<()> {
    let sink = crate::mpv::MpvSink::new(config.player)?;
    play(use_case, sink).await
}

#[cfg(not(unix))]
async fn play_external(_use_case: GetVideoUrl, config: VidloopConfig) -> Result<()> {
    Err(VidloopError::Configuration {
        reason: format!(
            "driving '{}' needs a unix IPC socket; use --dry-run on this platform",
            config.player.command
        ),
    })
}

/// Runs the screen, then forwards stdin signals until quit, EOF or Ctrl-C.
///
/// # Errors
/// - `VidloopError::Playback` - Player failure
/// - `VidloopError::Io` - Reading stdin failed
pub async fn play<S: PlaybackSink>(use_case: GetVideoUrl, sink: S) -> Result<()> {
    let input = BufReader::new(tokio::io::stdin());
    play_with_input(use_case, sink, input).await?;
    Ok(())
}

/// Same as [`play`] with signals read from `input`; returns the released session.
async fn play_with_input<S, R>(
    use_case: GetVideoUrl,
    sink: S,
    input: R,
) -> Result<PlaybackSession<S>>
where
    S: PlaybackSink,
    R: AsyncBufRead + Unpin,
{
    let mut screen = VideoScreen::open(use_case, sink, TerminalNotifier).await?;

    match screen.run().await? {
        UiState::Success(video) => {
            println!(
                "Playing {} (loop). Signals: pause, play, leave, background, foreground, quit",
                video.url
            );
        }
        UiState::Error(_) => println!("Type 'quit' to exit."),
        UiState::Loading => tracing::warn!("Fetch abandoned before completing"),
    }

    let mut lines = input.lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if line.trim().is_empty() {
                    continue;
                }
                match line.parse::<HostSignal>() {
                    Ok(HostSignal::Quit) => break,
                    Ok(signal) => {
                        if let Err(e) = screen.handle_signal(signal).await {
                            tracing::error!("Signal {signal:?} failed: {e}");
                            eprintln!("{}", VidloopError::from(e).user_message());
                        }
                    }
                    Err(e) => eprintln!("{e}"),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted");
                break;
            }
        }
    }

    Ok(screen.close().await?)
}

/// Notifier printing to the terminal.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn progress(&self, visible: bool) {
        if visible {
            println!("Loading video...");
        }
    }

    fn error(&self, message: &str) {
        eprintln!("{message}");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use vidloop_core::playback::{AspectRatio, RepeatMode, SinkCall, WindowMode};
    use vidloop_core::{Video, VideoRepository};

    use super::*;

    const VIDEO_URL: &str = "https://example.com/a.mp4";

    #[derive(Debug)]
    struct FixedRepository(FetchOutcome<Video>);

    #[async_trait]
    impl VideoRepository for FixedRepository {
        async fn fetch_video_url(&self) -> FetchOutcome<Video> {
            self.0.clone()
        }
    }

    fn use_case(outcome: FetchOutcome<Video>) -> GetVideoUrl {
        GetVideoUrl::new(Arc::new(FixedRepository(outcome)))
    }

    fn success() -> GetVideoUrl {
        use_case(FetchOutcome::Success(Video::new(VIDEO_URL)))
    }

    #[tokio::test]
    async fn test_fetch_success() {
        assert!(fetch(success()).await.is_ok());
    }

    #[tokio::test]
    async fn test_fetch_error_carries_message() {
        let outcome = FetchOutcome::error("No internet connection available.");
        let result = fetch(use_case(outcome)).await;

        match result {
            Err(VidloopError::VideoUnavailable { message }) => {
                assert_eq!(message, "No internet connection available.");
            }
            other => panic!("expected VideoUnavailable, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_play_forwards_signals_until_quit() {
        let input: &[u8] = b"leave\nbogus\n\nfg\nquit\npause\n";

        let session = play_with_input(success(), RecordingSink::new(), input)
            .await
            .unwrap();

        assert!(session.is_released());
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
                SinkCall::Release,
            ]
        );
    }

    #[tokio::test]
    async fn test_play_releases_on_end_of_input() {
        let input: &[u8] = b"pause\n";

        let session = play_with_input(success(), RecordingSink::new(), input)
            .await
            .unwrap();

        let calls = session.sink().calls();
        assert_eq!(&calls[calls.len() - 2..], &[SinkCall::Pause, SinkCall::Release]);
    }

    #[tokio::test]
    async fn test_play_after_error_leaves_player_idle() {
        let input: &[u8] = b"leave\nquit\n";

        let session = play_with_input(
            use_case(FetchOutcome::error("Unexpected error: HTTP 500")),
            RecordingSink::new(),
            input,
        )
        .await
        .unwrap();

        assert_eq!(session.sink().source(), None);
        assert_eq!(
            session.sink().calls(),
            &[
                SinkCall::Repeat(RepeatMode::All),
                SinkCall::Pause,
                SinkCall::Release,
            ]
        );
    }
}
