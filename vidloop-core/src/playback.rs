//! Playback sink seam and the host-side playback session.
//!
//! Decoding and rendering belong to the sink. The session only applies the
//! host lifecycle rules: loop forever, enter picture-in-picture when the
//! user leaves while something is playing, pause otherwise, and forward the
//! `pause` / `play` remote actions.

use async_trait::async_trait;

use crate::errors::PlaybackError;

/// Repeat behaviour requested from the sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RepeatMode {
    #[default]
    Off,
    One,
    All,
}

/// Width/height ratio of the picture-in-picture window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AspectRatio {
    pub width: u32,
    pub height: u32,
}

impl AspectRatio {
    pub const WIDESCREEN: AspectRatio = AspectRatio {
        width: 16,
        height: 9,
    };
}

/// Window placement of the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WindowMode {
    #[default]
    Full,
    PictureInPicture { aspect: AspectRatio },
}

impl WindowMode {
    pub fn is_picture_in_picture(self) -> bool {
        matches!(self, WindowMode::PictureInPicture { .. })
    }
}

/// External media player driven by the session.
#[async_trait]
pub trait PlaybackSink: Send + Sync + std::fmt::Debug {
    /// Replaces the current media item.
    ///
    /// # Errors
    /// - `PlaybackError::Released` - Sink already released
    async fn set_source(&mut self, url: &str) -> Result<(), PlaybackError>;

    /// Prepares the current source and plays as soon as it is ready.
    ///
    /// # Errors
    /// - `PlaybackError::NoSource` - No source set
    /// - `PlaybackError::Spawn` / `PlaybackError::Ipc` - Player failure
    async fn start(&mut self) -> Result<(), PlaybackError>;

    async fn pause(&mut self) -> Result<(), PlaybackError>;

    async fn resume(&mut self) -> Result<(), PlaybackError>;

    async fn set_repeat(&mut self, mode: RepeatMode) -> Result<(), PlaybackError>;

    async fn set_window_mode(&mut self, mode: WindowMode) -> Result<(), PlaybackError>;

    /// Frees player resources. Calling it twice is a no-op.
    async fn release(&mut self) -> Result<(), PlaybackError>;

    fn is_playing(&self) -> bool;
}

/// Signals forwarded by the host into the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostSignal {
    /// Remote "pause" action
    Pause,
    /// Remote "play" action
    Play,
    /// User navigated away from the screen
    UserLeave,
    /// Screen lost focus
    Background,
    /// Screen returned to the foreground
    Foreground,
    /// Host is shutting down
    Quit,
}

impl std::str::FromStr for HostSignal {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pause" => Ok(Self::Pause),
            "play" => Ok(Self::Play),
            "leave" | "pip" => Ok(Self::UserLeave),
            "background" | "bg" => Ok(Self::Background),
            "foreground" | "fg" => Ok(Self::Foreground),
            "quit" | "exit" | "q" => Ok(Self::Quit),
            _ => Err(format!(
                "Unknown signal: '{s}'. Valid signals are: pause, play, leave, background, foreground, quit"
            )),
        }
    }
}

/// Host-side wrapper around a [`PlaybackSink`].
#[derive(Debug)]
pub struct PlaybackSession<S> {
    sink: S,
    window: WindowMode,
    released: bool,
}

impl<S: PlaybackSink> PlaybackSession<S> {
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            window: WindowMode::Full,
            released: false,
        }
    }

    /// Configures loop-forever playback.
    ///
    /// # Errors
    /// Propagates sink failures.
    pub async fn prepare(&mut self) -> Result<(), PlaybackError> {
        self.sink.set_repeat(RepeatMode::All).await
    }

    /// Sets the source and starts playback.
    ///
    /// # Errors
    /// - `PlaybackError::Released` - Session already released
    /// - Sink failures from `set_source` / `start`
    pub async fn play_url(&mut self, url: &str) -> Result<(), PlaybackError> {
        if self.released {
            return Err(PlaybackError::Released);
        }
        tracing::info!("Playing {url}");
        self.sink.set_source(url).await?;
        self.sink.start().await
    }

    /// Applies a host signal. Signals after release are ignored.
    ///
    /// # Errors
    /// Propagates sink failures.
    pub async fn handle(&mut self, signal: HostSignal) -> Result<(), PlaybackError> {
        if self.released {
            tracing::debug!("Ignoring {signal:?} after release");
            return Ok(());
        }

        tracing::debug!("Host signal: {signal:?}");
        match signal {
            HostSignal::Pause => self.sink.pause().await,
            HostSignal::Play => self.sink.resume().await,
            HostSignal::UserLeave => {
                if self.sink.is_playing() {
                    self.enter_picture_in_picture().await
                } else {
                    self.sink.pause().await
                }
            }
            HostSignal::Background => {
                if self.window.is_picture_in_picture() {
                    Ok(())
                } else {
                    self.sink.pause().await
                }
            }
            HostSignal::Foreground => {
                if self.window.is_picture_in_picture() {
                    self.set_window(WindowMode::Full).await
                } else {
                    Ok(())
                }
            }
            HostSignal::Quit => self.release().await,
        }
    }

    /// Releases the sink once.
    ///
    /// # Errors
    /// Propagates the sink's release failure.
    pub async fn release(&mut self) -> Result<(), PlaybackError> {
        if self.released {
            return Ok(());
        }
        self.released = true;
        self.sink.release().await
    }

    pub fn window_mode(&self) -> WindowMode {
        self.window
    }

    /// Player controls are hidden while in picture-in-picture.
    pub fn controls_visible(&self) -> bool {
        !self.window.is_picture_in_picture()
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    async fn enter_picture_in_picture(&mut self) -> Result<(), PlaybackError> {
        self.set_window(WindowMode::PictureInPicture {
            aspect: AspectRatio::WIDESCREEN,
        })
        .await
    }

    async fn set_window(&mut self, mode: WindowMode) -> Result<(), PlaybackError> {
        self.sink.set_window_mode(mode).await?;
        self.window = mode;
        Ok(())
    }
}

/// Call recorded by [`RecordingSink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkCall {
    SetSource(String),
    Start,
    Pause,
    Resume,
    Repeat(RepeatMode),
    Window(WindowMode),
    Release,
}

/// Sink that only logs and records calls.
///
/// Used for dry runs and as a test double.
#[derive(Debug, Default)]
pub struct RecordingSink {
    calls: Vec<SinkCall>,
    source: Option<String>,
    playing: bool,
    released: bool,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> &[SinkCall] {
        &self.calls
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    fn record(&mut self, call: SinkCall) -> Result<(), PlaybackError> {
        if self.released {
            return Err(PlaybackError::Released);
        }
        tracing::info!("player: {call:?}");
        self.calls.push(call);
        Ok(())
    }
}

#[async_trait]
impl PlaybackSink for RecordingSink {
    async fn set_source(&mut self, url: &str) -> Result<(), PlaybackError> {
        self.record(SinkCall::SetSource(url.to_string()))?;
        self.source = Some(url.to_string());
        self.playing = false;
        Ok(())
    }

    async fn start(&mut self) -> Result<(), PlaybackError> {
        if self.source.is_none() {
            return Err(PlaybackError::NoSource);
        }
        self.record(SinkCall::Start)?;
        self.playing = true;
        Ok(())
    }

    async fn pause(&mut self) -> Result<(), PlaybackError> {
        self.record(SinkCall::Pause)?;
        self.playing = false;
        Ok(())
    }

    async fn resume(&mut self) -> Result<(), PlaybackError> {
        self.record(SinkCall::Resume)?;
        self.playing = self.source.is_some();
        Ok(())
    }

    async fn set_repeat(&mut self, mode: RepeatMode) -> Result<(), PlaybackError> {
        self.record(SinkCall::Repeat(mode))
    }

    async fn set_window_mode(&mut self, mode: WindowMode) -> Result<(), PlaybackError> {
        self.record(SinkCall::Window(mode))
    }

    async fn release(&mut self) -> Result<(), PlaybackError> {
        if self.released {
            return Ok(());
        }
        self.record(SinkCall::Release)?;
        self.released = true;
        self.playing = false;
        Ok(())
    }

    fn is_playing(&self) -> bool {
        self.playing
    }
}
