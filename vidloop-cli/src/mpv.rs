//! mpv-backed playback sink.
//!
//! mpv is started with a JSON IPC socket in a private temp directory. Every
//! later operation (pause, resume, loop, window placement, quit) is sent as a
//! JSON command line over that socket. mpv's own pause and end-of-playback
//! events flow back over the same socket and drive `is_playing`, so a pause
//! made in the player window is seen by the session.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};
use tempfile::TempDir;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::UnixStream;
use tokio::net::unix::OwnedWriteHalf;
use tokio::process::{Child, Command};
use tokio::time::Instant;
use vidloop_core::PlaybackError;
use vidloop_core::config::PlayerConfig;
use vidloop_core::playback::{PlaybackSink, RepeatMode, WindowMode};

const IPC_RETRY_INTERVAL: Duration = Duration::from_millis(50);
const QUIT_GRACE_PERIOD: Duration = Duration::from_secs(2);
const PAUSE_OBSERVER_ID: u64 = 1;

/// Line-oriented writer for mpv's JSON IPC protocol.
#[derive(Debug)]
pub struct MpvIpc<W> {
    writer: W,
    next_request_id: u64,
}

impl<W: AsyncWrite + Unpin> MpvIpc<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            next_request_id: 1,
        }
    }

    /// Sends one command such as `["set_property", "pause", true]`.
    ///
    /// # Errors
    /// - `PlaybackError::Ipc` - Socket write failed
    pub async fn command(&mut self, args: Value) -> Result<(), PlaybackError> {
        let request = json!({ "command": args, "request_id": self.next_request_id });
        self.next_request_id += 1;

        let mut line = request.to_string();
        line.push('\n');
        tracing::trace!("mpv <- {}", line.trim_end());

        self.writer
            .write_all(line.as_bytes())
            .await
            .map_err(|e| PlaybackError::Ipc {
                reason: e.to_string(),
            })?;
        self.writer.flush().await.map_err(|e| PlaybackError::Ipc {
            reason: e.to_string(),
        })
    }

    pub async fn set_property(&mut self, name: &str, value: Value) -> Result<(), PlaybackError> {
        self.command(json!(["set_property", name, value])).await
    }
}

/// Playback sink running an external mpv process.
#[derive(Debug)]
pub struct MpvSink {
    config: PlayerConfig,
    socket_dir: TempDir,
    child: Option<Child>,
    ipc: Option<MpvIpc<OwnedWriteHalf>>,
    source: Option<String>,
    repeat: RepeatMode,
    playing: Arc<AtomicBool>,
    released: bool,
}

impl MpvSink {
    /// Creates a sink; mpv itself is spawned on the first `start`.
    ///
    /// # Errors
    /// - `PlaybackError::Io` - Temp directory for the IPC socket could not be created
    pub fn new(config: PlayerConfig) -> Result<Self, PlaybackError> {
        let socket_dir = tempfile::Builder::new().prefix("vidloop-mpv").tempdir()?;
        Ok(Self {
            config,
            socket_dir,
            child: None,
            ipc: None,
            source: None,
            repeat: RepeatMode::Off,
            playing: Arc::new(AtomicBool::new(false)),
            released: false,
        })
    }

    fn socket_path(&self) -> PathBuf {
        self.socket_dir.path().join("mpv.sock")
    }

    fn ensure_alive(&self) -> Result<(), PlaybackError> {
        if self.released {
            Err(PlaybackError::Released)
        } else {
            Ok(())
        }
    }

    async fn spawn(&mut self, url: &str) -> Result<(), PlaybackError> {
        let socket = self.socket_path();
        let mut command = Command::new(&self.config.command);
        command
            .args(&self.config.extra_args)
            .arg(format!("--input-ipc-server={}", socket.display()))
            .arg("--force-window=yes")
            .arg(format!("--loop-file={}", loop_value(self.repeat)))
            .arg(url)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        tracing::debug!("Spawning {:?}", command.as_std());
        let mut child = command.spawn().map_err(|e| PlaybackError::Spawn {
            command: self.config.command.clone(),
            reason: e.to_string(),
        })?;

        let stream =
            match connect_ipc(&socket, &mut child, self.config.ipc_connect_timeout).await {
                Ok(stream) => stream,
                Err(e) => {
                    let _ = child.kill().await;
                    return Err(e);
                }
            };

        self.child = Some(child);
        self.attach(stream).await
    }

    /// Wires a connected IPC socket: replies and events are read in the
    /// background, and pause changes are observed.
    async fn attach(&mut self, stream: UnixStream) -> Result<(), PlaybackError> {
        let (reader, writer) = stream.into_split();
        tokio::spawn(track_events(reader, self.playing.clone()));

        let mut ipc = MpvIpc::new(writer);
        ipc.command(json!(["observe_property", PAUSE_OBSERVER_ID, "pause"]))
            .await?;
        self.ipc = Some(ipc);
        Ok(())
    }

    fn set_playing(&self, playing: bool) {
        self.playing.store(playing, Ordering::SeqCst);
    }

    async fn send(&mut self, args: Value) -> Result<(), PlaybackError> {
        match self.ipc.as_mut() {
            Some(ipc) => ipc.command(args).await,
            None => Ok(()),
        }
    }
}

#[async_trait]
impl PlaybackSink for MpvSink {
    async fn set_source(&mut self, url: &str) -> Result<(), PlaybackError> {
        self.ensure_alive()?;
        self.source = Some(url.to_string());
        self.send(json!(["loadfile", url, "replace"])).await
    }

    async fn start(&mut self) -> Result<(), PlaybackError> {
        self.ensure_alive()?;
        let url = self.source.clone().ok_or(PlaybackError::NoSource)?;

        if self.child.is_none() {
            self.spawn(&url).await?;
        } else {
            self.send(json!(["set_property", "pause", false])).await?;
        }
        self.set_playing(true);
        Ok(())
    }

    async fn pause(&mut self) -> Result<(), PlaybackError> {
        self.ensure_alive()?;
        self.send(json!(["set_property", "pause", true])).await?;
        self.set_playing(false);
        Ok(())
    }

    async fn resume(&mut self) -> Result<(), PlaybackError> {
        self.ensure_alive()?;
        if self.ipc.is_none() {
            return Ok(());
        }
        self.send(json!(["set_property", "pause", false])).await?;
        self.set_playing(true);
        Ok(())
    }

    async fn set_repeat(&mut self, mode: RepeatMode) -> Result<(), PlaybackError> {
        self.ensure_alive()?;
        self.repeat = mode;
        self.send(json!(["set_property", "loop-file", loop_value(mode)]))
            .await
    }

    async fn set_window_mode(&mut self, mode: WindowMode) -> Result<(), PlaybackError> {
        self.ensure_alive()?;
        let Some(ipc) = self.ipc.as_mut() else {
            return Ok(());
        };

        match mode {
            WindowMode::PictureInPicture { aspect } => {
                ipc.set_property("fullscreen", json!(false)).await?;
                ipc.set_property("ontop", json!(true)).await?;
                ipc.set_property(
                    "video-aspect-override",
                    json!(format!("{}:{}", aspect.width, aspect.height)),
                )
                .await
            }
            WindowMode::Full => {
                ipc.set_property("ontop", json!(false)).await?;
                ipc.set_property("video-aspect-override", json!("no")).await
            }
        }
    }

    async fn release(&mut self) -> Result<(), PlaybackError> {
        if self.released {
            return Ok(());
        }
        self.released = true;
        self.set_playing(false);

        if let Some(mut ipc) = self.ipc.take() {
            if let Err(e) = ipc.command(json!(["quit"])).await {
                tracing::debug!("mpv quit command failed: {e}");
            }
        }

        if let Some(mut child) = self.child.take() {
            match tokio::time::timeout(QUIT_GRACE_PERIOD, child.wait()).await {
                Ok(status) => tracing::debug!("mpv exited: {:?}", status),
                Err(_) => {
                    tracing::warn!("mpv did not quit in time, killing it");
                    child.kill().await?;
                }
            }
        }
        Ok(())
    }

    fn is_playing(&self) -> bool {
        self.playing.load(Ordering::SeqCst)
    }
}

fn loop_value(mode: RepeatMode) -> &'static str {
    match mode {
        RepeatMode::All | RepeatMode::One => "inf",
        RepeatMode::Off => "no",
    }
}

/// Reads mpv's reply and event lines until the socket closes.
///
/// The player counts as stopped once the connection is gone.
async fn track_events<R: AsyncRead + Unpin>(reader: R, playing: Arc<AtomicBool>) {
    let mut lines = BufReader::new(reader).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        tracing::trace!("mpv -> {line}");
        if let Some(state) = playing_after(&line) {
            playing.store(state, Ordering::SeqCst);
        }
    }
    playing.store(false, Ordering::SeqCst);
}

/// Playing state implied by one IPC line, if it carries one.
fn playing_after(line: &str) -> Option<bool> {
    let message: Value = serde_json::from_str(line).ok()?;
    match message.get("event")?.as_str()? {
        "property-change" if message.get("name")?.as_str()? == "pause" => {
            message.get("data")?.as_bool().map(|paused| !paused)
        }
        "pause" => Some(false),
        "unpause" => Some(true),
        // "stop" and "redirect" are emitted when a new file replaces the old one.
        "end-file" => match message.get("reason").and_then(Value::as_str) {
            Some("stop" | "redirect") => None,
            _ => Some(false),
        },
        "shutdown" => Some(false),
        _ => None,
    }
}

/// Waits for mpv to create its IPC socket.
async fn connect_ipc(
    path: &Path,
    child: &mut Child,
    timeout: Duration,
) -> Result<UnixStream, PlaybackError> {
    let deadline = Instant::now() + timeout;

    loop {
        if let Some(status) = child.try_wait()? {
            return Err(PlaybackError::Ipc {
                reason: format!("player exited before opening IPC socket ({status})"),
            });
        }

        match UnixStream::connect(path).await {
            Ok(stream) => return Ok(stream),
            Err(e) if Instant::now() >= deadline => {
                return Err(PlaybackError::Ipc {
                    reason: format!("could not connect to {}: {e}", path.display()),
                });
            }
            Err(_) => tokio::time::sleep(IPC_RETRY_INTERVAL).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::Lines;
    use tokio_test::io::Builder;
    use vidloop_core::PlaybackSession;
    use vidloop_core::playback::HostSignal;

    use super::*;

    async fn next_command<R: AsyncRead + Unpin>(lines: &mut Lines<BufReader<R>>) -> Value {
        let line = lines.next_line().await.unwrap().unwrap();
        serde_json::from_str::<Value>(&line).unwrap()["command"].clone()
    }

    async fn wait_for_playing(sink: &MpvSink, expected: bool) {
        tokio::time::timeout(Duration::from_secs(2), async {
            while sink.is_playing() != expected {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_ipc_writes_numbered_json_lines() {
        let writer = Builder::new()
            .write(b"{\"command\":[\"set_property\",\"pause\",true],\"request_id\":1}\n")
            .write(b"{\"command\":[\"quit\"],\"request_id\":2}\n")
            .build();

        let mut ipc = MpvIpc::new(writer);
        ipc.set_property("pause", json!(true)).await.unwrap();
        ipc.command(json!(["quit"])).await.unwrap();
    }

    #[test]
    fn test_loop_value() {
        assert_eq!(loop_value(RepeatMode::All), "inf");
        assert_eq!(loop_value(RepeatMode::Off), "no");
    }

    #[tokio::test]
    async fn test_calls_before_start_do_not_spawn() {
        let mut sink = MpvSink::new(PlayerConfig::default()).unwrap();

        sink.set_repeat(RepeatMode::All).await.unwrap();
        sink.set_source("https://example.com/a.mp4").await.unwrap();
        sink.pause().await.unwrap();
        sink.set_window_mode(WindowMode::Full).await.unwrap();

        assert!(sink.child.is_none());
        assert!(!sink.is_playing());
        assert_eq!(sink.repeat, RepeatMode::All);
    }

    #[tokio::test]
    async fn test_start_without_source() {
        let mut sink = MpvSink::new(PlayerConfig::default()).unwrap();
        assert!(matches!(sink.start().await, Err(PlaybackError::NoSource)));
    }

    #[tokio::test]
    async fn test_missing_player_binary() {
        let config = PlayerConfig {
            command: "vidloop-test-no-such-player".to_string(),
            ..PlayerConfig::default()
        };
        let mut sink = MpvSink::new(config).unwrap();
        sink.set_source("https://example.com/a.mp4").await.unwrap();

        assert!(matches!(sink.start().await, Err(PlaybackError::Spawn { .. })));
    }

    #[tokio::test]
    async fn test_release_twice() {
        let mut sink = MpvSink::new(PlayerConfig::default()).unwrap();
        sink.release().await.unwrap();
        sink.release().await.unwrap();
        assert!(matches!(
            sink.set_source("https://example.com/a.mp4").await,
            Err(PlaybackError::Released)
        ));
    }

    #[test]
    fn test_playing_after_events() {
        let pause = r#"{"event":"property-change","id":1,"name":"pause","data":true}"#;
        let unpause = r#"{"event":"property-change","id":1,"name":"pause","data":false}"#;
        assert_eq!(playing_after(pause), Some(false));
        assert_eq!(playing_after(unpause), Some(true));
        assert_eq!(playing_after(r#"{"event":"pause"}"#), Some(false));
        assert_eq!(playing_after(r#"{"event":"unpause"}"#), Some(true));
        assert_eq!(playing_after(r#"{"event":"end-file","reason":"eof"}"#), Some(false));
        assert_eq!(playing_after(r#"{"event":"end-file","reason":"stop"}"#), None);
        assert_eq!(playing_after(r#"{"event":"shutdown"}"#), Some(false));
        assert_eq!(playing_after(r#"{"request_id":1,"error":"success"}"#), None);
        assert_eq!(playing_after("garbage"), None);
    }

    #[tokio::test]
    async fn test_track_events_stops_on_disconnect() {
        let reader = Builder::new()
            .read(b"{\"event\":\"unpause\"}\n")
            .build();
        let playing = Arc::new(AtomicBool::new(true));

        track_events(reader, playing.clone()).await;
        assert!(!playing.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_pause_in_player_window_prevents_picture_in_picture() {
        let (ours, player) = UnixStream::pair().unwrap();
        let (player_reader, mut player_writer) = player.into_split();
        let mut commands = BufReader::new(player_reader).lines();

        let mut sink = MpvSink::new(PlayerConfig::default()).unwrap();
        sink.set_source("https://example.com/a.mp4").await.unwrap();
        sink.attach(ours).await.unwrap();
        assert_eq!(next_command(&mut commands).await, json!(["observe_property", 1, "pause"]));

        let unpaused = r#"{"event":"property-change","id":1,"name":"pause","data":false}"#;
        player_writer.write_all(format!("{unpaused}\n").as_bytes()).await.unwrap();
        wait_for_playing(&sink, true).await;

        // The user pauses in the mpv window.
        let paused = r#"{"event":"property-change","id":1,"name":"pause","data":true}"#;
        player_writer.write_all(format!("{paused}\n").as_bytes()).await.unwrap();
        wait_for_playing(&sink, false).await;

        let mut session = PlaybackSession::new(sink);
        session.handle(HostSignal::UserLeave).await.unwrap();
        assert_eq!(session.window_mode(), WindowMode::Full);
        assert_eq!(next_command(&mut commands).await, json!(["set_property", "pause", true]));
    }

    #[tokio::test]
    async fn test_player_exit_stops_playing() {
        let (ours, player) = UnixStream::pair().unwrap();
        let mut sink = MpvSink::new(PlayerConfig::default()).unwrap();
        sink.attach(ours).await.unwrap();
        sink.set_playing(true);

        drop(player);
        wait_for_playing(&sink, false).await;
    }
}
