//! In-process HTTP endpoint serving `video_url.json`.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use vidloop_core::config::NetworkConfig;
use vidloop_core::remote::{ConnectivityProbe, HttpVideoSource};
use vidloop_core::{GetVideoUrl, RemoteVideoRepository};

#[derive(Clone)]
struct Fixture {
    status: StatusCode,
    body: String,
    delay: Duration,
    hits: Arc<AtomicUsize>,
}

/// Running endpoint; the server stops when this is dropped.
pub struct VideoEndpoint {
    pub base_url: String,
    hits: Arc<AtomicUsize>,
    server: JoinHandle<()>,
}

impl VideoEndpoint {
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

impl Drop for VideoEndpoint {
    fn drop(&mut self) {
        self.server.abort();
    }
}

/// Serves `body` with `status` at `<prefix>/video_url.json`.
pub async fn serve(prefix: &str, status: StatusCode, body: &str) -> VideoEndpoint {
    serve_with_delay(prefix, status, body, Duration::ZERO).await
}

pub async fn serve_with_delay(
    prefix: &str,
    status: StatusCode,
    body: &str,
    delay: Duration,
) -> VideoEndpoint {
    let hits = Arc::new(AtomicUsize::new(0));
    let fixture = Fixture {
        status,
        body: body.to_string(),
        delay,
        hits: hits.clone(),
    };

    let app = Router::new()
        .route(&format!("{prefix}/video_url.json"), get(video_url))
        .with_state(fixture);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();

    let server = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!("Fixture server failed: {e}");
        }
    });

    VideoEndpoint {
        base_url: format!("http://{address}{prefix}"),
        hits,
        server,
    }
}

async fn video_url(State(fixture): State<Fixture>) -> (StatusCode, String) {
    fixture.hits.fetch_add(1, Ordering::SeqCst);
    if !fixture.delay.is_zero() {
        tokio::time::sleep(fixture.delay).await;
    }
    (fixture.status, fixture.body.clone())
}

/// Base URL of a port nothing listens on.
pub async fn closed_base_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{address}/")
}

/// Probe with a fixed answer.
#[derive(Debug, Clone, Copy)]
pub struct FixedProbe(pub bool);

#[async_trait]
impl ConnectivityProbe for FixedProbe {
    async fn is_available(&self) -> bool {
        self.0
    }
}

/// Builds the production pipeline against `base_url` with the given probe.
pub fn use_case(base_url: &str, probe: FixedProbe) -> GetVideoUrl {
    let config = NetworkConfig {
        base_url: base_url.to_string(),
        ..NetworkConfig::default()
    };
    let source = HttpVideoSource::new(&config, Box::new(probe)).unwrap();
    GetVideoUrl::new(Arc::new(RemoteVideoRepository::new(Box::new(source))))
}
