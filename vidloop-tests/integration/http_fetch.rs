//! Fetch pipeline against a real HTTP endpoint.

use axum::http::StatusCode;
use vidloop_core::app::video_use_case;
use vidloop_core::repository::NO_CONNECTION_MESSAGE;
use vidloop_core::{FetchOutcome, Video, VidloopConfig};

use crate::fixture::{FixedProbe, closed_base_url, serve, use_case};

const VALID_BODY: &str = r#"{"url":"https://example.com/a.mp4"}"#;

fn expect_error(outcome: FetchOutcome<Video>) -> String {
    match outcome {
        FetchOutcome::Error { message } => message,
        FetchOutcome::Success(video) => panic!("expected error, got {video:?}"),
    }
}

#[tokio::test]
async fn test_valid_response_yields_video() {
    let endpoint = serve("", StatusCode::OK, VALID_BODY).await;

    let outcome = use_case(&endpoint.base_url, FixedProbe(true)).invoke().await;

    assert_eq!(
        outcome,
        FetchOutcome::Success(Video::new("https://example.com/a.mp4"))
    );
    assert_eq!(endpoint.hits(), 1);
}

#[tokio::test]
async fn test_extra_fields_are_ignored() {
    let endpoint = serve(
        "",
        StatusCode::OK,
        r#"{"url":"https://example.com/b.mp4","title":"Ocean","loop":true}"#,
    )
    .await;

    let outcome = use_case(&endpoint.base_url, FixedProbe(true)).invoke().await;
    assert_eq!(
        outcome,
        FetchOutcome::Success(Video::new("https://example.com/b.mp4"))
    );
}

#[tokio::test]
async fn test_base_url_without_trailing_slash() {
    let endpoint = serve("/api/v1", StatusCode::OK, VALID_BODY).await;
    assert!(!endpoint.base_url.ends_with('/'));

    let outcome = use_case(&endpoint.base_url, FixedProbe(true)).invoke().await;
    assert!(outcome.is_success());
    assert_eq!(endpoint.hits(), 1);
}

#[tokio::test]
async fn test_non_2xx_is_unexpected_error() {
    let endpoint = serve("", StatusCode::NOT_FOUND, "missing").await;

    let message = expect_error(use_case(&endpoint.base_url, FixedProbe(true)).invoke().await);

    assert!(message.starts_with("Unexpected error: HTTP 404"), "{message}");
}

#[tokio::test]
async fn test_server_error_is_unexpected_error() {
    let endpoint = serve("", StatusCode::INTERNAL_SERVER_ERROR, VALID_BODY).await;

    let message = expect_error(use_case(&endpoint.base_url, FixedProbe(true)).invoke().await);

    assert!(message.starts_with("Unexpected error: HTTP 500"), "{message}");
}

#[tokio::test]
async fn test_malformed_body_is_unexpected_error() {
    for body in ["not json", r#"{"href":"https://example.com/a.mp4"}"#, r#"{"url":7}"#, ""] {
        let endpoint = serve("", StatusCode::OK, body).await;

        let message =
            expect_error(use_case(&endpoint.base_url, FixedProbe(true)).invoke().await);

        assert!(
            message.starts_with("Unexpected error: Malformed response body"),
            "{body:?} -> {message}"
        );
    }
}

#[tokio::test]
async fn test_offline_probe_skips_request() {
    let endpoint = serve("", StatusCode::OK, VALID_BODY).await;

    let outcome = use_case(&endpoint.base_url, FixedProbe(false)).invoke().await;

    assert_eq!(outcome, FetchOutcome::error(NO_CONNECTION_MESSAGE));
    assert_eq!(endpoint.hits(), 0);
}

#[tokio::test]
async fn test_refused_connection_after_passing_probe() {
    let base_url = closed_base_url().await;

    let outcome = use_case(&base_url, FixedProbe(true)).invoke().await;

    assert_eq!(outcome, FetchOutcome::error(NO_CONNECTION_MESSAGE));
}

#[tokio::test]
async fn test_repeated_fetches_are_equal() {
    let endpoint = serve("", StatusCode::OK, VALID_BODY).await;
    let use_case = use_case(&endpoint.base_url, FixedProbe(true));

    let first = use_case.invoke().await;
    let second = use_case.invoke().await;

    assert_eq!(first, second);
    assert_eq!(endpoint.hits(), 2);
}

#[tokio::test]
async fn test_configured_pipeline_probes_live_server() {
    let endpoint = serve("", StatusCode::OK, VALID_BODY).await;
    let mut config = VidloopConfig::default();
    config.network.base_url = endpoint.base_url.clone();

    let outcome = video_use_case(&config).unwrap().invoke().await;

    assert_eq!(
        outcome,
        FetchOutcome::Success(Video::new("https://example.com/a.mp4"))
    );
}

#[tokio::test]
async fn test_configured_pipeline_probe_detects_closed_port() {
    let mut config = VidloopConfig::default();
    config.network.base_url = closed_base_url().await;

    let outcome = video_use_case(&config).unwrap().invoke().await;

    assert_eq!(outcome, FetchOutcome::error(NO_CONNECTION_MESSAGE));
}
