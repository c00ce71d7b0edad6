//! Integration tests for Vidloop
//!
//! These tests run the real HTTP source against an in-process axum server
//! and drive the presenter, screen and playback session end to end.

#[path = "integration/fixture.rs"]
mod fixture;

#[path = "integration/http_fetch.rs"]
mod http_fetch;

#[path = "integration/screen_flow.rs"]
mod screen_flow;
