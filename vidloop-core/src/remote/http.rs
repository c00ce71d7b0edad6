//! HTTP video source for production use.

use async_trait::async_trait;
use url::Url;

use super::{ConnectivityProbe, VideoSource};
use crate::config::NetworkConfig;
use crate::domain::VideoRecord;
use crate::errors::FetchError;
use crate::{Result, VidloopError};

/// Fetches `video_url.json` from the configured base URL.
///
/// The connectivity probe runs before every request; a negative answer
/// short-circuits without touching the network.
#[derive(Debug)]
pub struct HttpVideoSource {
    client: reqwest::Client,
    endpoint: Url,
    probe: Box<dyn ConnectivityProbe>,
}

impl HttpVideoSource {
    /// Creates a source for the endpoint described by `config`.
    ///
    /// # Errors
    /// - `VidloopError::Configuration` - Invalid base URL or HTTP client setup failed
    pub fn new(config: &NetworkConfig, probe: Box<dyn ConnectivityProbe>) -> Result<Self> {
        let endpoint = config.endpoint()?;
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(config.user_agent)
            .build()
            .map_err(|e| VidloopError::Configuration {
                reason: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            endpoint,
            probe,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl VideoSource for HttpVideoSource {
    async fn fetch_video(&self) -> std::result::Result<VideoRecord, FetchError> {
        if !self.probe.is_available().await {
            tracing::debug!("Connectivity probe negative, not requesting {}", self.endpoint);
            return Err(FetchError::ConnectivityUnavailable);
        }

        let url = self.endpoint.as_str();
        tracing::debug!("--> GET {url}");

        let response = self
            .client
            .get(self.endpoint.clone())
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))?;

        let status = response.status();
        tracing::debug!("<-- {} {url}", status.as_u16());

        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))?;
        tracing::trace!("<-- body ({} bytes): {body}", body.len());

        serde_json::from_str(&body).map_err(|e| FetchError::Decode {
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;
    use crate::remote::AssumeOnline;

    #[derive(Debug, Default)]
    struct OfflineProbe {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl ConnectivityProbe for OfflineProbe {
        async fn is_available(&self) -> bool {
            self.calls.fetch_add(1, Ordering::SeqCst);
            false
        }
    }

    #[tokio::test]
    async fn test_offline_probe_short_circuits() {
        let calls = Arc::new(AtomicUsize::new(0));
        let config = NetworkConfig {
            // Nothing listens here; reaching the network would yield Connect.
            base_url: "http://127.0.0.1:9/".to_string(),
            ..NetworkConfig::default()
        };
        let source = HttpVideoSource::new(
            &config,
            Box::new(OfflineProbe {
                calls: calls.clone(),
            }),
        )
        .unwrap();

        let result = source.fetch_video().await;
        assert!(matches!(result, Err(FetchError::ConnectivityUnavailable)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_new_rejects_invalid_base_url() {
        let config = NetworkConfig {
            base_url: "::not-a-url".to_string(),
            ..NetworkConfig::default()
        };
        let result = HttpVideoSource::new(&config, Box::new(AssumeOnline));
        assert!(matches!(result, Err(VidloopError::Configuration { .. })));
    }

    #[test]
    fn test_endpoint_is_resolved() {
        let config = NetworkConfig {
            base_url: "https://cdn.example.com/feeds".to_string(),
            ..NetworkConfig::default()
        };
        let source = HttpVideoSource::new(&config, Box::new(AssumeOnline)).unwrap();
        assert_eq!(
            source.endpoint().as_str(),
            "https://cdn.example.com/feeds/video_url.json"
        );
    }
}
