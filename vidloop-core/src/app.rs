//! Explicit construction of the fetch pipeline from configuration.

use std::sync::Arc;

use crate::Result;
use crate::config::VidloopConfig;
use crate::remote::{AssumeOnline, ConnectivityProbe, HttpVideoSource, TcpConnectivityProbe};
use crate::repository::RemoteVideoRepository;
use crate::usecase::GetVideoUrl;

/// Builds probe, HTTP source, repository and use case.
///
/// # Errors
/// - `VidloopError::Configuration` - Invalid base URL or HTTP client setup failed
pub fn video_use_case(config: &VidloopConfig) -> Result<GetVideoUrl> {
    let probe = connectivity_probe(config)?;
    let source = HttpVideoSource::new(&config.network, probe)?;
    tracing::debug!("Video endpoint: {}", source.endpoint());

    let repository = RemoteVideoRepository::new(Box::new(source));
    Ok(GetVideoUrl::new(Arc::new(repository)))
}

fn connectivity_probe(config: &VidloopConfig) -> Result<Box<dyn ConnectivityProbe>> {
    if config.network.skip_probe {
        return Ok(Box::new(AssumeOnline));
    }

    let endpoint = config.network.endpoint()?;
    match TcpConnectivityProbe::for_url(&endpoint, config.network.probe_timeout) {
        Some(probe) => Ok(Box::new(probe)),
        None => {
            tracing::warn!("Cannot derive probe target from {endpoint}, probing disabled");
            Ok(Box::new(AssumeOnline))
        }
    }
}
