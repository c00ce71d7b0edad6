//! Connectivity probes consulted before each request.

use std::time::Duration;

use async_trait::async_trait;
use tokio::net::TcpStream;
use url::Url;

/// Reports whether the network is reachable before a request is sent.
#[async_trait]
pub trait ConnectivityProbe: Send + Sync + std::fmt::Debug {
    async fn is_available(&self) -> bool;
}

/// Probe that never blocks a request.
#[derive(Debug, Default, Clone, Copy)]
pub struct AssumeOnline;

#[async_trait]
impl ConnectivityProbe for AssumeOnline {
    async fn is_available(&self) -> bool {
        true
    }
}

/// Probe that opens a TCP connection to the endpoint's host.
#[derive(Debug, Clone)]
pub struct TcpConnectivityProbe {
    host: String,
    port: u16,
    timeout: Duration,
}

impl TcpConnectivityProbe {
    pub fn new(host: impl Into<String>, port: u16, timeout: Duration) -> Self {
        Self {
            host: host.into(),
            port,
            timeout,
        }
    }

    /// Builds a probe targeting the host and port of `url`.
    ///
    /// Returns `None` when the URL has no host or no known default port.
    pub fn for_url(url: &Url, timeout: Duration) -> Option<Self> {
        let host = url.host_str()?;
        let port = url.port_or_known_default()?;
        Some(Self::new(host, port, timeout))
    }
}

#[async_trait]
impl ConnectivityProbe for TcpConnectivityProbe {
    async fn is_available(&self) -> bool {
        let connect = TcpStream::connect((self.host.as_str(), self.port));
        match tokio::time::timeout(self.timeout, connect).await {
            Ok(Ok(_)) => true,
            Ok(Err(e)) => {
                tracing::debug!("Probe to {}:{} failed: {}", self.host, self.port, e);
                false
            }
            Err(_) => {
                tracing::debug!("Probe to {}:{} timed out", self.host, self.port);
                false
            }
        }
    }
}
