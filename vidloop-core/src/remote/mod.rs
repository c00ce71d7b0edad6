//! Remote fetch adapter for the video URL record.

use async_trait::async_trait;

use crate::domain::VideoRecord;
use crate::errors::FetchError;

pub mod http;
pub mod probe;

pub use http::HttpVideoSource;
pub use probe::{AssumeOnline, ConnectivityProbe, TcpConnectivityProbe};

/// Source of the video URL record.
///
/// Implementations perform exactly one attempt per call: no retries, no
/// caching. Failures are returned unclassified; the repository decides how
/// they are presented.
#[async_trait]
pub trait VideoSource: Send + Sync + std::fmt::Debug {
    /// Fetches the current video URL record.
    ///
    /// # Errors
    /// - `FetchError::ConnectivityUnavailable` - Probe reported no network
    /// - `FetchError::Connect` / `FetchError::Timeout` - Transport failure
    /// - `FetchError::Status` - Non-2xx response
    /// - `FetchError::Decode` - Body is not `{"url": string}`
    async fn fetch_video(&self) -> Result<VideoRecord, FetchError>;
}
